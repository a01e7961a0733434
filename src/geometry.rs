// Small planar helpers on top of imageproc's point type.

use imageproc::point::Point as GridPoint;

/// Sub-pixel position in frame coordinates.
pub type Point = imageproc::point::Point<f32>;

#[inline]
pub fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Arithmetic mean of the points; `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let n = points.len() as f64;
    Some(Point::new((sx / n) as f32, (sy / n) as f32))
}

/// Unsigned area enclosed by the polygon (shoelace), implicitly closed.
pub fn polygon_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0f64;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        twice += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    (twice.abs() / 2.0) as f32
}

/// Order points by angle around their own centroid, starting from +x and
/// turning towards +y. Gives a stable polygon regardless of detection order.
pub fn sort_by_angle(points: &mut [Point]) {
    let Some(c) = centroid(points) else { return };
    points.sort_by(|a, b| {
        let ta = (a.y - c.y).atan2(a.x - c.x);
        let tb = (b.y - c.y).atan2(b.x - c.x);
        ta.total_cmp(&tb)
    });
}

/// Even-odd ray casting test.
pub fn contains(polygon: &[Point], p: Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Snap to the pixel grid (imageproc's polygon fitting works on integers).
pub fn to_grid(points: &[Point]) -> Vec<GridPoint<i32>> {
    points
        .iter()
        .map(|p| GridPoint::new(p.x.round() as i32, p.y.round() as i32))
        .collect()
}

pub fn from_grid(points: &[GridPoint<i32>]) -> Vec<Point> {
    points.iter().map(|p| Point::new(p.x as f32, p.y as f32)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(side: f32) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn square_area_ignores_winding() {
        let mut sq = square(10.0);
        assert_relative_eq!(polygon_area(&sq), 100.0);
        sq.reverse();
        assert_relative_eq!(polygon_area(&sq), 100.0);
    }

    #[test]
    fn back_and_forth_line_has_no_area() {
        let pts: Vec<Point> = (0..20)
            .map(|i| Point::new(if i % 2 == 0 { 0.0 } else { 30.0 }, 5.0))
            .collect();
        assert_relative_eq!(polygon_area(&pts), 0.0);
    }

    #[test]
    fn centroid_of_empty_is_none() {
        assert!(centroid(&[]).is_none());
        let c = centroid(&square(4.0)).unwrap();
        assert_relative_eq!(c.x, 2.0);
        assert_relative_eq!(c.y, 2.0);
    }

    #[test]
    fn angular_sort_is_independent_of_input_order() {
        let mut a = vec![
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(-10.0, 0.0),
            Point::new(0.0, -10.0),
        ];
        let mut b = vec![a[2], a[0], a[3], a[1]];
        sort_by_angle(&mut a);
        sort_by_angle(&mut b);
        assert_eq!(a, b);
        assert_eq!(a[0], Point::new(0.0, -10.0));
        assert_eq!(a[3], Point::new(-10.0, 0.0));
    }

    #[test]
    fn containment() {
        let sq = square(10.0);
        assert!(contains(&sq, Point::new(5.0, 5.0)));
        assert!(!contains(&sq, Point::new(15.0, 5.0)));
        assert!(!contains(&sq[..2], Point::new(5.0, 0.0)));
    }
}

// Points collected while drawing, loop-closure detection, and the
// conversion of a finished stroke into a simplified outline.

use imageproc::geometry::approximate_polygon_dp;
use log::debug;

use crate::config::EngineConfig;
use crate::geometry::{self, Point};

type GridPoint = imageproc::point::Point<i32>;

/// Polygon fitting needs at least a triangle.
const MIN_OUTLINE_POINTS: usize = 3;
/// Smallest usable fitting tolerance (px).
const MIN_TOLERANCE: f64 = 0.1;

pub struct StrokeAccumulator {
    points: Vec<Point>,
    /// Set once the current points were offered to shape creation.
    finalized: bool,
    min_points: usize,
    closure_distance: f32,
    min_loop_area: f32,
    tolerance: f64,
}

impl StrokeAccumulator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            points: Vec::new(),
            finalized: true,
            min_points: config.min_stroke_points,
            closure_distance: config.closure_distance(),
            min_loop_area: config.min_loop_area(),
            tolerance: config.approx_tolerance.max(MIN_TOLERANCE),
        }
    }

    pub fn points(&self) -> &[Point] { &self.points }
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn is_finalized(&self) -> bool { self.finalized }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Append a sample and report whether the stroke has just closed a loop.
    pub fn push(&mut self, p: Point) -> bool {
        self.points.push(p);
        self.finalized = false;
        self.closes_loop()
    }

    /// The newest point returned near one of the earliest points, and the path
    /// actually encloses something (not just hovering at the start).
    fn closes_loop(&self) -> bool {
        if self.points.len() <= self.min_points {
            return false;
        }
        let Some(&newest) = self.points.last() else { return false };
        let near_start = self.points[..self.min_points / 2]
            .iter()
            .any(|&early| geometry::distance(newest, early) < self.closure_distance);
        if !near_start {
            return false;
        }
        let area = geometry::polygon_area(&self.points);
        let closed = area > self.min_loop_area;
        if closed {
            debug!("stroke closed after {} points, area {:.0}", self.points.len(), area);
        }
        closed
    }

    /// Offer the stroke for shape creation, at most once per set of points.
    /// Returns the simplified closed outline, or `None` for a stroke too short
    /// to mean anything.
    pub fn finalize(&mut self) -> Option<Vec<Point>> {
        if self.finalized {
            return None;
        }
        self.finalized = true;
        if self.points.len() < self.min_points.max(MIN_OUTLINE_POINTS) {
            debug!("discarding short stroke ({} points)", self.points.len());
            return None;
        }
        let outline = fit_closed(&geometry::to_grid(&self.points), self.tolerance);
        if outline.len() < MIN_OUTLINE_POINTS {
            debug!("stroke collapsed to {} vertices", outline.len());
            return None;
        }
        Some(geometry::from_grid(&outline))
    }
}

/// Fit a closed curve by cutting it at the point farthest from its start and
/// simplifying both halves as open curves. The ends may share a pixel.
fn fit_closed(grid: &[GridPoint], tolerance: f64) -> Vec<GridPoint> {
    let Some(&start) = grid.first() else { return Vec::new() };
    let mut end = grid.len();
    while end > 1 && grid[end - 1] == start {
        end -= 1;
    }
    let curve = &grid[..end];

    let Some((far, reach)) = curve
        .iter()
        .map(|p| {
            let (dx, dy) = (i64::from(p.x - start.x), i64::from(p.y - start.y));
            dx * dx + dy * dy
        })
        .enumerate()
        .max_by_key(|&(_, d)| d)
    else {
        return Vec::new();
    };
    if reach == 0 {
        return vec![start];
    }

    let mut back: Vec<GridPoint> = curve[far..].to_vec();
    back.push(start);

    let mut outline = approximate_polygon_dp(&curve[..=far], tolerance, false);
    outline.pop();
    let mut tail = approximate_polygon_dp(&back, tolerance, false);
    tail.pop();
    outline.append(&mut tail);
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(n: usize, r: f32) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32 * std::f32::consts::TAU;
                Point::new(100.0 + r * t.cos(), 100.0 + r * t.sin())
            })
            .collect()
    }

    #[test]
    fn circle_closes_when_it_returns_to_the_start() {
        let mut stroke = StrokeAccumulator::new(&EngineConfig::default());
        let pts = circle(24, 20.0);
        let closed_at: Vec<usize> = pts
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| stroke.push(p).then_some(i))
            .collect();
        assert_eq!(closed_at.first(), Some(&23));
    }

    #[test]
    fn hovering_back_and_forth_never_closes() {
        let mut stroke = StrokeAccumulator::new(&EngineConfig::default());
        for i in 0..40 {
            let x = if i % 2 == 0 { 100.0 } else { 104.0 };
            assert!(!stroke.push(Point::new(x, 100.0)));
        }
    }

    #[test]
    fn short_strokes_are_discarded_once() {
        let mut stroke = StrokeAccumulator::new(&EngineConfig::default());
        assert!(stroke.finalize().is_none());
        for p in circle(10, 20.0) {
            stroke.push(p);
        }
        assert!(!stroke.is_finalized());
        assert!(stroke.finalize().is_none());
        assert!(stroke.is_finalized());
    }

    #[test]
    fn finalize_simplifies_and_runs_once() {
        let mut stroke = StrokeAccumulator::new(&EngineConfig::default());
        for p in circle(60, 40.0) {
            stroke.push(p);
        }
        let outline = stroke.finalize().expect("long stroke produces an outline");
        assert!(outline.len() >= 3 && outline.len() < 60);
        assert!(stroke.finalize().is_none());
    }

    #[test]
    fn loop_ending_on_its_first_pixel_keeps_its_outline() {
        let mut stroke = StrokeAccumulator::new(&EngineConfig::default());
        let mut pts = circle(20, 40.0);
        pts.push(pts[0]);
        let closed: Vec<bool> = pts.iter().map(|&p| stroke.push(p)).collect();
        assert_eq!(closed.last(), Some(&true));

        let outline = stroke.finalize().expect("closed loop produces an outline");
        assert!(outline.len() >= 3, "{outline:?}");
        assert!(geometry::polygon_area(&outline) > 3500.0);
    }

    #[test]
    fn degenerate_settings_do_not_panic() {
        let cfg = EngineConfig { min_stroke_points: 0, approx_tolerance: 0.0, ..EngineConfig::default() };
        let mut stroke = StrokeAccumulator::new(&cfg);
        stroke.push(Point::new(5.0, 5.0));
        stroke.clear();
        assert!(stroke.finalize().is_none());

        for p in circle(30, 20.0) {
            stroke.push(p);
        }
        assert!(stroke.finalize().is_some_and(|o| o.len() >= 3));
    }

    #[test]
    fn stroke_stuck_on_one_pixel_collapses() {
        let mut stroke = StrokeAccumulator::new(&EngineConfig::default());
        for _ in 0..25 {
            stroke.push(Point::new(7.2, 7.4));
        }
        assert!(stroke.finalize().is_none());
    }
}

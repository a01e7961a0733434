// Pointer detection: marker-colored blobs that are big enough and round enough.

use image::GrayImage;
use imageproc::contours::{self, BorderType, Contour};
use imageproc::geometry::arc_length;
use log::trace;

use crate::color::{self, ColorBand};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::geometry::{self, Point};
use crate::types::FrameBuffer;

/// One accepted marker blob in the current frame. No identity across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Pointer {
    pub center: Point,
    /// Border pixels of the blob, used to paint it.
    pub outline: Vec<Point>,
    pub area: f32,
}

impl Pointer {
    /// A pointer with a tiny square outline; handy when feeding positions directly.
    pub fn at(x: f32, y: f32) -> Self {
        let outline = vec![
            Point::new(x - 1.0, y - 1.0),
            Point::new(x + 1.0, y - 1.0),
            Point::new(x + 1.0, y + 1.0),
            Point::new(x - 1.0, y + 1.0),
        ];
        Self { center: Point::new(x, y), outline, area: 4.0 }
    }
}

/// Malinowska coefficient: 0 for a circle, growing as the blob gets less round.
pub fn compactness(area: f32, perimeter: f32) -> f32 {
    if area <= 0.0 {
        return f32::INFINITY;
    }
    perimeter / (2.0 * (std::f32::consts::PI * area).sqrt()) - 1.0
}

pub struct PointerTracker {
    min_area: f32,
    max_compactness: f32,
}

impl PointerTracker {
    pub fn new(config: &EngineConfig) -> Self {
        Self { min_area: config.min_pointer_area, max_compactness: config.max_compactness }
    }

    /// Find this frame's pointers using the calibrated band.
    pub fn detect(&self, frame: &FrameBuffer, band: &ColorBand) -> Result<Vec<Pointer>, Error> {
        frame.validate()?;
        let mask = color::band_mask(&color::hsv_frame(frame), band);
        Ok(self.detect_in_mask(&mask))
    }

    /// Accept outermost blobs of an already thresholded mask.
    pub fn detect_in_mask(&self, mask: &GrayImage) -> Vec<Pointer> {
        let found: Vec<Contour<i32>> = contours::find_contours(mask);
        let pointers: Vec<Pointer> = found
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .filter_map(|c| self.accept(&c))
            .collect();
        trace!("{} pointer(s) in frame", pointers.len());
        pointers
    }

    fn accept(&self, contour: &Contour<i32>) -> Option<Pointer> {
        if contour.points.len() < 3 {
            return None;
        }
        let outline = geometry::from_grid(&contour.points);
        let area = geometry::polygon_area(&outline);
        let perimeter = arc_length(&contour.points, true) as f32;
        if area <= self.min_area || compactness(area, perimeter) >= self.max_compactness {
            return None;
        }
        let center = geometry::centroid(&outline)?;
        Some(Pointer { center, outline, area })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn disk(mask: &mut GrayImage, cx: i32, cy: i32, r: i32) {
        for y in (cy - r)..=(cy + r) {
            for x in (cx - r)..=(cx + r) {
                if (x - cx) * (x - cx) + (y - cy) * (y - cy) <= r * r {
                    mask.put_pixel(x as u32, y as u32, Luma([255]));
                }
            }
        }
    }

    fn tracker() -> PointerTracker {
        PointerTracker::new(&EngineConfig::default())
    }

    #[test]
    fn circle_scores_near_zero() {
        let r = 10.0f32;
        let c = compactness(std::f32::consts::PI * r * r, 2.0 * std::f32::consts::PI * r);
        assert!(c.abs() < 1e-5);
        assert!(compactness(0.0, 10.0).is_infinite());
    }

    #[test]
    fn round_blob_is_a_pointer() {
        let mut mask = GrayImage::new(120, 120);
        disk(&mut mask, 60, 60, 20);
        let found = tracker().detect_in_mask(&mask);
        assert_eq!(found.len(), 1);
        assert!((found[0].center.x - 60.0).abs() < 1.0);
        assert!((found[0].center.y - 60.0).abs() < 1.0);
    }

    #[test]
    fn small_and_elongated_blobs_are_rejected() {
        let mut mask = GrayImage::new(200, 120);
        disk(&mut mask, 20, 20, 5);
        for y in 80..88 {
            for x in 40..140 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        assert!(tracker().detect_in_mask(&mask).is_empty());
    }

    #[test]
    fn detects_each_marker_separately() {
        let mut mask = GrayImage::new(200, 100);
        disk(&mut mask, 40, 50, 18);
        disk(&mut mask, 150, 50, 18);
        assert_eq!(tracker().detect_in_mask(&mask).len(), 2);
    }

    #[test]
    fn detect_uses_the_band() {
        let mut frame = FrameBuffer::new(100, 100);
        for y in 0..100usize {
            for x in 0..100usize {
                let (dx, dy) = (x as i32 - 50, y as i32 - 50);
                if dx * dx + dy * dy <= 400 {
                    frame.pixels[y * 100 + x] = 0x0028C828;
                }
            }
        }
        let band = ColorBand { lower: [50, 150, 150], upper: [70, 240, 240], ..ColorBand::default() };
        assert_eq!(tracker().detect(&frame, &band).unwrap().len(), 1);
        let other = ColorBand { lower: [100, 150, 150], upper: [130, 240, 240], ..ColorBand::default() };
        assert!(tracker().detect(&frame, &other).unwrap().is_empty());
    }
}

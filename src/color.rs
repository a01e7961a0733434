// 8-bit HSV helpers: H in 0..=180, S and V in 0..=255.
// The band published by the calibrator is applied here to build binary masks.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;

use crate::types::FrameBuffer;

pub const HUE_MAX: i32 = 180;
pub const CHANNEL_MAX: i32 = 255;

/// HSV triple stored as `[h, s, v]`.
pub type Hsv = [u8; 3];

/// An `RgbImage` whose three channels hold H, S and V instead of R, G, B.
pub type HsvImage = RgbImage;

/// Accepted HSV range for marker pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorBand {
    pub lower: Hsv,
    pub upper: Hsv,
    /// Mid-band color used to draw pointers and diagnostics.
    pub representative_rgb: [u8; 3],
}

impl Default for ColorBand {
    /// A green marker until the calibrator has seen anything.
    fn default() -> Self {
        Self { lower: [40, 50, 50], upper: [80, 150, 150], representative_rgb: [0, 255, 0] }
    }
}

impl ColorBand {
    /// Build a band from unclamped bounds, forcing every channel into range
    /// and keeping `lower <= upper` per channel.
    pub fn clamped(lower: [i32; 3], upper: [i32; 3], representative_rgb: [u8; 3]) -> Self {
        let max = [HUE_MAX, CHANNEL_MAX, CHANNEL_MAX];
        let mut lo = [0u8; 3];
        let mut hi = [0u8; 3];
        for c in 0..3 {
            let u = upper[c].clamp(0, max[c]);
            let l = lower[c].clamp(0, u);
            lo[c] = l as u8;
            hi[c] = u as u8;
        }
        Self { lower: lo, upper: hi, representative_rgb }
    }

    #[inline]
    pub fn contains(&self, hsv: Hsv) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    pub fn rgb_u32(&self) -> u32 {
        crate::types::pack_rgb(self.representative_rgb)
    }
}

/// RGB to 8-bit HSV with hue halved to fit a byte.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { diff / v * 255.0 } else { 0.0 };
    let mut h = if diff <= 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 { h += 360.0; }

    [
        ((h / 2.0).round() as i32).clamp(0, HUE_MAX) as u8,
        (s.round() as i32).clamp(0, CHANNEL_MAX) as u8,
        v as u8,
    ]
}

/// Inverse of [`rgb_to_hsv`].
pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let h = (hsv[0] as f32 * 2.0) % 360.0;
    let s = hsv[1] as f32 / 255.0;
    let v = hsv[2] as f32 / 255.0;

    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    let to_u8 = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r1), to_u8(g1), to_u8(b1)]
}

/// Convert a rectangular region of the frame to HSV.
/// The region is clipped to the frame.
pub fn hsv_region(frame: &FrameBuffer, x0: usize, y0: usize, w: usize, h: usize) -> HsvImage {
    let w = w.min(frame.width.saturating_sub(x0));
    let h = h.min(frame.height.saturating_sub(y0));
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        Rgb(rgb_to_hsv(frame.rgb_at(x0 + x as usize, y0 + y as usize)))
    })
}

pub fn hsv_frame(frame: &FrameBuffer) -> HsvImage {
    hsv_region(frame, 0, 0, frame.width, frame.height)
}

/// Integer mean of each HSV channel (truncating, like summing then dividing).
pub fn mean_hsv(hsv: &HsvImage) -> [i32; 3] {
    let n = (hsv.width() as u64) * (hsv.height() as u64);
    if n == 0 {
        return [0, 0, 0];
    }
    let mut sum = [0u64; 3];
    for px in hsv.pixels() {
        for c in 0..3 { sum[c] += px[c] as u64; }
    }
    [(sum[0] / n) as i32, (sum[1] / n) as i32, (sum[2] / n) as i32]
}

/// Range threshold: 255 where the pixel falls inside the band, 0 elsewhere.
pub fn in_range(hsv: &HsvImage, band: &ColorBand) -> GrayImage {
    GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
        let px = hsv.get_pixel(x, y);
        Luma([if band.contains(px.0) { 255 } else { 0 }])
    })
}

/// One pass of morphological closing with a 3x3 round (cross) element.
pub fn close_gaps(mask: &GrayImage) -> GrayImage {
    imageproc::morphology::close(mask, Norm::L1, 1)
}

/// Threshold then close: the mask every consumer of the band works on.
pub fn band_mask(hsv: &HsvImage, band: &ColorBand) -> GrayImage {
    close_gaps(&in_range(hsv, band))
}

pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] > 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_map_to_opencv_hues() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn hsv_to_rgb_inverts_primaries() {
        assert_eq!(hsv_to_rgb([60, 255, 255]), [0, 255, 0]);
        assert_eq!(hsv_to_rgb([120, 255, 255]), [0, 0, 255]);
        assert_eq!(hsv_to_rgb([0, 0, 200]), [200, 200, 200]);
    }

    #[test]
    fn clamped_band_stays_ordered() {
        let band = ColorBand::clamped([-30, 300, 10], [200, 100, -5], [0, 0, 0]);
        assert_eq!(band.upper, [180, 100, 0]);
        assert_eq!(band.lower, [0, 100, 0]);
    }

    #[test]
    fn closing_fills_single_pixel_hole() {
        let mut mask = GrayImage::from_pixel(7, 7, Luma([255]));
        mask.put_pixel(3, 3, Luma([0]));
        let closed = close_gaps(&mask);
        assert_eq!(closed.get_pixel(3, 3)[0], 255);
    }

    #[test]
    fn range_mask_counts_matching_pixels() {
        let mut frame = FrameBuffer::filled(4, 4, 0x0000FF00);
        frame.pixels[0] = 0x00FF0000;
        let hsv = hsv_frame(&frame);
        let band = ColorBand { lower: [50, 200, 200], upper: [70, 255, 255], ..ColorBand::default() };
        assert_eq!(count_foreground(&in_range(&hsv, &band)), 15);
        assert_eq!(mean_hsv(&hsv_region(&frame, 1, 1, 2, 2)), [60, 255, 255]);
    }
}

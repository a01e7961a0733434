// Pixel buffers shared by the tracker, the gesture engine and the window.

use crate::error::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// Black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Frame filled with a single 0x00RRGGBB color.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    /// Reject frames that cannot be processed (nothing to render from them).
    pub fn validate(&self) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 || self.pixels.is_empty() {
            return Err(Error::EmptyFrame);
        }
        if self.pixels.len() != self.width * self.height {
            return Err(Error::FrameSizeMismatch {
                expected: self.width * self.height,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        unpack_rgb(self.pixels[y * self.width + x])
    }
}

/// Per-pixel coverage in [0,1]; 0 = untouched, 1 = fully covered by the overlay.
#[derive(Clone, Debug)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub alpha: Vec<f32>,   // length = width * height, values clamped to [0.0, 1.0]
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, alpha: vec![0.0; width * height] }
    }

    pub fn clear(&mut self) {
        for a in &mut self.alpha { *a = 0.0; }
    }
}

/// Layer that shapes and diagnostics paint into before it is composited
/// over the camera image.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub color: FrameBuffer,
    pub coverage: Mask,
}

impl Overlay {
    pub fn new(width: usize, height: usize) -> Self {
        Self { color: FrameBuffer::new(width, height), coverage: Mask::new(width, height) }
    }

    pub fn width(&self) -> usize { self.color.width }
    pub fn height(&self) -> usize { self.color.height }

    /// Paint one pixel with the given strength. Stronger paint wins.
    #[inline]
    pub fn paint(&mut self, x: i32, y: i32, color: u32, strength: f32) {
        if x < 0 || y < 0 { return; }
        let (x, y) = (x as usize, y as usize);
        if x >= self.color.width || y >= self.color.height { return; }
        let idx = y * self.color.width + x;
        let s = strength.clamp(0.0, 1.0);
        if s >= self.coverage.alpha[idx] {
            self.color.pixels[idx] = color;
            self.coverage.alpha[idx] = s;
        }
    }

    /// Wipe the layer so the next frame starts transparent.
    pub fn clear(&mut self) {
        for p in &mut self.color.pixels { *p = 0; }
        self.coverage.clear();
    }

    /// Whether anything was painted at all (lets compositing skip the pass).
    pub fn is_blank(&self) -> bool {
        self.coverage.alpha.iter().all(|&a| a <= 0.0)
    }
}

#[inline]
pub fn pack_rgb(rgb: [u8; 3]) -> u32 {
    ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32
}

#[inline]
pub fn unpack_rgb(px: u32) -> [u8; 3] {
    [((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_is_rejected() {
        let frame = FrameBuffer::new(0, 0);
        assert!(matches!(frame.validate(), Err(Error::EmptyFrame)));
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let mut frame = FrameBuffer::new(4, 4);
        frame.pixels.pop();
        assert!(matches!(
            frame.validate(),
            Err(Error::FrameSizeMismatch { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn stronger_paint_wins() {
        let mut overlay = Overlay::new(2, 2);
        overlay.paint(1, 1, 0x00FF0000, 0.5);
        overlay.paint(1, 1, 0x0000FF00, 0.2);
        assert_eq!(overlay.color.pixels[3], 0x00FF0000);
        overlay.paint(1, 1, 0x000000FF, 0.9);
        assert_eq!(overlay.color.pixels[3], 0x000000FF);
        overlay.paint(-1, 5, 0x00FFFFFF, 1.0);
        assert!(!overlay.is_blank());
        overlay.clear();
        assert!(overlay.is_blank());
    }

    #[test]
    fn pack_and_unpack_agree() {
        assert_eq!(unpack_rgb(pack_rgb([12, 200, 7])), [12, 200, 7]);
    }
}

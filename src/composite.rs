// Overlay compositing in linear light.
// sRGB <-> linear conversions go through lookup tables instead of powf.

use crate::error::Error;
use crate::types::{FrameBuffer, Overlay, pack_rgb, unpack_rgb};

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1) as f32
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255) via 4096-step quantization
    // (index = (linear * 4095).round())
    linear_to_srgb: [u8; 4096],
}

impl GammaLut {
    /// Build both tables once at startup.
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = (i as f32) / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

/// Mix the overlay into `base` where it has coverage, scaled by `opacity`.
pub fn blend_overlay(
    base: &mut FrameBuffer,
    overlay: &Overlay,
    opacity: f32,
    lut: &GammaLut,
) -> Result<(), Error> {
    if base.width != overlay.width() || base.height != overlay.height() {
        return Err(Error::FrameSizeMismatch {
            expected: base.width * base.height,
            actual: overlay.width() * overlay.height(),
        });
    }

    if overlay.is_blank() {
        return Ok(());
    }

    let opacity = opacity.clamp(0.0, 1.0);
    for (i, px) in base.pixels.iter_mut().enumerate() {
        let a = overlay.coverage.alpha[i] * opacity;
        if a <= 0.0 { continue; }
        if a >= 1.0 {
            *px = overlay.color.pixels[i];
            continue;
        }

        let under = unpack_rgb(*px);
        let over = unpack_rgb(overlay.color.pixels[i]);
        let inv = 1.0 - a;
        let mut out = [0u8; 3];
        for c in 0..3 {
            let lin = a * lut.srgb_u8_to_linear(over[c]) + inv * lut.srgb_u8_to_linear(under[c]);
            out[c] = lut.linear_to_srgb_u8(lin);
        }
        *px = pack_rgb(out);
    }
    Ok(())
}

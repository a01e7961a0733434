// Online color calibration.
// The user holds the marker over a fixed box in the middle of the frame; the
// band drifts towards the box's mean color every frame, and once the band
// covers almost the whole box for long enough the calibration is done.

use image::GrayImage;
use log::{debug, info};

use crate::color::{self, ColorBand, HUE_MAX, CHANNEL_MAX};
use crate::config::EngineConfig;
use crate::draw;
use crate::error::Error;
use crate::types::FrameBuffer;

/// Half-width of the hue window around the sampled mean.
const HUE_WINDOW: i32 = 20;
/// How far below the sampled saturation/value the lower bound reaches.
const SV_WINDOW: i32 = 100;
/// Saturation/value upper bounds are pinned here instead of following the mean.
const SV_CEILING: i32 = 240;

const OUTLINE_COLOR: u32 = 0x000000FF;
const TEXT_COLOR: u32 = 0x00FFFFFF;

/// Calibration square centered in the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl SampleBox {
    /// Box of `size` pixels centered in a `width x height` frame, shrunk to
    /// fit when the frame is smaller.
    pub fn centered(width: usize, height: usize, size: usize) -> Self {
        let w = size.min(width);
        let h = size.min(height);
        Self { x: (width - w) / 2, y: (height - h) / 2, width: w, height: h }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// What one calibration step saw; used for the on-screen readout.
#[derive(Clone, Debug)]
pub struct CalibrationReport {
    pub sample: SampleBox,
    /// Closed band mask of the sample box only.
    pub mask: GrayImage,
    pub fill_ratio: f32,
    pub progress_ms: u32,
    pub complete: bool,
}

pub struct ColorCalibrator {
    band: ColorBand,
    box_size: usize,
    fill_ratio: f32,
    max_ms: u32,
    progress_ms: u32,
    complete: bool,
}

impl ColorCalibrator {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_band(config, ColorBand::default())
    }

    pub fn with_band(config: &EngineConfig, band: ColorBand) -> Self {
        Self {
            band,
            box_size: config.calibration_box,
            fill_ratio: config.calibration_fill_ratio,
            max_ms: config.max_calibration_ms,
            progress_ms: 0,
            complete: false,
        }
    }

    pub fn band(&self) -> &ColorBand { &self.band }
    pub fn progress_ms(&self) -> u32 { self.progress_ms }
    pub fn is_complete(&self) -> bool { self.complete }

    /// Run one calibration step on `frame`, which covered `dt_ms` of time.
    pub fn observe(&mut self, frame: &FrameBuffer, dt_ms: u32) -> Result<CalibrationReport, Error> {
        frame.validate()?;
        let sample = SampleBox::centered(frame.width, frame.height, self.box_size);
        let hsv = color::hsv_region(frame, sample.x, sample.y, sample.width, sample.height);

        let mean = color::mean_hsv(&hsv);
        self.blend_towards(mean);

        let mask = color::band_mask(&hsv, &self.band);
        let fill_ratio = color::count_foreground(&mask) as f32 / sample.area().max(1) as f32;

        if !self.complete {
            if fill_ratio > self.fill_ratio {
                self.progress_ms = self.progress_ms.saturating_add(dt_ms);
                if self.progress_ms > self.max_ms {
                    self.complete = true;
                    self.progress_ms = self.max_ms;
                    info!(
                        "calibration complete: band {:?}..{:?}",
                        self.band.lower, self.band.upper
                    );
                }
            } else {
                self.progress_ms = self.progress_ms.saturating_sub(dt_ms);
            }
        }

        Ok(CalibrationReport {
            sample,
            mask,
            fill_ratio,
            progress_ms: self.progress_ms,
            complete: self.complete,
        })
    }

    /// Average the previous band with a fixed window around `mean`.
    fn blend_towards(&mut self, mean: [i32; 3]) {
        let lo = self.band.lower.map(i32::from);
        let hi = self.band.upper.map(i32::from);
        let lower = [
            (mean[0] - HUE_WINDOW + lo[0]) / 2,
            (mean[1] - SV_WINDOW + lo[1]) / 2,
            (mean[2] - SV_WINDOW + lo[2]) / 2,
        ];
        let upper = [(mean[0] + HUE_WINDOW + hi[0]) / 2, SV_CEILING, SV_CEILING];

        let mean_hsv = [
            mean[0].clamp(0, HUE_MAX) as u8,
            mean[1].clamp(0, CHANNEL_MAX) as u8,
            mean[2].clamp(0, CHANNEL_MAX) as u8,
        ];
        self.band = ColorBand::clamped(lower, upper, color::hsv_to_rgb(mean_hsv));
        debug!("band {:?}..{:?}", self.band.lower, self.band.upper);
    }

    /// Draw the box outline, the band mask inside it, and the text readout.
    pub fn render_diagnostics(&self, output: &mut FrameBuffer, report: &CalibrationReport) {
        let s = report.sample;
        let color = self.band.rgb_u32();
        for (x, y, px) in report.mask.enumerate_pixels() {
            if px[0] > 0 {
                draw::put_pixel(output, (s.x + x as usize) as i32, (s.y + y as usize) as i32, color);
            }
        }
        draw::draw_rect(output, s.x as i32, s.y as i32, s.width as i32, s.height as i32, 2, OUTLINE_COLOR);

        let (lo, hi) = (self.band.lower, self.band.upper);
        let band_text = format!(
            "BAND: ({}; {}; {}) - ({}; {}; {})",
            lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]
        );
        let fill_text = format!("FILL: {}%", (report.fill_ratio * 100.0) as u32);
        let progress = u64::from(report.progress_ms) * 100 / u64::from(self.max_ms.max(1));
        let progress_text = format!("CALIBRATION: {}%", progress);
        draw::draw_text_5x7(output, 10, 10, &band_text, TEXT_COLOR);
        draw::draw_text_5x7(output, 10, 22, &fill_text, TEXT_COLOR);
        draw::draw_text_5x7(output, 10, 34, &progress_text, TEXT_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn sample_box_is_centered_and_clipped() {
        assert_eq!(SampleBox::centered(640, 480, 50), SampleBox { x: 295, y: 215, width: 50, height: 50 });
        assert_eq!(SampleBox::centered(30, 20, 50), SampleBox { x: 0, y: 0, width: 30, height: 20 });
    }

    #[test]
    fn band_stays_clamped_for_extreme_colors() {
        let mut cal = ColorCalibrator::new(&config());
        let colors = [0x00000000, 0x00FFFFFF, 0x00FF0000, 0x000000FF, 0x00FF00FF, 0x00101010];
        for (i, c) in colors.iter().cycle().take(60).enumerate() {
            let frame = FrameBuffer::filled(80, 60, *c);
            cal.observe(&frame, 40 + i as u32).unwrap();
            let b = cal.band();
            assert!(b.lower[0] as i32 <= HUE_MAX && b.upper[0] as i32 <= HUE_MAX);
            for ch in 0..3 {
                assert!(b.lower[ch] <= b.upper[ch], "channel {ch}: {:?}", b);
            }
        }
    }

    #[test]
    fn progress_decays_without_underflow() {
        let mut cal = ColorCalibrator::new(&config());
        // Grey carries no saturation, so the band never matches it.
        let grey = FrameBuffer::filled(60, 60, 0x00808080);
        let report = cal.observe(&grey, 10_000).unwrap();
        assert_eq!(report.progress_ms, 0);
        assert!(!report.complete);
    }

    #[test]
    fn empty_frame_is_a_precondition_violation() {
        let mut cal = ColorCalibrator::new(&config());
        assert!(cal.observe(&FrameBuffer::new(0, 0), 10).is_err());
    }
}

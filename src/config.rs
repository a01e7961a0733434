// Every tunable threshold of the engine, with the reference defaults.

/// How the Removing mode advances its sustain counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RemovingStep {
    /// Count elapsed milliseconds like every other mode.
    #[default]
    Elapsed,
    /// Count one unit per frame regardless of elapsed time.
    PerFrame,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub window_name: String,
    /// Side of the centered calibration square (px).
    pub calibration_box: usize,
    /// Qualifying time that completes calibration (ms).
    pub max_calibration_ms: u32,
    /// Fraction of the calibration square that must match the band.
    pub calibration_fill_ratio: f32,
    /// Minimum stroke length for closure checks and shape creation.
    pub min_stroke_points: usize,
    /// Ceiling of the mode debounce counter (ms).
    pub max_hysteresis_ms: u32,
    /// A shape is moved only if its center is strictly closer than this (px).
    pub capture_radius: f32,
    /// Pointer blobs must be larger than this (px²).
    pub min_pointer_area: f32,
    /// Pointer blobs must be rounder than this (0 = perfect circle).
    pub max_compactness: f32,
    /// Polygon fitting tolerance for finished strokes (px).
    pub approx_tolerance: f64,
    /// Strength of the shape overlay when composited over the camera image.
    pub overlay_opacity: f32,
    /// Multiplier applied to playback `dt` once gestures are being tracked.
    pub gesture_dt_scale: u32,
    pub removing_step: RemovingStep,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_name: String::from("Gesture Draw"),
            calibration_box: 50,
            max_calibration_ms: 5000,
            calibration_fill_ratio: 0.95,
            min_stroke_points: 20,
            max_hysteresis_ms: 2000,
            capture_radius: 40.0,
            min_pointer_area: 530.0,
            max_compactness: 0.35,
            approx_tolerance: 2.0,
            overlay_opacity: 0.8,
            gesture_dt_scale: 3,
            removing_step: RemovingStep::Elapsed,
        }
    }
}

impl EngineConfig {
    /// Loop closure needs a newest point within this distance of an early one.
    pub fn closure_distance(&self) -> f32 {
        (self.min_stroke_points / 2) as f32 - 1.0
    }

    /// A closed stroke must enclose more than this (px²).
    pub fn min_loop_area(&self) -> f32 {
        let m = self.min_stroke_points as f32;
        std::f32::consts::PI * m * m / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn closure_thresholds_follow_min_stroke_points() {
        let cfg = EngineConfig::default();
        assert_relative_eq!(cfg.closure_distance(), 9.0);
        assert_relative_eq!(cfg.min_loop_area(), std::f32::consts::PI * 100.0);
    }
}

use std::path::PathBuf;

use clap::Parser;

use crate::config::{EngineConfig, RemovingStep};

/// Draw shapes in the air with colored markers held up to a camera.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Title of the display window.
    #[arg(long, default_value = "Gesture Draw")]
    pub window_name: String,
    /// Play back a directory of still frames instead of opening the camera.
    #[arg(long)]
    pub frames: Option<PathBuf>,
    /// Playback rate in frames per second (values below 0.01 mean 20).
    #[arg(long, default_value_t = 20.0)]
    pub rate: f32,
    /// Camera device index.
    #[arg(long, default_value_t = 0)]
    pub camera: u32,
    /// Requested camera width.
    #[arg(long, default_value_t = 640)]
    pub width: u32,
    /// Requested camera height.
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Side of the centered calibration square (px).
    #[arg(long, default_value_t = 50)]
    pub calibration_box: usize,
    /// Time the marker must fill the square to finish calibration (ms).
    #[arg(long, default_value_t = 5000)]
    pub calibration_ms: u32,
    /// Stroke length that enables loop closure and shape creation.
    #[arg(
        long,
        default_value_t = 20,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(3..)
    )]
    pub min_stroke_points: usize,
    /// Mode debounce ceiling (ms).
    #[arg(long, default_value_t = 2000)]
    pub max_hysteresis_ms: u32,
    /// Distance within which a shape follows the move gesture (px).
    #[arg(long, default_value_t = 40.0)]
    pub capture_radius: f32,
    /// Smallest marker blob accepted as a pointer (px²).
    #[arg(long, default_value_t = 530.0)]
    pub min_pointer_area: f32,
    /// Roundness limit for pointer blobs (0 = circle).
    #[arg(long, default_value_t = 0.35)]
    pub max_compactness: f32,
    /// Multiplier on playback frame time once calibration is done.
    #[arg(long, default_value_t = 3)]
    pub gesture_dt_scale: u32,
    /// How the removing gesture counts sustain time.
    #[arg(long, value_enum, default_value_t = RemovingStep::Elapsed)]
    pub removing_step: RemovingStep,
}

impl Cli {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            window_name: self.window_name.clone(),
            calibration_box: self.calibration_box.max(1),
            max_calibration_ms: self.calibration_ms,
            min_stroke_points: self.min_stroke_points,
            max_hysteresis_ms: self.max_hysteresis_ms,
            capture_radius: self.capture_radius,
            min_pointer_area: self.min_pointer_area,
            max_compactness: self.max_compactness,
            gesture_dt_scale: self.gesture_dt_scale.max(1),
            removing_step: self.removing_step,
            ..EngineConfig::default()
        }
    }

    pub fn from_file(&self) -> bool {
        self.frames.is_some()
    }
}

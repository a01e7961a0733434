// Where a frame's elapsed time comes from. The engine only sees `FrameClock`.

use std::time::Instant;

/// Rates below this are treated as unset.
const MIN_RATE: f32 = 0.01;
const DEFAULT_RATE: f32 = 20.0;

/// Which part of the engine the frame is going to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Calibration,
    Gesture,
}

pub trait FrameClock {
    /// Milliseconds elapsed since the previous processed frame.
    fn tick(&mut self, stage: Stage) -> u32;
}

/// Nominal frame time for recorded input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackClock {
    frame_ms: u32,
    gesture_scale: u32,
}

impl PlaybackClock {
    /// `rate` is in frames per second; gesture frames count `gesture_scale` times.
    pub fn from_rate(rate: f32, gesture_scale: u32) -> Self {
        let rate = if rate.is_finite() && rate >= MIN_RATE { rate } else { DEFAULT_RATE };
        Self { frame_ms: (1000.0 / rate) as u32, gesture_scale }
    }

    pub fn frame_ms(&self) -> u32 { self.frame_ms }
}

impl FrameClock for PlaybackClock {
    fn tick(&mut self, stage: Stage) -> u32 {
        match stage {
            Stage::Calibration => self.frame_ms,
            Stage::Gesture => self.frame_ms.saturating_mul(self.gesture_scale),
        }
    }
}

/// Measured wall-clock time for live input.
pub struct WallClock {
    last: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for WallClock {
    fn tick(&mut self, _stage: Stage) -> u32 {
        let now = Instant::now();
        let ms = now.duration_since(self.last).as_millis();
        self.last = now;
        u32::try_from(ms).unwrap_or(u32::MAX)
    }
}

/// Clock that always reports the same delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub u32);

impl FrameClock for FixedClock {
    fn tick(&mut self, _stage: Stage) -> u32 {
        self.0
    }
}

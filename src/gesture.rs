// Interaction modes and the debounced transition between them.
//
// The pointer count picks a candidate mode every frame. Switching to it is
// delayed until the hysteresis counter has been drained by elapsed time;
// while the current mode matches the candidate the counter refills up to a
// per-mode ceiling.

use log::debug;

use crate::config::{EngineConfig, RemovingStep};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
    Calibration,
    Showing,
    Drawing,
    Removing,
    Moving,
}

impl InteractionMode {
    /// The mode a given number of visible pointers asks for.
    pub fn for_pointer_count(count: usize) -> Self {
        match count {
            0 => Self::Showing,
            1 => Self::Drawing,
            2 => Self::Removing,
            _ => Self::Moving,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Calibration => "CALIBRATION",
            Self::Showing => "SHOWING",
            Self::Drawing => "DRAWING",
            Self::Removing => "REMOVING",
            Self::Moving => "MOVING",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeState {
    pub mode: InteractionMode,
    pub hysteresis_ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HysteresisLimits {
    pub max_ms: u32,
    pub removing_step: RemovingStep,
}

impl HysteresisLimits {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self { max_ms: config.max_hysteresis_ms, removing_step: config.removing_step }
    }

    /// Drawing and Moving sustain up to the full ceiling, Removing and
    /// Showing up to half of it.
    pub fn ceiling(&self, mode: InteractionMode) -> u32 {
        match mode {
            InteractionMode::Drawing | InteractionMode::Moving => self.max_ms,
            InteractionMode::Removing | InteractionMode::Showing => self.max_ms / 2,
            InteractionMode::Calibration => 0,
        }
    }

    fn sustain_step(&self, mode: InteractionMode, dt_ms: u32) -> u32 {
        match (mode, self.removing_step) {
            (InteractionMode::Removing, RemovingStep::PerFrame) => 1,
            _ => dt_ms,
        }
    }
}

/// Outcome of one frame's transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: ModeState,
    /// The mode changed this frame; mode-specific state must be reset.
    pub entered: bool,
    /// The mode matches what the pointers ask for, so its action runs.
    pub active: bool,
}

/// Pure transition function: (state, pointer count, dt) -> next state.
/// Calibration is left only through [`GestureStateMachine::finish_calibration`].
pub fn transition(state: ModeState, pointer_count: usize, dt_ms: u32, limits: &HysteresisLimits) -> Transition {
    if state.mode == InteractionMode::Calibration {
        return Transition { state, entered: false, active: false };
    }
    let candidate = InteractionMode::for_pointer_count(pointer_count);
    let mut next = state;
    let mut entered = false;

    if next.mode != candidate {
        next.hysteresis_ms = next.hysteresis_ms.saturating_sub(dt_ms);
        if next.hysteresis_ms == 0 {
            next.mode = candidate;
            entered = true;
        }
    }

    let active = next.mode == candidate;
    if active {
        let step = limits.sustain_step(candidate, dt_ms);
        next.hysteresis_ms = next.hysteresis_ms.saturating_add(step).min(limits.ceiling(candidate));
    }
    Transition { state: next, entered, active }
}

pub struct GestureStateMachine {
    state: ModeState,
    limits: HysteresisLimits,
}

impl GestureStateMachine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: ModeState { mode: InteractionMode::Calibration, hysteresis_ms: 0 },
            limits: HysteresisLimits::from_config(config),
        }
    }

    pub fn mode(&self) -> InteractionMode { self.state.mode }
    pub fn hysteresis_ms(&self) -> u32 { self.state.hysteresis_ms }

    /// Leave Calibration for good. Has no effect in any other mode.
    pub fn finish_calibration(&mut self) {
        if self.state.mode == InteractionMode::Calibration {
            self.state = ModeState { mode: InteractionMode::Showing, hysteresis_ms: 0 };
            debug!("mode -> {}", InteractionMode::Showing.label());
        }
    }

    pub fn advance(&mut self, pointer_count: usize, dt_ms: u32) -> Transition {
        let t = transition(self.state, pointer_count, dt_ms, &self.limits);
        if t.entered {
            debug!("mode {} -> {}", self.state.mode.label(), t.state.mode.label());
        }
        self.state = t.state;
        t
    }

    /// A drawn loop closed: stop drawing now, and make re-entry wait for a
    /// full debounce.
    pub fn close_stroke(&mut self) {
        if self.state.mode == InteractionMode::Drawing {
            self.state = ModeState { mode: InteractionMode::Showing, hysteresis_ms: self.limits.max_ms };
            debug!("mode DRAWING -> SHOWING (loop closed)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> HysteresisLimits {
        HysteresisLimits { max_ms: 2000, removing_step: RemovingStep::Elapsed }
    }

    fn showing(h: u32) -> ModeState {
        ModeState { mode: InteractionMode::Showing, hysteresis_ms: h }
    }

    #[test]
    fn pointer_counts_pick_modes() {
        assert_eq!(InteractionMode::for_pointer_count(0), InteractionMode::Showing);
        assert_eq!(InteractionMode::for_pointer_count(1), InteractionMode::Drawing);
        assert_eq!(InteractionMode::for_pointer_count(2), InteractionMode::Removing);
        assert_eq!(InteractionMode::for_pointer_count(3), InteractionMode::Moving);
        assert_eq!(InteractionMode::for_pointer_count(7), InteractionMode::Moving);
    }

    #[test]
    fn calibration_ignores_pointers() {
        let cal = ModeState { mode: InteractionMode::Calibration, hysteresis_ms: 0 };
        let t = transition(cal, 1, 500, &limits());
        assert_eq!(t.state, cal);
        assert!(!t.active);
    }

    #[test]
    fn switch_waits_for_the_counter_to_drain() {
        let t = transition(showing(1000), 1, 500, &limits());
        assert_eq!(t.state, showing(500));
        assert!(!t.entered && !t.active);

        let t = transition(t.state, 1, 500, &limits());
        assert_eq!(t.state.mode, InteractionMode::Drawing);
        assert!(t.entered && t.active);
        // The new mode accumulates in the same frame it is entered.
        assert_eq!(t.state.hysteresis_ms, 500);
    }

    #[test]
    fn drain_never_underflows() {
        let t = transition(showing(100), 2, u32::MAX, &limits());
        assert_eq!(t.state.mode, InteractionMode::Removing);
        assert_eq!(t.state.hysteresis_ms, 1000);
    }

    #[test]
    fn sustained_modes_clamp_to_their_ceiling() {
        let mut state = showing(0);
        for _ in 0..10 {
            state = transition(state, 0, 400, &limits()).state;
        }
        assert_eq!(state.hysteresis_ms, 1000);

        let drawing = ModeState { mode: InteractionMode::Drawing, hysteresis_ms: 1900 };
        assert_eq!(transition(drawing, 1, 400, &limits()).state.hysteresis_ms, 2000);
    }

    #[test]
    fn per_frame_removing_step() {
        let lim = HysteresisLimits { max_ms: 2000, removing_step: RemovingStep::PerFrame };
        let removing = ModeState { mode: InteractionMode::Removing, hysteresis_ms: 10 };
        assert_eq!(transition(removing, 2, 500, &lim).state.hysteresis_ms, 11);
    }

    #[test]
    fn closing_a_stroke_forces_a_full_debounce() {
        let mut machine = GestureStateMachine::new(&EngineConfig::default());
        machine.finish_calibration();
        machine.advance(1, 0);
        assert_eq!(machine.mode(), InteractionMode::Drawing);
        machine.close_stroke();
        assert_eq!(machine.mode(), InteractionMode::Showing);
        assert_eq!(machine.hysteresis_ms(), 2000);

        machine.finish_calibration();
        assert_eq!(machine.mode(), InteractionMode::Showing);
    }
}

// One interaction surface: calibration, pointer tracking, the gesture state
// machine, the stroke being drawn and the shapes on screen, driven one frame
// at a time.

use log::{debug, trace};

use crate::calibration::ColorCalibrator;
use crate::clock::{FrameClock, Stage};
use crate::color::ColorBand;
use crate::composite::{self, GammaLut};
use crate::config::EngineConfig;
use crate::draw;
use crate::error::Error;
use crate::geometry::{self, Point};
use crate::gesture::{GestureStateMachine, InteractionMode};
use crate::registry::{ShapeId, ShapeRegistry};
use crate::shape::{PolygonShapeFactory, ShapeFactory};
use crate::stroke::StrokeAccumulator;
use crate::tracker::{Pointer, PointerTracker};
use crate::types::{FrameBuffer, Overlay};

const STROKE_THICKNESS: i32 = 3;
const HUD_COLOR: u32 = 0x00FFFFFF;

/// What changed during one gesture frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub pruned: usize,
    pub closed: bool,
    pub added: Option<ShapeId>,
    pub removed: Option<ShapeId>,
    pub moved: Option<ShapeId>,
}

pub struct Session {
    config: EngineConfig,
    calibrator: ColorCalibrator,
    tracker: PointerTracker,
    machine: GestureStateMachine,
    stroke: StrokeAccumulator,
    registry: ShapeRegistry,
    factory: Box<dyn ShapeFactory>,
    overlay: Overlay,
    lut: GammaLut,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_factory(config, Box::new(PolygonShapeFactory))
    }

    pub fn with_factory(config: EngineConfig, factory: Box<dyn ShapeFactory>) -> Self {
        Self {
            calibrator: ColorCalibrator::new(&config),
            tracker: PointerTracker::new(&config),
            machine: GestureStateMachine::new(&config),
            stroke: StrokeAccumulator::new(&config),
            registry: ShapeRegistry::new(),
            factory,
            overlay: Overlay::new(0, 0),
            lut: GammaLut::new(),
            config,
        }
    }

    pub fn mode(&self) -> InteractionMode { self.machine.mode() }
    pub fn hysteresis_ms(&self) -> u32 { self.machine.hysteresis_ms() }
    pub fn band(&self) -> &ColorBand { self.calibrator.band() }
    pub fn calibrator(&self) -> &ColorCalibrator { &self.calibrator }
    pub fn stroke(&self) -> &[Point] { self.stroke.points() }
    pub fn registry(&self) -> &ShapeRegistry { &self.registry }
    pub fn registry_mut(&mut self) -> &mut ShapeRegistry { &mut self.registry }

    /// Stop calibrating and start interpreting gestures with the current band.
    pub fn finish_calibration(&mut self) {
        self.machine.finish_calibration();
    }

    pub fn clear_shapes(&mut self) {
        self.registry.clear();
    }

    /// Process one camera frame and return the image to display.
    pub fn process_frame(&mut self, frame: &FrameBuffer, clock: &mut dyn FrameClock) -> Result<FrameBuffer, Error> {
        frame.validate()?;
        let mut output = frame.clone();

        if self.machine.mode() == InteractionMode::Calibration {
            let dt = clock.tick(Stage::Calibration);
            let report = self.calibrator.observe(frame, dt)?;
            self.calibrator.render_diagnostics(&mut output, &report);
            if report.complete {
                self.machine.finish_calibration();
            }
            return Ok(output);
        }

        let dt = clock.tick(Stage::Gesture);
        let pointers = self.tracker.detect(frame, self.calibrator.band())?;
        self.step(&pointers, dt, &mut output)?;
        self.draw_hud(&mut output);
        Ok(output)
    }

    /// Everything that happens after pointer detection: shapes update, the
    /// mode advances, the active mode acts, then the overlay is composited.
    pub fn step(&mut self, pointers: &[Pointer], dt_ms: u32, output: &mut FrameBuffer) -> Result<StepReport, Error> {
        let mut report = StepReport::default();
        if self.machine.mode() == InteractionMode::Calibration {
            return Ok(report);
        }
        trace!("{} pointer(s), dt {} ms", pointers.len(), dt_ms);

        if self.overlay.width() != output.width || self.overlay.height() != output.height {
            self.overlay = Overlay::new(output.width, output.height);
        } else {
            self.overlay.clear();
        }

        self.registry.render_all(&mut self.overlay, dt_ms);
        report.pruned = self.registry.prune_invalid();

        let t = self.machine.advance(pointers.len(), dt_ms);
        if t.entered {
            self.stroke.clear();
        }
        if t.active {
            match t.state.mode {
                InteractionMode::Drawing => report.closed = self.draw_step(pointers),
                InteractionMode::Removing => report.removed = self.remove_step(pointers, dt_ms),
                InteractionMode::Moving => report.moved = self.move_step(pointers),
                InteractionMode::Showing => self.stroke.clear(),
                InteractionMode::Calibration => {}
            }
        }

        let pointer_color = self.calibrator.band().rgb_u32();
        for p in pointers {
            draw::fill_polygon(output, &p.outline, pointer_color, 1.0);
        }

        if self.machine.mode() == InteractionMode::Drawing {
            let [r, _, b] = self.calibrator.band().representative_rgb;
            let color = crate::types::pack_rgb([r, 255, b]);
            draw::draw_polyline(output, self.stroke.points(), STROKE_THICKNESS, color);
        } else {
            report.added = self.finalize_stroke();
        }

        composite::blend_overlay(output, &self.overlay, self.config.overlay_opacity, &self.lut)?;
        Ok(report)
    }

    fn draw_step(&mut self, pointers: &[Pointer]) -> bool {
        let Some(p) = pointers.first() else { return false };
        let closed = self.stroke.push(p.center);
        if closed {
            self.machine.close_stroke();
        }
        closed
    }

    fn remove_step(&mut self, pointers: &[Pointer], dt_ms: u32) -> Option<ShapeId> {
        let centers: Vec<Point> = pointers.iter().map(|p| p.center).collect();
        let removed = self.registry.try_remove(&centers, dt_ms);
        if let Some(id) = removed {
            debug!("shape {:?} removed by gesture", id);
        }
        removed
    }

    fn move_step(&mut self, pointers: &[Pointer]) -> Option<ShapeId> {
        let mut centers: Vec<Point> = pointers.iter().map(|p| p.center).collect();
        geometry::sort_by_angle(&mut centers);
        let target = geometry::centroid(&centers)?;
        let moved = self.registry.try_move(target, self.config.capture_radius);

        let color = self.calibrator.band().rgb_u32();
        draw::outline_polygon(&mut self.overlay, &centers, color, 1.0);
        for &c in &centers {
            draw::draw_line(&mut self.overlay, c, target, 1, color, 1.0);
        }
        moved
    }

    /// Turn the last stroke into a shape, once. Short strokes and degenerate
    /// shapes are dropped.
    fn finalize_stroke(&mut self) -> Option<ShapeId> {
        let outline = self.stroke.finalize()?;
        let shape = self.factory.build(outline, self.calibrator.band().rgb_u32());
        if !shape.is_valid() {
            debug!("discarding degenerate shape");
            return None;
        }
        Some(self.registry.add(shape))
    }

    fn draw_hud(&self, output: &mut FrameBuffer) {
        let text = format!("MODE: {} | SHAPES: {}", self.machine.mode().label(), self.registry.len());
        draw::draw_text_5x7(output, 8, 8, &text, HUD_COLOR);
    }
}

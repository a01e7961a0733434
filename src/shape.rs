// Finished shapes. The engine only talks to them through the `Shape` trait;
// `PolygonShape` is the one the application draws with.

use crate::draw;
use crate::geometry::{self, Point};
use crate::types::Overlay;

/// Shapes smaller than this are treated as degenerate (px²).
pub const MIN_SHAPE_AREA: f32 = 100.0;
/// Time for a new shape to fade in.
const FADE_IN_MS: u32 = 300;
/// How long both removal pointers must stay on a shape to delete it.
const REMOVE_HOLD_MS: u32 = 600;

pub trait Shape {
    /// Paint into the overlay; `dt_ms` drives any animation.
    fn render(&mut self, overlay: &mut Overlay, dt_ms: u32);
    fn is_valid(&self) -> bool;
    /// Feed the removal gesture. Returns true once removal has completed.
    fn try_remove(&mut self, pointers: &[Point], dt_ms: u32) -> bool;
    fn move_to(&mut self, target: Point);
    fn center(&self) -> Point;
}

/// Builds shapes out of simplified stroke outlines.
pub trait ShapeFactory {
    fn build(&self, outline: Vec<Point>, color: u32) -> Box<dyn Shape>;
}

pub struct PolygonShapeFactory;

impl ShapeFactory for PolygonShapeFactory {
    fn build(&self, outline: Vec<Point>, color: u32) -> Box<dyn Shape> {
        Box::new(PolygonShape::new(outline, color))
    }
}

pub struct PolygonShape {
    vertices: Vec<Point>,
    center: Point,
    color: u32,
    age_ms: u32,
    removal_ms: u32,
    /// Removal pointers were on the shape since the last render.
    held: bool,
    removed: bool,
}

impl PolygonShape {
    pub fn new(vertices: Vec<Point>, color: u32) -> Self {
        let center = geometry::centroid(&vertices).unwrap_or(Point::new(0.0, 0.0));
        Self { vertices, center, color, age_ms: 0, removal_ms: 0, held: false, removed: false }
    }

    pub fn vertices(&self) -> &[Point] { &self.vertices }

    fn opacity(&self) -> f32 {
        let fade_in = (self.age_ms as f32 / FADE_IN_MS as f32).min(1.0);
        let fade_out = 1.0 - self.removal_ms as f32 / REMOVE_HOLD_MS as f32;
        (fade_in * fade_out).clamp(0.0, 1.0)
    }
}

impl Shape for PolygonShape {
    fn render(&mut self, overlay: &mut Overlay, dt_ms: u32) {
        self.age_ms = self.age_ms.saturating_add(dt_ms).min(FADE_IN_MS);
        if !self.held {
            self.removal_ms = self.removal_ms.saturating_sub(dt_ms);
        }
        self.held = false;
        if !self.is_valid() {
            return;
        }
        let a = self.opacity();
        draw::fill_polygon(overlay, &self.vertices, self.color, 0.6 * a);
        draw::outline_polygon(overlay, &self.vertices, 0x00FFFFFF, a);
    }

    fn is_valid(&self) -> bool {
        !self.removed
            && self.vertices.len() >= 3
            && geometry::polygon_area(&self.vertices) >= MIN_SHAPE_AREA
    }

    fn try_remove(&mut self, pointers: &[Point], dt_ms: u32) -> bool {
        if self.removed {
            return false;
        }
        let touching = !pointers.is_empty()
            && pointers.iter().all(|&p| geometry::contains(&self.vertices, p));
        if !touching {
            return false;
        }
        self.held = true;
        self.removal_ms = self.removal_ms.saturating_add(dt_ms);
        if self.removal_ms >= REMOVE_HOLD_MS {
            self.removed = true;
            return true;
        }
        false
    }

    fn move_to(&mut self, target: Point) {
        let (dx, dy) = (target.x - self.center.x, target.y - self.center.y);
        for v in &mut self.vertices {
            v.x += dx;
            v.y += dy;
        }
        self.center = target;
    }

    fn center(&self) -> Point {
        self.center
    }
}

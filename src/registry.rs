// Owning store of live shapes. Shapes are addressed by value-type ids and
// dropped in an explicit compaction pass once they report themselves invalid.

use log::debug;

use crate::geometry::{self, Point};
use crate::shape::Shape;
use crate::types::Overlay;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

struct Entry {
    id: ShapeId,
    shape: Box<dyn Shape>,
}

#[derive(Default)]
pub struct ShapeRegistry {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Ids in registration order.
    pub fn ids(&self) -> Vec<ShapeId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn get(&self, id: ShapeId) -> Option<&dyn Shape> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.shape.as_ref())
    }

    pub fn add(&mut self, shape: Box<dyn Shape>) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, shape });
        debug!("shape {:?} added ({} live)", id, self.entries.len());
        id
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn render_all(&mut self, overlay: &mut Overlay, dt_ms: u32) {
        for e in &mut self.entries {
            e.shape.render(overlay, dt_ms);
        }
    }

    /// Drop every shape that is no longer valid, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn prune_invalid(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| {
            let keep = e.shape.is_valid();
            if !keep {
                debug!("shape {:?} pruned", e.id);
            }
            keep
        });
        before - self.entries.len()
    }

    /// Offer the removal gesture to shapes in registration order; the first
    /// shape that completes its removal ends the search for this frame.
    pub fn try_remove(&mut self, pointers: &[Point], dt_ms: u32) -> Option<ShapeId> {
        self.entries
            .iter_mut()
            .find_map(|e| e.shape.try_remove(pointers, dt_ms).then_some(e.id))
    }

    /// Move the shape nearest to `target` whose center is strictly within `radius`.
    pub fn try_move(&mut self, target: Point, radius: f32) -> Option<ShapeId> {
        let nearest = self
            .entries
            .iter_mut()
            .map(|e| {
                let d = geometry::distance(e.shape.center(), target);
                (d, e)
            })
            .filter(|(d, _)| *d < radius)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))?;
        let (_, entry) = nearest;
        entry.shape.move_to(target);
        Some(entry.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Shape whose validity and removal outcome are controlled from the test.
    struct Probe {
        center: Point,
        valid: Rc<Cell<bool>>,
        removes: bool,
        offered: Rc<Cell<u32>>,
    }

    impl Shape for Probe {
        fn render(&mut self, _overlay: &mut Overlay, _dt_ms: u32) {}
        fn is_valid(&self) -> bool { self.valid.get() }
        fn try_remove(&mut self, _pointers: &[Point], _dt_ms: u32) -> bool {
            self.offered.set(self.offered.get() + 1);
            self.removes
        }
        fn move_to(&mut self, target: Point) { self.center = target; }
        fn center(&self) -> Point { self.center }
    }

    fn probe(x: f32, y: f32, removes: bool) -> (Box<dyn Shape>, Rc<Cell<bool>>, Rc<Cell<u32>>) {
        let valid = Rc::new(Cell::new(true));
        let offered = Rc::new(Cell::new(0));
        let shape = Probe { center: Point::new(x, y), valid: valid.clone(), removes, offered: offered.clone() };
        (Box::new(shape), valid, offered)
    }

    #[test]
    fn prune_without_invalid_shapes_changes_nothing() {
        let mut reg = ShapeRegistry::new();
        for i in 0..3 {
            reg.add(probe(i as f32, 0.0, false).0);
        }
        let before = reg.ids();
        assert_eq!(reg.prune_invalid(), 0);
        assert_eq!(reg.ids(), before);
    }

    #[test]
    fn prune_drops_exactly_the_invalid_shape() {
        let mut reg = ShapeRegistry::new();
        let (a, _, _) = probe(0.0, 0.0, false);
        let (b, b_valid, _) = probe(1.0, 0.0, false);
        let (c, _, _) = probe(2.0, 0.0, false);
        let ia = reg.add(a);
        let ib = reg.add(b);
        let ic = reg.add(c);
        b_valid.set(false);
        assert_eq!(reg.prune_invalid(), 1);
        assert_eq!(reg.ids(), vec![ia, ic]);
        assert!(reg.get(ib).is_none());
    }

    #[test]
    fn first_completed_removal_stops_the_search() {
        let mut reg = ShapeRegistry::new();
        let (a, _, a_offered) = probe(0.0, 0.0, false);
        let (b, _, _) = probe(0.0, 0.0, true);
        let (c, _, c_offered) = probe(0.0, 0.0, true);
        reg.add(a);
        let ib = reg.add(b);
        reg.add(c);
        assert_eq!(reg.try_remove(&[Point::new(0.0, 0.0)], 16), Some(ib));
        assert_eq!(a_offered.get(), 1);
        assert_eq!(c_offered.get(), 0);
    }

    #[test]
    fn capture_radius_is_exclusive() {
        let mut reg = ShapeRegistry::new();
        let id = reg.add(probe(0.0, 0.0, false).0);
        assert_eq!(reg.try_move(Point::new(40.0, 0.0), 40.0), None);
        assert_eq!(reg.get(id).unwrap().center(), Point::new(0.0, 0.0));
        assert_eq!(reg.try_move(Point::new(39.999, 0.0), 40.0), Some(id));
        assert_eq!(reg.get(id).unwrap().center(), Point::new(39.999, 0.0));
    }

    #[test]
    fn nearest_shape_is_moved() {
        let mut reg = ShapeRegistry::new();
        reg.add(probe(30.0, 0.0, false).0);
        let near = reg.add(probe(5.0, 0.0, false).0);
        assert_eq!(reg.try_move(Point::new(0.0, 0.0), 40.0), Some(near));
    }
}

// SPDX-License-Identifier: LGPL-3.0-only

//! Immediate mode layout primitives and the virtualized [List].

use nalgebra::Vector2;
use std::time::Instant;
use vello::kurbo::Rect;
use vello::Scene;

use crate::event::PointerEvent;
use crate::unit::Metric;

/// Virtualized, scrollable list layout.
pub mod list;

pub use list::{DrawnChild, List, Position};

/// Stand-in for an unbounded length, in pixels.
pub const INF: i32 = 1_000_000;

/// The direction of a linear layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    #[default]
    Vertical,
}

impl Axis {
    /// The main axis component of `v`.
    pub fn main(&self, v: Vector2<i32>) -> i32 {
        match self {
            Axis::Horizontal => v.x,
            Axis::Vertical => v.y,
        }
    }

    /// The cross axis component of `v`.
    pub fn cross(&self, v: Vector2<i32>) -> i32 {
        match self {
            Axis::Horizontal => v.y,
            Axis::Vertical => v.x,
        }
    }

    /// The main axis component of a floating point vector.
    pub fn main_f32(&self, v: Vector2<f32>) -> f32 {
        match self {
            Axis::Horizontal => v.x,
            Axis::Vertical => v.y,
        }
    }

    /// Builds a point from main and cross axis components.
    pub fn point(&self, main: i32, cross: i32) -> Vector2<i32> {
        match self {
            Axis::Horizontal => Vector2::new(main, cross),
            Axis::Vertical => Vector2::new(cross, main),
        }
    }

    /// Builds a rectangle from main and cross axis bounds.
    pub fn rect(&self, main0: i32, cross0: i32, main1: i32, cross1: i32) -> Rect {
        let min = self.point(main0, cross0);
        let max = self.point(main1, cross1);
        Rect::new(min.x as f64, min.y as f64, max.x as f64, max.y as f64)
    }

    /// The (min, max) main axis bounds of `cs`.
    pub fn main_constraint(&self, cs: &Constraints) -> (i32, i32) {
        (self.main(cs.min), self.main(cs.max))
    }

    /// The (min, max) cross axis bounds of `cs`.
    pub fn cross_constraint(&self, cs: &Constraints) -> (i32, i32) {
        (self.cross(cs.min), self.cross(cs.max))
    }

    /// Constraints from main and cross axis bounds.
    pub fn constraints(&self, main_min: i32, main_max: i32, cross_min: i32, cross_max: i32) -> Constraints {
        Constraints {
            min: self.point(main_min, cross_min),
            max: self.point(main_max, cross_max),
        }
    }
}

/// Cross axis placement of children smaller than their siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Flush with the start edge.
    #[default]
    Start,
    /// Centered.
    Middle,
    /// Flush with the end edge.
    End,
}

/// The range of sizes, in device pixels, a widget may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraints {
    /// Smallest allowed size.
    pub min: Vector2<i32>,
    /// Largest allowed size.
    pub max: Vector2<i32>,
}

impl Constraints {
    /// Constraints allowing exactly `size`.
    pub fn tight(size: Vector2<i32>) -> Self {
        Self { min: size, max: size }
    }

    /// Constraints allowing anything from zero to `max`.
    pub fn loose(max: Vector2<i32>) -> Self {
        Self {
            min: Vector2::zeros(),
            max,
        }
    }

    /// Clamps `size` into the allowed range.
    pub fn constrain(&self, size: Vector2<i32>) -> Vector2<i32> {
        Vector2::new(
            size.x.clamp(self.min.x, self.max.x.max(self.min.x)),
            size.y.clamp(self.min.y, self.max.y.max(self.min.y)),
        )
    }
}

/// The size a widget chose during layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Size in device pixels.
    pub size: Vector2<i32>,
}

impl Dimensions {
    /// Dimensions of `width` by `height` pixels.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: Vector2::new(width, height),
        }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// State threaded through a layout pass.
///
/// Widgets lay themselves out within `constraints` and record their drawing
/// into `scene`, in their own coordinate space. `events` holds the pointer
/// input of the top level pass, in the coordinate space of the widget that
/// created the context with [new](Self::new). [child](Self::child) passes
/// it on untranslated, since a child's position is only known after its
/// layout.
pub struct LayoutContext<'a> {
    /// Allowed sizes.
    pub constraints: Constraints,
    /// Unit conversion for the current window.
    pub metric: Metric,
    /// Frame time.
    pub now: Instant,
    /// Pointer input since the previous frame.
    pub events: &'a [PointerEvent],
    /// Draw target.
    pub scene: &'a mut Scene,
}

impl<'a> LayoutContext<'a> {
    /// A context for a top level layout pass.
    pub fn new(
        constraints: Constraints,
        metric: Metric,
        now: Instant,
        events: &'a [PointerEvent],
        scene: &'a mut Scene,
    ) -> Self {
        Self {
            constraints,
            metric,
            now,
            events,
            scene,
        }
    }

    /// A context for a child widget drawing into its own `scene`.
    ///
    /// The child sees the same `events`, in the parent's coordinates.
    pub fn child<'b>(&self, constraints: Constraints, scene: &'b mut Scene) -> LayoutContext<'b>
    where
        'a: 'b,
    {
        LayoutContext {
            constraints,
            metric: self.metric,
            now: self.now,
            events: self.events,
            scene,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_swaps_components() {
        let v = Vector2::new(3, 7);
        assert_eq!(Axis::Horizontal.main(v), 3);
        assert_eq!(Axis::Horizontal.cross(v), 7);
        assert_eq!(Axis::Vertical.main(v), 7);
        assert_eq!(Axis::Vertical.cross(v), 3);
        assert_eq!(Axis::Vertical.point(7, 3), v);
    }

    #[test]
    fn test_axis_constraints() {
        let cs = Axis::Vertical.constraints(0, INF, 10, 20);
        assert_eq!(cs.min, Vector2::new(10, 0));
        assert_eq!(cs.max, Vector2::new(20, INF));
        assert_eq!(Axis::Vertical.main_constraint(&cs), (0, INF));
        assert_eq!(Axis::Vertical.cross_constraint(&cs), (10, 20));
    }

    #[test]
    fn test_constrain() {
        let cs = Constraints {
            min: Vector2::new(10, 10),
            max: Vector2::new(100, 50),
        };
        assert_eq!(cs.constrain(Vector2::new(5, 80)), Vector2::new(10, 50));
        assert_eq!(Constraints::tight(Vector2::new(4, 4)).constrain(Vector2::new(9, 1)), Vector2::new(4, 4));
    }

    #[test]
    fn test_child_keeps_parent_events() {
        let events = [PointerEvent::new(
            crate::event::PointerKind::Press,
            Vector2::new(30.0, 40.0),
        )];
        let mut scene = Scene::new();
        let ctx = LayoutContext::new(
            Constraints::loose(Vector2::new(100, 100)),
            Metric::default(),
            Instant::now(),
            &events,
            &mut scene,
        );
        let mut child_scene = Scene::new();
        let child = ctx.child(Constraints::tight(Vector2::new(10, 10)), &mut child_scene);
        assert_eq!(child.events.len(), 1);
        assert_eq!(child.events[0].position.x, 30.0);
        assert_eq!(child.events[0].position.y, 40.0);
        assert_eq!(child.constraints.max, Vector2::new(10, 10));
    }
}

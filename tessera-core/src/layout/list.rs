// SPDX-License-Identifier: LGPL-3.0-only

use nalgebra::Vector2;
use vello::kurbo::{Affine, Rect, Shape};
use vello::peniko::Mix;
use vello::Scene;

use super::{Alignment, Axis, Dimensions, LayoutContext, INF};
use crate::error::fatal;
use crate::gesture::{ScrollGesture, ScrollState};

/// Scroll position of a [List], relative to the leading edge of a child.
///
/// Save it after [List::layout] to remember where the user was, and assign it
/// before the next layout to restore or scroll programmatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Whether the list is scrolled before its very end.
    ///
    /// With [List::scroll_to_end] set and this flag cleared, `first` and
    /// `offset` are ignored and the last child is drawn at the trailing edge.
    /// Tracking "before end" instead of "at end" keeps the default position
    /// at the start of the list.
    pub before_end: bool,
    /// Index of the first visible child.
    pub first: usize,
    /// Distance in pixels from the leading edge to the child at `first`.
    /// Positive values lie before the edge.
    pub offset: i32,
}

/// A child drawn by the last layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawnChild {
    /// Index in the underlying sequence.
    pub index: usize,
    /// Unclipped bounds in the list's coordinate space.
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    None,
    Forward,
    Backward,
}

struct ScrollChild {
    index: usize,
    size: Vector2<i32>,
    scene: Scene,
}

/// Lays out a window into a potentially huge sequence of children.
///
/// Only children needed to fill the viewport are measured and drawn. Each
/// pass starts from [position](Self::position), applies pending scrolling and
/// expands forward and backward until the viewport is covered.
pub struct List {
    /// Main axis.
    pub axis: Axis,
    /// Keeps the list pinned to its end once the end is reached. A pinned list
    /// shorter than its viewport is drawn flush with the trailing edge.
    pub scroll_to_end: bool,
    /// Cross axis alignment of children.
    pub alignment: Alignment,
    /// Current scroll position, updated by every layout.
    pub position: Position,

    scroll: ScrollGesture,
    scroll_delta: i32,

    scroll_to: Option<usize>,
    from_end: bool,

    len: usize,
    first_drawn: usize,
    last_drawn: usize,

    // Viewport bounds of the pass in progress.
    main: (i32, i32),
    cross: (i32, i32),

    // Total main axis size of the measured children.
    max_size: i32,
    children: Vec<ScrollChild>,
    spare: Vec<Scene>,
    dir: Direction,
    drawn: Vec<DrawnChild>,

    // Main axis extent of the last layout, for paging.
    extent: i32,
}

impl List {
    /// An empty list along `axis`, positioned at its start.
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            scroll_to_end: false,
            alignment: Alignment::Start,
            position: Position::default(),
            scroll: ScrollGesture::new(),
            scroll_delta: 0,
            scroll_to: None,
            from_end: false,
            len: 0,
            first_drawn: 0,
            last_drawn: 0,
            main: (0, 0),
            cross: (0, 0),
            max_size: 0,
            children: Vec::new(),
            spare: Vec::new(),
            dir: Direction::None,
            drawn: Vec::new(),
            extent: 0,
        }
    }

    /// Sets the cross axis alignment and returns self.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets end pinning and returns self.
    pub fn with_scroll_to_end(mut self, scroll_to_end: bool) -> Self {
        self.scroll_to_end = scroll_to_end;
        self
    }

    /// Lays out and draws the visible part of a `len` long sequence.
    ///
    /// `element` measures and draws the child at an index into the context it
    /// is given. Children get unbounded main axis constraints.
    pub fn layout<F>(&mut self, ctx: &mut LayoutContext<'_>, len: usize, mut element: F) -> Dimensions
    where
        F: FnMut(&mut LayoutContext<'_>, usize) -> Dimensions,
    {
        self.init(ctx, len);
        while self.more() {
            let (cross_min, cross_max) = self.cross;
            let cs = self.axis.constraints(0, INF, cross_min, cross_max);
            let index = self.index();
            let mut scene = self.spare.pop().unwrap_or_default();
            let dims = {
                let mut child = ctx.child(cs, &mut scene);
                element(&mut child, index)
            };
            self.end(index, dims, scene);
            self.next();
        }
        self.finish(ctx)
    }

    /// Makes sure the child at `index` is in view after the next layout.
    ///
    /// A child before the viewport becomes the first one, a child after it
    /// becomes the last one. An index past the end at layout time scrolls to
    /// the last child.
    pub fn scroll_to(&mut self, index: usize) {
        self.scroll_to = Some(index);
    }

    /// Scrolls back by one viewport.
    pub fn page_up(&mut self) {
        self.position.offset = self.position.offset.saturating_sub(self.extent);
        // Otherwise end pinning would discard the offset.
        self.position.before_end = true;
    }

    /// Scrolls forward by one viewport.
    pub fn page_down(&mut self) {
        self.position.offset = self.position.offset.saturating_add(self.extent);
        self.position.before_end = true;
    }

    /// Whether a touch drag is scrolling the list.
    pub fn dragging(&self) -> bool {
        self.scroll.state() == ScrollState::Dragging
    }

    /// What the scroll gesture is doing. A flinging list needs frames.
    pub fn scroll_state(&self) -> ScrollState {
        self.scroll.state()
    }

    /// Index of the first child drawn by the last layout.
    pub fn first_drawn(&self) -> usize {
        self.first_drawn
    }

    /// Index of the last child drawn by the last layout.
    pub fn last_drawn(&self) -> usize {
        self.last_drawn
    }

    /// The children drawn by the last layout, in index order.
    pub fn drawn_children(&self) -> &[DrawnChild] {
        &self.drawn
    }

    fn init(&mut self, ctx: &LayoutContext<'_>, len: usize) {
        if self.more() {
            fatal("list: layout started with an unfinished child");
        }
        self.main = self.axis.main_constraint(&ctx.constraints);
        self.cross = self.axis.cross_constraint(&ctx.constraints);
        self.max_size = 0;
        self.recycle();
        self.len = len;
        // Restored positions may hold any offset.
        self.position.offset = self.position.offset.clamp(-INF, INF);
        self.update(ctx);

        if let Some(target) = self.scroll_to {
            let target = target.min(len.saturating_sub(1));
            self.scroll_to = Some(target);
            if self.first_drawn < target && target < self.last_drawn {
                // Already in view.
                self.scroll_to = None;
            } else {
                self.position.offset = 0;
                self.position.first = target;
                if self.last_drawn > 0 && target >= self.last_drawn {
                    // Lay out backwards from just past the target.
                    self.from_end = true;
                    self.position.first += 1;
                } else {
                    self.from_end = false;
                }
            }
        } else if self.pinned_to_end() || self.position.first > len {
            self.position.offset = 0;
            self.position.first = len;
        }
        self.next();
    }

    fn update(&mut self, ctx: &LayoutContext<'_>) {
        let delta = self.scroll.scroll(ctx.events, ctx.now, self.axis);
        self.scroll_delta = delta;
        self.position.offset = self.position.offset.saturating_add(delta);
    }

    fn pinned_to_end(&self) -> bool {
        (self.scroll_to.is_some() && self.from_end) || (self.scroll_to_end && !self.position.before_end)
    }

    fn next(&mut self) {
        self.dir = self.next_dir();
        // User scrolling applies after the list settled at its end.
        if self.pinned_to_end() && !self.more() && self.scroll_delta < 0 {
            self.position.before_end = true;
            self.position.offset += self.scroll_delta;
            self.dir = self.next_dir();
        }
    }

    fn index(&self) -> usize {
        match self.dir {
            Direction::Backward => self.position.first - 1,
            Direction::Forward => self.position.first + self.children.len(),
            Direction::None => fatal("list: child index requested outside a probe"),
        }
    }

    fn more(&self) -> bool {
        self.dir != Direction::None
    }

    fn next_dir(&mut self) -> Direction {
        let vsize = self.main.1;
        let last = self.position.first + self.children.len();
        let probing_target = self.from_end && self.scroll_to.is_some_and(|target| last == target + 1);
        if self.max_size - self.position.offset < vsize && (last == self.len || probing_target) {
            self.position.offset = self.max_size - vsize;
        }
        if self.position.offset < 0 && self.position.first == 0 {
            self.position.offset = 0;
        }

        if self.children.len() == self.len {
            Direction::None
        } else if self.max_size - self.position.offset < vsize {
            Direction::Forward
        } else if self.position.offset < 0 {
            Direction::Backward
        } else {
            Direction::None
        }
    }

    fn end(&mut self, index: usize, dims: Dimensions, scene: Scene) {
        let child = ScrollChild {
            index,
            size: dims.size,
            scene,
        };
        let main_size = self.axis.main(child.size);
        self.max_size += main_size;
        match self.dir {
            Direction::Forward => self.children.push(child),
            Direction::Backward => {
                self.children.insert(0, child);
                self.position.first -= 1;
                self.position.offset += main_size;
            },
            Direction::None => fatal("list: child finished outside a probe"),
        }
        self.dir = Direction::None;
    }

    fn finish(&mut self, ctx: &mut LayoutContext<'_>) -> Dimensions {
        if self.more() {
            fatal("list: layout finished with an unfinished child");
        }
        let axis = self.axis;
        let (main_min, main_max) = self.main;

        // Skip children scrolled out of view before the leading edge.
        let mut skip = 0;
        for child in &self.children {
            let main_size = axis.main(child.size);
            if self.position.offset <= main_size {
                break;
            }
            self.position.first += 1;
            self.position.offset -= main_size;
            skip += 1;
        }

        let mut size = -self.position.offset;
        let mut max_cross = 0;
        let mut take = 0;
        for child in &self.children[skip..] {
            max_cross = max_cross.max(axis.cross(child.size));
            size += axis.main(child.size);
            take += 1;
            if size >= main_max {
                break;
            }
        }
        let visible = &self.children[skip..skip + take];

        let mut pos = -self.position.offset;
        let space = main_max - size;
        if self.scroll_to_end && space > 0 {
            pos += space;
        }
        if let (Some(first), Some(last)) = (visible.first(), visible.last()) {
            self.first_drawn = first.index;
            self.last_drawn = last.index;
        }

        self.drawn.clear();
        for child in visible {
            let cross = match self.alignment {
                Alignment::Start => 0,
                Alignment::Middle => (max_cross - axis.cross(child.size)) / 2,
                Alignment::End => max_cross - axis.cross(child.size),
            };
            let child_size = axis.main(child.size);
            let clip = axis.rect(pos.max(0), -INF, (pos + child_size).min(main_max), INF);
            let origin = axis.point(pos, cross);

            #[allow(deprecated)]
            ctx.scene.push_layer(Mix::Clip, 1.0, Affine::IDENTITY, &clip.to_path(0.1));
            ctx.scene
                .append(&child.scene, Some(Affine::translate((origin.x as f64, origin.y as f64))));
            ctx.scene.pop_layer();

            let end = origin + child.size;
            self.drawn.push(DrawnChild {
                index: child.index,
                rect: Rect::new(origin.x as f64, origin.y as f64, end.x as f64, end.y as f64),
            });
            pos += child_size;
        }

        let at_start = self.position.first == 0 && self.position.offset <= 0;
        let at_end = self.position.first + visible.len() == self.len && main_max >= pos;
        if (at_start && self.scroll_delta < 0) || (at_end && self.scroll_delta > 0) {
            self.scroll.stop();
        }
        self.position.before_end = !at_end;

        let pos = pos.max(main_min).min(main_max);
        let dims = axis.point(pos, max_cross);
        self.scroll.set_area(dims);
        self.scroll_to = None;
        self.extent = pos;
        log::trace!(
            "list laid out {} of {} children, first {} offset {}",
            visible.len(),
            self.len,
            self.position.first,
            self.position.offset
        );
        Dimensions { size: dims }
    }

    fn recycle(&mut self) {
        for mut child in self.children.drain(..) {
            child.scene.reset();
            self.spare.push(child.scene);
        }
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new(Axis::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Constraints;
    use crate::unit::Metric;
    use std::time::Instant;

    fn run(list: &mut List, len: usize, item: i32, viewport: i32) -> Dimensions {
        let mut scene = Scene::new();
        let mut ctx = LayoutContext::new(
            Constraints::loose(Vector2::new(100, viewport)),
            Metric::default(),
            Instant::now(),
            &[],
            &mut scene,
        );
        list.layout(&mut ctx, len, |_, _| Dimensions::new(100, item))
    }

    #[test]
    fn test_fills_viewport_from_start() {
        let mut list = List::new(Axis::Vertical);
        let dims = run(&mut list, 100, 20, 200);
        assert_eq!(list.first_drawn(), 0);
        assert_eq!(list.last_drawn(), 9);
        assert_eq!(dims.size, Vector2::new(100, 200));
        assert!(list.position.before_end);
        assert_eq!(list.position.first, 0);
        assert_eq!(list.position.offset, 0);
    }

    #[test]
    fn test_zero_items() {
        let mut list = List::new(Axis::Vertical);
        let mut calls = 0;
        let mut scene = Scene::new();
        let mut ctx = LayoutContext::new(
            Constraints::loose(Vector2::new(100, 200)),
            Metric::default(),
            Instant::now(),
            &[],
            &mut scene,
        );
        let dims = list.layout(&mut ctx, 0, |_, _| {
            calls += 1;
            Dimensions::new(100, 20)
        });
        assert_eq!(calls, 0);
        assert_eq!(dims.size, Vector2::new(0, 0));
        assert!(list.drawn_children().is_empty());
    }

    #[test]
    fn test_offset_is_clamped_to_content() {
        let mut list = List::new(Axis::Vertical);
        list.position.offset = 10_000;
        run(&mut list, 100, 20, 200);
        assert_eq!(list.position.first, 90);
        assert_eq!(list.position.offset, 0);
        assert_eq!(list.last_drawn(), 99);
        assert!(!list.position.before_end);

        list.position = Position {
            first: 5,
            offset: -500,
            before_end: true,
        };
        run(&mut list, 100, 20, 200);
        assert_eq!(list.position.first, 0);
        assert_eq!(list.position.offset, 0);
    }

    #[test]
    fn test_extreme_offsets_do_not_overflow() {
        let mut list = List::new(Axis::Vertical);
        list.position = Position {
            first: 5,
            offset: i32::MIN,
            before_end: true,
        };
        run(&mut list, 100, 20, 200);
        assert_eq!(list.position.first, 0);
        assert_eq!(list.position.offset, 0);

        list.position.offset = i32::MAX;
        run(&mut list, 100, 20, 200);
        assert_eq!(list.last_drawn(), 99);
        assert!(!list.position.before_end);

        list.position.offset = i32::MAX;
        list.page_down();
        run(&mut list, 100, 20, 200);
        assert_eq!(list.last_drawn(), 99);
    }

    #[test]
    fn test_scroll_to_end_pins_short_content() {
        let mut list = List::new(Axis::Vertical).with_scroll_to_end(true);
        let dims = run(&mut list, 3, 20, 200);
        let drawn = list.drawn_children();
        assert_eq!(drawn.len(), 3);
        assert_eq!(drawn[0].rect.y0, 140.0);
        assert_eq!(drawn[2].rect.y1, 200.0);
        assert_eq!(dims.size.y, 200);
    }

    #[test]
    fn test_page_down_and_up() {
        let mut list = List::new(Axis::Vertical);
        run(&mut list, 100, 20, 200);
        list.page_down();
        run(&mut list, 100, 20, 200);
        // A child ending exactly at the leading edge stays first.
        assert_eq!(list.position.first, 9);
        assert_eq!(list.position.offset, 20);
        assert_eq!(list.last_drawn(), 19);
        list.page_up();
        run(&mut list, 100, 20, 200);
        assert_eq!(list.first_drawn(), 0);
    }

    #[test]
    fn test_horizontal_alignment() {
        let mut list = List::new(Axis::Horizontal).with_alignment(Alignment::Middle);
        let mut scene = Scene::new();
        let mut ctx = LayoutContext::new(
            Constraints::loose(Vector2::new(300, 100)),
            Metric::default(),
            Instant::now(),
            &[],
            &mut scene,
        );
        let dims = list.layout(&mut ctx, 2, |_, i| Dimensions::new(50, if i == 0 { 40 } else { 20 }));
        assert_eq!(dims.size, Vector2::new(100, 40));
        let drawn = list.drawn_children();
        assert_eq!(drawn[1].rect, Rect::new(50.0, 10.0, 100.0, 30.0));
    }

    #[test]
    #[should_panic]
    fn test_index_outside_layout_is_fatal() {
        let list = List::new(Axis::Vertical);
        list.index();
    }
}

// SPDX-License-Identifier: LGPL-3.0-only

//! Gesture recognizers over raw [PointerEvent]s.

use nalgebra::Vector2;
use std::time::{Duration, Instant};

use crate::event::{PointerEvent, PointerKind, PointerSource};
use crate::layout::Axis;

/// How far back drag samples count towards the fling velocity.
const SAMPLE_WINDOW: Duration = Duration::from_millis(100);
/// Flings slower than this, in pixels per second, stop.
const MIN_FLING_VELOCITY: f32 = 50.0;
/// Exponential decay rate of a fling, per second.
const FLING_DECAY: f32 = 4.0;

/// What a [ScrollGesture] is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollState {
    /// No scrolling in progress.
    #[default]
    Idle,
    /// A touch drag is moving the content.
    Dragging,
    /// The content keeps moving after a drag was released.
    Flinging,
}

#[derive(Debug, Clone, Copy)]
struct Fling {
    velocity: f32,
    last: Instant,
}

impl Fling {
    fn tick(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        let decay = (-FLING_DECAY * dt).exp();
        let distance = self.velocity * (1.0 - decay) / FLING_DECAY;
        self.velocity *= decay;
        distance
    }

    fn finished(&self) -> bool {
        self.velocity.abs() < MIN_FLING_VELOCITY
    }
}

/// Turns touch drags and wheel motion along one axis into scroll distances.
///
/// Touch drags move the content with the finger and fling on release. Mouse
/// input scrolls through the wheel only. Only events inside the area set by
/// [set_area](Self::set_area) start a scroll.
#[derive(Debug, Clone)]
pub struct ScrollGesture {
    area: Vector2<f32>,
    drag: Option<f32>,
    samples: Vec<(Duration, f32)>,
    fling: Option<Fling>,
    remainder: f32,
}

impl ScrollGesture {
    /// An idle gesture with an empty area.
    pub fn new() -> Self {
        Self {
            area: Vector2::zeros(),
            drag: None,
            samples: Vec::new(),
            fling: None,
            remainder: 0.0,
        }
    }

    /// Sets the size of the region accepting input, from its origin.
    pub fn set_area(&mut self, size: Vector2<i32>) {
        self.area = Vector2::new(size.x as f32, size.y as f32);
    }

    /// Consumes `events` and returns the whole pixels to scroll along `axis`.
    /// Positive distances move towards the end of the content.
    pub fn scroll(&mut self, events: &[PointerEvent], now: Instant, axis: Axis) -> i32 {
        let mut distance = 0.0;
        for event in events {
            let pos = axis.main_f32(event.position);
            match event.kind {
                PointerKind::Press => {
                    if event.source != PointerSource::Touch || !self.contains(event.position) {
                        continue;
                    }
                    self.fling = None;
                    self.drag = Some(pos);
                    self.samples.clear();
                    self.samples.push((event.time, pos));
                },
                PointerKind::Move => {
                    if let Some(last) = self.drag {
                        distance += last - pos;
                        self.drag = Some(pos);
                        self.sample(event.time, pos);
                    }
                    let wheel = axis.main_f32(event.scroll);
                    if wheel != 0.0 && self.contains(event.position) {
                        self.fling = None;
                        distance += wheel;
                    }
                },
                PointerKind::Release => {
                    if self.drag.take().is_some() {
                        let velocity = self.velocity();
                        if velocity.abs() >= MIN_FLING_VELOCITY {
                            log::trace!("scroll fling at {velocity:.0} px/s");
                            self.fling = Some(Fling { velocity, last: now });
                        }
                    }
                    self.samples.clear();
                },
                PointerKind::Cancel => {
                    self.drag = None;
                    self.samples.clear();
                },
            }
        }

        if let Some(fling) = self.fling.as_mut() {
            distance += fling.tick(now);
            if fling.finished() {
                self.fling = None;
            }
        }

        self.remainder += distance;
        let whole = self.remainder.round();
        self.remainder -= whole;
        whole as i32
    }

    /// Ends any fling in progress.
    pub fn stop(&mut self) {
        self.fling = None;
    }

    /// The current state.
    pub fn state(&self) -> ScrollState {
        if self.drag.is_some() {
            ScrollState::Dragging
        } else if self.fling.is_some() {
            ScrollState::Flinging
        } else {
            ScrollState::Idle
        }
    }

    fn contains(&self, pos: Vector2<f32>) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x < self.area.x && pos.y < self.area.y
    }

    fn sample(&mut self, time: Duration, pos: f32) {
        self.samples.push((time, pos));
        if let Some(&(latest, _)) = self.samples.last() {
            self.samples.retain(|(t, _)| latest.saturating_sub(*t) <= SAMPLE_WINDOW);
        }
    }

    // Content velocity, opposite to the finger's.
    fn velocity(&self) -> f32 {
        let (Some(&(t0, p0)), Some(&(t1, p1))) = (self.samples.first(), self.samples.last()) else {
            return 0.0;
        };
        let dt = t1.saturating_sub(t0).as_secs_f32();
        if dt <= 0.0 {
            return 0.0;
        }
        (p0 - p1) / dt
    }
}

impl Default for ScrollGesture {
    fn default() -> Self {
        Self::new()
    }
}

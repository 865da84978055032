// SPDX-License-Identifier: LGPL-3.0-only

use tessera_core::event::{Buttons, PointerEvent, PointerKind, PointerSource};
use tessera_core::vg::kurbo::{Point, Rect};

/// The internal state of a [Clickable].
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum ClickState {
    /// The pointer is elsewhere.
    #[default]
    Idle,
    /// The pointer is over the area.
    Hovered,
    /// The primary button went down inside the area and is still held.
    Pressed,
}

/// Press tracking for a rectangular hit area.
///
/// A click is a press and a release both inside the area. Clicks queue up
/// until read with [clicked](Self::clicked).
#[derive(Debug, Clone, Default)]
pub struct Clickable {
    area: Rect,
    state: ClickState,
    clicks: usize,
}

impl Clickable {
    /// A clickable with an empty area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hit area, usually from the last layout.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    /// The hit area.
    pub fn area(&self) -> Rect {
        self.area
    }

    /// The current state.
    pub fn state(&self) -> ClickState {
        self.state
    }

    /// Updates the state from `events`.
    pub fn process(&mut self, events: &[PointerEvent]) {
        for event in events {
            let inside = self
                .area
                .contains(Point::new(event.position.x as f64, event.position.y as f64));
            match event.kind {
                PointerKind::Press => {
                    let primary = event.source == PointerSource::Touch || event.buttons.contains(Buttons::LEFT);
                    if inside && primary {
                        self.state = ClickState::Pressed;
                    }
                },
                PointerKind::Release => {
                    if self.state == ClickState::Pressed && inside {
                        self.clicks += 1;
                    }
                    self.state = if inside { ClickState::Hovered } else { ClickState::Idle };
                },
                PointerKind::Move => {
                    // fixes state leaving pressed while the button is still held
                    if self.state != ClickState::Pressed {
                        self.state = if inside { ClickState::Hovered } else { ClickState::Idle };
                    }
                },
                PointerKind::Cancel => self.state = ClickState::Idle,
            }
        }
    }

    /// Consumes one pending click.
    pub fn clicked(&mut self) -> bool {
        if self.clicks == 0 {
            return false;
        }
        self.clicks -= 1;
        true
    }
}

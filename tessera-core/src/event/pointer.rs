// SPDX-License-Identifier: LGPL-3.0-only

use bitflags::bitflags;
use nalgebra::Vector2;
use std::time::Duration;

use super::key::Modifiers;

bitflags! {
    /// Set of pressed pointer buttons.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        /// Primary button.
        const LEFT = 0b001;
        /// Secondary button.
        const RIGHT = 0b010;
        /// Wheel or middle button.
        const MIDDLE = 0b100;
    }
}

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// The pointer moved or scrolled.
    Move,
    /// A button went down.
    Press,
    /// A button went up.
    Release,
    /// The gesture was taken over by the system.
    Cancel,
}

/// The device producing the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerSource {
    /// A mouse or trackpad.
    #[default]
    Mouse,
    /// A touch screen.
    Touch,
}

/// A pointer event. Positions are in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// Event type.
    pub kind: PointerKind,
    /// Producing device.
    pub source: PointerSource,
    /// Time since an arbitrary, per platform epoch.
    pub time: Duration,
    /// Buttons held while the event happened.
    pub buttons: Buttons,
    /// Pointer position.
    pub position: Vector2<f32>,
    /// Scroll amount; positive values scroll towards the end.
    pub scroll: Vector2<f32>,
    /// Keyboard modifiers.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// A mouse event of `kind` at `position` with no buttons or scroll.
    pub fn new(kind: PointerKind, position: Vector2<f32>) -> Self {
        Self {
            kind,
            source: PointerSource::Mouse,
            time: Duration::ZERO,
            buttons: Buttons::empty(),
            position,
            scroll: Vector2::zeros(),
            modifiers: Modifiers::empty(),
        }
    }

    /// Sets the event time and returns self.
    pub fn at(mut self, time: Duration) -> Self {
        self.time = time;
        self
    }

    /// Sets the held buttons and returns self.
    pub fn with_buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = buttons;
        self
    }

    /// Sets the scroll amount and returns self.
    pub fn with_scroll(mut self, scroll: Vector2<f32>) -> Self {
        self.scroll = scroll;
        self
    }
}

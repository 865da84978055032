// SPDX-License-Identifier: LGPL-3.0-only

//! Portable events delivered to a window's [Callbacks](crate::platform::Callbacks).

use nalgebra::Vector2;
use std::fmt;
use std::time::Instant;

use crate::error::WindowError;
use crate::unit::Metric;

/// Keyboard, text and focus events.
pub mod key;
/// Pointer events and button sets.
pub mod pointer;

pub use key::{EditEvent, FocusEvent, KeyEvent, KeyName, Modifiers};
pub use pointer::{Buttons, PointerEvent, PointerKind, PointerSource};

/// Every event a window can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The window wants a new frame.
    Frame(FrameEvent),
    /// The window is gone. Always the last event of a window.
    Destroy(DestroyEvent),
    /// Answer to a clipboard read request.
    Clipboard(ClipboardEvent),
    /// The lifecycle stage changed.
    Stage(StageEvent),
    /// Mouse or touch input.
    Pointer(PointerEvent),
    /// A key press.
    Key(KeyEvent),
    /// Committed text input.
    Edit(EditEvent),
    /// Keyboard focus gained or lost.
    Focus(FocusEvent),
}

/// Requests a new frame of the given pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEvent {
    /// Window size in device pixels.
    pub size: Vector2<i32>,
    /// Unit conversion for this frame.
    pub metric: Metric,
    /// Animation time of the frame.
    pub now: Instant,
    /// Whether the native side waits for the frame before presenting.
    pub sync: bool,
}

/// The last event sent by a window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DestroyEvent {
    /// [None] for a normal close, the cause otherwise.
    pub err: Option<WindowError>,
}

/// Sent once for each clipboard read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardEvent {
    /// Clipboard content.
    pub text: String,
}

/// Sent whenever the [Stage] of a window changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageEvent {
    /// The new stage.
    pub stage: Stage,
}

/// Lifecycle stage of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Stage {
    /// Inactive windows don't receive frame events.
    #[default]
    Paused,
    /// The window is visible and drawing.
    Running,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Paused => write!(f, "StagePaused"),
            Stage::Running => write!(f, "StageRunning"),
        }
    }
}

impl From<PointerEvent> for Event {
    fn from(e: PointerEvent) -> Self {
        Event::Pointer(e)
    }
}

impl From<KeyEvent> for Event {
    fn from(e: KeyEvent) -> Self {
        Event::Key(e)
    }
}

impl From<EditEvent> for Event {
    fn from(e: EditEvent) -> Self {
        Event::Edit(e)
    }
}

impl From<FocusEvent> for Event {
    fn from(e: FocusEvent) -> Self {
        Event::Focus(e)
    }
}

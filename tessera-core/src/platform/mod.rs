// SPDX-License-Identifier: LGPL-3.0-only

//! Platform abstraction for windowing and input.
//!
//! Native callbacks are normalized by a bridge into [Event]s and delivered to
//! the [Callbacks] registered for the window. Windows hand a [Driver] back to
//! their callbacks for clipboard access and animation control.

use std::fmt;
use std::sync::Arc;

use crate::config::WindowOptions;
use crate::event::Event;

/// Native event bridge for single-instance native applications (AppKit).
pub mod bridge;

/// Display refresh driven frame pacer.
pub mod display_link;

/// View handle to window mapping.
pub mod registry;

/// Window creation hand-off between callers and the UI thread.
pub mod rendezvous;

/// Multiplexer over Wayland/X11 window drivers.
pub mod unix;

#[cfg(all(target_os = "linux", feature = "winit"))]
pub mod winit;

pub use bridge::{Bridge, NativeHost};
pub use display_link::{DisplayLink, RefreshSource};
pub use registry::WindowRegistry;
pub use rendezvous::WindowRendezvous;
pub use unix::{UnixPlatform, WindowDriver};

/// Opaque identity of a native view.
///
/// Portable code only compares and hashes it; ownership stays with the
/// native side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewHandle(pub u64);

impl fmt::Display for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{:x}", self.0)
    }
}

/// Identity of a physical display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayId(pub u64);

/// Receives the event stream of a window.
pub trait Callbacks: Send + Sync {
    /// Hands the window's driver to the callbacks. Called once, before any event.
    fn set_driver(&self, driver: Arc<dyn Driver>);

    /// Delivers one event.
    fn event(&self, event: Event);
}

/// Operations a window offers back to its callbacks.
pub trait Driver: Send + Sync {
    /// Requests the clipboard content. The answer arrives as an
    /// [Event::Clipboard].
    fn read_clipboard(&self);

    /// Replaces the clipboard content.
    fn write_clipboard(&self, text: String);

    /// Starts or stops continuous frame events.
    fn set_animating(&self, animating: bool);

    /// Shows or hides the on-screen keyboard, where there is one.
    fn show_text_input(&self, show: bool);
}

/// A pending window creation.
#[derive(Clone)]
pub struct WindowRequest {
    /// Event sink of the new window.
    pub callbacks: Arc<dyn Callbacks>,
    /// Construction options.
    pub options: WindowOptions,
}

impl WindowRequest {
    /// Bundles callbacks and options.
    pub fn new(callbacks: Arc<dyn Callbacks>, options: WindowOptions) -> Self {
        Self { callbacks, options }
    }
}

impl fmt::Debug for WindowRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowRequest")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

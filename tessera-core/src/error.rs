// SPDX-License-Identifier: LGPL-3.0-only

//! Window creation errors and the fatal invariant facility.

use thiserror::Error;

/// Errors reported to callers that create windows.
///
/// The error is [Clone] so it can travel inside a
/// [DestroyEvent](crate::event::DestroyEvent).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// No window driver was configured.
    #[error("no window driver available")]
    NoDriver,

    /// The native view could not be created.
    #[error("failed to create native view: {0}")]
    ViewCreation(String),

    /// A specific driver failed to create the window.
    #[error("{driver} driver failed: {reason}")]
    Driver {
        /// Name of the failing driver.
        driver: &'static str,
        /// Driver supplied reason.
        reason: String,
    },

    /// The platform only supports a single window.
    #[error("multiple windows are not supported")]
    MultipleWindows,

    /// The native event loop failed.
    #[error("event loop error: {0}")]
    EventLoop(String),

    /// The host environment terminated the window.
    #[error("window terminated: {0}")]
    Terminated(String),

    /// The other side of a hand-off went away.
    #[error("window event loop is gone")]
    Disconnected,
}

/// Reports a violated programming invariant and aborts the current thread.
///
/// Used where wiring guarantees a condition (a registered view, a finished
/// list child). Reaching it is a bug in the caller, never a runtime condition.
#[track_caller]
pub fn fatal(msg: &str) -> ! {
    log::error!("invariant violated: {msg}");
    panic!("{msg}");
}

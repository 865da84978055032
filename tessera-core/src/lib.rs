#![warn(missing_docs)]

//! Core library for tessera => See `tessera` crate.
//!
//! Contains the platform event bridge, window lifecycle plumbing and the
//! layout engine.

pub use vello as vg;

/// Contains the [WindowOptions](config::WindowOptions) struct and driver selection.
pub mod config;

/// Contains [WindowError](error::WindowError) and the fatal invariant facility.
pub mod error;

/// Contains the portable event stream types.
pub mod event;

/// Contains scroll gesture recognition.
pub mod gesture;

/// Contains useful types and functions for layout interaction.
pub mod layout;

/// Contains platform abstraction for windowing and input.
///
/// This module provides the native event bridge, the window registry, the
/// window creation rendezvous, the frame pacer and the Unix driver multiplexer.
pub mod platform;

/// Contains device independent units.
pub mod unit;

pub use error::{fatal, WindowError};

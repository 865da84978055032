#![warn(missing_docs)]

//! Widget state for tessera => See `tessera` crate.
//!
//! Contains widget state machines built on the core layout engine.

/// Contains the [clickable::Clickable] press tracker.
pub mod clickable;

/// Contains the [tabbar::TabBar] state.
pub mod tabbar;

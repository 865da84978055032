#![warn(missing_docs)]

//! Native window bridging and virtualized list layout for GUI toolkits.

pub use nalgebra as math;
pub use vello::peniko as color;

pub use tessera_core as core;
pub use tessera_widgets as widgets;

/// A "prelude" for users of the tessera toolkit.
///
/// Importing this module brings into scope the most common types
/// needed to drive windows and lay out lists.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::config::WindowOptions;
    pub use crate::core::error::WindowError;
    pub use crate::core::event::*;
    pub use crate::core::gesture::{ScrollGesture, ScrollState};
    pub use crate::core::layout::*;
    pub use crate::core::platform::{Callbacks, Driver, ViewHandle, WindowRequest};
    pub use crate::core::unit::{Dp, Metric, Sp};

    // Math
    pub use nalgebra::Vector2;

    // Graphics
    pub use crate::core::vg::Scene;

    // Widgets
    pub use crate::widgets::clickable::{ClickState, Clickable};
    pub use crate::widgets::tabbar::{Tab, TabBar, TabId};
}

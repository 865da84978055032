// SPDX-License-Identifier: LGPL-3.0-only

use nalgebra::Vector2;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::unit::{Dp, Metric};

/// Options consumed once when the native window is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOptions {
    /// The title of the window.
    pub title: String,
    /// The inner size of the window in [Dp].
    pub size: Vector2<f32>,
}

impl WindowOptions {
    /// Creates options with the given title and default size.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the inner size in [Dp] and returns self.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vector2::new(width, height);
        self
    }

    /// The inner size converted to device pixels with the given metric.
    pub fn size_px(&self, metric: &Metric) -> Vector2<i32> {
        Vector2::new(metric.dp(Dp(self.size.x)), metric.dp(Dp(self.size.y)))
    }
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "New Window".to_string(),
            size: Vector2::new(800.0, 600.0),
        }
    }
}

/// A window driver family on Unix-like systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Native Wayland protocol.
    Wayland,
    /// X11 (also used under XWayland).
    X11,
}

impl DriverKind {
    /// Lower case name of the driver family.
    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Wayland => "wayland",
            DriverKind::X11 => "x11",
        }
    }
}

/// Determines the order in which Unix window drivers are tried.
///
/// * `TESSERA_DRIVER=wayland` tries Wayland first.
/// * `TESSERA_DRIVER=x11` tries X11 first.
/// * Otherwise Wayland goes first when `WAYLAND_DISPLAY` is set, X11 when not.
pub fn driver_order() -> Vec<DriverKind> {
    driver_order_from(
        std::env::var("TESSERA_DRIVER").ok().as_deref(),
        std::env::var("WAYLAND_DISPLAY").is_ok(),
    )
}

pub(crate) fn driver_order_from(requested: Option<&str>, wayland_session: bool) -> Vec<DriverKind> {
    if let Some(val) = requested {
        match val.to_lowercase().as_str() {
            "wayland" => {
                log::debug!("Wayland driver requested via TESSERA_DRIVER=wayland");
                return vec![DriverKind::Wayland, DriverKind::X11];
            },
            "x11" => {
                log::debug!("X11 driver requested via TESSERA_DRIVER=x11");
                return vec![DriverKind::X11, DriverKind::Wayland];
            },
            _ => {
                // Only log this message once to avoid spam
                static LOGGED: AtomicBool = AtomicBool::new(false);
                if !LOGGED.swap(true, Ordering::Relaxed) {
                    log::warn!("Unknown TESSERA_DRIVER value '{}'; using default order", val);
                }
            },
        }
    }

    if wayland_session {
        vec![DriverKind::Wayland, DriverKind::X11]
    } else {
        vec![DriverKind::X11, DriverKind::Wayland]
    }
}

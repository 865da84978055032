// SPDX-License-Identifier: LGPL-3.0-only

//! Device independent units and their conversion to pixels.

/// A length in device independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Dp(pub f32);

/// A length in scaled (font) pixels.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Sp(pub f32);

/// Converts device independent units to device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    /// Device pixels per [Dp].
    pub px_per_dp: f32,
    /// Device pixels per [Sp].
    pub px_per_sp: f32,
}

impl Metric {
    /// The metric of a display with the given backing scale factor.
    pub fn for_scale(scale: f32) -> Self {
        Self {
            px_per_dp: scale,
            px_per_sp: scale,
        }
    }

    /// Rounds `v` to the nearest whole device pixel.
    pub fn dp(&self, v: Dp) -> i32 {
        round(v.0 * self.px_per_dp)
    }

    /// Rounds `v` to the nearest whole device pixel.
    pub fn sp(&self, v: Sp) -> i32 {
        round(v.0 * self.px_per_sp)
    }

    /// Converts device pixels back to [Dp].
    pub fn px_to_dp(&self, px: i32) -> Dp {
        if self.px_per_dp == 0.0 {
            return Dp(0.0);
        }
        Dp(px as f32 / self.px_per_dp)
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::for_scale(1.0)
    }
}

/// Half-up rounding used for every length conversion.
pub(crate) fn round(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// A real number held in `[0, 1]`.
///
/// Out-of-range inputs are clamped rather than rejected, so every
/// constructor is infallible. `NaN` is treated as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct BoundedScalar(f32);

impl BoundedScalar {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    /// Build from a fraction, clamped to `[0, 1]`.
    pub fn from_fraction(value: f32) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Build from a percentage, clamped to `[0, 100]` before scaling.
    pub fn from_percent(percent: f32) -> Self {
        Self::from_fraction(percent / 100.0)
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Replace the held value, clamping like the constructors do.
    pub fn set(&mut self, value: f32) {
        *self = Self::from_fraction(value);
    }
}

impl From<f32> for BoundedScalar {
    fn from(value: f32) -> Self {
        Self::from_fraction(value)
    }
}

impl From<BoundedScalar> for f32 {
    fn from(value: BoundedScalar) -> Self {
        value.0
    }
}

impl fmt::Display for BoundedScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

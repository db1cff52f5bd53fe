use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SignVisionError;

/// The numeric range a model reply uses for box coordinates and confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateScale {
    /// Fractions of the image, `0.0..=1.0`.
    #[default]
    Unit,
    /// Percentages of the image, `0..=100`.
    Percent,
}

impl CoordinateScale {
    /// Upper bound of the source range.
    pub fn max(self) -> f64 {
        match self {
            Self::Unit => 1.0,
            Self::Percent => 100.0,
        }
    }

    /// Clamp a source value into `[0, max]`. NaN collapses to 0.
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, self.max())
    }

    /// Convert an already clamped source value into the unit range.
    pub fn to_unit(self, value: f64) -> f64 {
        match self {
            Self::Unit => value,
            Self::Percent => value / 100.0,
        }
    }
}

impl fmt::Display for CoordinateScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "unit"),
            Self::Percent => write!(f, "percent"),
        }
    }
}

impl FromStr for CoordinateScale {
    type Err = SignVisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unit" | "normalized" | "0-1" | "fraction" => Ok(Self::Unit),
            "percent" | "percentage" | "0-100" | "pct" => Ok(Self::Percent),
            other => Err(SignVisionError::InvalidInput(format!(
                "unknown coordinate scale '{other}' (expected 'unit' or 'percent')"
            ))),
        }
    }
}

//! Drawing units
//!
//! Maps the DXF `$INSUNITS` header code onto a scale factor into
//! millimeters, the internal unit of every kerfnest geometry routine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit a drawing was authored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingUnits {
    /// No unit recorded, coordinates are taken as millimeters
    #[default]
    Unitless,
    /// Inches
    Inches,
    /// Millimeters
    Millimeters,
    /// Centimeters
    Centimeters,
    /// Meters
    Meters,
}

impl DrawingUnits {
    /// Resolve a `$INSUNITS` header code. Unknown codes fall back to unitless.
    pub fn from_insunits(code: i32) -> Self {
        match code {
            1 => Self::Inches,
            4 => Self::Millimeters,
            5 => Self::Centimeters,
            6 => Self::Meters,
            _ => Self::Unitless,
        }
    }

    /// Multiplier that converts a coordinate in this unit to millimeters
    pub fn to_mm_factor(self) -> f64 {
        match self {
            Self::Unitless | Self::Millimeters => 1.0,
            Self::Inches => 25.4,
            Self::Centimeters => 10.0,
            Self::Meters => 1000.0,
        }
    }
}

impl fmt::Display for DrawingUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unitless => write!(f, "unitless"),
            Self::Inches => write!(f, "in"),
            Self::Millimeters => write!(f, "mm"),
            Self::Centimeters => write!(f, "cm"),
            Self::Meters => write!(f, "m"),
        }
    }
}

impl FromStr for DrawingUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unitless" | "none" => Ok(Self::Unitless),
            "in" | "inch" | "inches" => Ok(Self::Inches),
            "mm" | "millimeters" => Ok(Self::Millimeters),
            "cm" | "centimeters" => Ok(Self::Centimeters),
            "m" | "meters" => Ok(Self::Meters),
            _ => Err(format!("Unknown drawing unit: {}", s)),
        }
    }
}

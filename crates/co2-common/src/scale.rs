//! Physical units and normalization modes for CO2 quantities.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Units for mass-like containment quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Co2MassScale {
    Kg,
    Tons,
    MTons,
    Normalize,
}

/// Units for volume-like containment quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Co2VolumeScale {
    CubicMeters,
    BillionCubicMeters,
    Normalize,
}

/// A requested scale for containment amounts.
///
/// Tags outside the two known families are kept verbatim in `Other` and
/// resolve to a neutral factor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Co2Scale {
    Mass(Co2MassScale),
    Volume(Co2VolumeScale),
    Other(String),
}

impl Co2Scale {
    pub const KG: Self = Self::Mass(Co2MassScale::Kg);
    pub const TONS: Self = Self::Mass(Co2MassScale::Tons);
    pub const MTONS: Self = Self::Mass(Co2MassScale::MTons);
    pub const CUBIC_METERS: Self = Self::Volume(Co2VolumeScale::CubicMeters);
    pub const BILLION_CUBIC_METERS: Self = Self::Volume(Co2VolumeScale::BillionCubicMeters);

    pub fn is_normalize(&self) -> bool {
        matches!(
            self,
            Self::Mass(Co2MassScale::Normalize) | Self::Volume(Co2VolumeScale::Normalize)
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Mass(Co2MassScale::Kg) => "kg",
            Self::Mass(Co2MassScale::Tons) => "tons",
            Self::Mass(Co2MassScale::MTons) => "M tons",
            Self::Mass(Co2MassScale::Normalize) | Self::Volume(Co2VolumeScale::Normalize) => {
                "normalize"
            }
            Self::Volume(Co2VolumeScale::CubicMeters) => "m3",
            Self::Volume(Co2VolumeScale::BillionCubicMeters) => "Billion m3",
            Self::Other(tag) => tag,
        }
    }
}

impl FromStr for Co2Scale {
    type Err = Infallible;

    /// Parse a scale tag (case-insensitive). Unknown tags become `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let scale = match s.trim().to_lowercase().as_str() {
            "kg" => Self::Mass(Co2MassScale::Kg),
            "tons" | "t" => Self::Mass(Co2MassScale::Tons),
            "m tons" | "mtons" => Self::Mass(Co2MassScale::MTons),
            "normalize" | "fraction" => Self::Mass(Co2MassScale::Normalize),
            "m3" | "cubic_meters" => Self::Volume(Co2VolumeScale::CubicMeters),
            "billion m3" | "billion_cubic_meters" => {
                Self::Volume(Co2VolumeScale::BillionCubicMeters)
            }
            _ => Self::Other(s.to_string()),
        };
        Ok(scale)
    }
}

impl fmt::Display for Co2Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical unit a mass surface is displayed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MapUnit {
    Kg,
    Tons,
    MTons,
    Other(String),
}

impl MapUnit {
    /// Divisor converting stored values (tons) to this unit.
    pub fn divisor(&self) -> f64 {
        match self {
            Self::Kg => 0.001,
            Self::Tons => 1.0,
            Self::MTons => 1e6,
            Self::Other(_) => 1.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Kg => "kg",
            Self::Tons => "tons",
            Self::MTons => "M tons",
            Self::Other(tag) => tag,
        }
    }
}

impl Default for MapUnit {
    fn default() -> Self {
        Self::Tons
    }
}

impl From<String> for MapUnit {
    fn from(s: String) -> Self {
        match s.as_str() {
            "kg" => Self::Kg,
            "tons" => Self::Tons,
            "M tons" => Self::MTons,
            _ => Self::Other(s),
        }
    }
}

impl From<MapUnit> for String {
    fn from(unit: MapUnit) -> Self {
        unit.as_str().to_string()
    }
}

impl fmt::Display for MapUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_from_str() {
        assert_eq!("kg".parse::<Co2Scale>().unwrap(), Co2Scale::KG);
        assert_eq!("M tons".parse::<Co2Scale>().unwrap(), Co2Scale::MTONS);
        assert_eq!(
            "Billion m3".parse::<Co2Scale>().unwrap(),
            Co2Scale::BILLION_CUBIC_METERS
        );
        assert!("Fraction".parse::<Co2Scale>().unwrap().is_normalize());
        assert_eq!(
            "furlongs".parse::<Co2Scale>().unwrap(),
            Co2Scale::Other("furlongs".to_string())
        );
    }

    #[test]
    fn test_map_unit_divisors() {
        assert_eq!(MapUnit::from("kg".to_string()).divisor(), 0.001);
        assert_eq!(MapUnit::from("tons".to_string()).divisor(), 1.0);
        assert_eq!(MapUnit::from("M tons".to_string()).divisor(), 1e6);
        assert_eq!(MapUnit::from("stone".to_string()).divisor(), 1.0);
    }

    #[test]
    fn test_map_unit_serde() {
        let unit: MapUnit = serde_json::from_str("\"M tons\"").unwrap();
        assert_eq!(unit, MapUnit::MTons);
        assert_eq!(serde_json::to_string(&MapUnit::Kg).unwrap(), "\"kg\"");
    }
}

//! Monitored pollutants and comfort parameters.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// A pollutant or comfort parameter carried by every sample.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Co2,
    Pm25,
    Tvoc,
    Temperature,
    Humidity,
}

impl Pollutant {
    pub const ALL: [Self; 5] = [
        Self::Co2,
        Self::Pm25,
        Self::Tvoc,
        Self::Temperature,
        Self::Humidity,
    ];

    /// Stable identifier as used on the wire and in issue details.
    pub fn code(self) -> &'static str {
        match self {
            Self::Co2 => "co2",
            Self::Pm25 => "pm25",
            Self::Tvoc => "tvoc",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
        }
    }

    /// Human-readable display name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Co2 => "CO₂",
            Self::Pm25 => "PM2.5",
            Self::Tvoc => "TVOC",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
        }
    }

    /// Measurement unit.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Co2 => "ppm",
            Self::Pm25 => "µg/m³",
            Self::Tvoc => "mg/m³",
            Self::Temperature => "°C",
            Self::Humidity => "%",
        }
    }

    /// Parse a wire identifier ("co2", "pm25", ...).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "co2" => Some(Self::Co2),
            "pm25" => Some(Self::Pm25),
            "tvoc" => Some(Self::Tvoc),
            "temperature" => Some(Self::Temperature),
            "humidity" => Some(Self::Humidity),
            _ => None,
        }
    }
}

impl std::fmt::Display for Pollutant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of a band a value breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Low,
    High,
}

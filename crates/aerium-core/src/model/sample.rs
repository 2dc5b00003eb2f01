//! A single sensor reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pollutant::Pollutant;

/// One sensor reading for a room. Immutable once received.
///
/// Missing measurements are represented as `f64::NAN` — the threshold
/// evaluator maps NaN to `Severity::None` and the action rules skip any
/// condition on a NaN variable, so absent data can never raise an alert.
///
/// The core only ever retains the single most-recent sample per
/// (brand, room); historical series belong to the chart layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    /// CO₂ in ppm.
    pub co2: f64,
    /// PM2.5 in µg/m³.
    pub pm25: f64,
    /// TVOC in mg/m³.
    pub tvoc: f64,
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Backend-computed global score (0-100), if it sent one.
    pub global_score: Option<f64>,
}

impl Sample {
    /// Value of a given parameter (NaN when the sensor didn't report it).
    pub fn value(&self, parameter: Pollutant) -> f64 {
        match parameter {
            Pollutant::Co2 => self.co2,
            Pollutant::Pm25 => self.pm25,
            Pollutant::Tvoc => self.tvoc,
            Pollutant::Temperature => self.temperature,
            Pollutant::Humidity => self.humidity,
        }
    }

    /// True when no parameter carries a usable value.
    pub fn is_empty(&self) -> bool {
        Pollutant::ALL.iter().all(|&p| self.value(p).is_nan())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample;
    use super::*;

    #[test]
    fn value_indexes_by_parameter() {
        let s = sample(800.0, 5.0, 300.0, 21.0, 50.0);
        assert_eq!(s.value(Pollutant::Co2), 800.0);
        assert_eq!(s.value(Pollutant::Humidity), 50.0);
    }

    #[test]
    fn all_nan_sample_is_empty() {
        let s = sample(f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN);
        assert!(s.is_empty());
        assert!(!sample(400.0, f64::NAN, f64::NAN, f64::NAN, f64::NAN).is_empty());
    }
}

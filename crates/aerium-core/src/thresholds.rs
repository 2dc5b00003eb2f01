//! Threshold evaluation: sensor value → severity tier.
//!
//! Pure functions over fixed band tables. The tables are constant for the
//! process lifetime and not user-editable.
//!
//! The temperature and humidity bands carry asymmetric open/closed
//! boundaries inherited from the original deployment, including a neutral
//! gap at exactly 24 °C and between 30 % and 40 % humidity. These are kept
//! as-is and pinned by tests — do not "fix" them.

use crate::model::{Direction, Pollutant, Severity};

// ── Band cut points ──────────────────────────────────────────────────

pub const CO2_WARNING: f64 = 800.0;
pub const CO2_DANGER: f64 = 1200.0;

pub const PM25_WARNING: f64 = 5.0;
pub const PM25_DANGER: f64 = 35.0;

pub const TVOC_WARNING: f64 = 300.0;
pub const TVOC_DANGER: f64 = 1000.0;

pub const TEMP_DANGER_LOW: f64 = 16.0;
pub const TEMP_WARNING_LOW: f64 = 18.0;
pub const TEMP_WARNING_HIGH: f64 = 22.0;
pub const TEMP_GAP: f64 = 24.0;
pub const TEMP_DANGER_HIGH: f64 = 28.0;

pub const HUMIDITY_DANGER_LOW: f64 = 20.0;
pub const HUMIDITY_WARNING_LOW: f64 = 30.0;
pub const HUMIDITY_INFO_LOW: f64 = 40.0;
pub const HUMIDITY_WARNING_HIGH: f64 = 60.0;
pub const HUMIDITY_DANGER_HIGH: f64 = 80.0;

// ── Evaluation ───────────────────────────────────────────────────────

/// Map a parameter value to its severity tier.
///
/// NaN always yields `Severity::None`; absent data can never raise an
/// alert. For the monotonic pollutants (CO₂, PM2.5, TVOC) severity only
/// escalates with the value. Temperature and humidity are banded around a
/// comfort range, with neutral gaps where neither band claims the value.
pub fn evaluate(parameter: Pollutant, value: f64) -> Severity {
    if value.is_nan() {
        return Severity::None;
    }

    match parameter {
        Pollutant::Co2 => {
            if value >= CO2_DANGER {
                Severity::Danger
            } else if value >= CO2_WARNING {
                Severity::Warning
            } else {
                Severity::Info
            }
        }
        Pollutant::Pm25 => {
            if value >= PM25_DANGER {
                Severity::Danger
            } else if value >= PM25_WARNING {
                Severity::Warning
            } else {
                Severity::Info
            }
        }
        Pollutant::Tvoc => {
            if value > TVOC_DANGER {
                Severity::Danger
            } else if value >= TVOC_WARNING {
                Severity::Warning
            } else {
                Severity::Info
            }
        }
        Pollutant::Temperature => {
            if value < TEMP_DANGER_LOW || value > TEMP_DANGER_HIGH {
                Severity::Danger
            } else if (value >= TEMP_DANGER_LOW && value < TEMP_WARNING_LOW)
                || (value > TEMP_WARNING_HIGH && value < TEMP_GAP)
                || (value > TEMP_GAP && value <= TEMP_DANGER_HIGH)
            {
                Severity::Warning
            } else if value >= TEMP_WARNING_LOW && value <= TEMP_WARNING_HIGH {
                Severity::Info
            } else {
                // Exactly 24 °C: the gap between the two warning bands.
                Severity::None
            }
        }
        Pollutant::Humidity => {
            if value < HUMIDITY_DANGER_LOW || value > HUMIDITY_DANGER_HIGH {
                Severity::Danger
            } else if (value >= HUMIDITY_DANGER_LOW && value < HUMIDITY_WARNING_LOW)
                || (value > HUMIDITY_WARNING_HIGH && value <= HUMIDITY_DANGER_HIGH)
            {
                Severity::Warning
            } else if value >= HUMIDITY_INFO_LOW && value <= HUMIDITY_WARNING_HIGH {
                Severity::Info
            } else {
                // 30 % ≤ h < 40 %: neutral gap below the comfort range.
                Severity::None
            }
        }
    }
}

/// The band boundary a value crossed to earn `warning` or `danger`, with
/// the side it breached. Feeds [`IssueDetail`](crate::model::IssueDetail).
///
/// Returns `None` for `info`/`none` severities — those never become
/// issues.
pub fn crossed_boundary(
    parameter: Pollutant,
    value: f64,
    severity: Severity,
) -> Option<(Direction, f64)> {
    if severity < Severity::Warning || value.is_nan() {
        return None;
    }
    let danger = severity == Severity::Danger;

    let crossing = match parameter {
        Pollutant::Co2 => (Direction::High, if danger { CO2_DANGER } else { CO2_WARNING }),
        Pollutant::Pm25 => (Direction::High, if danger { PM25_DANGER } else { PM25_WARNING }),
        Pollutant::Tvoc => (Direction::High, if danger { TVOC_DANGER } else { TVOC_WARNING }),
        Pollutant::Temperature => {
            if danger {
                if value < TEMP_DANGER_LOW {
                    (Direction::Low, TEMP_DANGER_LOW)
                } else {
                    (Direction::High, TEMP_DANGER_HIGH)
                }
            } else if value < TEMP_WARNING_LOW {
                (Direction::Low, TEMP_WARNING_LOW)
            } else {
                (Direction::High, TEMP_WARNING_HIGH)
            }
        }
        Pollutant::Humidity => {
            if danger {
                if value < HUMIDITY_DANGER_LOW {
                    (Direction::Low, HUMIDITY_DANGER_LOW)
                } else {
                    (Direction::High, HUMIDITY_DANGER_HIGH)
                }
            } else if value < HUMIDITY_WARNING_LOW {
                (Direction::Low, HUMIDITY_WARNING_LOW)
            } else {
                (Direction::High, HUMIDITY_WARNING_HIGH)
            }
        }
    };
    Some(crossing)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Monotonic pollutants ─────────────────────────────────────────

    #[test]
    fn co2_bands() {
        assert_eq!(evaluate(Pollutant::Co2, 400.0), Severity::Info);
        assert_eq!(evaluate(Pollutant::Co2, 799.9), Severity::Info);
        assert_eq!(evaluate(Pollutant::Co2, 800.0), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Co2, 1199.9), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Co2, 1200.0), Severity::Danger);
        assert_eq!(evaluate(Pollutant::Co2, f64::NAN), Severity::None);
    }

    #[test]
    fn pm25_bands() {
        assert_eq!(evaluate(Pollutant::Pm25, 3.0), Severity::Info);
        assert_eq!(evaluate(Pollutant::Pm25, 5.0), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Pm25, 34.9), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Pm25, 35.0), Severity::Danger);
    }

    #[test]
    fn tvoc_bands_are_inclusive_at_the_top() {
        assert_eq!(evaluate(Pollutant::Tvoc, 100.0), Severity::Info);
        assert_eq!(evaluate(Pollutant::Tvoc, 300.0), Severity::Warning);
        // Exactly 1000 is still warning; danger starts strictly above.
        assert_eq!(evaluate(Pollutant::Tvoc, 1000.0), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Tvoc, 1000.1), Severity::Danger);
    }

    #[test]
    fn monotonic_pollutants_never_descend() {
        // Property 1: severity escalates monotonically with the value.
        for parameter in [Pollutant::Co2, Pollutant::Pm25, Pollutant::Tvoc] {
            let mut prev = Severity::None;
            let mut v = 0.0;
            while v < 2500.0 {
                let s = evaluate(parameter, v);
                assert!(s >= prev, "{parameter:?} dipped from {prev:?} to {s:?} at {v}");
                prev = s;
                v += 0.5;
            }
        }
    }

    // ── Temperature ──────────────────────────────────────────────────

    #[test]
    fn temperature_bands() {
        assert_eq!(evaluate(Pollutant::Temperature, 15.9), Severity::Danger);
        assert_eq!(evaluate(Pollutant::Temperature, 16.0), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Temperature, 17.9), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Temperature, 18.0), Severity::Info);
        assert_eq!(evaluate(Pollutant::Temperature, 22.0), Severity::Info);
        assert_eq!(evaluate(Pollutant::Temperature, 22.1), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Temperature, 23.9), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Temperature, 24.1), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Temperature, 28.0), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Temperature, 28.1), Severity::Danger);
    }

    #[test]
    fn temperature_24_gap() {
        // The two warning bands leave exactly 24 °C unclaimed. The gap is
        // intentional and must not be smoothed over.
        assert_eq!(evaluate(Pollutant::Temperature, 24.0), Severity::None);
    }

    // ── Humidity ─────────────────────────────────────────────────────

    #[test]
    fn humidity_bands() {
        assert_eq!(evaluate(Pollutant::Humidity, 19.9), Severity::Danger);
        assert_eq!(evaluate(Pollutant::Humidity, 20.0), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Humidity, 29.9), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Humidity, 40.0), Severity::Info);
        assert_eq!(evaluate(Pollutant::Humidity, 60.0), Severity::Info);
        assert_eq!(evaluate(Pollutant::Humidity, 60.1), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Humidity, 80.0), Severity::Warning);
        assert_eq!(evaluate(Pollutant::Humidity, 80.1), Severity::Danger);
    }

    #[test]
    fn humidity_neutral_gap_between_30_and_40() {
        assert_eq!(evaluate(Pollutant::Humidity, 30.0), Severity::None);
        assert_eq!(evaluate(Pollutant::Humidity, 35.0), Severity::None);
        assert_eq!(evaluate(Pollutant::Humidity, 39.9), Severity::None);
    }

    // ── Crossed boundaries ───────────────────────────────────────────

    #[test]
    fn crossed_boundary_reports_the_exceeded_cut() {
        assert_eq!(
            crossed_boundary(Pollutant::Co2, 1300.0, Severity::Danger),
            Some((Direction::High, CO2_DANGER))
        );
        assert_eq!(
            crossed_boundary(Pollutant::Co2, 900.0, Severity::Warning),
            Some((Direction::High, CO2_WARNING))
        );
        assert_eq!(
            crossed_boundary(Pollutant::Temperature, 15.0, Severity::Danger),
            Some((Direction::Low, TEMP_DANGER_LOW))
        );
        assert_eq!(
            crossed_boundary(Pollutant::Temperature, 26.0, Severity::Warning),
            Some((Direction::High, TEMP_WARNING_HIGH))
        );
        assert_eq!(
            crossed_boundary(Pollutant::Humidity, 25.0, Severity::Warning),
            Some((Direction::Low, HUMIDITY_WARNING_LOW))
        );
        assert_eq!(
            crossed_boundary(Pollutant::Humidity, 85.0, Severity::Danger),
            Some((Direction::High, HUMIDITY_DANGER_HIGH))
        );
    }

    #[test]
    fn info_and_none_never_become_issues() {
        assert_eq!(crossed_boundary(Pollutant::Co2, 400.0, Severity::Info), None);
        assert_eq!(crossed_boundary(Pollutant::Temperature, 24.0, Severity::None), None);
    }
}

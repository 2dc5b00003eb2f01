//! Severity aggregation: sample → per-device alert assessment.
//!
//! Each device aggregates the severities of the pollutants in its
//! contribution map with a `max`-merge, collects `warning`/`danger`
//! pollutants as issues, and gets a recommended action from a fixed
//! first-match-wins rule table.

use std::collections::BTreeMap;

use crate::model::{ActionKey, DeviceKind, IssueDetail, Sample, Severity};
use crate::thresholds;

/// The aggregation result for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceAssessment {
    pub severity: Severity,
    pub issues: Vec<IssueDetail>,
    pub action: ActionKey,
}

/// Aggregate a sample into per-device assessments.
///
/// Deterministic and side-effect free: calling twice with the same sample
/// yields identical results. Devices whose contributors are all NaN come
/// out at `Severity::None` (inactive).
pub fn aggregate(sample: &Sample) -> BTreeMap<DeviceKind, DeviceAssessment> {
    let mut out = BTreeMap::new();

    for device in DeviceKind::ALL {
        let mut severity = Severity::None;
        let mut issues = Vec::new();

        for &pollutant in device.contributors() {
            let value = sample.value(pollutant);
            let tier = thresholds::evaluate(pollutant, value);
            severity = severity.merge(tier);

            // Issues carry only warning/danger pollutants, never info.
            if tier >= Severity::Warning {
                if let Some((direction, threshold)) =
                    thresholds::crossed_boundary(pollutant, value, tier)
                {
                    issues.push(IssueDetail {
                        pollutant,
                        severity: tier,
                        value,
                        direction,
                        threshold,
                    });
                }
            }
        }

        out.insert(
            device,
            DeviceAssessment {
                severity,
                issues,
                action: suggest_action(device, sample),
            },
        );
    }

    out
}

// ── Action rules ─────────────────────────────────────────────────────
//
// Heuristic rule tables from the original deployment, evaluated in listed
// order with first match winning. A NaN variable makes its condition
// false (skip), never an error.

/// Recommend a corrective action for a device given the current sample.
pub fn suggest_action(device: DeviceKind, sample: &Sample) -> ActionKey {
    let co2 = sample.co2;
    let pm25 = sample.pm25;
    let tvoc = sample.tvoc;
    let temp = sample.temperature;
    let hum = sample.humidity;

    match device {
        DeviceKind::Window => {
            // Outside air would make things worse: particulates high while
            // CO₂ is fine, or the room is already too dry/cold.
            if (at_least(pm25, thresholds::PM25_DANGER) && strictly_below(co2, thresholds::CO2_WARNING))
                || strictly_below(hum, thresholds::HUMIDITY_WARNING_LOW)
                || strictly_below(temp, thresholds::TEMP_WARNING_LOW)
            {
                ActionKey::Close
            } else {
                ActionKey::Open
            }
        }
        DeviceKind::Door => {
            if at_least(co2, thresholds::CO2_WARNING) {
                ActionKey::Open
            } else {
                ActionKey::Close
            }
        }
        DeviceKind::Ventilation => {
            if at_least(co2, thresholds::CO2_WARNING)
                || at_least(tvoc, thresholds::TVOC_WARNING)
                || at_least(pm25, 15.0)
                || strictly_above(hum, thresholds::HUMIDITY_WARNING_HIGH)
            {
                ActionKey::TurnOn
            } else if strictly_below(hum, thresholds::HUMIDITY_WARNING_LOW) {
                ActionKey::TurnOff
            } else {
                ActionKey::TurnOn
            }
        }
        DeviceKind::Radiator => {
            if strictly_below(temp, thresholds::TEMP_WARNING_LOW) {
                ActionKey::Increase
            } else if strictly_above(temp, thresholds::TEMP_GAP) {
                ActionKey::Decrease
            } else {
                ActionKey::Decrease
            }
        }
    }
}

// NaN-safe comparisons: a NaN variable skips its condition.

fn at_least(value: f64, cut: f64) -> bool {
    !value.is_nan() && value >= cut
}

fn strictly_above(value: f64, cut: f64) -> bool {
    !value.is_nan() && value > cut
}

fn strictly_below(value: f64, cut: f64) -> bool {
    !value.is_nan() && value < cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample::test_support::sample;
    use crate::model::{Direction, Pollutant};
    use pretty_assertions::assert_eq;

    #[test]
    fn co2_spike_reaches_every_air_renewal_device() {
        // Sample {co2:1300, pm25:10, tvoc:100, temperature:20, humidity:50}.
        let s = sample(1300.0, 10.0, 100.0, 20.0, 50.0);
        let result = aggregate(&s);

        assert_eq!(result[&DeviceKind::Window].severity, Severity::Danger);
        assert_eq!(result[&DeviceKind::Ventilation].severity, Severity::Danger);
        assert_eq!(result[&DeviceKind::Door].severity, Severity::Danger);
        // Radiator only hears temperature/humidity — both in comfort bands.
        assert_eq!(result[&DeviceKind::Radiator].severity, Severity::Info);
        assert_eq!(result[&DeviceKind::Door].action, ActionKey::Open);
    }

    #[test]
    fn particulates_close_the_window_when_co2_is_fine() {
        // Sample {co2:500, pm25:40, tvoc:100, temperature:20, humidity:50}:
        // pm25 ≥ 35 and co2 < 800 → close; pm25 at danger drives the
        // window's severity to danger too.
        let s = sample(500.0, 40.0, 100.0, 20.0, 50.0);
        let result = aggregate(&s);

        assert_eq!(result[&DeviceKind::Window].action, ActionKey::Close);
        assert_eq!(result[&DeviceKind::Window].severity, Severity::Danger);
        assert_eq!(result[&DeviceKind::Ventilation].severity, Severity::Danger);
        assert_eq!(result[&DeviceKind::Door].severity, Severity::Info);
        assert_eq!(result[&DeviceKind::Ventilation].action, ActionKey::TurnOn);
    }

    #[test]
    fn device_severity_equals_max_of_contributors() {
        let s = sample(900.0, 2.0, 100.0, 17.0, 50.0);
        let result = aggregate(&s);

        // Window hears co2 (warning), pm25 (info), temperature (warning),
        // humidity (info) — exactly warning, no more, no less.
        assert_eq!(result[&DeviceKind::Window].severity, Severity::Warning);
        // Radiator hears temperature (warning) and humidity (info).
        assert_eq!(result[&DeviceKind::Radiator].severity, Severity::Warning);
        assert_eq!(result[&DeviceKind::Radiator].action, ActionKey::Increase);
    }

    #[test]
    fn issues_exclude_info_and_carry_the_crossed_cut() {
        let s = sample(900.0, 2.0, 100.0, 17.0, 50.0);
        let result = aggregate(&s);

        let window = &result[&DeviceKind::Window];
        assert_eq!(window.issues.len(), 2);

        let co2_issue = window
            .issues
            .iter()
            .find(|i| i.pollutant == Pollutant::Co2)
            .expect("co2 issue present");
        assert_eq!(co2_issue.direction, Direction::High);
        assert_eq!(co2_issue.threshold, thresholds::CO2_WARNING);

        let temp_issue = window
            .issues
            .iter()
            .find(|i| i.pollutant == Pollutant::Temperature)
            .expect("temperature issue present");
        assert_eq!(temp_issue.direction, Direction::Low);
        assert_eq!(temp_issue.threshold, thresholds::TEMP_WARNING_LOW);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let s = sample(1300.0, 40.0, 1200.0, 15.0, 85.0);
        assert_eq!(aggregate(&s), aggregate(&s));
    }

    #[test]
    fn all_nan_sample_leaves_every_device_inactive() {
        let s = sample(f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN);
        let result = aggregate(&s);
        for device in DeviceKind::ALL {
            assert_eq!(result[&device].severity, Severity::None);
            assert!(result[&device].issues.is_empty());
        }
    }

    #[test]
    fn nan_skips_rule_conditions_instead_of_failing() {
        // Humidity missing: the window's dryness condition skips, the
        // default branch wins.
        let s = sample(400.0, 2.0, 100.0, 21.0, f64::NAN);
        assert_eq!(suggest_action(DeviceKind::Window, &s), ActionKey::Open);
        // Temperature missing: radiator falls through to decrease.
        let s = sample(400.0, 2.0, 100.0, f64::NAN, 50.0);
        assert_eq!(suggest_action(DeviceKind::Radiator, &s), ActionKey::Decrease);
    }

    #[test]
    fn ventilation_rules_fire_in_listed_order() {
        // Dry AND stale air: the turn_on triggers are checked first, so
        // CO₂ wins over the dryness turn_off.
        let s = sample(900.0, 2.0, 100.0, 21.0, 25.0);
        assert_eq!(suggest_action(DeviceKind::Ventilation, &s), ActionKey::TurnOn);
        // Dry air alone: turn_off.
        let s = sample(400.0, 2.0, 100.0, 21.0, 25.0);
        assert_eq!(suggest_action(DeviceKind::Ventilation, &s), ActionKey::TurnOff);
        // Nothing triggers: the trailing default is turn_on.
        let s = sample(400.0, 2.0, 100.0, 21.0, 50.0);
        assert_eq!(suggest_action(DeviceKind::Ventilation, &s), ActionKey::TurnOn);
    }

    #[test]
    fn pm25_ventilation_trigger_sits_below_the_danger_cut() {
        // The ventilation trigger is pm25 ≥ 15 — between the warning and
        // danger thresholds.
        let s = sample(400.0, 20.0, 100.0, 21.0, 50.0);
        assert_eq!(suggest_action(DeviceKind::Ventilation, &s), ActionKey::TurnOn);
    }

    #[test]
    fn radiator_holds_decrease_in_comfort_range() {
        let s = sample(400.0, 2.0, 100.0, 21.0, 50.0);
        assert_eq!(suggest_action(DeviceKind::Radiator, &s), ActionKey::Decrease);
        let s = sample(400.0, 2.0, 100.0, 26.0, 50.0);
        assert_eq!(suggest_action(DeviceKind::Radiator, &s), ActionKey::Decrease);
    }
}

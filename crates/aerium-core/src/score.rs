//! Global IAQ score (0–100, 100 = excellent).
//!
//! The backend computes this server-side and attaches it to window
//! records; push measurements and degraded backends omit it, so the
//! dashboard recomputes the same bands client-side as a fallback. The cut
//! points follow the WHO/ANSES/EPA-derived tables of the original scoring
//! service and must stay in lockstep with it.

use serde::{Deserialize, Serialize};

use crate::model::Sample;

/// Qualitative level matching a global score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLevel {
    Excellent,
    Good,
    Moderate,
    Poor,
    VeryPoor,
}

impl ScoreLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
            Self::VeryPoor => "very poor",
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Moderate
        } else if score >= 30.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }
}

/// The computed score with its qualitative level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreAssessment {
    pub score: f64,
    pub level: ScoreLevel,
}

/// Compute the global IAQ score for a sample.
///
/// Missing (NaN) parameters fall back to the scoring service's neutral
/// defaults rather than dragging the score down.
pub fn compute(sample: &Sample) -> ScoreAssessment {
    let co2 = fallback(sample.co2, 400.0);
    let pm25 = fallback(sample.pm25, 5.0);
    let tvoc = fallback(sample.tvoc, 100.0);
    let temperature = fallback(sample.temperature, 21.0);
    let humidity = fallback(sample.humidity, 45.0);

    let scores = [
        graded(co2, &[600.0, 1000.0, 1400.0, 2000.0]),
        graded(pm25, &[12.0, 25.0, 50.0, 100.0]),
        graded(tvoc, &[200.0, 300.0, 500.0, 1000.0]),
        range_graded(humidity, (40.0, 50.0), (30.0, 60.0), (20.0, 70.0)),
        range_graded(temperature, (19.0, 22.0), (18.0, 24.0), (16.0, 26.0)),
    ];

    #[allow(clippy::cast_precision_loss)]
    let score = (scores.iter().sum::<f64>() / scores.len() as f64).round();
    ScoreAssessment {
        score,
        level: ScoreLevel::from_score(score),
    }
}

/// Resolve the score to display: the backend's, or the local fallback.
pub fn effective(sample: &Sample) -> ScoreAssessment {
    match sample.global_score {
        Some(score) if !score.is_nan() => ScoreAssessment {
            score,
            level: ScoreLevel::from_score(score),
        },
        _ => compute(sample),
    }
}

fn fallback(value: f64, default: f64) -> f64 {
    if value.is_nan() { default } else { value }
}

/// Lower-is-better pollutants: four ascending cut points → 100/80/60/40/20.
fn graded(value: f64, cuts: &[f64; 4]) -> f64 {
    if value <= cuts[0] {
        100.0
    } else if value <= cuts[1] {
        80.0
    } else if value <= cuts[2] {
        60.0
    } else if value <= cuts[3] {
        40.0
    } else {
        20.0
    }
}

/// Optimal-range parameters: nested inclusive ranges → 100/80/60/40.
fn range_graded(value: f64, excellent: (f64, f64), good: (f64, f64), moderate: (f64, f64)) -> f64 {
    if value >= excellent.0 && value <= excellent.1 {
        100.0
    } else if value >= good.0 && value <= good.1 {
        80.0
    } else if value >= moderate.0 && value <= moderate.1 {
        60.0
    } else {
        40.0
    }
}

//! Preventive-action predictions from the ML service. Display-only:
//! these never feed the severity aggregation.

use serde::{Deserialize, Serialize};

use super::device::DeviceKind;
use super::pollutant::Pollutant;

/// Priority label attached to a predicted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl ActionPriority {
    pub fn parse(label: &str) -> Self {
        match label {
            "urgent" => Self::Urgent,
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// One recommended preventive action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreventiveAction {
    /// Target device, when the module name matched a known kind.
    pub device: Option<DeviceKind>,
    /// Raw module name as the prediction service sent it.
    pub module: String,
    /// Raw action identifier ("ouvrir_fenetre", ...).
    pub action: String,
    pub priority: ActionPriority,
    pub parameter: Option<Pollutant>,
    pub current_value: Option<f64>,
    pub predicted_value: Option<f64>,
    pub reason: Option<String>,
}

/// The full prediction payload for a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub actions: Vec<PreventiveAction>,
    pub predicted_score: Option<f64>,
}

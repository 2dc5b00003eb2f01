//! Wire types for the IAQ backend.
//!
//! Everything here mirrors what the backend actually sends, nullable fields
//! included. Sensors drop out, aggregation windows can be empty, and older
//! backend versions omit the score columns — so every measurement field is
//! an `Option`. Domain-level normalization (NaN semantics, timestamp
//! ordering) lives in `aerium-core`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Measurement window ───────────────────────────────────────────────

/// One record from `GET /api/iaq/window`.
///
/// The backend pivots time-series storage rows into flat objects; column
/// names vary slightly between storage engines, hence the aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Sample timestamp (RFC 3339).
    #[serde(alias = "_time", alias = "time")]
    pub timestamp: DateTime<Utc>,

    /// CO₂ concentration in ppm.
    #[serde(default)]
    pub co2: Option<f64>,

    /// Fine particulate matter in µg/m³.
    #[serde(default)]
    pub pm25: Option<f64>,

    /// Total volatile organic compounds in mg/m³.
    #[serde(default)]
    pub tvoc: Option<f64>,

    /// Air temperature in °C.
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Relative humidity in %.
    #[serde(default)]
    pub humidity: Option<f64>,

    /// Backend-computed global IAQ score (0-100), when available.
    #[serde(default)]
    pub global_score: Option<f64>,

    /// Qualitative level matching the score ("good", "moderate", ...).
    #[serde(default)]
    pub global_level: Option<String>,

    /// Everything else the backend tags onto a record (sensor_id,
    /// enseigne, salle, ...). Kept so nothing is silently dropped.
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

// ── Site configuration ───────────────────────────────────────────────

/// `GET /api/config` — the site topology document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfigResponse {
    pub lieux: LieuxRecord,
}

/// The `lieux` section: brand ("enseigne") and room ("piece") hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LieuxRecord {
    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub enseignes: Vec<EnseigneRecord>,
}

/// A brand: a top-level physical location grouping rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnseigneRecord {
    pub id: String,
    pub nom: String,
    #[serde(default)]
    pub pieces: Vec<PieceRecord>,
}

/// A monitored room within a brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceRecord {
    pub id: String,
    pub nom: String,
    /// Room type hint ("bureau", "salle de réunion", ...), free-form.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// ── Predictions ──────────────────────────────────────────────────────

/// `GET /api/iaq/actions/preventive` — ML-derived corrective actions.
///
/// Display-only on the dashboard; never feeds severity aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub actions: Vec<PreventiveActionRecord>,

    #[serde(default)]
    pub predicted_score: Option<f64>,
}

/// One recommended preventive action from the prediction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreventiveActionRecord {
    /// Target module ("fenetre", "ventilation", ...).
    #[serde(alias = "module_type")]
    pub device: String,

    /// Action identifier ("ouvrir_fenetre", "activer_ventilation", ...).
    #[serde(alias = "action_type")]
    pub action: String,

    /// Priority label ("urgent", "high", "medium", "low").
    #[serde(default)]
    pub priority: Option<String>,

    /// Pollutant that motivated the action.
    #[serde(default)]
    pub parameter: Option<String>,

    #[serde(default)]
    pub current_value: Option<f64>,

    #[serde(default)]
    pub predicted_value: Option<f64>,

    /// Free-form explanation from the prediction service.
    #[serde(default)]
    pub reason: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn measurement_record_tolerates_missing_fields() {
        let json = r#"{"_time": "2026-03-02T09:15:00Z", "co2": 812.5, "salle": "Bureau"}"#;
        let rec: MeasurementRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.co2, Some(812.5));
        assert!(rec.pm25.is_none());
        assert!(rec.global_score.is_none());
        assert_eq!(rec.extra["salle"], "Bureau");
    }

    #[test]
    fn site_config_parses_nested_hierarchy() {
        let json = serde_json::json!({
            "lieux": {
                "active": true,
                "enseignes": [{
                    "id": "e1",
                    "nom": "Maison",
                    "pieces": [
                        { "id": "p1", "nom": "Bureau", "type": "bureau" },
                        { "id": "p2", "nom": "Chambre" }
                    ]
                }]
            }
        });
        let cfg: SiteConfigResponse = serde_json::from_value(json).unwrap();
        assert!(cfg.lieux.active);
        assert_eq!(cfg.lieux.enseignes.len(), 1);
        assert_eq!(cfg.lieux.enseignes[0].pieces[1].kind, None);
    }

    #[test]
    fn preventive_action_accepts_legacy_field_names() {
        let json = serde_json::json!({
            "module_type": "ventilation",
            "action_type": "activer_ventilation",
            "priority": "high",
            "parameter": "co2",
            "current_value": 1450.0,
            "predicted_value": 1600.0
        });
        let action: PreventiveActionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(action.device, "ventilation");
        assert_eq!(action.action, "activer_ventilation");
        assert_eq!(action.priority.as_deref(), Some("high"));
    }
}

//! Wire → domain conversions.
//!
//! Keeps `aerium-api`'s nullable wire shapes out of the rest of the core:
//! everything past this module works with NaN semantics and typed enums.

use aerium_api::types::{
    EnseigneRecord, MeasurementRecord, PieceRecord, PredictionResponse, PreventiveActionRecord,
    SiteConfigResponse,
};

use crate::model::{
    ActionPriority, Brand, DeviceKind, Pollutant, PredictionReport, PreventiveAction, Room, Sample,
    SiteConfig,
};

impl From<&MeasurementRecord> for Sample {
    fn from(rec: &MeasurementRecord) -> Self {
        Self {
            timestamp: rec.timestamp,
            co2: rec.co2.unwrap_or(f64::NAN),
            pm25: rec.pm25.unwrap_or(f64::NAN),
            tvoc: rec.tvoc.unwrap_or(f64::NAN),
            temperature: rec.temperature.unwrap_or(f64::NAN),
            humidity: rec.humidity.unwrap_or(f64::NAN),
            global_score: rec.global_score,
        }
    }
}

impl From<SiteConfigResponse> for SiteConfig {
    fn from(resp: SiteConfigResponse) -> Self {
        Self {
            active: resp.lieux.active,
            brands: resp.lieux.enseignes.into_iter().map(Brand::from).collect(),
        }
    }
}

impl From<EnseigneRecord> for Brand {
    fn from(rec: EnseigneRecord) -> Self {
        Self {
            id: rec.id,
            name: rec.nom,
            rooms: rec.pieces.into_iter().map(Room::from).collect(),
        }
    }
}

impl From<PieceRecord> for Room {
    fn from(rec: PieceRecord) -> Self {
        Self {
            id: rec.id,
            name: rec.nom,
            kind: rec.kind,
        }
    }
}

impl From<PredictionResponse> for PredictionReport {
    fn from(resp: PredictionResponse) -> Self {
        Self {
            actions: resp
                .actions
                .into_iter()
                .map(PreventiveAction::from)
                .collect(),
            predicted_score: resp.predicted_score,
        }
    }
}

impl From<PreventiveActionRecord> for PreventiveAction {
    fn from(rec: PreventiveActionRecord) -> Self {
        Self {
            device: DeviceKind::from_key(&rec.device),
            module: rec.device,
            action: rec.action,
            priority: rec
                .priority
                .as_deref()
                .map_or(ActionPriority::Medium, ActionPriority::parse),
            parameter: rec.parameter.as_deref().and_then(Pollutant::from_code),
            current_value: rec.current_value,
            predicted_value: rec.predicted_value,
            reason: rec.reason,
        }
    }
}

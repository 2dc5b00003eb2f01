//! Canonical domain types for the alert pipeline.

pub mod alert;
pub mod device;
pub mod pollutant;
pub mod prediction;
pub mod sample;
pub mod severity;
pub mod site;

pub use alert::{AlertPoint, IssueDetail};
pub use device::{ActionKey, ActuationState, DeviceKind};
pub use pollutant::{Direction, Pollutant};
pub use prediction::{ActionPriority, PredictionReport, PreventiveAction};
pub use sample::Sample;
pub use severity::Severity;
pub use site::{Brand, Room, RoomModel, SceneObject, SiteConfig};

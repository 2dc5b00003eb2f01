//! Actionable fixtures ("devices") inferred from the room model.

use serde::{Deserialize, Serialize};

use super::pollutant::Pollutant;

/// A device with a derived severity and a recommended action.
///
/// The set is fixed; devices are instantiated per room by matching named
/// objects in the room model against [`DeviceKind::from_object_name`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Window,
    Door,
    Ventilation,
    Radiator,
}

impl DeviceKind {
    pub const ALL: [Self; 4] = [Self::Window, Self::Door, Self::Ventilation, Self::Radiator];

    /// Pollutants feeding this device's aggregated severity.
    ///
    /// The map is fixed: a device only alerts for parameters it can
    /// plausibly influence.
    pub fn contributors(self) -> &'static [Pollutant] {
        match self {
            Self::Window => &[
                Pollutant::Co2,
                Pollutant::Pm25,
                Pollutant::Temperature,
                Pollutant::Humidity,
            ],
            Self::Door => &[Pollutant::Co2],
            Self::Ventilation => &[
                Pollutant::Co2,
                Pollutant::Pm25,
                Pollutant::Tvoc,
                Pollutant::Humidity,
            ],
            Self::Radiator => &[Pollutant::Temperature, Pollutant::Humidity],
        }
    }

    /// Stable identifier used in session keys and on the wire.
    pub fn key(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Door => "door",
            Self::Ventilation => "ventilation",
            Self::Radiator => "radiator",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Window => "Window",
            Self::Door => "Door",
            Self::Ventilation => "Ventilation",
            Self::Radiator => "Radiator",
        }
    }

    /// Match a named object from the room model to a device.
    ///
    /// Room models come from the original French deployments, so both
    /// French and English object names are recognized. Matching is
    /// case-insensitive on name prefixes ("fenetre_1", "Radiateur-Sud").
    pub fn from_object_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("fenetre") || lower.contains("fenêtre") || lower.contains("window") {
            Some(Self::Window)
        } else if lower.contains("porte") || lower.contains("door") {
            Some(Self::Door)
        } else if lower.contains("ventil") {
            Some(Self::Ventilation)
        } else if lower.contains("radiat") || lower.contains("heater") {
            Some(Self::Radiator)
        } else {
            None
        }
    }

    /// Parse a stable identifier (the inverse of [`key`](Self::key)),
    /// falling back to object-name matching for legacy values.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "window" => Some(Self::Window),
            "door" => Some(Self::Door),
            "ventilation" => Some(Self::Ventilation),
            "radiator" => Some(Self::Radiator),
            other => Self::from_object_name(other),
        }
    }

    /// Initial actuation state when a room is first seeded.
    pub fn default_actuation(self) -> ActuationState {
        match self {
            Self::Window | Self::Door => ActuationState::Closed,
            Self::Ventilation | Self::Radiator => ActuationState::Off,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// User-toggled physical state of a device.
///
/// Orthogonal to severity: toggling never changes severity or issues, and
/// severity updates never change this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuationState {
    Open,
    Closed,
    On,
    Off,
}

impl ActuationState {
    /// Flip within the open/closed or on/off pair.
    pub fn toggle(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

/// Recommended corrective action for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKey {
    Open,
    Close,
    TurnOn,
    TurnOff,
    Increase,
    Decrease,
}

impl ActionKey {
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::TurnOn => "turn on",
            Self::TurnOff => "turn off",
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

impl std::fmt::Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

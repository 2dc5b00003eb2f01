//! Site topology (brands and rooms) and the room model.

use serde::{Deserialize, Serialize};

use super::device::DeviceKind;

/// The brand/room hierarchy from the backend configuration document.
/// Read-only input to the context tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub active: bool,
    pub brands: Vec<Brand>,
}

impl SiteConfig {
    /// Look up a brand by display name.
    pub fn brand(&self, name: &str) -> Option<&Brand> {
        self.brands.iter().find(|b| b.name == name)
    }

    /// First brand/room pair, used as the initial selection when the
    /// session has no saved navigation state.
    pub fn first_room(&self) -> Option<(&Brand, &Room)> {
        self.brands
            .iter()
            .find_map(|b| b.rooms.first().map(|r| (b, r)))
    }
}

/// A brand ("enseigne"): a top-level physical location grouping rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub rooms: Vec<Room>,
}

impl Brand {
    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name == name)
    }
}

/// A monitored room ("salle"/"pièce") with its own sensor feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub kind: Option<String>,
}

/// The named objects of a room's model.
///
/// The original deployments ship a 3D scene per room; the dashboard only
/// cares about object names (for device matching) and plan positions (for
/// marker placement), so that is all this type retains. Rooms without a
/// bespoke model use [`RoomModel::standard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomModel {
    pub objects: Vec<SceneObject>,
}

/// One named object in a room model, with a normalized plan position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// Normalized (x, y) in [0, 1] on the room plan.
    pub position: (f64, f64),
}

impl RoomModel {
    /// The default plan used when a room has no bespoke model: one of
    /// each device at conventional positions.
    pub fn standard() -> Self {
        Self {
            objects: vec![
                SceneObject { name: "fenetre_1".into(), position: (0.5, 0.05) },
                SceneObject { name: "porte".into(), position: (0.05, 0.5) },
                SceneObject { name: "ventilation".into(), position: (0.9, 0.15) },
                SceneObject { name: "radiateur".into(), position: (0.5, 0.92) },
            ],
        }
    }

    /// Match named objects against the device patterns.
    ///
    /// Returns at most one marker per device kind — rooms with several
    /// windows get a single window alert point, anchored at the first
    /// matching object, which is what the severity model expects.
    pub fn markers(&self) -> Vec<(DeviceKind, (f64, f64))> {
        let mut found: Vec<(DeviceKind, (f64, f64))> = Vec::new();
        for obj in &self.objects {
            if let Some(kind) = DeviceKind::from_object_name(&obj.name) {
                if !found.iter().any(|(k, _)| *k == kind) {
                    found.push((kind, obj.position));
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_model_yields_all_four_devices() {
        let markers = RoomModel::standard().markers();
        assert_eq!(markers.len(), 4);
        for kind in DeviceKind::ALL {
            assert!(markers.iter().any(|(k, _)| *k == kind));
        }
    }

    #[test]
    fn duplicate_objects_collapse_to_one_marker() {
        let model = RoomModel {
            objects: vec![
                SceneObject { name: "fenetre_1".into(), position: (0.2, 0.0) },
                SceneObject { name: "fenetre_2".into(), position: (0.8, 0.0) },
                SceneObject { name: "lampe".into(), position: (0.5, 0.5) },
            ],
        };
        let markers = model.markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0], (DeviceKind::Window, (0.2, 0.0)));
    }

    #[test]
    fn first_room_walks_past_empty_brands() {
        let site = SiteConfig {
            active: true,
            brands: vec![
                Brand { id: "e0".into(), name: "Vide".into(), rooms: vec![] },
                Brand {
                    id: "e1".into(),
                    name: "Maison".into(),
                    rooms: vec![Room { id: "p1".into(), name: "Bureau".into(), kind: None }],
                },
            ],
        };
        let (brand, room) = site.first_room().expect("has a room");
        assert_eq!(brand.name, "Maison");
        assert_eq!(room.name, "Bureau");
    }
}

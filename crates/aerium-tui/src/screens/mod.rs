//! Screen implementations.

pub mod readings;
pub mod room;

use crate::screen::{Screen, ScreenId};

/// Instantiate all primary screens in tab order.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Screen>)> {
    vec![
        (ScreenId::Room, Box::new(room::RoomScreen::new())),
        (ScreenId::Readings, Box::new(readings::ReadingsScreen::new())),
    ]
}

//! Electron route through the external circuit

use glam::Vec2;

use crate::geometry::SceneGeometry;

/// Speed along straight wire runs, units per tick
pub const WIRE_SPEED: f32 = 3.0;
/// Speed through the bulb filament, units per tick
pub const BULB_SPEED: f32 = 1.8;

/// One stop on an electron's route, with the speed used to approach it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub position: Vec2,
    pub speed: f32,
}

impl Waypoint {
    fn wire(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            speed: WIRE_SPEED,
        }
    }

    fn bulb(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            speed: BULB_SPEED,
        }
    }
}

/// Build the route for an electron generated at `start`.
///
/// Only the first leg (straight up or down to the n-layer centre line) depends
/// on the generation point; the rest of the circuit is fixed.
pub fn build_electron_path(start: Vec2, geometry: &SceneGeometry) -> Vec<Waypoint> {
    let j = &geometry.junction;
    let c = &geometry.circuit;
    let n_y = j.n_layer_y();

    vec![
        // Into the n-layer
        Waypoint::wire(start.x, n_y),
        // Along the n-layer to the metal contact
        Waypoint::wire(j.right_contact_x(), n_y),
        Waypoint::wire(c.top_bus_x, n_y),
        // Down to the bulb
        Waypoint::wire(c.top_bus_x, c.bulb_top_y),
        Waypoint::wire(c.bulb_x, c.bulb_top_y),
        // Through the filament
        Waypoint::bulb(c.bulb_x, c.bulb_mid_y),
        Waypoint::bulb(c.bulb_x, c.bulb_bottom_y),
        // Bottom wire back to the left side
        Waypoint::wire(c.bulb_x, c.bottom_wire_y),
        Waypoint::wire(c.left_bottom_x, c.bottom_wire_y),
        Waypoint::wire(c.left_bottom_x, c.left_rise_y),
        Waypoint::wire(j.left_contact_x(), c.left_rise_y),
        // Into the p-layer contact
        Waypoint::wire(j.left_contact_x(), j.p_layer_y()),
    ]
}

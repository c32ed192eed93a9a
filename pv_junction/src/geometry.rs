//! Static layout of the scene: sun, junction layers, external circuit
//!
//! All coordinates are in the 800×560 logical canvas, origin top-left, y down.

use glam::Vec2;
use serde::Deserialize;

/// The light source photons are emitted from
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sun {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub ray_count: u32,
}

impl Default for Sun {
    fn default() -> Self {
        Self {
            x: 90.0,
            y: 70.0,
            radius: 45.0,
            ray_count: 12,
        }
    }
}

impl Sun {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Horizontal span and stacked layers of the PN-junction module
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Junction {
    pub left: f32,
    pub right: f32,
    pub glass_top: f32,
    pub glass_height: f32,
    pub n_layer_top: f32,
    pub n_layer_height: f32,
    pub depletion_top: f32,
    pub depletion_height: f32,
    pub p_layer_top: f32,
    pub p_layer_height: f32,
}

impl Default for Junction {
    fn default() -> Self {
        Self {
            left: 160.0,
            right: 540.0,
            glass_top: 175.0,
            glass_height: 14.0,
            n_layer_top: 193.0,
            n_layer_height: 50.0,
            depletion_top: 251.0,
            depletion_height: 40.0,
            p_layer_top: 299.0,
            p_layer_height: 50.0,
        }
    }
}

impl Junction {
    /// Vertical centre of the n-layer, where electrons run to the right contact
    pub fn n_layer_y(&self) -> f32 {
        self.n_layer_top + self.n_layer_height / 2.0
    }

    /// Vertical centre of the p-layer, where electrons re-enter
    pub fn p_layer_y(&self) -> f32 {
        self.p_layer_top + self.p_layer_height / 2.0
    }

    /// Far edge of the p-layer; holes disappear past it
    pub fn p_layer_bottom(&self) -> f32 {
        self.p_layer_top + self.p_layer_height
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Metal contact on the right of the n-layer
    pub fn right_contact_x(&self) -> f32 {
        self.right + 4.0
    }

    /// Metal contact on the left of the p-layer
    pub fn left_contact_x(&self) -> f32 {
        self.left - 4.0
    }
}

/// External circuit: top bus, bulb, bottom wire and the left-hand return leg
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Circuit {
    pub top_bus_x: f32,
    pub bulb_x: f32,
    pub bulb_top_y: f32,
    pub bulb_mid_y: f32,
    pub bulb_bottom_y: f32,
    pub bottom_wire_y: f32,
    pub left_bottom_x: f32,
    pub left_rise_y: f32,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            top_bus_x: 620.0,
            bulb_x: 660.0,
            bulb_top_y: 260.0,
            bulb_mid_y: 330.0,
            bulb_bottom_y: 400.0,
            bottom_wire_y: 490.0,
            left_bottom_x: 100.0,
            left_rise_y: 390.0,
        }
    }
}

/// Visible region; particles outside it are dropped even with life left
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: -50.0,
            max_x: 850.0,
            max_y: 620.0,
        }
    }
}

impl Bounds {
    pub fn contains(&self, position: Vec2) -> bool {
        position.x > self.min_x && position.x < self.max_x && position.y < self.max_y
    }
}

/// Everything the path builder, spawner and renderer need to know about layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneGeometry {
    pub sun: Sun,
    pub junction: Junction,
    pub circuit: Circuit,
    pub bounds: Bounds,
}

impl SceneGeometry {
    /// Sanity checks for hand-edited layouts
    pub fn validate(&self) -> Result<(), &'static str> {
        let j = &self.junction;
        let values = [
            j.left,
            j.right,
            j.glass_top,
            j.n_layer_top,
            j.depletion_top,
            j.p_layer_top,
            self.sun.radius,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("geometry values must be finite");
        }
        if j.right <= j.left {
            return Err("junction right edge must lie right of its left edge");
        }
        if j.depletion_top <= j.n_layer_top {
            return Err("depletion region must start below the n-layer top");
        }
        if j.p_layer_height <= 0.0 || j.n_layer_height <= 0.0 {
            return Err("junction layers must have positive height");
        }
        if self.sun.radius < 0.0 {
            return Err("sun radius must not be negative");
        }
        if self.bounds.max_x <= self.bounds.min_x {
            return Err("bounds must have positive width");
        }
        Ok(())
    }

    /// Band photons are aimed at: across the junction, n-layer top to depletion top
    pub fn absorption_band(&self) -> (Vec2, Vec2) {
        let j = &self.junction;
        let min = Vec2::new(j.left + 15.0, j.n_layer_top + 3.0);
        let max = Vec2::new(j.right - 15.0, j.depletion_top - 3.0);
        (min, max)
    }

    /// Whether a point is close enough to the bulb to light it
    pub fn near_bulb(&self, position: Vec2) -> bool {
        let c = &self.circuit;
        position.x >= c.bulb_x - 20.0
            && position.x <= c.bulb_x + 20.0
            && position.y >= c.bulb_top_y
            && position.y <= c.bulb_bottom_y + 30.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_derived_values() {
        let geometry = SceneGeometry::default();
        assert_eq!(geometry.junction.n_layer_y(), 218.0);
        assert_eq!(geometry.junction.p_layer_y(), 324.0);
        assert_eq!(geometry.junction.p_layer_bottom(), 349.0);
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn absorption_band_sits_above_depletion_region() {
        let geometry = SceneGeometry::default();
        let (min, max) = geometry.absorption_band();
        assert_eq!(min, Vec2::new(175.0, 196.0));
        assert_eq!(max, Vec2::new(525.0, 248.0));
    }

    #[test]
    fn bounds_use_open_interval() {
        let bounds = Bounds::default();
        assert!(bounds.contains(Vec2::new(0.0, 0.0)));
        assert!(!bounds.contains(Vec2::new(850.0, 10.0)));
        assert!(!bounds.contains(Vec2::new(-50.0, 10.0)));
        assert!(!bounds.contains(Vec2::new(10.0, 620.0)));
    }

    #[test]
    fn inverted_junction_is_rejected() {
        let mut geometry = SceneGeometry::default();
        geometry.junction.right = 100.0;
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn bulb_detection_box() {
        let geometry = SceneGeometry::default();
        assert!(geometry.near_bulb(Vec2::new(660.0, 330.0)));
        assert!(geometry.near_bulb(Vec2::new(675.0, 430.0)));
        assert!(!geometry.near_bulb(Vec2::new(620.0, 330.0)));
        assert!(!geometry.near_bulb(Vec2::new(660.0, 250.0)));
    }
}

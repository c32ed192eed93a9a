//! Decorative "built-in field" intensity shown over the depletion region

use crate::particle::{Particle, ParticleKind};

/// Upper bound of the displayed field strength
pub const FIELD_MAX: f32 = 100.0;
/// Contribution of each live electron to the target value
pub const PER_ELECTRON: f32 = 6.0;
/// Cap on the electron-driven part of the target
pub const ELECTRON_CAP: f32 = 95.0;
/// First-order smoothing factor applied every frame
pub const SMOOTHING: f32 = 0.08;

/// Smoothed field strength derived from the live electron population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStrength {
    pub current: f32,
    pub target: f32,
    pub max: f32,
    pub active_electrons: usize,
    pub smoothing: f32,
}

impl Default for FieldStrength {
    fn default() -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            max: FIELD_MAX,
            active_electrons: 0,
            smoothing: SMOOTHING,
        }
    }
}

impl FieldStrength {
    /// Recount electrons, retarget, and take one smoothing step
    pub fn update(&mut self, particles: &[Particle], elapsed: f32) {
        self.active_electrons = particles
            .iter()
            .filter(|p| p.kind() == ParticleKind::Electron)
            .count();

        let base = (self.active_electrons as f32 * PER_ELECTRON).min(ELECTRON_CAP);
        self.target = (base + fluctuation(elapsed)).clamp(0.0, self.max);
        self.approach_target();
    }

    /// Move `current` a fixed fraction of the way toward `target`
    pub fn approach_target(&mut self) {
        self.current += (self.target - self.current) * self.smoothing;
    }

    /// `current` as a fraction of `max`
    pub fn normalized(&self) -> f32 {
        if self.max > 0.0 {
            (self.current / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        *self = Self {
            max: self.max,
            smoothing: self.smoothing,
            ..Self::default()
        };
    }
}

/// Periodic wobble added to the target; two sines, purely cosmetic
pub fn fluctuation(elapsed: f32) -> f32 {
    (elapsed * 2.0).sin() * 8.0 + (elapsed * 5.0).sin() * 4.0
}

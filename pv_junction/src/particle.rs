//! Photons, carriers and absorption flashes
//!
//! Every particle shares a position and a lifetime budget; what it does each
//! tick depends on its [`Motion`]. Particles never change kind after creation.

use std::collections::VecDeque;

use glam::Vec2;

use crate::geometry::SceneGeometry;
use crate::path::{build_electron_path, Waypoint};

/// Photon speed, units per tick
pub const PHOTON_SPEED: f32 = 6.0;
/// Hole drift toward the p-contact, units per tick
pub const HOLE_DRIFT: f32 = 1.2;
/// Life lost by every particle on every tick
pub const LIFE_DECAY: f32 = 0.5;
/// Positions kept for a photon's motion trail
pub const TRAIL_LENGTH: usize = 6;

const PHOTON_LIFE: f32 = 100.0;
const ELECTRON_LIFE: f32 = 800.0;
const HOLE_LIFE: f32 = 160.0;
const FLASH_LIFE: f32 = 20.0;

const FLASH_GROWTH: f32 = 1.5;
const FLASH_FADE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Photon,
    Electron,
    Hole,
    Flash,
}

impl ParticleKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParticleKind::Photon => "photon",
            ParticleKind::Electron => "electron",
            ParticleKind::Hole => "hole",
            ParticleKind::Flash => "flash",
        }
    }
}

/// Kind-specific state
#[derive(Debug, Clone)]
pub enum Motion {
    Photon {
        velocity: Vec2,
        target: Vec2,
        trail: VecDeque<Vec2>,
    },
    Electron {
        path: Vec<Waypoint>,
        path_index: usize,
    },
    Hole,
    Flash {
        radius: f32,
        alpha: f32,
    },
}

/// Something a particle's update asks its owner to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleEvent {
    /// A photon reached its target; spawn a carrier pair here
    Absorbed(Vec2),
    /// An electron finished its trip around the circuit
    PathCompleted,
}

/// A single simulated entity
#[derive(Debug, Clone)]
pub struct Particle {
    pub id: u64,
    pub position: Vec2,
    pub life: f32,
    motion: Motion,
}

impl Particle {
    /// A photon travelling from `start` toward `target`.
    ///
    /// A zero-length (or otherwise non-finite) direction falls back to
    /// straight down so the velocity is always finite.
    pub fn photon(id: u64, start: Vec2, target: Vec2) -> Self {
        let direction = (target - start).try_normalize().unwrap_or(Vec2::Y);
        Self {
            id,
            position: start,
            life: PHOTON_LIFE,
            motion: Motion::Photon {
                velocity: direction * PHOTON_SPEED,
                target,
                trail: VecDeque::with_capacity(TRAIL_LENGTH),
            },
        }
    }

    /// An electron generated at `start`, routed through the circuit
    pub fn electron(id: u64, start: Vec2, geometry: &SceneGeometry) -> Self {
        Self::electron_with_path(id, start, build_electron_path(start, geometry))
    }

    /// An electron following an explicit route.
    ///
    /// # Panics
    ///
    /// Panics if `path` is empty.
    pub fn electron_with_path(id: u64, start: Vec2, path: Vec<Waypoint>) -> Self {
        assert!(!path.is_empty(), "electron path must contain at least one waypoint");
        Self {
            id,
            position: start,
            life: ELECTRON_LIFE,
            motion: Motion::Electron {
                path,
                path_index: 0,
            },
        }
    }

    pub fn hole(id: u64, start: Vec2) -> Self {
        Self {
            id,
            position: start,
            life: HOLE_LIFE,
            motion: Motion::Hole,
        }
    }

    pub fn flash(id: u64, start: Vec2) -> Self {
        Self {
            id,
            position: start,
            life: FLASH_LIFE,
            motion: Motion::Flash {
                radius: 1.0,
                alpha: 1.0,
            },
        }
    }

    pub fn kind(&self) -> ParticleKind {
        match self.motion {
            Motion::Photon { .. } => ParticleKind::Photon,
            Motion::Electron { .. } => ParticleKind::Electron,
            Motion::Hole => ParticleKind::Hole,
            Motion::Flash { .. } => ParticleKind::Flash,
        }
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Recent photon positions, oldest first; empty for other kinds
    pub fn trail(&self) -> impl Iterator<Item = Vec2> + '_ {
        let trail = match &self.motion {
            Motion::Photon { trail, .. } => Some(trail.iter().copied()),
            _ => None,
        };
        trail.into_iter().flatten()
    }

    /// Flash radius and alpha, if this is a flash
    pub fn flash_state(&self) -> Option<(f32, f32)> {
        match self.motion {
            Motion::Flash { radius, alpha } => Some((radius, alpha)),
            _ => None,
        }
    }

    /// Progress along the route, if this is an electron
    pub fn path_progress(&self) -> Option<(usize, usize)> {
        match &self.motion {
            Motion::Electron { path, path_index } => Some((*path_index, path.len())),
            _ => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// Advance one tick
    pub fn update(&mut self, geometry: &SceneGeometry) -> Option<ParticleEvent> {
        self.life -= LIFE_DECAY;

        match &mut self.motion {
            Motion::Photon {
                velocity,
                target,
                trail,
            } => {
                if trail.len() == TRAIL_LENGTH {
                    trail.pop_front();
                }
                trail.push_back(self.position);

                self.position += *velocity;

                if self.position.y >= target.y {
                    self.life = 0.0;
                    return Some(ParticleEvent::Absorbed(self.position));
                }
                None
            }
            Motion::Flash { radius, alpha } => {
                *radius += FLASH_GROWTH;
                *alpha -= FLASH_FADE;
                if *alpha <= 0.0 {
                    self.life = 0.0;
                }
                None
            }
            Motion::Electron { path, path_index } => {
                let Some(waypoint) = path.get(*path_index).copied() else {
                    self.life = 0.0;
                    return Some(ParticleEvent::PathCompleted);
                };

                let offset = waypoint.position - self.position;
                let distance = offset.length();

                if distance <= waypoint.speed {
                    self.position = waypoint.position;
                    *path_index += 1;
                    if *path_index >= path.len() {
                        self.life = 0.0;
                        return Some(ParticleEvent::PathCompleted);
                    }
                } else {
                    self.position += offset / distance * waypoint.speed;
                }
                None
            }
            Motion::Hole => {
                self.position.y += HOLE_DRIFT;
                if self.position.y > geometry.junction.p_layer_bottom() {
                    self.life = 0.0;
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photon_velocity_has_fixed_speed() {
        let p = Particle::photon(0, Vec2::new(90.0, 70.0), Vec2::new(300.0, 220.0));
        match p.motion() {
            Motion::Photon { velocity, .. } => {
                assert!((velocity.length() - PHOTON_SPEED).abs() < 1e-4);
                assert!(velocity.x > 0.0 && velocity.y > 0.0);
            }
            other => panic!("expected photon motion, got {:?}", other),
        }
        assert_eq!(p.life, 100.0);
    }

    #[test]
    fn degenerate_photon_falls_back_to_downward() {
        let at = Vec2::new(100.0, 100.0);
        let p = Particle::photon(0, at, at);
        match p.motion() {
            Motion::Photon { velocity, .. } => {
                assert!(velocity.is_finite());
                assert_eq!(*velocity, Vec2::new(0.0, PHOTON_SPEED));
            }
            other => panic!("expected photon motion, got {:?}", other),
        }
    }

    #[test]
    fn photon_absorption_is_terminal() {
        let geometry = SceneGeometry::default();
        let mut p = Particle::photon(0, Vec2::new(300.0, 200.0), Vec2::new(300.0, 210.0));
        assert_eq!(p.update(&geometry), None);
        assert!(p.is_alive());
        let event = p.update(&geometry);
        assert_eq!(event, Some(ParticleEvent::Absorbed(Vec2::new(300.0, 212.0))));
        assert_eq!(p.life, 0.0);
    }

    #[test]
    fn photon_trail_is_capped() {
        let geometry = SceneGeometry::default();
        let mut p = Particle::photon(0, Vec2::new(0.0, 0.0), Vec2::new(0.0, 500.0));
        for _ in 0..10 {
            p.update(&geometry);
        }
        let trail: Vec<Vec2> = p.trail().collect();
        assert_eq!(trail.len(), TRAIL_LENGTH);
        // Six most recent pre-move positions survive
        assert_eq!(trail.first().copied(), Some(Vec2::new(0.0, 24.0)));
        assert_eq!(trail.last().copied(), Some(Vec2::new(0.0, 54.0)));
    }

    #[test]
    fn flash_grows_and_fades_out() {
        let geometry = SceneGeometry::default();
        let mut p = Particle::flash(0, Vec2::ZERO);
        p.update(&geometry);
        let (radius, alpha) = p.flash_state().expect("flash state");
        assert!((radius - 2.5).abs() < 1e-5);
        assert!((alpha - 0.95).abs() < 1e-5);

        let mut ticks = 1;
        while p.is_alive() {
            p.update(&geometry);
            ticks += 1;
        }
        assert_eq!(ticks, 20);
        assert_eq!(p.kind(), ParticleKind::Flash);
    }

    #[test]
    fn hole_drifts_down_and_expires_past_p_layer() {
        let geometry = SceneGeometry::default();
        let mut p = Particle::hole(0, Vec2::new(300.0, 345.0));
        p.update(&geometry);
        assert!((p.position.y - 346.2).abs() < 1e-4);
        assert!(p.is_alive());
        for _ in 0..3 {
            p.update(&geometry);
        }
        assert!(!p.is_alive());
    }

    #[test]
    fn electron_snaps_and_advances() {
        let geometry = SceneGeometry::default();
        let path = vec![
            Waypoint { position: Vec2::new(0.0, 2.0), speed: 3.0 },
            Waypoint { position: Vec2::new(10.0, 2.0), speed: 3.0 },
        ];
        let mut p = Particle::electron_with_path(0, Vec2::ZERO, path);
        assert_eq!(p.update(&geometry), None);
        assert_eq!(p.position, Vec2::new(0.0, 2.0));
        assert_eq!(p.path_progress(), Some((1, 2)));

        p.update(&geometry);
        assert!((p.position.x - 3.0).abs() < 1e-5);
        p.update(&geometry);
        p.update(&geometry);
        assert!((p.position.x - 9.0).abs() < 1e-5);
        assert!(p.is_alive());

        // Final snap completes the route on the same update
        assert_eq!(p.update(&geometry), Some(ParticleEvent::PathCompleted));
        assert_eq!(p.position, Vec2::new(10.0, 2.0));
        assert_eq!(p.path_progress(), Some((2, 2)));
        assert!(!p.is_alive());
    }

    #[test]
    #[should_panic(expected = "at least one waypoint")]
    fn empty_electron_path_is_a_bug() {
        Particle::electron_with_path(0, Vec2::ZERO, Vec::new());
    }

    #[test]
    fn every_kind_loses_life_each_tick() {
        let geometry = SceneGeometry::default();
        let mut particles = vec![
            Particle::photon(0, Vec2::ZERO, Vec2::new(0.0, 500.0)),
            Particle::electron(1, Vec2::new(300.0, 220.0), &geometry),
            Particle::hole(2, Vec2::new(300.0, 220.0)),
            Particle::flash(3, Vec2::ZERO),
        ];
        let before: Vec<f32> = particles.iter().map(|p| p.life).collect();
        for p in &mut particles {
            p.update(&geometry);
        }
        for (p, life) in particles.iter().zip(before) {
            assert_eq!(p.life, life - LIFE_DECAY, "{}", p.kind().name());
        }
    }
}

//! Photovoltaic PN-Junction Animation
//!
//! The simulation core behind the "PV Principle Demo":
//!
//! - **Particles**: photons from the sun, electron/hole pairs and absorption flashes
//! - **Electron paths**: a fixed route out of the n-layer, through the bulb and back into the p-layer
//! - **Field strength**: a smoothed, decorative intensity driven by the live electron count
//! - **Timeline**: elapsed time mapped onto the narrated steps of the demo
//! - **Animation loop**: the Idle/Running state machine that ties it all together
//!
//! Rendering lives in the binary; the core only hands out [`FrameSnapshot`]s.

pub mod config;
pub mod geometry;
pub mod path;
pub mod particle;
pub mod field;
pub mod timeline;
pub mod scheduler;
pub mod animation;

pub use animation::{Animation, FrameSink, FrameSnapshot, PhaseNotice};
pub use config::{ConfigError, SceneConfig};
pub use geometry::SceneGeometry;
pub use particle::{Particle, ParticleKind};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use timeline::{Timeline, TimelineStep};

/// Tuning constants for the animation loop, in ticks and seconds
pub mod constants {
    /// Largest simulated step per frame, in seconds
    pub const MAX_DELTA: f32 = 0.05;

    /// Step used for the first frame after start and for non-positive gaps
    pub const DEFAULT_DELTA: f32 = 0.016;

    /// Frame time the spawn probability is calibrated against
    pub const NOMINAL_FRAME_DELTA: f32 = 0.016;

    /// Photon spawn probability per nominal frame
    pub const PHOTON_SPAWN_RATE: f32 = 0.38;

    /// Field pulse decay per second of elapsed time
    pub const PULSE_DECAY_RATE: f32 = 0.5;
}

//! Common utilities for the PV junction demo
//!
//! This crate provides the window/GPU setup and the 2D scene camera shared by
//! the desktop host. Nothing in here knows about particles or timelines.

pub mod graphics;
pub mod camera;

pub use graphics::*;
pub use camera::*;

/// Logical canvas the scene is authored in, in scene units.
pub mod canvas {
    pub const WIDTH: f32 = 800.0;
    pub const HEIGHT: f32 = 560.0;
}

/// Initialise `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

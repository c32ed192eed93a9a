//! The animation loop: an Idle/Running state machine over the particle scene
//!
//! Each delivered frame runs one tick in a fixed order: spawn photons, decay
//! the field pulse, update and prune particles, recompute the timeline phase,
//! refresh the field tracker, present. While running, the loop keeps exactly
//! one frame requested from its [`FrameScheduler`].

use glam::Vec2;
use rand::Rng;

use crate::config::SceneConfig;
use crate::constants::{
    DEFAULT_DELTA, MAX_DELTA, NOMINAL_FRAME_DELTA, PHOTON_SPAWN_RATE, PULSE_DECAY_RATE,
};
use crate::field::FieldStrength;
use crate::geometry::SceneGeometry;
use crate::particle::{Particle, ParticleEvent, ParticleKind};
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::timeline::{Timeline, TimelineStep};

/// Field strength above which the circuit shows current even before any
/// electron has completed a loop
const FLOW_FIELD_THRESHOLD: f32 = 10.0;

/// Mutable simulation state shared by the tick and the controls
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    pub is_animating: bool,
    pub elapsed: f32,
    pub phase: usize,
    pub particles: Vec<Particle>,
    pub field_pulse: f32,
    /// Electrons that made it all the way round the circuit this session
    pub loop_count: u64,
    next_id: u64,
}

impl AnimationState {
    /// Zero everything except the running flag
    fn clear(&mut self) {
        *self = Self {
            is_animating: self.is_animating,
            ..Self::default()
        };
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Electron, hole and flash at the absorption point
    pub fn spawn_pair(&mut self, at: Vec2, geometry: &SceneGeometry) {
        let electron = Particle::electron(self.next_id(), at, geometry);
        let hole = Particle::hole(self.next_id(), at);
        let flash = Particle::flash(self.next_id(), at);
        self.particles.extend([electron, hole, flash]);
        self.field_pulse = 1.0;
    }

    fn spawn_photon(&mut self, start: Vec2, target: Vec2) {
        let photon = Particle::photon(self.next_id(), start, target);
        self.particles.push(photon);
    }
}

/// Which narrated step is active, for UI highlighting
#[derive(Debug, Clone, Copy)]
pub struct PhaseNotice<'a> {
    pub index: usize,
    pub step: Option<&'a TimelineStep>,
    pub playing: bool,
}

impl PhaseNotice<'_> {
    pub fn label(&self) -> &str {
        self.step.map_or("Ready", |step| step.label.as_str())
    }

    pub fn info_text(&self) -> String {
        match self.step {
            Some(step) if self.playing => format!("Playing: {}", step.info),
            Some(step) => step.info.clone(),
            None => "Click play to start...".to_string(),
        }
    }
}

/// Read-only view of one frame, everything the renderer needs
#[derive(Debug, Clone, Copy)]
pub struct FrameSnapshot<'a> {
    pub particles: &'a [Particle],
    pub field: &'a FieldStrength,
    pub field_pulse: f32,
    pub phase: usize,
    pub loop_count: u64,
    pub elapsed: f32,
    pub is_animating: bool,
    pub geometry: &'a SceneGeometry,
}

impl FrameSnapshot<'_> {
    pub fn active_electrons(&self) -> usize {
        self.field.active_electrons
    }

    /// An electron is passing through the bulb
    pub fn bulb_lit(&self) -> bool {
        self.particles
            .iter()
            .any(|p| p.kind() == ParticleKind::Electron && self.geometry.near_bulb(p.position))
    }

    /// Whether to draw the moving "current flow" overlay on the wires
    pub fn current_flowing(&self) -> bool {
        self.loop_count > 0 || self.field.current > FLOW_FIELD_THRESHOLD
    }
}

/// Where frames and phase changes go; implemented by renderers and hosts
pub trait FrameSink {
    fn present(&mut self, frame: &FrameSnapshot<'_>);

    fn phase_changed(&mut self, _notice: &PhaseNotice<'_>) {}
}

/// A single PN-junction animation with its own RNG and frame source
pub struct Animation<R, S> {
    timeline: Timeline,
    geometry: SceneGeometry,
    rng: R,
    scheduler: S,
    state: AnimationState,
    field: FieldStrength,
    pending: Option<FrameHandle>,
    prev_time: Option<f64>,
}

impl<R: Rng, S: FrameScheduler> Animation<R, S> {
    pub fn new(config: &SceneConfig, rng: R, scheduler: S) -> Self {
        Self {
            timeline: config.timeline.clone(),
            geometry: config.geometry,
            rng,
            scheduler,
            state: AnimationState::default(),
            field: FieldStrength::default(),
            pending: None,
            prev_time: None,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn field(&self) -> &FieldStrength {
        &self.field
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn geometry(&self) -> &SceneGeometry {
        &self.geometry
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_animating
    }

    /// The frame this animation is waiting for, if running
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn snapshot(&self) -> FrameSnapshot<'_> {
        FrameSnapshot {
            particles: &self.state.particles,
            field: &self.field,
            field_pulse: self.state.field_pulse,
            phase: self.state.phase,
            loop_count: self.state.loop_count,
            elapsed: self.state.elapsed,
            is_animating: self.state.is_animating,
            geometry: &self.geometry,
        }
    }

    pub fn phase_notice(&self) -> PhaseNotice<'_> {
        PhaseNotice {
            index: self.state.phase,
            step: self
                .timeline
                .get(self.state.phase)
                .or_else(|| self.timeline.get(0)),
            playing: self.state.is_animating,
        }
    }

    /// Idle → Running with a fresh scene. No-op while already running.
    pub fn start(&mut self, sink: &mut impl FrameSink) {
        if self.state.is_animating {
            return;
        }

        self.state.clear();
        self.field.reset();
        self.prev_time = None;
        self.state.is_animating = true;
        log::info!("Animation started");

        sink.phase_changed(&self.phase_notice());
        sink.present(&self.snapshot());
        self.pending = Some(self.scheduler.request_frame());
    }

    /// Running → Idle. The last frame's particles and phase stay in place.
    pub fn stop(&mut self) {
        let was_running = self.state.is_animating;
        self.state.is_animating = false;
        self.cancel_pending();
        self.prev_time = None;
        if was_running {
            log::info!(
                "Animation stopped at {:.2}s ({} particles, {} loops)",
                self.state.elapsed,
                self.state.particles.len(),
                self.state.loop_count
            );
        }
    }

    pub fn toggle(&mut self, sink: &mut impl FrameSink) {
        if self.state.is_animating {
            self.stop();
        } else {
            self.start(sink);
        }
    }

    /// Back to Idle with an empty scene, redrawn immediately
    pub fn reset(&mut self, sink: &mut impl FrameSink) {
        self.stop();
        self.state.clear();
        self.field.reset();
        log::info!("Animation reset");

        sink.phase_changed(&self.phase_notice());
        sink.present(&self.snapshot());
    }

    /// Deliver a scheduled frame at wall-clock time `now` (seconds).
    ///
    /// Frames other than the pending one are ignored, so nothing runs after
    /// a stop. Returns whether a tick ran.
    pub fn on_frame(&mut self, handle: FrameHandle, now: f64, sink: &mut impl FrameSink) -> bool {
        if self.pending != Some(handle) {
            log::trace!("Ignoring stale frame {}", handle.id());
            return false;
        }
        self.pending = None;

        if !self.state.is_animating {
            return false;
        }

        let delta = self.frame_delta(now);
        self.tick(delta, sink);

        if self.state.is_animating {
            self.pending = Some(self.scheduler.request_frame());
        }
        true
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    /// Seconds since the previous frame, clamped so a stall cannot jump the scene
    fn frame_delta(&mut self, now: f64) -> f32 {
        let delta = match self.prev_time {
            Some(prev) => {
                let gap = (now - prev) as f32;
                if gap > 0.0 {
                    gap.min(MAX_DELTA)
                } else {
                    DEFAULT_DELTA
                }
            }
            None => DEFAULT_DELTA,
        };
        self.prev_time = Some(now);
        delta
    }

    fn tick(&mut self, delta: f32, sink: &mut impl FrameSink) {
        self.state.elapsed += delta;

        self.maybe_spawn_photon(delta);

        self.state.field_pulse = (self.state.field_pulse - delta * PULSE_DECAY_RATE).max(0.0);

        self.update_particles();
        self.update_phase(sink);

        self.field.update(&self.state.particles, self.state.elapsed);
        log::trace!(
            "tick {:.3}s: {} particles, field {:.1}",
            self.state.elapsed,
            self.state.particles.len(),
            self.field.current
        );

        sink.present(&self.snapshot());
    }

    fn maybe_spawn_photon(&mut self, delta: f32) {
        let chance = PHOTON_SPAWN_RATE * (delta / NOMINAL_FRAME_DELTA);
        if self.rng.gen::<f32>() >= chance {
            return;
        }

        let (band_min, band_max) = self.geometry.absorption_band();
        let target = Vec2::new(
            band_min.x + self.rng.gen::<f32>() * (band_max.x - band_min.x),
            band_min.y + self.rng.gen::<f32>() * (band_max.y - band_min.y),
        );

        // Biased toward the lower right of the disc, facing the junction
        let sun = self.geometry.sun;
        let spread = sun.radius * 0.8;
        let start = Vec2::new(
            sun.x + (self.rng.gen::<f32>() - 0.3) * spread,
            sun.y + (self.rng.gen::<f32>() - 0.3) * spread,
        );

        self.state.spawn_photon(start, target);
    }

    fn update_particles(&mut self) {
        let mut absorbed = Vec::new();
        for particle in &mut self.state.particles {
            match particle.update(&self.geometry) {
                Some(ParticleEvent::Absorbed(at)) => absorbed.push(at),
                Some(ParticleEvent::PathCompleted) => self.state.loop_count += 1,
                None => {}
            }
        }

        if !absorbed.is_empty() {
            log::debug!("{} photon(s) absorbed at {:.2}s", absorbed.len(), self.state.elapsed);
        }
        for at in absorbed {
            self.state.spawn_pair(at, &self.geometry);
        }

        let bounds = self.geometry.bounds;
        self.state
            .particles
            .retain(|p| p.is_alive() && bounds.contains(p.position));
    }

    fn update_phase(&mut self, sink: &mut impl FrameSink) {
        let Some(index) = self.timeline.phase_at(self.state.elapsed) else {
            return;
        };
        if index == self.state.phase {
            return;
        }

        self.state.phase = index;
        let notice = self.phase_notice();
        log::debug!("Phase {} '{}' at {:.2}s", index, notice.label(), self.state.elapsed);
        sink.phase_changed(&notice);
    }
}

//! # Engine Context
//!
//! One explicit object owns every piece of mutable simulation state: both
//! particle populations, the anchor, the RNG stream and the clock. There are
//! no process-wide singletons; two engines never share anything but an
//! `Arc<LiveSettings>` if the caller hands them the same one.
//!
//! ```text
//! on_frame(landmarks, dt):
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ 1. drain pending commits (whole commits only)                   │
//! │ 2. dt ← clamp(dt, 0, max_dt)                                    │
//! │ 3. mapper ← (source size, viewport)                             │
//! │ 4. anchor ← face landmarks (held when absent)                   │
//! │ 5. fingertip ← first hand, index tip, mapped                    │
//! │ 6. placements ← current state                                   │
//! │ 7. brush: kicks and pushes near the fingertip                   │
//! │ 8. integrate: decay → advance → veil relax                      │
//! │ 9. placements ← post-step state; composite three passes         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine schedules nothing. A driver calls [`Engine::on_frame`] with the
//! latest landmarks and its own wall-clock delta.

use std::sync::Arc;

use halo_shared::{Color, LandmarkFrame, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::compositor::{Compositor, DrawList};
use crate::config::{HaloConfig, LiveSettings, SettingsUpdate};
use crate::error::HaloResult;
use crate::geometry::{Placement, Projection};
use crate::particles::{CommitReceipt, Particle, ParticleStore};
use crate::simulation::{clamp_dt, InteractionField, Integrator};
use crate::sync::{CommitQueue, CommitSender, PendingCommit};
use crate::tokenizer::Tokenizer;
use crate::tracking::{AnchorState, AnchorTracker, CoordinateMapper};

/// Viewport assumed until the driver reports one.
pub const DEFAULT_VIEWPORT: (f32, f32) = (1280.0, 720.0);

/// Saturation of commit hues.
const COMMIT_SATURATION: f32 = 0.85;
/// Lightness of commit hues.
const COMMIT_LIGHTNESS: f32 = 0.65;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Ticks run so far, this one included.
    pub frame: u64,
    /// Clamped time step actually integrated.
    pub dt: f32,
    /// Orbit population after the tick.
    pub orbit: usize,
    /// Veil population after the tick.
    pub veil: usize,
    /// Queued commits applied at the start of the tick.
    pub commits_applied: usize,
    /// Orbit particles inside the brush radius.
    pub orbit_pushed: usize,
    /// Veil particles inside the brush radius.
    pub veil_pushed: usize,
    /// Glyphs emitted.
    pub glyphs: usize,
    /// A face was detected this tick.
    pub face_present: bool,
    /// A fingertip was detected this tick.
    pub fingertip_present: bool,
}

/// The simulation context.
#[derive(Debug)]
pub struct Engine {
    config: HaloConfig,
    live: Arc<LiveSettings>,
    tokenizer: Tokenizer,
    store: ParticleStore,
    viewport: Vec2,
    source_size: Option<Vec2>,
    mapper: CoordinateMapper,
    anchor: AnchorTracker,
    field: InteractionField,
    integrator: Integrator,
    compositor: Compositor,
    draw_list: DrawList,
    placements: Vec<Placement>,
    rng: ChaCha8Rng,
    queue: CommitQueue,
    /// Simulated seconds (sum of clamped deltas).
    clock: f64,
    frame: u64,
    stats: FrameStats,
}

impl Engine {
    /// Creates an engine after validating `config`.
    pub fn new(config: HaloConfig, live: Arc<LiveSettings>) -> HaloResult<Self> {
        config.validate()?;
        Ok(Self::build(config, live))
    }

    /// Creates an engine with default tuning and fresh live settings.
    #[must_use]
    pub fn with_defaults() -> Self {
        let config = HaloConfig::default();
        let live = Arc::new(LiveSettings::new(&config.live));
        Self::build(config, live)
    }

    fn build(config: HaloConfig, live: Arc<LiveSettings>) -> Self {
        let viewport = Vec2::new(DEFAULT_VIEWPORT.0, DEFAULT_VIEWPORT.1);
        let center = viewport * 0.5;
        let store = ParticleStore::new(
            config.capacity.clone(),
            config.orbit.clone(),
            config.veil.clone(),
        );

        tracing::debug!(
            orbit_capacity = config.capacity.orbit_capacity(),
            max_particles = config.capacity.max_particles,
            seed = config.simulation.seed,
            "engine created"
        );

        Self {
            tokenizer: Tokenizer::new(config.tokenizer.clone()),
            store,
            viewport,
            source_size: None,
            mapper: CoordinateMapper::new(viewport.x, viewport.y, viewport.x, viewport.y),
            anchor: AnchorTracker::new(config.anchor.clone(), center),
            field: InteractionField::new(config.interaction.clone()),
            integrator: Integrator::new(config.orbit.clone(), config.veil.clone()),
            compositor: Compositor::new(config.render.clone()),
            draw_list: DrawList::new(),
            placements: Vec::with_capacity(config.capacity.max_particles),
            rng: ChaCha8Rng::seed_from_u64(config.simulation.seed),
            queue: CommitQueue::new(config.simulation.commit_queue_capacity),
            clock: 0.0,
            frame: 0,
            stats: FrameStats::default(),
            live,
            config,
        }
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// A handle other threads can queue commits through.
    #[must_use]
    pub fn commit_sender(&self) -> CommitSender {
        self.queue.sender()
    }

    /// Tokenizes `text` and adds its particles immediately.
    ///
    /// On error nothing is added. Blank text is an empty, successful commit.
    pub fn try_commit_text(&mut self, text: &str) -> HaloResult<CommitReceipt> {
        let tokens = self.tokenizer.prepare(text)?;
        if tokens.is_empty() {
            return Ok(CommitReceipt::default());
        }
        let hue = self.rng.gen_range(0.0..360.0);
        let color = Color::from_hsl(hue, COMMIT_SATURATION, COMMIT_LIGHTNESS);
        Ok(self.store.commit(&tokens, color, self.clock, &mut self.rng))
    }

    /// Commits `text`, logging and dropping it if it is rejected.
    pub fn commit_text(&mut self, text: &str) {
        if let Err(err) = self.try_commit_text(text) {
            tracing::warn!(error = %err, "commit rejected, particles unchanged");
        }
    }

    /// Removes every particle and restarts the id and orbit counters.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    fn apply_pending(&mut self) -> usize {
        let pending = self.queue.drain();
        let applied = pending.len();
        for commit in pending {
            match commit {
                PendingCommit::Text(text) => self.commit_text(&text),
                PendingCommit::Clear => self.clear(),
            }
        }
        applied
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Sets the viewport size in pixels.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let viewport = Vec2::new(width, height);
        if !viewport.is_finite() || width <= 0.0 || height <= 0.0 {
            tracing::warn!(width, height, "ignoring degenerate viewport");
            return;
        }
        self.viewport = viewport;
        self.anchor.recenter_if_idle(viewport * 0.5);
        self.rebuild_mapper();
    }

    /// Sets the source video size in pixels.
    pub fn set_source_size(&mut self, width: f32, height: f32) {
        self.source_size = Some(Vec2::new(width, height));
        self.rebuild_mapper();
    }

    fn rebuild_mapper(&mut self) {
        let source = self.source_size.unwrap_or(self.viewport);
        self.mapper = CoordinateMapper::new(source.x, source.y, self.viewport.x, self.viewport.y);
    }

    /// Applies a live settings update; effective from the next read.
    pub fn set_config(&self, update: SettingsUpdate) {
        self.live.apply(update);
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Runs one tick and returns this frame's draw list.
    pub fn on_frame(&mut self, frame: &LandmarkFrame, raw_dt: f32) -> &DrawList {
        let commits_applied = self.apply_pending();

        let dt = clamp_dt(raw_dt, self.config.simulation.max_dt);
        self.clock += f64::from(dt);
        self.frame += 1;

        if let Some((w, h)) = frame.source_size {
            if self.source_size != Some(Vec2::new(w, h)) {
                self.set_source_size(w, h);
            }
        }

        let anchor = self.anchor.update(frame.face.as_ref(), &self.mapper);
        let fingertip = frame
            .fingertip()
            .filter(|tip| tip.is_finite())
            .map(|tip| self.mapper.map_landmark(tip));
        let settings = self.live.snapshot();
        let projection = Projection::new(anchor, &self.config.orbit, &self.config.veil);

        self.placements.clear();
        self.placements
            .extend(self.store.iter().map(|p| projection.place(p)));
        let pushed = self.field.apply(
            fingertip,
            self.store.iter_mut(),
            &self.placements,
            &projection,
            dt,
        );

        self.integrator
            .step(self.store.iter_mut(), dt, settings.speed_multiplier);

        self.placements.clear();
        self.placements
            .extend(self.store.iter().map(|p| projection.place(p)));
        let particles: Vec<&Particle> = self.store.iter().collect();
        self.compositor.compose(
            &particles,
            &self.placements,
            anchor,
            self.viewport,
            &settings,
            &mut self.draw_list,
        );

        self.stats = FrameStats {
            frame: self.frame,
            dt,
            orbit: self.store.orbit_len(),
            veil: self.store.veil_len(),
            commits_applied,
            orbit_pushed: pushed.orbit_pushed,
            veil_pushed: pushed.veil_pushed,
            glyphs: particles.len(),
            face_present: anchor.face_present,
            fingertip_present: fingertip.is_some(),
        };
        tracing::trace!(
            frame = self.frame,
            dt,
            orbit = self.stats.orbit,
            veil = self.stats.veil,
            "tick"
        );
        &self.draw_list
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Static configuration.
    #[must_use]
    pub fn config(&self) -> &HaloConfig {
        &self.config
    }

    /// Shared live settings.
    #[must_use]
    pub fn live(&self) -> &Arc<LiveSettings> {
        &self.live
    }

    /// Both populations.
    #[must_use]
    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Every particle, orbit first.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.store.iter()
    }

    /// Current head geometry.
    #[must_use]
    pub fn anchor(&self) -> &AnchorState {
        self.anchor.state()
    }

    /// Current coordinate projection.
    #[must_use]
    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Viewport size in pixels.
    #[must_use]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Where `particle` would be drawn with the current anchor.
    #[must_use]
    pub fn place(&self, particle: &Particle) -> Placement {
        Projection::new(self.anchor.state(), &self.config.orbit, &self.config.veil).place(particle)
    }

    /// Post-step placements of the last tick, parallel to [`Self::particles`].
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Draw list of the last tick.
    #[must_use]
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Statistics of the last tick.
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Simulated seconds so far.
    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

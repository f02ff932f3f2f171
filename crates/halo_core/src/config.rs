//! # Engine Configuration
//!
//! Two kinds of configuration live here:
//!
//! - [`HaloConfig`]: static tuning, loaded once from TOML at startup. Every
//!   section defaults, so a file only names what it overrides.
//! - [`LiveSettings`]: the handful of scalars a control surface may change
//!   while frames are running (font size, speed, color mode, global color).
//!   Each one is a single atomic, so assignment needs no lock and takes
//!   effect the next time the engine reads it.
//!
//! ```toml
//! [capacity]
//! lane_capacity = 20
//! max_particles = 600
//!
//! [live]
//! color_mode = "global"
//! global_color = 0xFF3366
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use halo_shared::Color;
use serde::{Deserialize, Serialize};

use crate::error::{HaloError, HaloResult};

// =============================================================================
// STATIC CONFIGURATION
// =============================================================================

/// Complete static configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HaloConfig {
    /// Population bounds.
    pub capacity: CapacityConfig,
    /// Orbit ring geometry and dynamics.
    pub orbit: OrbitConfig,
    /// Veil sampling and dynamics.
    pub veil: VeilConfig,
    /// Head anchor tracking.
    pub anchor: AnchorConfig,
    /// Fingertip brush.
    pub interaction: InteractionConfig,
    /// Per-glyph draw parameters.
    pub render: RenderConfig,
    /// Text splitting.
    pub tokenizer: TokenizerConfig,
    /// Tick parameters.
    pub simulation: SimulationConfig,
    /// Initial values of the live settings.
    pub live: LiveDefaults,
}

/// Population bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityConfig {
    /// Orbit slots per lane.
    pub lane_capacity: usize,
    /// Number of concentric lanes.
    pub max_lanes: usize,
    /// Global cap on orbit + veil particles.
    pub max_particles: usize,
    /// Veil particles spawned per token on an empty store.
    pub veil_min_per_token: usize,
    /// Veil particles per token never exceed this.
    pub veil_max_per_token: usize,
    /// Orbit commits needed to add one more veil particle per token.
    pub veil_density_step: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            lane_capacity: 24,
            max_lanes: 5,
            max_particles: 900,
            veil_min_per_token: 2,
            veil_max_per_token: 8,
            veil_density_step: 6,
        }
    }
}

impl CapacityConfig {
    /// Total orbit slots (`lane_capacity * max_lanes`).
    #[must_use]
    pub fn orbit_capacity(&self) -> usize {
        self.lane_capacity * self.max_lanes
    }
}

/// Orbit ring geometry and dynamics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrbitConfig {
    /// Innermost ring radius as a multiple of the head ellipse x radius.
    pub base_radius_factor: f32,
    /// Pixels between consecutive lanes.
    pub lane_gap: f32,
    /// Ring y radius as a fraction of its x radius.
    pub ellipse_y_scale: f32,
    /// Angular speed of lane 0 (rad/s).
    pub omega_base: f32,
    /// Outer lanes turn at `omega_base / (1 + lane * falloff)`.
    pub lane_omega_falloff: f32,
    /// Extra starting phase per lane (rad), so lanes do not line up.
    pub lane_phase: f32,
    /// Time constant of the outward push decay (s).
    pub radius_tau: f32,
    /// Time constant of the angular kick decay (s).
    pub omega_tau: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            base_radius_factor: 1.05,
            lane_gap: 28.0,
            ellipse_y_scale: 0.28,
            omega_base: 0.6,
            lane_omega_falloff: 0.15,
            lane_phase: 0.35,
            radius_tau: 0.6,
            omega_tau: 0.9,
        }
    }
}

/// Veil sampling and dynamics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VeilConfig {
    /// Time constant of the return to the drifting rest target (s).
    pub relax_tau: f32,
    /// Drift radius in local units at `u = 1`.
    pub drift_amplitude: f32,
    /// Drift cycles per radian of the particle's own rotation.
    pub drift_frequency: f32,
    /// Local coordinates stay in `[-local_clamp, local_clamp]`.
    pub local_clamp: f32,
    /// Vertical bias range sampled at creation (negative = up).
    pub bias_range: [f32; 2],
    /// Bias in units of the veil y radius.
    pub bias_scale: f32,
    /// Rotational drift speed range (rad/s).
    pub omega_range: [f32; 2],
}

impl Default for VeilConfig {
    fn default() -> Self {
        Self {
            relax_tau: 0.45,
            drift_amplitude: 0.08,
            drift_frequency: 1.7,
            local_clamp: 1.5,
            bias_range: [-1.0, 0.25],
            bias_scale: 0.22,
            omega_range: [0.04, 0.16],
        }
    }
}

/// Head anchor tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnchorConfig {
    /// Low-pass factor per frame, `(0, 1]`.
    pub smoothing: f32,
    /// Pixels added to the face-box center y (negative lifts toward the crown).
    pub vertical_offset: f32,
    /// Plausible face width in pixels.
    pub face_width_range: [f32; 2],
    /// Plausible face height in pixels.
    pub face_height_range: [f32; 2],
    /// Face size assumed before the first detection.
    pub default_face_size: [f32; 2],
    /// Occlusion ellipse radii as multiples of face width/height.
    pub head_scale: [f32; 2],
    /// Veil ellipse radii as multiples of face width/height.
    pub veil_scale: [f32; 2],
    /// Silhouette inflation of the face oval (x, y).
    pub silhouette_scale: [f32; 2],
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.25,
            vertical_offset: -36.0,
            face_width_range: [60.0, 900.0],
            face_height_range: [80.0, 1200.0],
            default_face_size: [220.0, 280.0],
            head_scale: [0.62, 0.8],
            veil_scale: [0.72, 0.86],
            silhouette_scale: [1.35, 1.9],
        }
    }
}

/// Fingertip brush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionConfig {
    /// Pixels; no effect at or beyond this distance.
    pub influence_radius: f32,
    /// Outward push added to `radius_offset` (px/s at full weight).
    pub repel_strength: f32,
    /// Angular kick added to `omega_offset` (rad/s² at full weight).
    pub swirl_strength: f32,
    /// Local-space veil displacement (units/s at full weight).
    pub veil_push_strength: f32,
    /// Pushed veil coordinates stay in `[-veil_push_clamp, veil_push_clamp]`.
    pub veil_push_clamp: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            influence_radius: 140.0,
            repel_strength: 900.0,
            swirl_strength: 7.0,
            veil_push_strength: 6.0,
            veil_push_clamp: 1.5,
        }
    }
}

/// Per-glyph draw parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Orbit font scale at depth -1 and +1.
    pub orbit_font_scale: [f32; 2],
    /// Orbit opacity at depth -1 and +1.
    pub orbit_alpha: [f32; 2],
    /// Veil font scale.
    pub veil_font_scale: f32,
    /// Veil opacity at `u = 1` and `u = 0`.
    pub veil_alpha: [f32; 2],
    /// Emit anchor and silhouette outlines after the glyph passes.
    pub debug_overlay: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            orbit_font_scale: [0.7, 1.25],
            orbit_alpha: [0.3, 1.0],
            veil_font_scale: 0.85,
            veil_alpha: [0.12, 0.85],
            debug_overlay: false,
        }
    }
}

/// How committed text is cut into glyph tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenGranularity {
    /// Word runs stay whole, everything else is one grapheme per token.
    #[default]
    Words,
    /// Every grapheme cluster is its own token.
    Graphemes,
}

/// Text splitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizerConfig {
    /// Token granularity.
    pub granularity: TokenGranularity,
    /// Commits longer than this (in chars) are rejected whole.
    pub max_commit_chars: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            granularity: TokenGranularity::Words,
            max_commit_chars: 280,
        }
    }
}

/// Tick parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Largest time step ever integrated (s).
    pub max_dt: f32,
    /// Seed of the sampling RNG.
    pub seed: u64,
    /// Pending commits held between ticks.
    pub commit_queue_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_dt: 0.05,
            seed: 0x5EED,
            commit_queue_capacity: 64,
        }
    }
}

/// Initial values of the live settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveDefaults {
    /// Base glyph size in pixels.
    pub font_size: f32,
    /// Multiplier on every intrinsic angular speed.
    pub speed_multiplier: f32,
    /// Glyph color source.
    pub color_mode: ColorMode,
    /// `0xRRGGBB` used in [`ColorMode::Global`].
    pub global_color: u32,
}

impl Default for LiveDefaults {
    fn default() -> Self {
        Self {
            font_size: 28.0,
            speed_multiplier: 1.0,
            color_mode: ColorMode::PerCommit,
            global_color: 0xFF_FF_FF,
        }
    }
}

impl HaloConfig {
    /// Parses a TOML document; missing sections and fields keep defaults.
    pub fn from_toml_str(source: &str) -> HaloResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> HaloResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> HaloResult<()> {
        let c = &self.capacity;
        at_least_one("capacity.lane_capacity", c.lane_capacity)?;
        at_least_one("capacity.max_lanes", c.max_lanes)?;
        at_least_one("capacity.max_particles", c.max_particles)?;
        at_least_one("capacity.veil_density_step", c.veil_density_step)?;
        if c.veil_min_per_token > c.veil_max_per_token {
            return Err(invalid(
                "capacity.veil_min_per_token",
                format!("{} exceeds veil_max_per_token {}", c.veil_min_per_token, c.veil_max_per_token),
            ));
        }

        positive("orbit.ellipse_y_scale", self.orbit.ellipse_y_scale)?;
        positive("orbit.radius_tau", self.orbit.radius_tau)?;
        positive("orbit.omega_tau", self.orbit.omega_tau)?;
        non_negative("orbit.lane_gap", self.orbit.lane_gap)?;
        non_negative("orbit.lane_omega_falloff", self.orbit.lane_omega_falloff)?;

        positive("veil.relax_tau", self.veil.relax_tau)?;
        positive("veil.local_clamp", self.veil.local_clamp)?;
        ordered("veil.bias_range", self.veil.bias_range)?;
        ordered("veil.omega_range", self.veil.omega_range)?;

        let a = &self.anchor;
        if !(a.smoothing > 0.0 && a.smoothing <= 1.0) {
            return Err(invalid("anchor.smoothing", format!("{} not in (0, 1]", a.smoothing)));
        }
        ordered("anchor.face_width_range", a.face_width_range)?;
        ordered("anchor.face_height_range", a.face_height_range)?;
        positive("anchor.face_width_range", a.face_width_range[0])?;
        positive("anchor.face_height_range", a.face_height_range[0])?;
        positive("anchor.head_scale", a.head_scale[0].min(a.head_scale[1]))?;
        positive("anchor.veil_scale", a.veil_scale[0].min(a.veil_scale[1]))?;

        positive("interaction.influence_radius", self.interaction.influence_radius)?;
        positive("interaction.veil_push_clamp", self.interaction.veil_push_clamp)?;

        ordered("render.orbit_font_scale", self.render.orbit_font_scale)?;
        ordered("render.orbit_alpha", self.render.orbit_alpha)?;
        ordered("render.veil_alpha", self.render.veil_alpha)?;

        at_least_one("tokenizer.max_commit_chars", self.tokenizer.max_commit_chars)?;
        positive("simulation.max_dt", self.simulation.max_dt)?;
        at_least_one(
            "simulation.commit_queue_capacity",
            self.simulation.commit_queue_capacity,
        )?;
        positive("live.font_size", self.live.font_size)?;
        non_negative("live.speed_multiplier", self.live.speed_multiplier)?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> HaloError {
    HaloError::Config { field, reason }
}

fn positive(field: &'static str, value: f32) -> HaloResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be > 0")))
    }
}

fn non_negative(field: &'static str, value: f32) -> HaloResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be >= 0")))
    }
}

fn at_least_one(field: &'static str, value: usize) -> HaloResult<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(invalid(field, "must be >= 1".to_string()))
    }
}

fn ordered(field: &'static str, range: [f32; 2]) -> HaloResult<()> {
    if range[0].is_finite() && range[1].is_finite() && range[0] <= range[1] {
        Ok(())
    } else {
        Err(invalid(field, format!("[{}, {}] is not an ordered range", range[0], range[1])))
    }
}

// =============================================================================
// LIVE SETTINGS
// =============================================================================

/// Where glyph colors come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Every glyph uses the configured global color.
    Global,
    /// Every glyph uses the hue assigned to its commit.
    #[default]
    PerCommit,
}

impl ColorMode {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Global => 0,
            Self::PerCommit => 1,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Global,
            _ => Self::PerCommit,
        }
    }
}

/// Live-adjustable scalars shared with a control surface.
///
/// Each field is one atomic. Readers may observe a mix of old and new
/// fields within one tick; every field individually is always whole.
#[derive(Debug)]
pub struct LiveSettings {
    font_size: AtomicU32,
    speed_multiplier: AtomicU32,
    color_mode: AtomicU8,
    global_color: AtomicU32,
}

/// A partial update, as sent by a settings panel. `None` leaves a field as is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsUpdate {
    /// New base glyph size in pixels.
    pub font_size: Option<f32>,
    /// New speed multiplier.
    pub speed_multiplier: Option<f32>,
    /// New color source.
    pub color_mode: Option<ColorMode>,
    /// New global color.
    pub global_color: Option<Color>,
}

/// Plain copy of the live settings at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsSnapshot {
    /// Base glyph size in pixels.
    pub font_size: f32,
    /// Multiplier on every intrinsic angular speed.
    pub speed_multiplier: f32,
    /// Glyph color source.
    pub color_mode: ColorMode,
    /// Color used in [`ColorMode::Global`].
    pub global_color: Color,
}

impl LiveSettings {
    /// Creates live settings from their configured initial values.
    #[must_use]
    pub fn new(defaults: &LiveDefaults) -> Self {
        Self {
            font_size: AtomicU32::new(defaults.font_size.to_bits()),
            speed_multiplier: AtomicU32::new(defaults.speed_multiplier.to_bits()),
            color_mode: AtomicU8::new(defaults.color_mode.to_u8()),
            global_color: AtomicU32::new(defaults.global_color & 0x00FF_FFFF),
        }
    }

    /// Base glyph size in pixels.
    #[inline]
    #[must_use]
    pub fn font_size(&self) -> f32 {
        f32::from_bits(self.font_size.load(Ordering::Relaxed))
    }

    /// Multiplier on every intrinsic angular speed.
    #[inline]
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        f32::from_bits(self.speed_multiplier.load(Ordering::Relaxed))
    }

    /// Glyph color source.
    #[inline]
    #[must_use]
    pub fn color_mode(&self) -> ColorMode {
        ColorMode::from_u8(self.color_mode.load(Ordering::Relaxed))
    }

    /// Color used in [`ColorMode::Global`].
    #[inline]
    #[must_use]
    pub fn global_color(&self) -> Color {
        Color::hex_rgb(self.global_color.load(Ordering::Relaxed))
    }

    /// Sets the base glyph size. Non-finite values are ignored.
    pub fn set_font_size(&self, px: f32) {
        if px.is_finite() {
            self.font_size.store(px.max(0.0).to_bits(), Ordering::Relaxed);
        }
    }

    /// Sets the speed multiplier. Non-finite values are ignored.
    pub fn set_speed_multiplier(&self, multiplier: f32) {
        if multiplier.is_finite() {
            self.speed_multiplier
                .store(multiplier.max(0.0).to_bits(), Ordering::Relaxed);
        }
    }

    /// Sets the color source.
    pub fn set_color_mode(&self, mode: ColorMode) {
        self.color_mode.store(mode.to_u8(), Ordering::Relaxed);
    }

    /// Sets the global color (alpha is ignored).
    pub fn set_global_color(&self, color: Color) {
        self.global_color.store(color.to_hex_rgb(), Ordering::Relaxed);
    }

    /// Applies every field present in `update`.
    pub fn apply(&self, update: SettingsUpdate) {
        if let Some(px) = update.font_size {
            self.set_font_size(px);
        }
        if let Some(multiplier) = update.speed_multiplier {
            self.set_speed_multiplier(multiplier);
        }
        if let Some(mode) = update.color_mode {
            self.set_color_mode(mode);
        }
        if let Some(color) = update.global_color {
            self.set_global_color(color);
        }
    }

    /// Reads every field once.
    #[must_use]
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            font_size: self.font_size(),
            speed_multiplier: self.speed_multiplier(),
            color_mode: self.color_mode(),
            global_color: self.global_color(),
        }
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::new(&LiveDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        HaloConfig::default().validate().unwrap();
        assert_eq!(HaloConfig::default().capacity.orbit_capacity(), 120);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HaloConfig::from_toml_str(
            r#"
            [capacity]
            lane_capacity = 10

            [tokenizer]
            granularity = "graphemes"

            [live]
            color_mode = "global"
            global_color = 0xFF3366
            "#,
        )
        .unwrap();

        assert_eq!(config.capacity.lane_capacity, 10);
        assert_eq!(config.capacity.max_lanes, CapacityConfig::default().max_lanes);
        assert_eq!(config.tokenizer.granularity, TokenGranularity::Graphemes);
        assert_eq!(config.live.color_mode, ColorMode::Global);
        assert_eq!(config.live.global_color, 0xFF3366);
        assert_eq!(config.orbit, OrbitConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = HaloConfig::from_toml_str("[capacity]\nmax_lanes = 0\n").unwrap_err();
        assert!(matches!(err, HaloError::Config { field: "capacity.max_lanes", .. }));

        let err = HaloConfig::from_toml_str("[anchor]\nsmoothing = 1.5\n").unwrap_err();
        assert!(matches!(err, HaloError::Config { field: "anchor.smoothing", .. }));

        let err = HaloConfig::from_toml_str("[orbit]\nno_such_field = 1\n").unwrap_err();
        assert!(matches!(err, HaloError::ConfigParse(_)));
    }

    #[test]
    fn test_live_settings_apply() {
        let live = LiveSettings::default();
        live.apply(SettingsUpdate {
            font_size: Some(40.0),
            speed_multiplier: Some(f32::NAN),
            color_mode: Some(ColorMode::Global),
            global_color: Some(Color::hex_rgb(0x00FF00)),
        });

        let snap = live.snapshot();
        assert_eq!(snap.font_size, 40.0);
        assert_eq!(snap.speed_multiplier, 1.0);
        assert_eq!(snap.color_mode, ColorMode::Global);
        assert_eq!(snap.global_color.to_hex_rgb(), 0x00FF00);
    }
}

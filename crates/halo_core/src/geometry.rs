//! Particle state → screen placement.
//!
//! The one projection shared by the brush (which needs this frame's
//! drawable positions) and the compositor (which draws them).
//!
//! - Orbit: ellipse around the anchor,
//!   `rx = head_rx * base_radius_factor + lane * lane_gap + radius_offset`,
//!   `ry = rx * ellipse_y_scale`, parameterized by `theta`.
//! - Veil: `anchor + (veil_rx * r.x, veil_ry * r.y + bias_y * veil_ry * bias_scale)`
//!   with `r = local` rotated by the particle's own `theta`.

use halo_shared::{Vec2, EPSILON};

use crate::config::{OrbitConfig, VeilConfig};
use crate::particles::{OrbitState, Particle, ParticleKind, VeilState};
use crate::tracking::AnchorState;

/// Where a particle is drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Screen position in pixels.
    pub position: Vec2,
    /// `sin(theta)`; negative is behind the head.
    pub depth: f32,
}

/// Projection parameters for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Projection<'a> {
    anchor: &'a AnchorState,
    orbit: &'a OrbitConfig,
    veil: &'a VeilConfig,
}

impl<'a> Projection<'a> {
    /// Binds the anchor and geometry config of the current frame.
    #[must_use]
    pub fn new(anchor: &'a AnchorState, orbit: &'a OrbitConfig, veil: &'a VeilConfig) -> Self {
        Self { anchor, orbit, veil }
    }

    /// Places any particle.
    #[must_use]
    pub fn place(&self, particle: &Particle) -> Placement {
        match &particle.kind {
            ParticleKind::Orbit(orbit) => self.place_orbit(orbit),
            ParticleKind::Veil(veil) => self.place_veil(veil),
        }
    }

    /// Ring radii of an orbit particle, including its transient push.
    #[must_use]
    pub fn orbit_radii(&self, orbit: &OrbitState) -> Vec2 {
        let base = self.anchor.head_radii.x * self.orbit.base_radius_factor;
        let rx = (base + orbit.lane as f32 * self.orbit.lane_gap + orbit.motion.radius_offset)
            .max(0.0);
        Vec2::new(rx, rx * self.orbit.ellipse_y_scale)
    }

    /// Places an orbit particle.
    #[must_use]
    pub fn place_orbit(&self, orbit: &OrbitState) -> Placement {
        let radii = self.orbit_radii(orbit);
        let (sin, cos) = orbit.motion.angle().sin_cos();
        Placement {
            position: self.anchor.position + Vec2::new(radii.x * cos, radii.y * sin),
            depth: sin,
        }
    }

    /// Places a veil particle.
    #[must_use]
    pub fn place_veil(&self, veil: &VeilState) -> Placement {
        let radii = self.anchor.veil_radii;
        let rotated = veil.local.rotate(veil.motion.angle());
        let bias = veil.bias_y * radii.y * self.veil.bias_scale;
        Placement {
            position: self.anchor.position + Vec2::new(radii.x * rotated.x, radii.y * rotated.y + bias),
            depth: veil.motion.depth(),
        }
    }

    /// Expresses a screen-space direction in a veil particle's local frame
    /// (ellipse-normalized, then un-rotated), as a unit vector.
    ///
    /// Returns `None` when the direction degenerates.
    #[must_use]
    pub fn screen_dir_to_local(&self, veil: &VeilState, dir: Vec2) -> Option<Vec2> {
        let radii = self.anchor.veil_radii;
        let normalized = Vec2::new(dir.x / radii.x.max(EPSILON), dir.y / radii.y.max(EPSILON));
        let local = normalized.rotate(-veil.motion.angle());
        (local.length() >= EPSILON).then(|| local.normalize_or(Vec2::X))
    }
}

//! The particle record and its two variants.

use std::sync::Arc;

use halo_shared::{Color, Vec2};

/// Monotonic creation id; restarts at 1 after `clear`.
pub type ParticleId = u64;

/// Angular state shared by both variants.
///
/// Orbit particles read `theta` as their position on the ring; veil
/// particles use it as the phase of their slow rotation and drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Unbounded angle accumulator (rad). Kept in `f64` so long sessions
    /// still advance by one frame's step.
    pub theta: f64,
    /// Intrinsic angular speed (rad/s) before the speed multiplier.
    pub omega_base: f32,
    /// Transient outward push (px), decays to 0.
    pub radius_offset: f32,
    /// Transient angular-speed bump (rad/s), decays to 0.
    pub omega_offset: f32,
}

impl Motion {
    /// At rest at `theta`.
    #[must_use]
    pub fn new(theta: f32, omega_base: f32) -> Self {
        Self {
            theta: f64::from(theta),
            omega_base,
            radius_offset: 0.0,
            omega_offset: 0.0,
        }
    }

    /// `sin(theta)`: negative is behind the head, non-negative in front.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> f32 {
        self.angle().sin()
    }

    /// `theta` wrapped into `[0, 2π)`.
    #[inline]
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.theta.rem_euclid(std::f64::consts::TAU) as f32
    }

    /// `theta * frequency` wrapped into `[0, 2π)`.
    #[inline]
    #[must_use]
    pub fn phase(&self, frequency: f32) -> f32 {
        (self.theta * f64::from(frequency)).rem_euclid(std::f64::consts::TAU) as f32
    }
}

/// A glyph revolving on one elliptical lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Ring index, 0 = innermost.
    pub lane: usize,
    /// Global slot index in `[0, lane_capacity * max_lanes)`.
    pub slot: usize,
    /// Angular state.
    pub motion: Motion,
}

/// A glyph confined to the region over the face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VeilState {
    /// Radial sampling parameter in `[0, 1]`; fixed.
    pub u: f32,
    /// Vertical bias; fixed, negative favors the upper face.
    pub bias_y: f32,
    /// Current local coordinates.
    pub local: Vec2,
    /// Rest target of `local`; fixed.
    pub rest: Vec2,
    /// Rotation and drift phase.
    pub motion: Motion,
}

/// Variant payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleKind {
    /// Revolves around the anchor.
    Orbit(OrbitState),
    /// Hovers over the face.
    Veil(VeilState),
}

/// The unit of simulation and rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Creation id.
    pub id: ParticleId,
    /// One grapheme cluster or one intact word, shared across the commit's
    /// orbit and veil particles.
    pub token: Arc<str>,
    /// Hue assigned to the commit.
    pub color: Color,
    /// Simulation time of creation (s); informational.
    pub born_at: f64,
    /// Variant payload.
    pub kind: ParticleKind,
}

impl Particle {
    /// Angular state of either variant.
    #[must_use]
    pub fn motion(&self) -> &Motion {
        match &self.kind {
            ParticleKind::Orbit(orbit) => &orbit.motion,
            ParticleKind::Veil(veil) => &veil.motion,
        }
    }

    /// Mutable angular state of either variant.
    pub fn motion_mut(&mut self) -> &mut Motion {
        match &mut self.kind {
            ParticleKind::Orbit(orbit) => &mut orbit.motion,
            ParticleKind::Veil(veil) => &mut veil.motion,
        }
    }

    /// `sin(theta)` of either variant.
    #[must_use]
    pub fn depth(&self) -> f32 {
        self.motion().depth()
    }

    /// True for orbit particles.
    #[must_use]
    pub fn is_orbit(&self) -> bool {
        matches!(self.kind, ParticleKind::Orbit(_))
    }

    /// Orbit payload, if this is an orbit particle.
    #[must_use]
    pub fn as_orbit(&self) -> Option<&OrbitState> {
        match &self.kind {
            ParticleKind::Orbit(orbit) => Some(orbit),
            ParticleKind::Veil(_) => None,
        }
    }

    /// Veil payload, if this is a veil particle.
    #[must_use]
    pub fn as_veil(&self) -> Option<&VeilState> {
        match &self.kind {
            ParticleKind::Veil(veil) => Some(veil),
            ParticleKind::Orbit(_) => None,
        }
    }
}

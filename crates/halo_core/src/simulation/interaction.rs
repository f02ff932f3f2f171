//! Fingertip brush.
//!
//! Linear falloff `t = 1 - distance / influence_radius` inside the radius.
//!
//! - Orbit: `radius_offset += repel * t * dt`, `omega_offset += swirl * t * dt`
//!   (always the same rotational sign).
//! - Veil: the screen-space unit vector away from the fingertip, expressed in
//!   the particle's local frame, scaled by `push * t * dt` and added to
//!   `local`; each component is then clamped.
//!
//! With the fingertip on top of a particle (closer than [`COINCIDENT_PX`])
//! there is no usable "away"; the push then points outward along the
//! particle's own local position.

use halo_shared::{Vec2, EPSILON};

use crate::config::InteractionConfig;
use crate::geometry::{Placement, Projection};
use crate::particles::{Particle, ParticleKind};

/// Fingertip-to-glyph distances below this are treated as zero.
pub const COINCIDENT_PX: f32 = 0.5;

/// What the brush touched this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionStats {
    /// Orbit particles inside the influence radius.
    pub orbit_pushed: usize,
    /// Veil particles inside the influence radius.
    pub veil_pushed: usize,
}

/// Repulsion around one fingertip.
#[derive(Debug, Clone)]
pub struct InteractionField {
    config: InteractionConfig,
}

impl InteractionField {
    /// Creates the field.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self { config }
    }

    /// Falloff weight at `distance`: 1 at the fingertip, 0 at the radius.
    #[inline]
    #[must_use]
    pub fn weight(&self, distance: f32) -> f32 {
        let radius = self.config.influence_radius.max(EPSILON);
        (1.0 - distance / radius).max(0.0)
    }

    /// Applies forces to every particle near `fingertip`.
    ///
    /// `placements` must be in the same order as `particles`. Without a
    /// fingertip nothing changes.
    pub fn apply<'p>(
        &self,
        fingertip: Option<Vec2>,
        particles: impl Iterator<Item = &'p mut Particle>,
        placements: &[Placement],
        projection: &Projection<'_>,
        dt: f32,
    ) -> InteractionStats {
        let mut stats = InteractionStats::default();
        let Some(tip) = fingertip.filter(|p| p.is_finite()) else {
            return stats;
        };

        for (particle, placed) in particles.zip(placements) {
            let away = placed.position - tip;
            let distance = away.length();
            if distance >= self.config.influence_radius {
                continue;
            }
            let t = self.weight(distance);

            match &mut particle.kind {
                ParticleKind::Orbit(orbit) => {
                    orbit.motion.radius_offset += self.config.repel_strength * t * dt;
                    orbit.motion.omega_offset += self.config.swirl_strength * t * dt;
                    stats.orbit_pushed += 1;
                }
                ParticleKind::Veil(veil) => {
                    let outward = veil.local.normalize_or(Vec2::X);
                    let dir = if distance < COINCIDENT_PX {
                        outward
                    } else {
                        projection
                            .screen_dir_to_local(veil, away * (1.0 / distance))
                            .unwrap_or(outward)
                    };
                    let push = dir * (self.config.veil_push_strength * t * dt);
                    veil.local = (veil.local + push).clamp_symmetric(self.config.veil_push_clamp);
                    stats.veil_pushed += 1;
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OrbitConfig, VeilConfig};
    use crate::particles::{Motion, OrbitState, VeilState};
    use crate::tracking::AnchorState;
    use halo_shared::Color;
    use std::sync::Arc;

    fn anchor() -> AnchorState {
        AnchorState {
            position: Vec2::new(400.0, 300.0),
            face_size: Vec2::new(200.0, 250.0),
            head_radii: Vec2::new(100.0, 120.0),
            veil_radii: Vec2::new(80.0, 100.0),
            silhouette: None,
            face_present: true,
            acquired: true,
        }
    }

    fn orbit_particle() -> Particle {
        Particle {
            id: 1,
            token: Arc::from("a"),
            color: Color::WHITE,
            born_at: 0.0,
            kind: ParticleKind::Orbit(OrbitState {
                lane: 0,
                slot: 0,
                motion: Motion::new(0.0, 0.5),
            }),
        }
    }

    fn veil_particle(local: Vec2) -> Particle {
        Particle {
            id: 2,
            token: Arc::from("a"),
            color: Color::WHITE,
            born_at: 0.0,
            kind: ParticleKind::Veil(VeilState {
                u: local.length(),
                bias_y: 0.0,
                local,
                rest: local,
                motion: Motion::new(0.3, 0.1),
            }),
        }
    }

    fn run(field: &InteractionField, tip: Option<Vec2>, particles: &mut [Particle], dt: f32) -> InteractionStats {
        let anchor = anchor();
        let orbit = OrbitConfig::default();
        let veil = VeilConfig::default();
        let projection = Projection::new(&anchor, &orbit, &veil);
        let placements: Vec<Placement> = particles.iter().map(|p| projection.place(p)).collect();
        field.apply(tip, particles.iter_mut(), &placements, &projection, dt)
    }

    #[test]
    fn test_weight_is_linear() {
        let field = InteractionField::new(InteractionConfig {
            influence_radius: 100.0,
            ..InteractionConfig::default()
        });
        assert_eq!(field.weight(0.0), 1.0);
        assert_eq!(field.weight(25.0), 0.75);
        assert_eq!(field.weight(100.0), 0.0);
        assert_eq!(field.weight(250.0), 0.0);
    }

    #[test]
    fn test_no_fingertip_changes_nothing() {
        let field = InteractionField::new(InteractionConfig::default());
        let mut particles = vec![orbit_particle(), veil_particle(Vec2::new(0.3, 0.1))];
        let before = particles.clone();

        let stats = run(&field, None, &mut particles, 0.016);
        assert_eq!(stats, InteractionStats::default());
        assert_eq!(particles, before);
    }

    #[test]
    fn test_orbit_kick_scales_with_weight_and_dt() {
        let config = InteractionConfig::default();
        let field = InteractionField::new(config.clone());
        let mut particles = vec![orbit_particle()];
        let anchor = anchor();
        let orbit_config = OrbitConfig::default();
        let veil_config = VeilConfig::default();
        let placed = Projection::new(&anchor, &orbit_config, &veil_config).place(&particles[0]);

        let stats = run(&field, Some(placed.position), &mut particles, 0.02);
        assert_eq!(stats.orbit_pushed, 1);
        let motion = particles[0].motion();
        assert!((motion.radius_offset - config.repel_strength * 0.02).abs() < 1e-3);
        assert!((motion.omega_offset - config.swirl_strength * 0.02).abs() < 1e-4);
        assert!(motion.omega_offset > 0.0);
    }

    #[test]
    fn test_out_of_range_untouched() {
        let field = InteractionField::new(InteractionConfig::default());
        let mut particles = vec![orbit_particle()];
        let stats = run(&field, Some(Vec2::new(-5000.0, -5000.0)), &mut particles, 0.02);
        assert_eq!(stats.orbit_pushed, 0);
        assert_eq!(particles[0].motion().radius_offset, 0.0);
    }

    #[test]
    fn test_veil_pushed_away_from_fingertip() {
        let field = InteractionField::new(InteractionConfig::default());
        let mut particles = vec![veil_particle(Vec2::new(0.4, 0.0))];
        let anchor = anchor();
        let orbit_config = OrbitConfig::default();
        let veil_config = VeilConfig::default();
        let projection = Projection::new(&anchor, &orbit_config, &veil_config);
        let before = projection.place(&particles[0]).position;
        // Fingertip just to the left of the glyph on screen.
        let tip = before - Vec2::new(10.0, 0.0);

        run(&field, Some(tip), &mut particles, 0.05);
        let after = projection.place(&particles[0]).position;
        assert!(after.x > before.x);
    }

    #[test]
    fn test_veil_push_clamped() {
        let field = InteractionField::new(InteractionConfig {
            veil_push_strength: 1.0e6,
            veil_push_clamp: 1.2,
            ..InteractionConfig::default()
        });
        let mut particles = vec![veil_particle(Vec2::new(0.5, 0.5))];
        let anchor = anchor();
        let orbit_config = OrbitConfig::default();
        let veil_config = VeilConfig::default();
        let tip = Projection::new(&anchor, &orbit_config, &veil_config).place(&particles[0]).position;

        run(&field, Some(tip), &mut particles, 0.05);
        let local = particles[0].as_veil().unwrap().local;
        assert!(local.x.abs() <= 1.2 && local.y.abs() <= 1.2);
        assert!(local.x > 0.5 && local.y > 0.5);
    }
}

//! One time step for every particle.
//!
//! Order per particle (do not reorder):
//!
//! 1. `radius_offset *= exp(-dt / radius_tau)`, `omega_offset *= exp(-dt / omega_tau)`
//! 2. `theta += (omega_base * speed_multiplier + omega_offset) * dt`
//! 3. veil only: `local` relaxes toward `rest + drift(theta) * u` with
//!    `1 - exp(-dt / relax_tau)`, then is clamped.
//!
//! The exponential form makes decay frame-rate independent; `dt` is clamped
//! before any of this runs.

use halo_shared::Vec2;

use crate::config::{OrbitConfig, VeilConfig};
use crate::particles::{Motion, Particle, ParticleKind, VeilState};

/// Clamps a raw frame delta to `[0, max_dt]`; NaN and negative deltas become 0.
#[inline]
#[must_use]
pub fn clamp_dt(raw: f32, max_dt: f32) -> f32 {
    if raw.is_nan() || raw <= 0.0 {
        0.0
    } else {
        raw.min(max_dt)
    }
}

/// Exponential integrator with per-quantity time constants.
#[derive(Debug, Clone)]
pub struct Integrator {
    orbit: OrbitConfig,
    veil: VeilConfig,
}

impl Integrator {
    /// Creates the integrator.
    #[must_use]
    pub fn new(orbit: OrbitConfig, veil: VeilConfig) -> Self {
        Self { orbit, veil }
    }

    /// Advances every particle by `dt` seconds (already clamped).
    pub fn step<'p>(
        &self,
        particles: impl Iterator<Item = &'p mut Particle>,
        dt: f32,
        speed_multiplier: f32,
    ) {
        if dt <= 0.0 {
            return;
        }
        let radius_decay = (-dt / self.orbit.radius_tau).exp();
        let omega_decay = (-dt / self.orbit.omega_tau).exp();
        let relax = 1.0 - (-dt / self.veil.relax_tau).exp();

        for particle in particles {
            let motion = particle.motion_mut();
            decay(motion, radius_decay, omega_decay);
            advance(motion, dt, speed_multiplier);

            if let ParticleKind::Veil(veil) = &mut particle.kind {
                self.relax_veil(veil, relax);
            }
        }
    }

    /// Drift target of a veil particle at its current phase.
    #[must_use]
    pub fn drift_target(&self, veil: &VeilState) -> Vec2 {
        let phase = veil.motion.phase(self.veil.drift_frequency);
        let amplitude = self.veil.drift_amplitude * veil.u;
        veil.rest + Vec2::new(phase.sin(), phase.cos()) * amplitude
    }

    fn relax_veil(&self, veil: &mut VeilState, relax: f32) {
        let target = self.drift_target(veil);
        let next = veil.local + (target - veil.local) * relax;
        veil.local = next.clamp_symmetric(self.veil.local_clamp);
    }
}

#[inline]
fn decay(motion: &mut Motion, radius_decay: f32, omega_decay: f32) {
    motion.radius_offset *= radius_decay;
    motion.omega_offset *= omega_decay;
}

#[inline]
fn advance(motion: &mut Motion, dt: f32, speed_multiplier: f32) {
    let omega = motion.omega_base * speed_multiplier + motion.omega_offset;
    motion.theta += f64::from(omega * dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::OrbitState;
    use halo_shared::Color;
    use std::sync::Arc;

    fn orbit(radius_offset: f32, omega_offset: f32) -> Particle {
        let mut motion = Motion::new(0.0, 0.5);
        motion.radius_offset = radius_offset;
        motion.omega_offset = omega_offset;
        Particle {
            id: 1,
            token: Arc::from("x"),
            color: Color::WHITE,
            born_at: 0.0,
            kind: ParticleKind::Orbit(OrbitState { lane: 0, slot: 0, motion }),
        }
    }

    fn veil(local: Vec2, rest: Vec2) -> Particle {
        Particle {
            id: 2,
            token: Arc::from("x"),
            color: Color::WHITE,
            born_at: 0.0,
            kind: ParticleKind::Veil(VeilState {
                u: rest.length(),
                bias_y: 0.0,
                local,
                rest,
                motion: Motion::new(0.0, 0.1),
            }),
        }
    }

    fn integrator() -> Integrator {
        Integrator::new(OrbitConfig::default(), VeilConfig::default())
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(1000.0, 0.05), 0.05);
        assert_eq!(clamp_dt(0.01, 0.05), 0.01);
        assert_eq!(clamp_dt(-1.0, 0.05), 0.0);
        assert_eq!(clamp_dt(f32::NAN, 0.05), 0.0);
    }

    #[test]
    fn test_offsets_decay_without_sign_change() {
        let integrator = integrator();
        let mut particles = vec![orbit(50.0, -3.0)];
        let mut last = (50.0_f32, -3.0_f32);

        for _ in 0..2000 {
            integrator.step(particles.iter_mut(), 0.016, 1.0);
            let m = particles[0].motion();
            assert!(m.radius_offset >= 0.0 && m.radius_offset <= last.0);
            assert!(m.omega_offset <= 0.0 && m.omega_offset >= last.1);
            last = (m.radius_offset, m.omega_offset);
        }
        assert!(last.0 < 1e-3);
        assert!(last.1.abs() < 1e-3);
    }

    #[test]
    fn test_decay_matches_closed_form() {
        let integrator = integrator();
        let tau = OrbitConfig::default().radius_tau;
        let mut particles = vec![orbit(10.0, 0.0)];
        for _ in 0..10 {
            integrator.step(particles.iter_mut(), 0.01, 1.0);
        }
        let expected = 10.0 * (-0.1 / tau).exp();
        assert!((particles[0].motion().radius_offset - expected).abs() < 1e-4);
    }

    #[test]
    fn test_theta_advance_is_tick_count_invariant() {
        let integrator = integrator();
        let mut coarse = vec![orbit(0.0, 0.0)];
        let mut fine = vec![orbit(0.0, 0.0)];

        for _ in 0..30 {
            integrator.step(coarse.iter_mut(), 0.04, 1.5);
        }
        for _ in 0..120 {
            integrator.step(fine.iter_mut(), 0.01, 1.5);
        }
        let a = coarse[0].motion().theta;
        let b = fine[0].motion().theta;
        assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        assert!((a - 0.5 * 1.5 * 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_theta_strictly_increases() {
        let integrator = integrator();
        let mut particles = vec![orbit(0.0, 0.0)];
        let mut last = particles[0].motion().theta;
        for _ in 0..100 {
            integrator.step(particles.iter_mut(), 0.016, 1.0);
            let theta = particles[0].motion().theta;
            assert!(theta > last);
            last = theta;
        }
    }

    #[test]
    fn test_theta_keeps_advancing_in_long_sessions() {
        let integrator = integrator();
        let mut particles = vec![orbit(0.0, 0.0)];
        // Roughly three days of orbiting at the base speed.
        particles[0].motion_mut().theta = 2f64.powi(20);
        let mut last = particles[0].motion().theta;
        for _ in 0..100 {
            integrator.step(particles.iter_mut(), 1.0 / 60.0, 1.0);
            let theta = particles[0].motion().theta;
            assert!(theta > last);
            last = theta;
        }
        let angle = particles[0].motion().angle();
        assert!((0.0..=std::f32::consts::TAU).contains(&angle));
    }

    #[test]
    fn test_speed_multiplier_scales_advance() {
        let integrator = integrator();
        let mut slow = vec![orbit(0.0, 0.0)];
        let mut fast = vec![orbit(0.0, 0.0)];
        integrator.step(slow.iter_mut(), 0.05, 1.0);
        integrator.step(fast.iter_mut(), 0.05, 3.0);
        let ratio = fast[0].motion().theta / slow[0].motion().theta;
        assert!((ratio - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_veil_relaxes_toward_rest() {
        let integrator = integrator();
        let rest = Vec2::new(0.3, -0.2);
        let mut particles = vec![veil(Vec2::new(1.2, 1.2), rest)];

        for _ in 0..600 {
            integrator.step(particles.iter_mut(), 0.016, 1.0);
        }
        let state = particles[0].as_veil().unwrap();
        let drift = VeilConfig::default().drift_amplitude * state.u;
        assert!((state.local - rest).length() <= drift + 1e-3);
    }

    #[test]
    fn test_veil_local_clamped() {
        let integrator = Integrator::new(
            OrbitConfig::default(),
            VeilConfig {
                local_clamp: 0.5,
                ..VeilConfig::default()
            },
        );
        let mut particles = vec![veil(Vec2::new(3.0, -3.0), Vec2::new(3.0, -3.0))];
        integrator.step(particles.iter_mut(), 0.016, 1.0);
        let local = particles[0].as_veil().unwrap().local;
        assert_eq!(local, Vec2::new(0.5, -0.5));
    }
}

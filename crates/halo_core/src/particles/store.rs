//! Bounded orbit + veil populations.
//!
//! ## Capacity rules
//!
//! 1. Orbit slots: a monotonic counter picks `slot = counter % orbit_capacity`.
//!    A new orbit particle replaces whatever occupies its slot, so the orbit
//!    population never exceeds `lane_capacity * max_lanes`. Two tokens
//!    committed far apart can land in the same slot.
//! 2. Global cap: when `orbit + veil > max_particles`, the oldest veil
//!    particles go first; orbit particles go (oldest first) only once the
//!    veil population is empty.
//!
//! A commit is staged in full before anything is appended, so a reader
//! never sees part of one.

use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::sync::Arc;

use halo_shared::{Color, Vec2};
use rand::Rng;

use super::particle::{Motion, OrbitState, Particle, ParticleId, ParticleKind, VeilState};
use crate::config::{CapacityConfig, OrbitConfig, VeilConfig};

/// What one commit did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommitReceipt {
    /// Tokens committed.
    pub tokens: usize,
    /// Orbit particles created.
    pub orbit_added: usize,
    /// Veil particles created.
    pub veil_added: usize,
    /// Existing orbit particles replaced through slot wrap-around.
    pub orbit_overwritten: usize,
    /// Veil particles removed by the global cap.
    pub veil_evicted: usize,
    /// Orbit particles removed by the global cap.
    pub orbit_evicted: usize,
    /// Color shared by every particle of the commit.
    pub color: Color,
}

/// Owner of both particle populations.
#[derive(Debug, Clone)]
pub struct ParticleStore {
    capacity: CapacityConfig,
    orbit_config: OrbitConfig,
    veil_config: VeilConfig,
    /// Insertion order, oldest first.
    orbit: VecDeque<Particle>,
    /// Insertion order, oldest first.
    veil: VecDeque<Particle>,
    next_id: ParticleId,
    /// Orbit particles ever committed since construction or `clear`.
    orbit_counter: u64,
}

impl ParticleStore {
    /// First id handed out after construction or `clear`.
    pub const FIRST_ID: ParticleId = 1;

    /// Creates an empty store.
    #[must_use]
    pub fn new(capacity: CapacityConfig, orbit_config: OrbitConfig, veil_config: VeilConfig) -> Self {
        // Divisors stay non-zero even for a config that skipped `validate`.
        let capacity = CapacityConfig {
            lane_capacity: capacity.lane_capacity.max(1),
            max_lanes: capacity.max_lanes.max(1),
            veil_density_step: capacity.veil_density_step.max(1),
            ..capacity
        };
        let orbit_capacity = capacity.orbit_capacity();
        Self {
            orbit: VecDeque::with_capacity(orbit_capacity),
            veil: VecDeque::with_capacity(capacity.max_particles.min(4096)),
            capacity,
            orbit_config,
            veil_config,
            next_id: Self::FIRST_ID,
            orbit_counter: 0,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Orbit particles, oldest first.
    pub fn orbit(&self) -> impl ExactSizeIterator<Item = &Particle> + '_ {
        self.orbit.iter()
    }

    /// Veil particles, oldest first.
    pub fn veil(&self) -> impl ExactSizeIterator<Item = &Particle> + '_ {
        self.veil.iter()
    }

    /// All particles: orbit first, then veil.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.orbit.iter().chain(self.veil.iter())
    }

    /// All particles mutably, in the same order as [`Self::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> + '_ {
        self.orbit.iter_mut().chain(self.veil.iter_mut())
    }

    /// Number of orbit particles.
    #[must_use]
    pub fn orbit_len(&self) -> usize {
        self.orbit.len()
    }

    /// Number of veil particles.
    #[must_use]
    pub fn veil_len(&self) -> usize {
        self.veil.len()
    }

    /// Total particle count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orbit.len() + self.veil.len()
    }

    /// True when both populations are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orbit.is_empty() && self.veil.is_empty()
    }

    /// Orbit particles ever committed since construction or `clear`.
    #[must_use]
    pub fn orbit_counter(&self) -> u64 {
        self.orbit_counter
    }

    /// The id the next particle will receive.
    #[must_use]
    pub fn next_id(&self) -> ParticleId {
        self.next_id
    }

    /// Capacity limits in force.
    #[must_use]
    pub fn capacity(&self) -> &CapacityConfig {
        &self.capacity
    }

    /// Veil particles spawned for the next token after `orbit_counter`
    /// orbit commits.
    #[must_use]
    pub fn veil_count_for(&self, orbit_counter: u64) -> usize {
        let c = &self.capacity;
        let growth = (orbit_counter / c.veil_density_step.max(1) as u64) as usize;
        c.veil_min_per_token
            .saturating_add(growth)
            .min(c.veil_max_per_token)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Adds one orbit particle and its veil particles for every token.
    ///
    /// Every particle of the commit gets `color`. An empty token list is a
    /// no-op. Eviction runs before returning.
    pub fn commit<R: Rng + ?Sized>(
        &mut self,
        tokens: &[String],
        color: Color,
        now: f64,
        rng: &mut R,
    ) -> CommitReceipt {
        let mut receipt = CommitReceipt {
            tokens: tokens.len(),
            color,
            ..CommitReceipt::default()
        };
        if tokens.is_empty() {
            return receipt;
        }

        // Stage everything first; nothing below can fail.
        let mut next_id = self.next_id;
        let mut orbit_counter = self.orbit_counter;
        let mut staged_orbit = Vec::with_capacity(tokens.len());
        let mut staged_veil = Vec::new();

        for text in tokens {
            let token: Arc<str> = Arc::from(text.as_str());

            staged_orbit.push(Particle {
                id: next_id,
                token: Arc::clone(&token),
                color,
                born_at: now,
                kind: ParticleKind::Orbit(self.place_orbit(orbit_counter)),
            });
            next_id += 1;

            for _ in 0..self.veil_count_for(orbit_counter) {
                staged_veil.push(Particle {
                    id: next_id,
                    token: Arc::clone(&token),
                    color,
                    born_at: now,
                    kind: ParticleKind::Veil(self.sample_veil(rng)),
                });
                next_id += 1;
            }
            orbit_counter += 1;
        }

        receipt.orbit_added = staged_orbit.len();
        receipt.veil_added = staged_veil.len();

        for particle in staged_orbit {
            if let Some(slot) = particle.as_orbit().map(|o| o.slot) {
                if let Some(index) = self
                    .orbit
                    .iter()
                    .position(|p| p.as_orbit().is_some_and(|o| o.slot == slot))
                {
                    self.orbit.remove(index);
                    receipt.orbit_overwritten += 1;
                }
            }
            self.orbit.push_back(particle);
        }
        self.veil.extend(staged_veil);
        self.next_id = next_id;
        self.orbit_counter = orbit_counter;

        let (veil_evicted, orbit_evicted) = self.evict();
        receipt.veil_evicted = veil_evicted;
        receipt.orbit_evicted = orbit_evicted;

        tracing::debug!(
            tokens = receipt.tokens,
            orbit = receipt.orbit_added,
            veil = receipt.veil_added,
            overwritten = receipt.orbit_overwritten,
            veil_evicted,
            orbit_evicted,
            "commit applied"
        );
        receipt
    }

    /// Enforces both capacity invariants.
    ///
    /// Returns `(veil_evicted, orbit_evicted)`.
    pub fn evict(&mut self) -> (usize, usize) {
        let mut veil_evicted = 0;
        let mut orbit_evicted = 0;

        let orbit_capacity = self.capacity.orbit_capacity();
        while self.orbit.len() > orbit_capacity {
            self.orbit.pop_front();
            orbit_evicted += 1;
        }

        while self.len() > self.capacity.max_particles {
            if self.veil.pop_front().is_some() {
                veil_evicted += 1;
            } else if self.orbit.pop_front().is_some() {
                orbit_evicted += 1;
            } else {
                break;
            }
        }
        (veil_evicted, orbit_evicted)
    }

    /// Empties both populations and restarts the id and orbit counters.
    pub fn clear(&mut self) {
        let removed = self.len();
        self.orbit.clear();
        self.veil.clear();
        self.next_id = Self::FIRST_ID;
        self.orbit_counter = 0;
        tracing::debug!(removed, "particle store cleared");
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    fn place_orbit(&self, orbit_counter: u64) -> OrbitState {
        let lane_capacity = self.capacity.lane_capacity;
        let slot = (orbit_counter % self.capacity.orbit_capacity() as u64) as usize;
        let lane = slot / lane_capacity;
        let index_in_lane = slot % lane_capacity;

        let theta = index_in_lane as f32 / lane_capacity as f32 * TAU
            + lane as f32 * self.orbit_config.lane_phase;
        let omega = self.orbit_config.omega_base
            / (1.0 + lane as f32 * self.orbit_config.lane_omega_falloff);

        OrbitState {
            lane,
            slot,
            motion: Motion::new(theta, omega),
        }
    }

    fn sample_veil<R: Rng + ?Sized>(&self, rng: &mut R) -> VeilState {
        // Uniform in the unit disk: r = sqrt(U) keeps area density flat.
        let r = rng.gen::<f32>().sqrt();
        let angle = rng.gen::<f32>() * TAU;
        let local = Vec2::new(r * angle.cos(), r * angle.sin());

        let [bias_lo, bias_hi] = self.veil_config.bias_range;
        let [omega_lo, omega_hi] = self.veil_config.omega_range;
        let theta = rng.gen::<f32>() * TAU;
        let omega = rng.gen_range(omega_lo..=omega_hi);

        VeilState {
            u: r.clamp(0.0, 1.0),
            bias_y: rng.gen_range(bias_lo..=bias_hi),
            local,
            rest: local,
            motion: Motion::new(theta, omega),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn store(capacity: CapacityConfig) -> ParticleStore {
        ParticleStore::new(capacity, OrbitConfig::default(), VeilConfig::default())
    }

    fn tokens(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t{i}")).collect()
    }

    #[test]
    fn test_commit_places_consecutive_slots() {
        let mut store = store(CapacityConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let receipt = store.commit(&tokens(3), Color::WHITE, 0.0, &mut rng);

        assert_eq!(receipt.orbit_added, 3);
        assert_eq!(store.orbit_len(), 3);
        let slots: Vec<usize> = store.orbit().filter_map(|p| p.as_orbit()).map(|o| o.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert!(store.orbit().all(|p| p.as_orbit().is_some_and(|o| o.lane == 0)));
        assert!((6..=24).contains(&store.veil_len()));
    }

    #[test]
    fn test_ids_are_monotonic_and_shared_color() {
        let mut store = store(CapacityConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let color = Color::rgb(0.1, 0.2, 0.3);

        store.commit(&tokens(2), color, 0.0, &mut rng);
        let mut ids: Vec<ParticleId> = store.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), store.len());
        assert_eq!(ids[0], ParticleStore::FIRST_ID);
        assert!(store.iter().all(|p| p.color == color));
    }

    #[test]
    fn test_orbit_slot_wraps_and_overwrites_oldest() {
        let capacity = CapacityConfig {
            lane_capacity: 2,
            max_lanes: 2,
            max_particles: 10_000,
            ..CapacityConfig::default()
        };
        let mut store = store(capacity);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        store.commit(&tokens(4), Color::WHITE, 0.0, &mut rng);
        let receipt = store.commit(&["late".to_string()], Color::WHITE, 1.0, &mut rng);

        assert_eq!(receipt.orbit_overwritten, 1);
        assert_eq!(store.orbit_len(), 4);
        let late = store.orbit().find(|p| &*p.token == "late").unwrap();
        assert_eq!(late.as_orbit().unwrap().slot, 0);
        assert!(store.orbit().all(|p| &*p.token != "t0"));
    }

    #[test]
    fn test_global_cap_evicts_veil_first() {
        let capacity = CapacityConfig {
            lane_capacity: 10,
            max_lanes: 1,
            max_particles: 12,
            veil_min_per_token: 2,
            veil_max_per_token: 2,
            veil_density_step: 1,
        };
        let mut store = store(capacity);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        store.commit(&tokens(3), Color::WHITE, 0.0, &mut rng);
        assert_eq!(store.len(), 9);
        let oldest_veil = store.veil().next().unwrap().id;

        let receipt = store.commit(&tokens(2), Color::WHITE, 1.0, &mut rng);
        assert_eq!(store.len(), 12);
        assert_eq!(receipt.veil_evicted, 3);
        assert_eq!(receipt.orbit_evicted, 0);
        assert_eq!(store.orbit_len(), 5);
        assert!(store.veil().all(|p| p.id != oldest_veil));
    }

    #[test]
    fn test_orbit_evicted_only_when_veil_exhausted() {
        let capacity = CapacityConfig {
            lane_capacity: 10,
            max_lanes: 1,
            max_particles: 3,
            veil_min_per_token: 0,
            veil_max_per_token: 0,
            veil_density_step: 1,
        };
        let mut store = store(capacity);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let receipt = store.commit(&tokens(5), Color::WHITE, 0.0, &mut rng);
        assert_eq!(receipt.orbit_evicted, 2);
        assert_eq!(store.orbit_len(), 3);
        let names: Vec<&str> = store.orbit().map(|p| &*p.token).collect();
        assert_eq!(names, vec!["t2", "t3", "t4"]);
    }

    #[test]
    fn test_zero_divisors_are_tolerated() {
        let capacity = CapacityConfig {
            lane_capacity: 0,
            max_lanes: 0,
            veil_density_step: 0,
            ..CapacityConfig::default()
        };
        let mut store = store(capacity);
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        assert_eq!(store.capacity().veil_density_step, 1);
        assert_eq!(store.veil_count_for(3), 5);
        store.commit(&tokens(3), Color::WHITE, 0.0, &mut rng);
        assert_eq!(store.orbit_len(), 1);
        assert!(store.len() <= store.capacity().max_particles);
    }

    #[test]
    fn test_veil_density_grows_and_saturates() {
        let store = store(CapacityConfig::default());
        assert_eq!(store.veil_count_for(0), 2);
        assert_eq!(store.veil_count_for(6), 3);
        assert_eq!(store.veil_count_for(10_000), 8);
    }

    #[test]
    fn test_veil_samples_inside_unit_disk() {
        let mut store = store(CapacityConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        store.commit(&tokens(20), Color::WHITE, 0.0, &mut rng);

        for veil in store.veil().filter_map(Particle::as_veil) {
            assert!(veil.local.length() <= 1.0 + 1e-5);
            assert!((veil.u - veil.local.length()).abs() < 1e-5);
            assert_eq!(veil.local, veil.rest);
        }
    }

    #[test]
    fn test_clear_resets_counters() {
        let mut store = store(CapacityConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        store.commit(&tokens(30), Color::WHITE, 0.0, &mut rng);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.orbit_counter(), 0);
        assert_eq!(store.next_id(), ParticleStore::FIRST_ID);
        assert_eq!(store.veil_count_for(store.orbit_counter()), 2);
    }

    #[test]
    fn test_empty_commit_is_noop() {
        let mut store = store(CapacityConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let receipt = store.commit(&[], Color::WHITE, 0.0, &mut rng);
        assert_eq!(receipt.orbit_added, 0);
        assert!(store.is_empty());
        assert_eq!(store.next_id(), ParticleStore::FIRST_ID);
    }
}

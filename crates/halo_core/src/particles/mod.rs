//! # Particle Populations
//!
//! Two bounded populations share one record shape:
//!
//! ```text
//! ┌──────────────────────────── Particle ─────────────────────────────┐
//! │ id · token · color · born_at                                      │
//! ├──────────────────────────────┬────────────────────────────────────┤
//! │ Orbit                        │ Veil                               │
//! │  lane, slot                  │  u, bias_y (fixed)                 │
//! │  Motion (theta, offsets)     │  local, rest                       │
//! │                              │  Motion (drift phase only)         │
//! └──────────────────────────────┴────────────────────────────────────┘
//! ```
//!
//! Particles are created only by commits and destroyed only by capacity
//! eviction or `clear`. Nothing ages out by time.

mod particle;
mod store;

pub use particle::{Motion, OrbitState, Particle, ParticleId, ParticleKind, VeilState};
pub use store::{CommitReceipt, ParticleStore};

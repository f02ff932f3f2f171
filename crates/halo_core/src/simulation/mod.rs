//! # Simulation
//!
//! Per-frame particle update, in this order:
//!
//! ```text
//! placements (this frame's drawable positions)
//!      │
//!      ▼
//! InteractionField ── fingertip within radius? ──► radius/omega kicks, veil pushes
//!      │
//!      ▼
//! Integrator: decay ──► advance theta ──► veil relax
//! ```
//!
//! Decay runs before advance so transient offsets are already bounded when
//! the compositor reads them.

mod integrator;
mod interaction;

pub use integrator::{clamp_dt, Integrator};
pub use interaction::{InteractionField, InteractionStats, COINCIDENT_PX};

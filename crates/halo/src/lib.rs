//! # HALO Drivers
//!
//! Everything the core deliberately leaves out: a clock that measures
//! frame deltas and a source of landmark snapshots.
//!
//! ```text
//! FrameClock ──dt──┐
//!                  ▼
//! LandmarkSource ──frame──▶ Engine::on_frame ──▶ DrawList ──▶ renderer
//!                  ▲
//! input thread ──CommitSender──┘ (applied at the start of the next tick)
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod clock;
pub mod source;

pub use clock::FrameClock;
pub use source::{LandmarkSource, SyntheticConfig, SyntheticLandmarks};

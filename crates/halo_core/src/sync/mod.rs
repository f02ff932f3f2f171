//! # Commit Synchronization
//!
//! Text commits come from input handlers, not from the frame clock. A commit
//! must never be half-visible to a tick:
//!
//! ```text
//! input thread ──send──▶ [CommitQueue] ──drain at tick start──▶ Engine
//!                                              │
//! any thread ──lock──▶ SharedEngine(Mutex<Engine>) ◀──lock── frame driver
//! ```
//!
//! - [`CommitSender`] never blocks: a commit sent while a tick runs waits in
//!   the queue and lands, whole, before the next tick reads the particles.
//! - [`SharedEngine`] holds one lock for the whole of a commit, a clear or a
//!   tick, so the three are mutually exclusive.

mod queue;
mod shared;

pub use queue::{CommitQueue, CommitSender, PendingCommit};
pub use shared::SharedEngine;

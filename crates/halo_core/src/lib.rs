//! # HALO Core
//!
//! Words committed by a user become glyph particles around a tracked head:
//! orbit glyphs circle it on elliptical lanes, passing behind and in front
//! of it, and veil glyphs hang over the face like fog. A fingertip pushes
//! both kinds away; they drift back on their own.
//!
//! ## Architecture Rules
//!
//! 1. **One context object** - all mutable state lives in [`Engine`]
//! 2. **Single-threaded tick** - commits land between ticks, never inside one
//! 3. **No scheduling** - the driver owns the clock and hands in `dt`
//! 4. **Landmark loss is not an error** - the anchor simply holds
//!
//! ## Example
//!
//! ```rust
//! use halo_core::Engine;
//! use halo_shared::LandmarkFrame;
//!
//! let mut engine = Engine::with_defaults();
//! engine.commit_text("hello world");
//! let list = engine.on_frame(&LandmarkFrame::empty(), 1.0 / 60.0);
//! assert!(list.glyph_count() > 0);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod compositor;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod particles;
pub mod simulation;
pub mod sync;
pub mod tokenizer;
pub mod tracking;

pub use compositor::{
    ClipRegion, Compositor, DrawCommand, DrawList, GlyphDraw, GlyphInstance, Layer, Passes,
};
pub use config::{
    ColorMode, HaloConfig, LiveSettings, SettingsSnapshot, SettingsUpdate, TokenGranularity,
};
pub use engine::{Engine, FrameStats, DEFAULT_VIEWPORT};
pub use error::{HaloError, HaloResult};
pub use geometry::{Placement, Projection};
pub use particles::{CommitReceipt, Particle, ParticleId, ParticleKind, ParticleStore};
pub use simulation::{clamp_dt, InteractionField, Integrator};
pub use sync::{CommitQueue, CommitSender, PendingCommit, SharedEngine};
pub use tokenizer::Tokenizer;
pub use tracking::{AnchorState, AnchorTracker, CoordinateMapper};

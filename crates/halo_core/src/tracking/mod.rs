//! # Tracking
//!
//! Landmarks → screen space.
//!
//! ```text
//! normalized landmark ──► CoordinateMapper ──► mirrored cover-scaled px
//!                               │
//!        face landmarks ──► AnchorTracker ──► AnchorState
//!                                              (anchor, radii, silhouette)
//! ```
//!
//! One mapper instance is configured per frame and used for the anchor, the
//! face extents, the silhouette and the fingertip, so all four agree on the
//! same projection.

mod anchor;
mod mapper;

pub use anchor::{AnchorState, AnchorTracker};
pub use mapper::CoordinateMapper;

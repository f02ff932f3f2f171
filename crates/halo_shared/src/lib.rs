//! # HALO Shared
//!
//! Common types used by the engine core and by whatever drives it.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - the engine (`halo_core`)
//! - any landmark-inference or video crate
//!
//! Landmarks arrive here already normalized to `[0, 1]`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod color;
pub mod landmarks;
pub mod math;

pub use color::Color;
pub use landmarks::{
    FaceLandmarks, HandLandmarks, Landmark, LandmarkFrame, FACE_OVAL, INDEX_FINGER_TIP,
};
pub use math::{Vec2, EPSILON};

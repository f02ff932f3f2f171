//! Landmark sources.
//!
//! Real inference lives outside this workspace. [`SyntheticLandmarks`]
//! stands in for it with a face drifting on a Lissajous path, a fingertip
//! sweeping across it and periodic detection dropouts.

use std::f32::consts::TAU;

use halo_shared::{FaceLandmarks, HandLandmarks, Landmark, LandmarkFrame, FACE_OVAL};

/// Points in a face mesh.
pub const FACE_MESH_POINTS: usize = 468;
/// Points in a hand model.
pub const HAND_POINTS: usize = 21;

/// Anything that can produce the landmark snapshot for a moment in time.
pub trait LandmarkSource {
    /// Landmarks at `elapsed` seconds since the source started.
    fn frame_at(&mut self, elapsed: f64) -> LandmarkFrame;
}

/// Motion parameters of the synthetic subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Source video size in pixels.
    pub source_size: (f32, f32),
    /// Rest position of the face center (normalized).
    pub face_center: (f32, f32),
    /// Lissajous amplitudes of the face center (normalized).
    pub face_wander: (f32, f32),
    /// Half width/height of the face oval (normalized).
    pub face_half_size: (f32, f32),
    /// Horizontal sweep amplitude of the fingertip (normalized).
    pub fingertip_sweep: f32,
    /// Seconds per fingertip sweep cycle.
    pub fingertip_period: f32,
    /// Every this many seconds, the face is lost for `dropout_len` seconds.
    pub dropout_every: f32,
    /// Length of a face dropout (s); 0 disables dropouts.
    pub dropout_len: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            source_size: (1280.0, 720.0),
            face_center: (0.5, 0.45),
            face_wander: (0.08, 0.04),
            face_half_size: (0.09, 0.14),
            fingertip_sweep: 0.3,
            fingertip_period: 4.0,
            dropout_every: 7.0,
            dropout_len: 0.5,
        }
    }
}

/// Deterministic fake tracker output.
#[derive(Debug, Clone, Default)]
pub struct SyntheticLandmarks {
    config: SyntheticConfig,
}

impl SyntheticLandmarks {
    /// Creates a source.
    #[must_use]
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }

    /// Face center at `t` seconds.
    #[must_use]
    pub fn face_center(&self, t: f32) -> (f32, f32) {
        let (cx, cy) = self.config.face_center;
        let (ax, ay) = self.config.face_wander;
        (cx + ax * (0.7 * t).sin(), cy + ay * (1.1 * t).sin())
    }

    fn face_visible(&self, t: f32) -> bool {
        let c = &self.config;
        c.dropout_len <= 0.0 || c.dropout_every <= 0.0 || t.rem_euclid(c.dropout_every) < c.dropout_every - c.dropout_len
    }

    fn face(&self, t: f32) -> FaceLandmarks {
        let (cx, cy) = self.face_center(t);
        let (hw, hh) = self.config.face_half_size;
        let mut points = vec![Landmark::new(cx, cy); FACE_MESH_POINTS];
        for (i, &index) in FACE_OVAL.iter().enumerate() {
            let a = i as f32 / FACE_OVAL.len() as f32 * TAU;
            points[index] = Landmark::new(cx + hw * a.sin(), cy - hh * a.cos());
        }
        FaceLandmarks::new(points)
    }

    fn hand(&self, t: f32) -> HandLandmarks {
        let (cx, cy) = self.config.face_center;
        let phase = t / self.config.fingertip_period.max(f32::EPSILON) * TAU;
        let tip = Landmark::new(cx + self.config.fingertip_sweep * phase.sin(), cy - 0.05);
        HandLandmarks::new(vec![tip; HAND_POINTS])
    }
}

impl LandmarkSource for SyntheticLandmarks {
    fn frame_at(&mut self, elapsed: f64) -> LandmarkFrame {
        let t = elapsed as f32;
        LandmarkFrame {
            face: self.face_visible(t).then(|| self.face(t)),
            hands: vec![self.hand(t)],
            source_size: Some(self.config.source_size),
        }
    }
}

//! Smoothed head anchor derived from face landmarks.
//!
//! Per frame with a face:
//!
//! 1. Face box center (normalized) → screen, plus a fixed vertical lift.
//! 2. `anchor += (target - anchor) * smoothing`.
//! 3. Face width/height in pixels, clamped to a plausible range.
//! 4. Head (occlusion) and veil ellipse radii as fixed multiples of 3.
//! 5. Silhouette: face-oval points, offset from the face center, inflated
//!    anisotropically and re-centered on the smoothed anchor.
//!
//! Without a face the anchor and radii hold their last values and the
//! silhouette is dropped; occlusion falls back to the head ellipse.

use halo_shared::{FaceLandmarks, Vec2, FACE_OVAL};

use super::mapper::CoordinateMapper;
use crate::config::AnchorConfig;

/// Head geometry for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorState {
    /// Smoothed anchor position in pixels.
    pub position: Vec2,
    /// Clamped face width/height in pixels.
    pub face_size: Vec2,
    /// Occlusion ellipse radii.
    pub head_radii: Vec2,
    /// Veil extent ellipse radii.
    pub veil_radii: Vec2,
    /// Inflated head outline, when a face was seen this frame.
    pub silhouette: Option<Vec<Vec2>>,
    /// A face was detected this frame.
    pub face_present: bool,
    /// A face has been detected at least once.
    pub acquired: bool,
}

/// Frame-to-frame anchor filter.
#[derive(Debug, Clone)]
pub struct AnchorTracker {
    config: AnchorConfig,
    state: AnchorState,
    /// The last face box was outside the plausible range.
    clamped: bool,
    /// Unclamped → clamped transitions seen so far.
    clamp_episodes: u64,
}

impl AnchorTracker {
    /// Creates a tracker resting at `initial` with the default face size.
    #[must_use]
    pub fn new(config: AnchorConfig, initial: Vec2) -> Self {
        let face_size = Vec2::new(config.default_face_size[0], config.default_face_size[1]);
        let mut tracker = Self {
            state: AnchorState {
                position: initial,
                face_size,
                head_radii: Vec2::ZERO,
                veil_radii: Vec2::ZERO,
                silhouette: None,
                face_present: false,
                acquired: false,
            },
            config,
            clamped: false,
            clamp_episodes: 0,
        };
        tracker.derive_radii();
        tracker
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &AnchorState {
        &self.state
    }

    /// Whether the last detected face box needed clamping.
    #[must_use]
    pub fn is_clamped(&self) -> bool {
        self.clamped
    }

    /// Number of times the face box went from plausible to clamped.
    #[must_use]
    pub fn clamp_episodes(&self) -> u64 {
        self.clamp_episodes
    }

    /// Moves a never-acquired anchor (e.g. to a new viewport center).
    ///
    /// Once a face has been seen the anchor only follows landmarks.
    pub fn recenter_if_idle(&mut self, center: Vec2) {
        if !self.state.acquired {
            self.state.position = center;
        }
    }

    /// Consumes this frame's face landmarks (or their absence).
    pub fn update(&mut self, face: Option<&FaceLandmarks>, mapper: &CoordinateMapper) -> &AnchorState {
        let Some((face, (min, max))) = face.and_then(|f| f.bounds().map(|b| (f, b))) else {
            if self.state.face_present {
                tracing::info!("face lost, holding anchor");
            }
            self.state.face_present = false;
            self.state.silhouette = None;
            return &self.state;
        };

        let center_norm = Vec2::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5);
        let face_center = mapper.map(center_norm.x, center_norm.y);
        let target = face_center + Vec2::new(0.0, self.config.vertical_offset);

        if self.state.acquired {
            let s = self.config.smoothing;
            self.state.position += (target - self.state.position) * s;
        } else {
            tracing::info!(x = target.x, y = target.y, "face acquired");
            self.state.position = target;
        }

        let raw = mapper.extent(max.x - min.x, max.y - min.y);
        self.state.face_size = Vec2::new(
            clamp_extent(raw.x, self.config.face_width_range),
            clamp_extent(raw.y, self.config.face_height_range),
        );
        let clamped = self.state.face_size != raw;
        if clamped && !self.clamped {
            self.clamp_episodes += 1;
            tracing::warn!(
                raw_w = raw.x,
                raw_h = raw.y,
                "face box outside plausible range, clamped"
            );
        } else if !clamped && self.clamped {
            tracing::debug!("face box back in range");
        }
        self.clamped = clamped;
        self.derive_radii();

        self.state.silhouette = self.silhouette(face, face_center, mapper);
        self.state.face_present = true;
        self.state.acquired = true;
        &self.state
    }

    fn derive_radii(&mut self) {
        let size = self.state.face_size;
        let [hx, hy] = self.config.head_scale;
        let [vx, vy] = self.config.veil_scale;
        self.state.head_radii = size.scale(hx, hy);
        self.state.veil_radii = size.scale(vx, vy);
    }

    fn silhouette(
        &self,
        face: &FaceLandmarks,
        face_center: Vec2,
        mapper: &CoordinateMapper,
    ) -> Option<Vec<Vec2>> {
        let [sx, sy] = self.config.silhouette_scale;
        let anchor = self.state.position;
        let polygon: Vec<Vec2> = FACE_OVAL
            .iter()
            .filter_map(|&index| face.get(index))
            .map(|p| anchor + (mapper.map_landmark(p) - face_center).scale(sx, sy))
            .collect();
        (polygon.len() >= 3).then_some(polygon)
    }
}

/// Clamps to `[lo, hi]`; non-finite input becomes `lo`.
fn clamp_extent(value: f32, [lo, hi]: [f32; 2]) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        lo
    }
}

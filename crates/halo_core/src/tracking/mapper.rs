//! Normalized source coordinates → mirrored, cover-scaled screen pixels.
//!
//! The video background is drawn with "cover" semantics (uniform scale until
//! both axes fill the viewport, overflow cropped equally on both sides) and
//! flipped horizontally. Tracking coordinates must go through the same
//! transform to line up with the picture.

use halo_shared::{Landmark, Vec2, EPSILON};

/// Cover-scale projection for one source/viewport size pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    source: Vec2,
    viewport: Vec2,
    scale: f32,
    /// Source size after scaling.
    drawn: Vec2,
    /// Crop on each side, in pixels.
    crop: Vec2,
}

impl CoordinateMapper {
    /// Builds the projection.
    ///
    /// A non-positive or non-finite source size falls back to the viewport
    /// size (scale 1, no crop); a degenerate viewport falls back to 1×1.
    #[must_use]
    pub fn new(source_w: f32, source_h: f32, viewport_w: f32, viewport_h: f32) -> Self {
        let viewport = Vec2::new(sanitize(viewport_w, 1.0), sanitize(viewport_h, 1.0));
        let source = Vec2::new(
            sanitize(source_w, viewport.x),
            sanitize(source_h, viewport.y),
        );

        let scale = (viewport.x / source.x).max(viewport.y / source.y);
        let drawn = source * scale;
        let crop = (drawn - viewport) * 0.5;

        Self {
            source,
            viewport,
            scale,
            drawn,
            crop,
        }
    }

    /// Maps a normalized coordinate to screen pixels.
    #[inline]
    #[must_use]
    pub fn map(&self, nx: f32, ny: f32) -> Vec2 {
        let x = nx * self.drawn.x - self.crop.x;
        let y = ny * self.drawn.y - self.crop.y;
        Vec2::new(self.viewport.x - x, y)
    }

    /// Inverse of [`Self::map`]: screen pixels back to normalized source
    /// coordinates.
    #[inline]
    #[must_use]
    pub fn unmap(&self, screen: Vec2) -> (f32, f32) {
        let x = self.viewport.x - screen.x;
        (
            (x + self.crop.x) / self.drawn.x,
            (screen.y + self.crop.y) / self.drawn.y,
        )
    }

    /// Maps a landmark.
    #[inline]
    #[must_use]
    pub fn map_landmark(&self, landmark: Landmark) -> Vec2 {
        self.map(landmark.x, landmark.y)
    }

    /// Pixel size of a normalized extent (mirroring does not change size).
    #[inline]
    #[must_use]
    pub fn extent(&self, dnx: f32, dny: f32) -> Vec2 {
        Vec2::new(dnx.abs() * self.drawn.x, dny.abs() * self.drawn.y)
    }

    /// Uniform cover scale factor.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Source frame size in pixels.
    #[must_use]
    pub fn source(&self) -> Vec2 {
        self.source
    }

    /// Viewport size in pixels.
    #[must_use]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1280.0, 720.0)
    }
}

fn sanitize(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > EPSILON {
        value
    } else {
        fallback
    }
}

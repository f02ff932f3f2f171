//! Landmark snapshots handed to the engine once per rendered frame.
//!
//! The inference subsystem is a black box; all it owes us is ordered lists of
//! normalized `(x, y)` points in source-frame space, `[0, 1]` on both axes,
//! unmirrored. An empty face or hand list is a normal frame.

use serde::{Deserialize, Serialize};

/// Hand landmark index of the index fingertip (21-point hand model).
pub const INDEX_FINGER_TIP: usize = 8;

/// Face-oval ring of the 468-point face mesh, clockwise from the forehead.
pub const FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

/// One normalized landmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0 = left edge of the source frame.
    pub x: f32,
    /// Vertical position, 0 = top edge of the source frame.
    pub y: f32,
}

impl Landmark {
    /// Creates a landmark.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// All landmarks of one detected face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    /// Ordered points, indexable by the face-mesh numbering.
    pub points: Vec<Landmark>,
}

impl FaceLandmarks {
    /// Wraps an ordered point list.
    #[must_use]
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Normalized bounding box `(min, max)` over the finite points.
    ///
    /// Returns `None` when there is no finite point at all.
    #[must_use]
    pub fn bounds(&self) -> Option<(Landmark, Landmark)> {
        let mut iter = self.points.iter().copied().filter(|p| p.is_finite());
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Looks up one point by mesh index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied().filter(|p| p.is_finite())
    }
}

/// All landmarks of one detected hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    /// Ordered points, indexable by the hand-model numbering.
    pub points: Vec<Landmark>,
}

impl HandLandmarks {
    /// Wraps an ordered point list.
    #[must_use]
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// The index fingertip, if present and finite.
    #[must_use]
    pub fn fingertip(&self) -> Option<Landmark> {
        self.points
            .get(INDEX_FINGER_TIP)
            .copied()
            .filter(|p| p.is_finite())
    }
}

/// Everything the tracker saw for one video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// At most one face.
    pub face: Option<FaceLandmarks>,
    /// Up to two hands, in detection order.
    pub hands: Vec<HandLandmarks>,
    /// Source video size in pixels, when the driver knows it.
    pub source_size: Option<(f32, f32)>,
}

impl LandmarkFrame {
    /// A frame with nothing detected.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The fingertip of the first hand that has one.
    #[must_use]
    pub fn fingertip(&self) -> Option<Landmark> {
        self.hands.iter().take(2).find_map(HandLandmarks::fingertip)
    }
}

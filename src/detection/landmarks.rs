//! Landmark adapter
//!
//! Maps raw normalized detector output (coordinates in [0, 1]) onto the typed
//! geometry consumed by the zone evaluator: a 21-point hand skeleton becomes
//! [`HandKeypoints`], and a 468-point face mesh becomes a [`HeadRegion`] plus
//! [`FaceLandmarks`]. No inference happens here.

use crate::detection::types::{
    FaceLandmarks, Fingertips, HandKeypoints, Handedness, HeadRegion, Point, HAND_LANDMARK_COUNT,
    WRIST,
};
use serde::{Deserialize, Serialize};

/// Hands reported below this confidence are discarded
pub const MIN_HAND_CONFIDENCE: f64 = 0.5;

/// Head box is the landmark bounding box widened by this factor
pub const HEAD_WIDTH_SCALE: f64 = 1.3;

/// Head box is the landmark bounding box heightened by this factor
pub const HEAD_HEIGHT_SCALE: f64 = 1.4;

/// Face mesh indices of the named anchors
pub mod face_mesh {
    pub const FOREHEAD_TOP: usize = 10;
    pub const CHIN: usize = 152;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const NOSE_TIP: usize = 4;
    pub const NOSE_BRIDGE: usize = 6;
    pub const UPPER_LIP: usize = 13;
    pub const LOWER_LIP: usize = 14;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
    pub const LEFT_EYEBROW_INNER: usize = 70;
    pub const RIGHT_EYEBROW_INNER: usize = 300;

    /// Smallest mesh that contains every anchor
    pub const MIN_POINTS: usize = RIGHT_CHEEK + 1;
}

/// Detector landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub x: f64,
    pub y: f64,
}

impl NormalizedLandmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn to_pixel(self, width: f64, height: f64) -> Point {
        Point::new(self.x * width, self.y * height)
    }
}

/// One raw hand detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHand {
    pub landmarks: Vec<NormalizedLandmark>,
    pub handedness: Handedness,
    pub score: f64,
}

/// Frame dimensions used to scale normalized coordinates to pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl FrameSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Convert detected hands, dropping low-confidence or truncated skeletons
    pub fn hands(&self, raw: &[RawHand]) -> Vec<HandKeypoints> {
        raw.iter()
            .filter(|hand| hand.score >= MIN_HAND_CONFIDENCE)
            .filter_map(|hand| {
                let points: Vec<Point> = hand
                    .landmarks
                    .iter()
                    .map(|l| l.to_pixel(self.width, self.height))
                    .collect();
                hand_from_points(points, hand.handedness, hand.score)
            })
            .collect()
    }

    /// Convert a face mesh into head geometry and named anchors.
    ///
    /// Returns `None` when the mesh is too short to contain every anchor.
    pub fn face(&self, mesh: &[NormalizedLandmark]) -> Option<(HeadRegion, FaceLandmarks)> {
        use face_mesh::*;

        if mesh.len() < MIN_POINTS {
            return None;
        }

        let all: Vec<Point> = mesh
            .iter()
            .map(|l| l.to_pixel(self.width, self.height))
            .collect();

        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &all {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let head = HeadRegion {
            center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            width: (max_x - min_x) * HEAD_WIDTH_SCALE,
            height: (max_y - min_y) * HEAD_HEIGHT_SCALE,
            nose: Some(all[NOSE_TIP]),
            left_eye: Some(all[LEFT_EYE_INNER]),
            right_eye: Some(all[RIGHT_EYE_INNER]),
            left_ear: Some(all[LEFT_CHEEK]),
            right_ear: Some(all[RIGHT_CHEEK]),
        };

        let face = FaceLandmarks {
            forehead: all[FOREHEAD_TOP],
            left_eyebrow: all[LEFT_EYEBROW_INNER],
            right_eyebrow: all[RIGHT_EYEBROW_INNER],
            left_eye: all[LEFT_EYE_INNER],
            right_eye: all[RIGHT_EYE_INNER],
            nose_tip: all[NOSE_TIP],
            nose_bridge: all[NOSE_BRIDGE],
            left_cheek: all[LEFT_CHEEK],
            right_cheek: all[RIGHT_CHEEK],
            upper_lip: all[UPPER_LIP],
            lower_lip: all[LOWER_LIP],
            chin: all[CHIN],
            all,
        };

        Some((head, face))
    }
}

/// Build hand keypoints from a pixel-space skeleton
pub fn hand_from_points(
    landmarks: Vec<Point>,
    handedness: Handedness,
    confidence: f64,
) -> Option<HandKeypoints> {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return None;
    }
    let fingertips = Fingertips::from_landmarks(&landmarks);
    let wrist = Some(landmarks[WRIST]);
    Some(HandKeypoints {
        landmarks,
        handedness,
        confidence,
        fingertips,
        wrist,
    })
}

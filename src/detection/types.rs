//! Detection data types
//!
//! Geometry handed in by the external landmark detector, the zone vocabulary,
//! and the per-update telemetry produced by the proximity state machine.
//! All coordinates are in pixels.

use crate::error::FrameError;
use serde::{Deserialize, Serialize};

/// Number of landmarks in a full hand skeleton
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

fn default_confidence() -> f64 {
    1.0
}

/// 2D pixel coordinate with detector confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            confidence: 1.0,
        }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Point halfway between `self` and `other`
    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            confidence: self.confidence.min(other.confidence),
        }
    }
}

/// Face bounding region; defines the head ellipse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadRegion {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nose: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_eye: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_eye: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_ear: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_ear: Option<Point>,
}

impl HeadRegion {
    /// Head region with no optional landmarks
    pub fn new(center: Point, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
            nose: None,
            left_eye: None,
            right_eye: None,
            left_ear: None,
            right_ear: None,
        }
    }
}

/// Named face anchors plus the full landmark list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceLandmarks {
    pub forehead: Point,
    pub left_eyebrow: Point,
    pub right_eyebrow: Point,
    pub left_eye: Point,
    pub right_eye: Point,
    pub nose_tip: Point,
    pub nose_bridge: Point,
    pub left_cheek: Point,
    pub right_cheek: Point,
    pub upper_lip: Point,
    pub lower_lip: Point,
    pub chin: Point,
    #[serde(default)]
    pub all: Vec<Point>,
}

/// Which hand the detector believes it saw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// The five fingertip points of one hand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fingertips {
    pub thumb: Point,
    pub index: Point,
    pub middle: Point,
    pub ring: Point,
    pub pinky: Point,
}

impl Fingertips {
    /// Fingertips taken from a full hand skeleton
    pub fn from_landmarks(landmarks: &[Point]) -> Option<Self> {
        if landmarks.len() < HAND_LANDMARK_COUNT {
            return None;
        }
        Some(Self {
            thumb: landmarks[THUMB_TIP],
            index: landmarks[INDEX_TIP],
            middle: landmarks[MIDDLE_TIP],
            ring: landmarks[RING_TIP],
            pinky: landmarks[PINKY_TIP],
        })
    }

    /// Tips in thumb-to-pinky order
    pub fn points(&self) -> [Point; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }
}

/// Landmarks for one detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandKeypoints {
    pub landmarks: Vec<Point>,
    pub handedness: Handedness,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingertips: Option<Fingertips>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrist: Option<Point>,
}

impl HandKeypoints {
    /// Fingertips as reported, or derived from the skeleton when absent
    pub fn tips(&self) -> Option<Fingertips> {
        self.fingertips
            .or_else(|| Fingertips::from_landmarks(&self.landmarks))
    }
}

/// Monitored face/scalp region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionZone {
    Scalp,
    Forehead,
    Eyebrows,
    Eyes,
    Nose,
    Cheeks,
    Mouth,
    Chin,
    Ears,
    /// The whole head ellipse as a single zone
    FullFace,
}

impl DetectionZone {
    /// Every zone except `FullFace`, in evaluation order
    pub const SPECIFIC: [DetectionZone; 9] = [
        DetectionZone::Scalp,
        DetectionZone::Forehead,
        DetectionZone::Eyebrows,
        DetectionZone::Eyes,
        DetectionZone::Nose,
        DetectionZone::Cheeks,
        DetectionZone::Mouth,
        DetectionZone::Chin,
        DetectionZone::Ears,
    ];

    /// Hair-pulling zones
    pub const HAIR: [DetectionZone; 2] = [DetectionZone::Scalp, DetectionZone::Eyebrows];

    /// Skin-picking and face-touching zones
    pub const FACE: [DetectionZone; 7] = [
        DetectionZone::Forehead,
        DetectionZone::Eyes,
        DetectionZone::Nose,
        DetectionZone::Cheeks,
        DetectionZone::Mouth,
        DetectionZone::Chin,
        DetectionZone::Ears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionZone::Scalp => "scalp",
            DetectionZone::Forehead => "forehead",
            DetectionZone::Eyebrows => "eyebrows",
            DetectionZone::Eyes => "eyes",
            DetectionZone::Nose => "nose",
            DetectionZone::Cheeks => "cheeks",
            DetectionZone::Mouth => "mouth",
            DetectionZone::Chin => "chin",
            DetectionZone::Ears => "ears",
            DetectionZone::FullFace => "fullFace",
        }
    }

    /// Parse the wire name of a zone
    pub fn parse(name: &str) -> Option<Self> {
        Self::SPECIFIC
            .iter()
            .chain(std::iter::once(&DetectionZone::FullFace))
            .copied()
            .find(|zone| zone.as_str().eq_ignore_ascii_case(name))
    }

    /// Parse a zone name or a group alias (`hair`, `face`) into zones
    pub fn parse_group(name: &str) -> Option<Vec<Self>> {
        if name.eq_ignore_ascii_case("hair") {
            Some(Self::HAIR.to_vec())
        } else if name.eq_ignore_ascii_case("face") {
            Some(Self::FACE.to_vec())
        } else {
            Self::parse(name).map(|zone| vec![zone])
        }
    }

    /// Zone radius as a fraction of the smaller head dimension.
    ///
    /// `None` for `FullFace`, which uses the head ellipse instead of a circle.
    pub fn base_ratio(&self) -> Option<f64> {
        match self {
            DetectionZone::Scalp => Some(0.4),
            DetectionZone::Forehead => Some(0.25),
            DetectionZone::Eyebrows
            | DetectionZone::Eyes
            | DetectionZone::Nose
            | DetectionZone::Mouth
            | DetectionZone::Ears => Some(0.15),
            DetectionZone::Cheeks | DetectionZone::Chin => Some(0.2),
            DetectionZone::FullFace => None,
        }
    }
}

impl std::fmt::Display for DetectionZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Life-cycle state of the proximity state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionState {
    #[default]
    Idle,
    Detecting,
    Alert,
    Cooldown,
}

/// Per-update telemetry; recomputed on every call, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityInfo {
    pub is_near_head: bool,
    /// 0 in IDLE, trigger fraction in DETECTING, 1 on the ALERT frame,
    /// remaining cooldown fraction in COOLDOWN
    pub progress: f64,
    pub state: DetectionState,
    pub active_zone: Option<DetectionZone>,
}

/// Payload delivered to the alert handler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    /// When the alert fired (epoch ms)
    pub timestamp: i64,
    /// How long the hand stayed near before the alert fired (ms)
    pub contact_duration_ms: u64,
    pub zone: Option<DetectionZone>,
}

/// One recorded detector frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Capture time (epoch ms)
    pub timestamp: i64,
    #[serde(default)]
    pub hands: Vec<HandKeypoints>,
    #[serde(default)]
    pub head: Option<HeadRegion>,
    #[serde(default)]
    pub face: Option<FaceLandmarks>,
}

impl Frame {
    /// Parse newline-delimited JSON frames, skipping blank lines
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<Frame>, FrameError> {
        let mut frames = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let frame = serde_json::from_str::<Frame>(trimmed).map_err(|e| FrameError::ParseError {
                line: line_num + 1,
                message: e.to_string(),
            })?;
            frames.push(frame);
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_wire_names() {
        assert_eq!(
            serde_json::to_string(&DetectionZone::FullFace).unwrap(),
            "\"fullFace\""
        );
        let zone: DetectionZone = serde_json::from_str("\"eyebrows\"").unwrap();
        assert_eq!(zone, DetectionZone::Eyebrows);
        assert_eq!(DetectionZone::parse("FULLFACE"), Some(DetectionZone::FullFace));
        assert_eq!(DetectionZone::parse("elbow"), None);
    }

    #[test]
    fn test_zone_groups_cover_every_specific_zone() {
        let mut grouped: Vec<_> = DetectionZone::HAIR
            .iter()
            .chain(DetectionZone::FACE.iter())
            .copied()
            .collect();
        grouped.sort();
        assert_eq!(grouped, DetectionZone::SPECIFIC.to_vec());
    }

    #[test]
    fn test_base_ratio_table() {
        let expected = [
            (DetectionZone::Scalp, Some(0.4)),
            (DetectionZone::Forehead, Some(0.25)),
            (DetectionZone::Eyebrows, Some(0.15)),
            (DetectionZone::Eyes, Some(0.15)),
            (DetectionZone::Nose, Some(0.15)),
            (DetectionZone::Cheeks, Some(0.2)),
            (DetectionZone::Mouth, Some(0.15)),
            (DetectionZone::Chin, Some(0.2)),
            (DetectionZone::Ears, Some(0.15)),
            (DetectionZone::FullFace, None),
        ];
        for (zone, ratio) in expected {
            assert_eq!(zone.base_ratio(), ratio, "ratio for {}", zone);
        }
    }

    #[test]
    fn test_parse_group_aliases() {
        assert_eq!(
            DetectionZone::parse_group("Hair"),
            Some(DetectionZone::HAIR.to_vec())
        );
        assert_eq!(
            DetectionZone::parse_group("face"),
            Some(DetectionZone::FACE.to_vec())
        );
        assert_eq!(
            DetectionZone::parse_group("fullFace"),
            Some(vec![DetectionZone::FullFace])
        );
        assert_eq!(DetectionZone::parse_group("elbow"), None);
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&DetectionState::Cooldown).unwrap(),
            "\"COOLDOWN\""
        );
    }

    #[test]
    fn test_tips_derived_from_skeleton() {
        let landmarks: Vec<Point> = (0..21).map(|i| Point::new(i as f64, 0.0)).collect();
        let hand = HandKeypoints {
            landmarks,
            handedness: Handedness::Left,
            confidence: 0.9,
            fingertips: None,
            wrist: None,
        };
        let tips = hand.tips().unwrap();
        assert_eq!(tips.thumb.x, 4.0);
        assert_eq!(tips.pinky.x, 20.0);
    }

    #[test]
    fn test_short_skeleton_has_no_tips() {
        let hand = HandKeypoints {
            landmarks: vec![Point::new(0.0, 0.0); 5],
            handedness: Handedness::Right,
            confidence: 0.9,
            fingertips: None,
            wrist: None,
        };
        assert!(hand.tips().is_none());
    }

    #[test]
    fn test_frame_parses_with_defaults() {
        let frame: Frame = serde_json::from_str(
            r#"{"timestamp": 1000, "head": {"center": {"x": 1, "y": 2}, "width": 10, "height": 12}}"#,
        )
        .unwrap();
        assert!(frame.hands.is_empty());
        let head = frame.head.unwrap();
        assert_eq!(head.center.confidence, 1.0);
        assert!(head.left_ear.is_none());
    }

    #[test]
    fn test_parse_ndjson_frames() {
        let input = "{\"timestamp\": 1}\n\n{\"timestamp\": 2, \"hands\": []}\n";
        let frames = Frame::parse_ndjson(input).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].timestamp, 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let err = Frame::parse_ndjson("{\"timestamp\": 1}\nnot json").unwrap_err();
        assert!(matches!(err, FrameError::ParseError { line: 2, .. }));
    }
}

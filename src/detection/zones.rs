//! Zone geometry
//!
//! Decides whether any fingertip currently lies inside an enabled zone. This is
//! a pure function of its inputs; the proximity state machine calls it once
//! per frame.
//!
//! Full-face mode tests the head ellipse. Every other zone is a circle around a
//! center resolved from named face landmarks, so those zones need
//! [`FaceLandmarks`]; without them nothing is near.

use crate::detection::types::{DetectionZone, FaceLandmarks, HandKeypoints, HeadRegion, Point};
use serde::{Deserialize, Serialize};

/// Horizontal offset of estimated ear points, as a fraction of head width
const EAR_OFFSET_RATIO: f64 = 0.55;

/// Upward shift of the scalp center above the forehead landmark, as a
/// fraction of head height
const SCALP_LIFT_RATIO: f64 = 0.15;

/// Result of one geometry evaluation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneHit {
    pub is_near_head: bool,
    pub active_zone: Option<DetectionZone>,
}

impl ZoneHit {
    fn near(zone: DetectionZone) -> Self {
        Self {
            is_near_head: true,
            active_zone: Some(zone),
        }
    }
}

/// Detection radius multiplier for a sensitivity in [0, 1].
///
/// Ranges from 0.8 at sensitivity 0 to 1.5 at sensitivity 1. Out-of-range
/// sensitivities are clamped.
pub fn radius_multiplier(sensitivity: f64) -> f64 {
    let s = if sensitivity.is_nan() {
        0.0
    } else {
        sensitivity.clamp(0.0, 1.0)
    };
    0.8 + s * 0.7
}

/// Evaluate hand positions against the enabled zones
pub fn evaluate(
    hands: &[HandKeypoints],
    head: Option<&HeadRegion>,
    face: Option<&FaceLandmarks>,
    enabled_zones: &[DetectionZone],
    sensitivity: f64,
) -> ZoneHit {
    let head = match head {
        Some(head) if !hands.is_empty() => head,
        _ => return ZoneHit::default(),
    };

    if enabled_zones.contains(&DetectionZone::FullFace) {
        return evaluate_full_face(hands, head, sensitivity);
    }

    match face {
        Some(face) => evaluate_zones(hands, head, face, enabled_zones, sensitivity),
        None => ZoneHit::default(),
    }
}

fn evaluate_full_face(hands: &[HandKeypoints], head: &HeadRegion, sensitivity: f64) -> ZoneHit {
    let multiplier = radius_multiplier(sensitivity);
    let rx = head.width / 2.0 * multiplier;
    let ry = head.height / 2.0 * multiplier;
    if rx <= 0.0 || ry <= 0.0 {
        return ZoneHit::default();
    }

    let inside = fingertips(hands).any(|tip| {
        let dx = (tip.x - head.center.x) / rx;
        let dy = (tip.y - head.center.y) / ry;
        dx * dx + dy * dy <= 1.0
    });

    if inside {
        ZoneHit::near(DetectionZone::FullFace)
    } else {
        ZoneHit::default()
    }
}

fn evaluate_zones(
    hands: &[HandKeypoints],
    head: &HeadRegion,
    face: &FaceLandmarks,
    enabled_zones: &[DetectionZone],
    sensitivity: f64,
) -> ZoneHit {
    let scale = head.width.min(head.height) * radius_multiplier(sensitivity);

    for zone in DetectionZone::SPECIFIC {
        if !enabled_zones.contains(&zone) {
            continue;
        }
        let Some(ratio) = zone.base_ratio() else {
            continue;
        };
        let radius = ratio * scale;
        let centers = zone_centers(zone, head, face);

        let hit = fingertips(hands)
            .any(|tip| centers.iter().any(|center| tip.distance_to(center) <= radius));
        if hit {
            return ZoneHit::near(zone);
        }
    }

    ZoneHit::default()
}

/// Candidate center points for a zone. Only `Ears` yields two.
pub fn zone_centers(zone: DetectionZone, head: &HeadRegion, face: &FaceLandmarks) -> Vec<Point> {
    match zone {
        DetectionZone::Scalp => vec![Point {
            y: face.forehead.y - head.height * SCALP_LIFT_RATIO,
            ..face.forehead
        }],
        DetectionZone::Forehead => vec![face.forehead],
        DetectionZone::Eyebrows => vec![face.left_eyebrow.midpoint(&face.right_eyebrow)],
        DetectionZone::Eyes => vec![face.left_eye.midpoint(&face.right_eye)],
        DetectionZone::Nose => vec![face.nose_tip],
        DetectionZone::Cheeks => vec![face.left_cheek.midpoint(&face.right_cheek)],
        DetectionZone::Mouth => vec![face.upper_lip.midpoint(&face.lower_lip)],
        DetectionZone::Chin => vec![face.chin],
        DetectionZone::Ears => ear_points(head, face),
        DetectionZone::FullFace => vec![head.center],
    }
}

fn ear_points(head: &HeadRegion, face: &FaceLandmarks) -> Vec<Point> {
    let detected: Vec<Point> = [head.left_ear, head.right_ear]
        .into_iter()
        .flatten()
        .collect();
    if !detected.is_empty() {
        return detected;
    }

    let eye_y = face.left_eye.midpoint(&face.right_eye).y;
    let offset = head.width * EAR_OFFSET_RATIO;
    vec![
        Point::new(head.center.x - offset, eye_y),
        Point::new(head.center.x + offset, eye_y),
    ]
}

fn fingertips(hands: &[HandKeypoints]) -> impl Iterator<Item = Point> + '_ {
    hands
        .iter()
        .filter_map(|hand| hand.tips())
        .flat_map(|tips| tips.points())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::{Fingertips, Handedness};

    fn head(cx: f64, cy: f64, w: f64, h: f64) -> HeadRegion {
        HeadRegion::new(Point::new(cx, cy), w, h)
    }

    fn hand_at(x: f64, y: f64) -> HandKeypoints {
        let tip = Point::new(x, y);
        HandKeypoints {
            landmarks: vec![tip; 21],
            handedness: Handedness::Right,
            confidence: 0.9,
            fingertips: Some(Fingertips {
                thumb: tip,
                index: tip,
                middle: tip,
                ring: tip,
                pinky: tip,
            }),
            wrist: Some(Point::new(x, y + 100.0)),
        }
    }

    /// Face centered at (200, 200) on a 100x120 head
    fn face() -> FaceLandmarks {
        FaceLandmarks {
            forehead: Point::new(200.0, 160.0),
            left_eyebrow: Point::new(180.0, 175.0),
            right_eyebrow: Point::new(220.0, 175.0),
            left_eye: Point::new(180.0, 185.0),
            right_eye: Point::new(220.0, 185.0),
            nose_tip: Point::new(200.0, 205.0),
            nose_bridge: Point::new(200.0, 190.0),
            left_cheek: Point::new(165.0, 210.0),
            right_cheek: Point::new(235.0, 210.0),
            upper_lip: Point::new(200.0, 222.0),
            lower_lip: Point::new(200.0, 228.0),
            chin: Point::new(200.0, 250.0),
            all: vec![],
        }
    }

    const ALL_SPECIFIC: &[DetectionZone] = &DetectionZone::SPECIFIC;

    #[test]
    fn test_radius_multiplier_range() {
        assert!((radius_multiplier(0.0) - 0.8).abs() < 1e-9);
        assert!((radius_multiplier(1.0) - 1.5).abs() < 1e-9);
        assert!((radius_multiplier(-3.0) - 0.8).abs() < 1e-9);
        assert!((radius_multiplier(7.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_radius_monotonic_in_sensitivity() {
        let mut prev = radius_multiplier(0.0);
        for step in 1..=100 {
            let current = radius_multiplier(step as f64 / 100.0);
            assert!(current >= prev);
            prev = current;
        }
    }

    #[test]
    fn test_full_face_hit_on_center() {
        let hit = evaluate(
            &[hand_at(200.0, 200.0)],
            Some(&head(200.0, 200.0, 150.0, 200.0)),
            None,
            &[DetectionZone::FullFace],
            0.5,
        );
        assert!(hit.is_near_head);
        assert_eq!(hit.active_zone, Some(DetectionZone::FullFace));
    }

    #[test]
    fn test_full_face_miss_far_away() {
        let hit = evaluate(
            &[hand_at(600.0, 600.0)],
            Some(&head(200.0, 200.0, 150.0, 200.0)),
            None,
            &[DetectionZone::FullFace],
            0.5,
        );
        assert_eq!(hit, ZoneHit::default());
    }

    #[test]
    fn test_sensitivity_widens_ellipse() {
        // rx = 50 * 0.8 = 40 at sensitivity 0, 50 * 1.5 = 75 at sensitivity 1
        let h = head(200.0, 200.0, 100.0, 120.0);
        let hands = [hand_at(270.0, 200.0)];
        let zones = [DetectionZone::FullFace];

        assert!(!evaluate(&hands, Some(&h), None, &zones, 0.0).is_near_head);
        assert!(evaluate(&hands, Some(&h), None, &zones, 1.0).is_near_head);
    }

    #[test]
    fn test_no_head_or_no_hands() {
        let h = head(200.0, 200.0, 150.0, 200.0);
        let zones = [DetectionZone::FullFace];
        assert_eq!(evaluate(&[], Some(&h), None, &zones, 0.5), ZoneHit::default());
        assert_eq!(
            evaluate(&[hand_at(200.0, 200.0)], None, None, &zones, 0.5),
            ZoneHit::default()
        );
    }

    #[test]
    fn test_degenerate_head_is_not_near() {
        let h = head(200.0, 200.0, 0.0, 0.0);
        let hit = evaluate(&[hand_at(200.0, 200.0)], Some(&h), None, &[DetectionZone::FullFace], 0.5);
        assert!(!hit.is_near_head);
    }

    #[test]
    fn test_specific_zones_require_face_landmarks() {
        let h = head(200.0, 200.0, 100.0, 120.0);
        let hit = evaluate(&[hand_at(200.0, 205.0)], Some(&h), None, ALL_SPECIFIC, 0.5);
        assert_eq!(hit, ZoneHit::default());
    }

    #[test]
    fn test_nose_zone_hit() {
        let h = head(200.0, 200.0, 100.0, 120.0);
        let hit = evaluate(
            &[hand_at(200.0, 205.0)],
            Some(&h),
            Some(&face()),
            &[DetectionZone::Nose],
            0.5,
        );
        assert_eq!(hit.active_zone, Some(DetectionZone::Nose));
    }

    #[test]
    fn test_disabled_zone_is_ignored() {
        let h = head(200.0, 200.0, 100.0, 120.0);
        // On the chin, but only the scalp is monitored
        let hit = evaluate(
            &[hand_at(200.0, 250.0)],
            Some(&h),
            Some(&face()),
            &[DetectionZone::Scalp],
            0.5,
        );
        assert!(!hit.is_near_head);
    }

    #[test]
    fn test_first_zone_in_order_wins() {
        // Nose tip (200,205) and eyes midpoint (200,185) are both within
        // 0.15 * 100 * 1.15 = 17.25 of (200,195)
        let h = head(200.0, 200.0, 100.0, 120.0);
        let hit = evaluate(
            &[hand_at(200.0, 195.0)],
            Some(&h),
            Some(&face()),
            &[DetectionZone::Nose, DetectionZone::Eyes],
            0.5,
        );
        assert_eq!(hit.active_zone, Some(DetectionZone::Eyes));
    }

    #[test]
    fn test_ears_estimated_without_detector_points() {
        // Estimated ears at x = 200 -/+ 55, y = 185
        let h = head(200.0, 200.0, 100.0, 120.0);
        let hit = evaluate(
            &[hand_at(255.0, 186.0)],
            Some(&h),
            Some(&face()),
            &[DetectionZone::Ears],
            0.5,
        );
        assert_eq!(hit.active_zone, Some(DetectionZone::Ears));
    }

    #[test]
    fn test_ears_prefer_detector_points() {
        let mut h = head(200.0, 200.0, 100.0, 120.0);
        h.left_ear = Some(Point::new(140.0, 200.0));
        h.right_ear = Some(Point::new(260.0, 200.0));

        let centers = zone_centers(DetectionZone::Ears, &h, &face());
        assert_eq!(centers, vec![Point::new(140.0, 200.0), Point::new(260.0, 200.0)]);

        let hit = evaluate(
            &[hand_at(140.0, 202.0)],
            Some(&h),
            Some(&face()),
            &[DetectionZone::Ears],
            0.5,
        );
        assert!(hit.is_near_head);
    }

    #[test]
    fn test_scalp_sits_above_forehead() {
        let h = head(200.0, 200.0, 100.0, 120.0);
        let centers = zone_centers(DetectionZone::Scalp, &h, &face());
        assert_eq!(centers.len(), 1);
        assert!((centers[0].y - 142.0).abs() < 1e-9);
    }

    #[test]
    fn test_hand_without_tips_is_skipped() {
        let h = head(200.0, 200.0, 150.0, 200.0);
        let hand = HandKeypoints {
            landmarks: vec![Point::new(200.0, 200.0); 3],
            handedness: Handedness::Left,
            confidence: 0.9,
            fingertips: None,
            wrist: None,
        };
        let hit = evaluate(&[hand], Some(&h), None, &[DetectionZone::FullFace], 0.5);
        assert!(!hit.is_near_head);
    }

    fn zone_hit_at(zone: DetectionZone, x: f64, y: f64) -> bool {
        let h = head(200.0, 200.0, 100.0, 120.0);
        evaluate(&[hand_at(x, y)], Some(&h), Some(&face()), &[zone], 0.5).active_zone == Some(zone)
    }

    #[test]
    fn test_zone_radius_boundaries() {
        // min(100, 120) * 1.15 = 115 pixels per unit of ratio
        let cases = [
            (DetectionZone::Scalp, Point::new(200.0, 142.0), 0.4),
            (DetectionZone::Forehead, Point::new(200.0, 160.0), 0.25),
            (DetectionZone::Cheeks, Point::new(200.0, 210.0), 0.2),
            (DetectionZone::Chin, Point::new(200.0, 250.0), 0.2),
            (DetectionZone::Eyebrows, Point::new(200.0, 175.0), 0.15),
            (DetectionZone::Mouth, Point::new(200.0, 225.0), 0.15),
        ];
        for (zone, center, ratio) in cases {
            let radius = ratio * 115.0;
            assert!(
                zone_hit_at(zone, center.x + radius - 0.01, center.y),
                "{} should hit just inside {}",
                zone,
                radius
            );
            assert!(
                !zone_hit_at(zone, center.x + radius + 0.01, center.y),
                "{} should miss just outside {}",
                zone,
                radius
            );
        }
    }

    #[test]
    fn test_paired_zones_use_midpoint() {
        assert!(zone_hit_at(DetectionZone::Eyebrows, 200.0, 175.0));
        assert!(zone_hit_at(DetectionZone::Cheeks, 200.0, 210.0));
        assert!(zone_hit_at(DetectionZone::Mouth, 200.0, 225.0));
        assert!(zone_hit_at(DetectionZone::Eyes, 200.0, 185.0));

        // The individual landmarks sit farther than one radius from the midpoint
        assert!(!zone_hit_at(DetectionZone::Eyebrows, 180.0, 175.0));
        assert!(!zone_hit_at(DetectionZone::Cheeks, 165.0, 210.0));
    }

    #[test]
    fn test_single_landmark_zones_hit() {
        assert!(zone_hit_at(DetectionZone::Forehead, 200.0, 160.0));
        assert!(zone_hit_at(DetectionZone::Chin, 200.0, 250.0));
        assert!(zone_hit_at(DetectionZone::Nose, 200.0, 205.0));
    }
}

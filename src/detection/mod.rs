//! Hand-to-face proximity detection
//!
//! Turns per-frame hand and face geometry into debounced touch alerts.
//!
//! Pipeline: detector output → Landmark adapter → Zone geometry → Proximity state machine → alerts

pub mod landmarks;
pub mod proximity;
pub mod types;
pub mod zones;

pub use landmarks::{FrameSize, NormalizedLandmark, RawHand};
pub use proximity::{ProximityConfig, ProximityConfigUpdate, ProximityHandlers, ProximityMachine};
pub use types::{
    AlertEvent, DetectionState, DetectionZone, FaceLandmarks, Fingertips, Frame, HandKeypoints,
    Handedness, HeadRegion, Point, ProximityInfo,
};
pub use zones::{evaluate, ZoneHit};

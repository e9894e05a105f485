//! facetouch - Decision core for a face-touch habit monitor
//!
//! Turns per-frame hand and head geometry into debounced touch alerts, and
//! turns those alerts into durable daily habit statistics: goals, streaks and
//! meditation prompts.
//!
//! ## Modules
//!
//! - **Detection**: landmark adaptation → zone geometry → proximity state machine
//! - **Stats**: event store, day archival, aggregation views, import/export
//!
//! Time and persistence are injected through [`clock::Clock`] and
//! [`store::KeyValueStore`], so both engines run deterministically in tests
//! and when replaying recorded frames.

pub mod clock;
pub mod detection;
pub mod error;
pub mod meditation;
pub mod stats;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use detection::{
    AlertEvent, DetectionState, DetectionZone, ProximityConfig, ProximityHandlers, ProximityInfo,
    ProximityMachine,
};
pub use error::{FrameError, ImportError, StoreError};
pub use stats::{DailyStats, HabitSettings, HabitTracker, ImportSummary, TouchEvent, UserProgress};
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

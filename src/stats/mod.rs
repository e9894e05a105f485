//! Habit statistics
//!
//! Persistent touch history, daily aggregation, streaks, meditation gating and
//! import/export.

pub mod archive;
pub mod streak;
pub mod tracker;
pub mod transfer;
pub mod types;

pub use archive::MAX_DAILY_STATS_DAYS;
pub use tracker::{HabitTracker, STORAGE_KEY};
pub use transfer::{ImportSummary, EXPORT_VERSION};
pub use types::{
    DailyStats, ExportData, HabitSettings, HabitSettingsUpdate, StatisticsState, TouchEvent,
    UserProgress,
};

//! Habit statistics types
//!
//! Records persisted by the statistics engine. JSON field names are camelCase
//! so documents written by earlier releases load unchanged.

use crate::detection::types::DetectionZone;
use serde::{Deserialize, Serialize};

/// Number of hourly buckets in a day
pub const HOURS_PER_DAY: usize = 24;

/// One recorded touch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub id: String,
    /// When the touch was recorded (epoch ms)
    pub timestamp: i64,
    /// How long the hand was near the face before the alert (ms)
    pub duration: u64,
    #[serde(default)]
    pub zone: Option<DetectionZone>,
}

/// Aggregated statistics for one local calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Local date (`YYYY-MM-DD`)
    pub date: String,
    #[serde(default)]
    pub touch_count: u32,
    /// Total time near face (ms)
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub touches_by_hour: [u32; HOURS_PER_DAY],
    #[serde(default)]
    pub meditation_minutes: u32,
    #[serde(default)]
    pub meditation_sessions: u32,
    #[serde(default)]
    pub first_touch: Option<i64>,
    #[serde(default)]
    pub last_touch: Option<i64>,
}

impl DailyStats {
    /// Zeroed stats for a date
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            touch_count: 0,
            total_duration: 0,
            touches_by_hour: [0; HOURS_PER_DAY],
            meditation_minutes: 0,
            meditation_sessions: 0,
            first_touch: None,
            last_touch: None,
        }
    }

    /// Fold one touch into the day, bucketed under its local hour
    pub fn add_touch(&mut self, event: &TouchEvent, local_hour: usize) {
        self.touch_count = self.touch_count.saturating_add(1);
        self.total_duration = self.total_duration.saturating_add(event.duration);
        if let Some(bucket) = self.touches_by_hour.get_mut(local_hour) {
            *bucket = bucket.saturating_add(1);
        }
        self.first_touch = Some(match self.first_touch {
            Some(first) => first.min(event.timestamp),
            None => event.timestamp,
        });
        self.last_touch = Some(match self.last_touch {
            Some(last) => last.max(event.timestamp),
            None => event.timestamp,
        });
    }

    /// Hour of day with the most touches, if any were recorded
    pub fn peak_hour(&self) -> Option<usize> {
        let (hour, count) = self
            .touches_by_hour
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
        (*count > 0).then_some(hour)
    }
}

/// User-tunable habit thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HabitSettings {
    /// Recommend meditation every N touches
    pub touch_threshold_for_meditation: u32,
    /// A day at or under this many touches keeps the streak alive
    pub daily_touch_goal: u32,
    /// Default meditation length (seconds)
    pub meditation_duration: u32,
    pub enable_meditation_reminder: bool,
    /// Minimum minutes between two recommendations
    pub meditation_cooldown_minutes: u32,
}

impl Default for HabitSettings {
    fn default() -> Self {
        Self {
            touch_threshold_for_meditation: 5,
            daily_touch_goal: 10,
            meditation_duration: 180,
            enable_meditation_reminder: true,
            meditation_cooldown_minutes: 30,
        }
    }
}

impl HabitSettings {
    /// Apply a partial update
    pub fn apply(&mut self, update: HabitSettingsUpdate) {
        if let Some(v) = update.touch_threshold_for_meditation {
            self.touch_threshold_for_meditation = v;
        }
        if let Some(v) = update.daily_touch_goal {
            self.daily_touch_goal = v;
        }
        if let Some(v) = update.meditation_duration {
            self.meditation_duration = v;
        }
        if let Some(v) = update.enable_meditation_reminder {
            self.enable_meditation_reminder = v;
        }
        if let Some(v) = update.meditation_cooldown_minutes {
            self.meditation_cooldown_minutes = v;
        }
    }
}

/// Partial settings update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSettingsUpdate {
    pub touch_threshold_for_meditation: Option<u32>,
    pub daily_touch_goal: Option<u32>,
    pub meditation_duration: Option<u32>,
    pub enable_meditation_reminder: Option<bool>,
    pub meditation_cooldown_minutes: Option<u32>,
}

/// Lifetime progress counters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProgress {
    pub current_streak: u32,
    /// Never decreases
    pub longest_streak: u32,
    pub total_meditation_minutes: u32,
    pub total_meditation_sessions: u32,
    /// Local date tracking started (`YYYY-MM-DD`)
    pub start_date: String,
}

/// The complete persisted document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsState {
    /// Touches from the current local day only, once archived
    pub today_events: Vec<TouchEvent>,
    /// History, newest first, unique by date, at most 90 entries
    pub daily_stats: Vec<DailyStats>,
    pub settings: HabitSettings,
    pub progress: UserProgress,
    pub last_meditation_recommended_at: Option<i64>,
}

/// Portable export document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    /// ISO-8601 UTC export time
    pub exported_at: String,
    pub settings: HabitSettings,
    pub progress: UserProgress,
    pub daily_stats: Vec<DailyStats>,
}

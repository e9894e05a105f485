//! Habit tracker
//!
//! Owns the persisted [`StatisticsState`]: appends touch and meditation events,
//! archives past days, and derives today/weekly/monthly views, streaks and
//! meditation prompts on demand.
//!
//! Every public method runs the archival pass first, so views are always
//! computed against the current local date. Persistence is best effort: a
//! failed read yields default state and a failed write is logged, while the
//! in-memory state stays authoritative.

use crate::clock::{self, Clock, SystemClock};
use crate::detection::types::{AlertEvent, DetectionZone};
use crate::stats::archive;
use crate::stats::streak;
use crate::stats::types::{
    DailyStats, HabitSettings, HabitSettingsUpdate, StatisticsState, TouchEvent, UserProgress,
};
use crate::store::KeyValueStore;
use chrono::{Datelike, Days, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Key the statistics document is stored under
pub const STORAGE_KEY: &str = "dont-touch-statistics";

/// Number of days in the weekly view
pub const WEEK_DAYS: u64 = 7;

/// Stateful statistics engine backed by a key-value store
pub struct HabitTracker<S: KeyValueStore, C: Clock = SystemClock> {
    pub(crate) store: S,
    pub(crate) clock: C,
    pub(crate) key: String,
    pub(crate) state: StatisticsState,
}

impl<S: KeyValueStore, C: Clock> HabitTracker<S, C> {
    /// Load state from `store` (falling back to defaults) and archive past days
    pub fn new(store: S, clock: C) -> Self {
        Self::with_storage_key(store, clock, STORAGE_KEY)
    }

    /// Same as [`HabitTracker::new`] with a custom storage key
    pub fn with_storage_key(store: S, clock: C, key: &str) -> Self {
        let state = load_state(&store, key, &clock);
        let mut tracker = Self {
            store,
            clock,
            key: key.to_string(),
            state,
        };
        tracker.refresh();
        tracker
    }

    /// Append a touch stamped with the current time
    pub fn record_touch(&mut self, duration_ms: u64, zone: Option<DetectionZone>) -> TouchEvent {
        self.refresh();

        let event = TouchEvent {
            id: Uuid::new_v4().to_string(),
            timestamp: self.clock.now_ms(),
            duration: duration_ms,
            zone,
        };
        self.state.today_events.push(event.clone());
        self.persist();

        event
    }

    /// Record the touch reported by a proximity alert
    pub fn record_alert(&mut self, alert: &AlertEvent) -> TouchEvent {
        self.record_touch(alert.contact_duration_ms, alert.zone)
    }

    /// Record a completed meditation against lifetime and today's counters
    pub fn record_meditation(&mut self, minutes: u32) {
        self.refresh();

        let progress = &mut self.state.progress;
        progress.total_meditation_minutes = progress.total_meditation_minutes.saturating_add(minutes);
        progress.total_meditation_sessions = progress.total_meditation_sessions.saturating_add(1);

        let today = clock::today_string(&self.clock);
        let daily = archive::day_entry(&mut self.state.daily_stats, &today);
        daily.meditation_minutes = daily.meditation_minutes.saturating_add(minutes);
        daily.meditation_sessions = daily.meditation_sessions.saturating_add(1);
        archive::prune_history(&mut self.state.daily_stats);

        self.persist();
    }

    /// Stamp the current time as the last meditation recommendation
    pub fn set_meditation_recommended(&mut self) {
        self.refresh();
        self.state.last_meditation_recommended_at = Some(self.clock.now_ms());
        self.persist();
    }

    /// Whether a meditation should be suggested right now.
    ///
    /// True only at exact multiples of the touch threshold, and only once the
    /// recommendation cooldown has passed.
    pub fn should_recommend_meditation(&mut self) -> bool {
        self.refresh();

        let settings = &self.state.settings;
        if !settings.enable_meditation_reminder {
            return false;
        }

        let threshold = settings.touch_threshold_for_meditation;
        let count = self.state.today_events.len() as u32;
        if threshold == 0 || count < threshold {
            return false;
        }

        if let Some(last) = self.state.last_meditation_recommended_at {
            let cooldown_ms = i64::from(settings.meditation_cooldown_minutes) * 60 * 1000;
            if self.clock.now_ms() - last < cooldown_ms {
                return false;
            }
        }

        count % threshold == 0
    }

    pub fn get_today_touch_count(&mut self) -> usize {
        self.refresh();
        self.state.today_events.len()
    }

    pub fn get_today_events(&mut self) -> Vec<TouchEvent> {
        self.refresh();
        self.state.today_events.clone()
    }

    /// Live stats for today, folded from today's events
    pub fn get_today_stats(&mut self) -> DailyStats {
        self.refresh();
        self.live_today_stats()
    }

    /// Seven days, oldest first, ending with today
    pub fn get_weekly_stats(&mut self) -> Vec<DailyStats> {
        self.refresh();
        let today = clock::today(&self.clock);

        let mut week: Vec<DailyStats> = (1..WEEK_DAYS)
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
            .map(|date| self.archived_or_empty(&clock::date_key(date)))
            .collect();
        week.push(self.live_today_stats());
        week
    }

    /// Every day of a month (1-based) up to and including today, keyed by date.
    ///
    /// Future dates are omitted. Past days without history are zero-filled
    /// rather than left out, so every calendar cell up to today has an entry;
    /// earlier releases of the app skipped days with no archived stats.
    pub fn get_monthly_stats(&mut self, year: i32, month: u32) -> BTreeMap<String, DailyStats> {
        self.refresh();
        let today = clock::today(&self.clock);
        let mut result = BTreeMap::new();

        let mut day = NaiveDate::from_ymd_opt(year, month, 1);
        while let Some(date) = day {
            if date.month() != month || date > today {
                break;
            }
            let key = clock::date_key(date);
            let stats = if date == today {
                self.live_today_stats()
            } else {
                self.archived_or_empty(&key)
            };
            result.insert(key, stats);
            day = date.succ_opt();
        }

        result
    }

    /// Archived history, newest first
    pub fn get_history(&mut self) -> Vec<DailyStats> {
        self.refresh();
        self.state.daily_stats.clone()
    }

    pub fn get_settings(&mut self) -> HabitSettings {
        self.refresh();
        self.state.settings.clone()
    }

    /// Merge a partial settings update and re-evaluate the streak
    pub fn update_settings(&mut self, update: HabitSettingsUpdate) {
        self.refresh();
        self.state.settings.apply(update);
        self.recompute_streak();
        self.persist();
    }

    pub fn get_progress(&mut self) -> UserProgress {
        self.refresh();
        self.state.progress.clone()
    }

    /// Reset everything to defaults and persist
    pub fn clear_all_data(&mut self) {
        self.state = default_state(&self.clock);
        log::info!("statistics cleared");
        self.persist();
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Archival pass: migrate past-day events, then recompute the streak.
    /// Persists only when something changed.
    pub(crate) fn refresh(&mut self) {
        let archived = archive::archive_past_days(&mut self.state, &self.clock);
        let before = (
            self.state.progress.current_streak,
            self.state.progress.longest_streak,
        );
        self.recompute_streak();
        let after = (
            self.state.progress.current_streak,
            self.state.progress.longest_streak,
        );

        if archived > 0 || before != after {
            self.persist();
        }
    }

    pub(crate) fn recompute_streak(&mut self) {
        let today = clock::today_string(&self.clock);
        streak::update_streak(
            &mut self.state.progress,
            &self.state.daily_stats,
            &today,
            self.state.settings.daily_touch_goal,
        );
    }

    pub(crate) fn persist(&mut self) {
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize statistics: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key, &json) {
            log::error!("Failed to save statistics to storage: {}", e);
        }
    }

    fn live_today_stats(&self) -> DailyStats {
        let today = clock::today_string(&self.clock);
        let mut stats = DailyStats::empty(today.as_str());

        for event in &self.state.today_events {
            stats.add_touch(event, clock::local_hour(&self.clock, event.timestamp));
        }

        if let Some(archived) = self.state.daily_stats.iter().find(|d| d.date == today) {
            stats.meditation_minutes = archived.meditation_minutes;
            stats.meditation_sessions = archived.meditation_sessions;
        }

        stats
    }

    fn archived_or_empty(&self, date: &str) -> DailyStats {
        self.state
            .daily_stats
            .iter()
            .find(|d| d.date == date)
            .cloned()
            .unwrap_or_else(|| DailyStats::empty(date))
    }
}

/// All-defaults state with tracking starting today
pub(crate) fn default_state<C: Clock + ?Sized>(clock: &C) -> StatisticsState {
    let mut state = StatisticsState::default();
    state.progress.start_date = clock::today_string(clock);
    state
}

/// Read the persisted document, falling back to defaults on any failure
fn load_state<S: KeyValueStore, C: Clock + ?Sized>(store: &S, key: &str, clock: &C) -> StatisticsState {
    let json = match store.get(key) {
        Ok(Some(json)) => json,
        Ok(None) => return default_state(clock),
        Err(e) => {
            log::error!("Failed to load statistics from storage: {}", e);
            return default_state(clock);
        }
    };

    match serde_json::from_str::<Value>(&json) {
        Ok(Value::Object(doc)) => state_from_document(&doc, clock),
        Ok(_) => {
            log::warn!("Stored statistics are not an object; using defaults");
            default_state(clock)
        }
        Err(e) => {
            log::warn!("Stored statistics are corrupted ({}); using defaults", e);
            default_state(clock)
        }
    }
}

/// Field-by-field lenient decode: each malformed field falls back to its
/// default and malformed list entries are skipped.
fn state_from_document<C: Clock + ?Sized>(doc: &Map<String, Value>, clock: &C) -> StatisticsState {
    let mut state = StatisticsState {
        today_events: list_field(doc, "todayEvents"),
        daily_stats: list_field(doc, "dailyStats"),
        settings: field(doc, "settings"),
        progress: field(doc, "progress"),
        last_meditation_recommended_at: field(doc, "lastMeditationRecommendedAt"),
    };

    if state.progress.start_date.is_empty() {
        state.progress.start_date = clock::today_string(clock);
    }
    archive::prune_history(&mut state.daily_stats);
    state
}

fn field<T: DeserializeOwned + Default>(doc: &Map<String, Value>, name: &str) -> T {
    match doc.get(name) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed stored field {}: {}", name, e);
            T::default()
        }),
    }
}

fn list_field<T: DeserializeOwned>(doc: &Map<String, Value>, name: &str) -> Vec<T> {
    let Some(Value::Array(items)) = doc.get(name) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Skipping malformed entry in {}: {}", name, e);
                None
            }
        })
        .collect()
}

//! Export and import of statistics documents
//!
//! Exports carry settings, progress and history (never today's raw events).
//! Imports are validated as a whole first, then entry by entry: malformed
//! history entries are dropped without failing the import.

use crate::clock::{self, Clock};
use crate::error::ImportError;
use crate::stats::archive;
use crate::stats::tracker::HabitTracker;
use crate::stats::types::{DailyStats, ExportData, HabitSettings, StatisticsState, UserProgress};
use crate::store::KeyValueStore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Version tag written into exports
pub const EXPORT_VERSION: &str = "1.0";

/// Outcome of a successful import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    /// History entries kept
    pub imported: usize,
    /// History entries rejected or deduplicated away
    pub dropped: usize,
}

impl<S: KeyValueStore, C: Clock> HabitTracker<S, C> {
    /// Snapshot settings, progress and history for export
    pub fn export_data(&mut self) -> ExportData {
        self.refresh();

        let now = DateTime::<Utc>::from_timestamp_millis(self.clock.now_ms()).unwrap_or_default();
        ExportData {
            version: EXPORT_VERSION.to_string(),
            exported_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            settings: self.state.settings.clone(),
            progress: self.state.progress.clone(),
            daily_stats: self.state.daily_stats.clone(),
        }
    }

    /// Export as pretty-printed JSON
    pub fn export_json(&mut self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export_data())
    }

    /// Validate and load an export document, replacing current state.
    ///
    /// Today's events and the last recommendation time are cleared.
    pub fn try_import(&mut self, doc: &Value) -> Result<ImportSummary, ImportError> {
        let doc = doc.as_object().ok_or(ImportError::NotAnObject)?;

        match doc.get("version") {
            Some(Value::String(version)) if !version.is_empty() => {}
            _ => return Err(ImportError::MissingVersion),
        }

        let entries = doc
            .get("dailyStats")
            .and_then(Value::as_array)
            .ok_or(ImportError::MissingDailyStats)?;

        let mut history: Vec<DailyStats> = entries.iter().filter_map(valid_entry).collect();
        archive::prune_history(&mut history);

        let summary = ImportSummary {
            imported: history.len(),
            dropped: entries.len() - history.len(),
        };

        let mut progress: UserProgress = merged_field(doc, "progress");
        if progress.start_date.is_empty() {
            progress.start_date = clock::today_string(&self.clock);
        }

        self.state = StatisticsState {
            today_events: Vec::new(),
            daily_stats: history,
            settings: merged_field::<HabitSettings>(doc, "settings"),
            progress,
            last_meditation_recommended_at: None,
        };
        self.recompute_streak();
        self.persist();

        log::info!(
            "imported {} days of history ({} dropped)",
            summary.imported,
            summary.dropped
        );
        Ok(summary)
    }

    /// Import a parsed document; returns whether it was accepted
    pub fn import_data(&mut self, doc: &Value) -> bool {
        match self.try_import(doc) {
            Ok(_) => true,
            Err(e) => {
                log::error!("Failed to import data: {}", e);
                false
            }
        }
    }

    /// Import from JSON text; returns whether it was accepted
    pub fn import_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Value>(json) {
            Ok(doc) => self.import_data(&doc),
            Err(e) => {
                log::error!("Failed to import data: {}", ImportError::from(e));
                false
            }
        }
    }
}

/// Accept an entry only with a `YYYY-MM-DD` date and a non-negative touch count
fn valid_entry(entry: &Value) -> Option<DailyStats> {
    let fields = entry.as_object()?;

    let date_ok = fields
        .get("date")
        .and_then(Value::as_str)
        .is_some_and(is_date_key);
    let count_ok = fields
        .get("touchCount")
        .and_then(Value::as_f64)
        .is_some_and(|count| count >= 0.0);

    if !date_ok || !count_ok {
        log::warn!("Dropping invalid history entry: {}", entry);
        return None;
    }

    match serde_json::from_value(entry.clone()) {
        Ok(stats) => Some(stats),
        Err(e) => {
            log::warn!("Dropping unreadable history entry: {}", e);
            None
        }
    }
}

/// Shape check only: four digits, dash, two digits, dash, two digits
fn is_date_key(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Missing fields take their defaults; an unreadable object is replaced whole
fn merged_field<T: DeserializeOwned + Default>(doc: &Map<String, Value>, name: &str) -> T {
    match doc.get(name) {
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed {} in import: {}", name, e);
            T::default()
        }),
        _ => T::default(),
    }
}

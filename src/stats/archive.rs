//! Day archival
//!
//! Touches are appended to a "today" list. Once the local date rolls over,
//! those events are migrated into per-day [`DailyStats`] summaries. The pass
//! is lazy: it runs before every read or write instead of on a timer, so the
//! only requirement for correctness is that it runs before stats are read.

use crate::clock::{self, Clock};
use crate::stats::types::{DailyStats, StatisticsState, TouchEvent};
use std::collections::BTreeMap;

/// Maximum number of days kept in history
pub const MAX_DAILY_STATS_DAYS: usize = 90;

/// Migrate events from past local days into history.
///
/// Returns the number of events archived.
pub fn archive_past_days<C: Clock + ?Sized>(state: &mut StatisticsState, clock: &C) -> usize {
    let today = clock::today_string(clock);

    let (current, past): (Vec<TouchEvent>, Vec<TouchEvent>) = std::mem::take(&mut state.today_events)
        .into_iter()
        .partition(|event| clock::local_date_string(clock, event.timestamp) == today);
    state.today_events = current;

    if past.is_empty() {
        return 0;
    }

    let mut by_date: BTreeMap<String, Vec<TouchEvent>> = BTreeMap::new();
    for event in past {
        by_date
            .entry(clock::local_date_string(clock, event.timestamp))
            .or_default()
            .push(event);
    }

    let mut archived = 0;
    for (date, events) in by_date {
        archived += events.len();
        let daily = day_entry(&mut state.daily_stats, &date);
        for event in &events {
            daily.add_touch(event, clock::local_hour(clock, event.timestamp));
        }
        log::debug!("archived {} touches into {}", events.len(), date);
    }

    prune_history(&mut state.daily_stats);
    archived
}

/// Find the history entry for `date`, creating an empty one if needed
pub fn day_entry<'a>(history: &'a mut Vec<DailyStats>, date: &str) -> &'a mut DailyStats {
    let index = match history.iter().position(|d| d.date == date) {
        Some(index) => index,
        None => {
            history.push(DailyStats::empty(date));
            history.len() - 1
        }
    };
    &mut history[index]
}

/// Sort history newest first, drop duplicate dates and keep the newest 90 days.
///
/// When a date appears more than once the first occurrence wins.
pub fn prune_history(history: &mut Vec<DailyStats>) {
    history.sort_by(|a, b| b.date.cmp(&a.date));
    history.dedup_by(|later, earlier| later.date == earlier.date);
    history.truncate(MAX_DAILY_STATS_DAYS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn ms(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn touch(ts: i64) -> TouchEvent {
        TouchEvent {
            id: format!("t{}", ts),
            timestamp: ts,
            duration: 1000,
            zone: None,
        }
    }

    #[test]
    fn test_nothing_to_archive_on_same_day() {
        let clock = ManualClock::new(ms(2024, 6, 15, 18));
        let mut state = StatisticsState {
            today_events: vec![touch(ms(2024, 6, 15, 9)), touch(ms(2024, 6, 15, 10))],
            ..Default::default()
        };

        assert_eq!(archive_past_days(&mut state, &clock), 0);
        assert_eq!(state.today_events.len(), 2);
        assert!(state.daily_stats.is_empty());
    }

    #[test]
    fn test_rollover_groups_by_local_date() {
        let clock = ManualClock::new(ms(2024, 6, 16, 8));
        let mut state = StatisticsState {
            today_events: vec![
                touch(ms(2024, 6, 14, 9)),
                touch(ms(2024, 6, 15, 9)),
                touch(ms(2024, 6, 15, 21)),
                touch(ms(2024, 6, 16, 7)),
            ],
            ..Default::default()
        };

        assert_eq!(archive_past_days(&mut state, &clock), 3);
        assert_eq!(state.today_events.len(), 1);

        let dates: Vec<_> = state.daily_stats.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-15", "2024-06-14"]);

        let june15 = &state.daily_stats[0];
        assert_eq!(june15.touch_count, 2);
        assert_eq!(june15.total_duration, 2000);
        assert_eq!(june15.touches_by_hour[9], 1);
        assert_eq!(june15.touches_by_hour[21], 1);
        assert_eq!(june15.first_touch, Some(ms(2024, 6, 15, 9)));
        assert_eq!(june15.last_touch, Some(ms(2024, 6, 15, 21)));
    }

    #[test]
    fn test_archival_uses_local_not_utc_days() {
        // 22:00 UTC on Jun 15 is 00:00 Jun 16 at UTC+2, which is "today"
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let clock = ManualClock::with_offset(ms(2024, 6, 16, 8), offset);
        let mut state = StatisticsState {
            today_events: vec![touch(ms(2024, 6, 15, 22)), touch(ms(2024, 6, 15, 21))],
            ..Default::default()
        };

        assert_eq!(archive_past_days(&mut state, &clock), 1);
        assert_eq!(state.today_events[0].timestamp, ms(2024, 6, 15, 22));
        assert_eq!(state.daily_stats[0].date, "2024-06-15");
        assert_eq!(state.daily_stats[0].touches_by_hour[23], 1);
    }

    #[test]
    fn test_archive_merges_into_existing_day() {
        let clock = ManualClock::new(ms(2024, 6, 16, 8));
        let mut existing = DailyStats::empty("2024-06-15");
        existing.meditation_minutes = 3;
        existing.meditation_sessions = 1;
        let mut state = StatisticsState {
            today_events: vec![touch(ms(2024, 6, 15, 9))],
            daily_stats: vec![existing],
            ..Default::default()
        };

        archive_past_days(&mut state, &clock);
        assert_eq!(state.daily_stats.len(), 1);
        assert_eq!(state.daily_stats[0].touch_count, 1);
        assert_eq!(state.daily_stats[0].meditation_minutes, 3);
    }

    #[test]
    fn test_prune_keeps_newest_ninety() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut history: Vec<DailyStats> = (0..120)
            .map(|i| DailyStats::empty(crate::clock::date_key(start + chrono::Days::new(i))))
            .collect();

        prune_history(&mut history);
        assert_eq!(history.len(), MAX_DAILY_STATS_DAYS);
        assert_eq!(history[0].date, "2024-04-29");
        assert_eq!(history[89].date, "2024-01-31");
    }

    #[test]
    fn test_prune_drops_duplicate_dates() {
        let mut first = DailyStats::empty("2024-06-15");
        first.touch_count = 4;
        let mut history = vec![
            DailyStats::empty("2024-06-14"),
            first,
            DailyStats::empty("2024-06-15"),
        ];

        prune_history(&mut history);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].touch_count, 4);
    }
}

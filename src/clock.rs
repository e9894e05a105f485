//! Wall-clock abstraction and local calendar helpers
//!
//! Every time-dependent decision (trigger and cooldown fractions, day rollover,
//! meditation cooldown) compares a captured timestamp against [`Clock::now_ms`].
//! Calendar days are always resolved in the local offset reported by the clock,
//! never in UTC.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeZone, Timelike, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Format of every calendar-day key (`YYYY-MM-DD`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of the current time and of the local UTC offset
pub trait Clock {
    /// Current time as epoch milliseconds
    fn now_ms(&self) -> i64;

    /// Local UTC offset in effect at the given instant
    fn offset_at(&self, timestamp_ms: i64) -> FixedOffset;
}

/// Clock backed by the operating system time and timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn offset_at(&self, timestamp_ms: i64) -> FixedOffset {
        Local
            .timestamp_millis_opt(timestamp_ms)
            .earliest()
            .map(|dt| dt.offset().fix())
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Settable clock with a fixed local offset.
///
/// Clones share the same instant, so a test (or a frame replayer) can keep one
/// handle and advance time while the engines own another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
    offset: FixedOffset,
}

impl ManualClock {
    /// Create a clock at `now_ms` in UTC
    pub fn new(now_ms: i64) -> Self {
        Self::with_offset(now_ms, Utc.fix())
    }

    /// Create a clock at `now_ms` whose local days use `offset`
    pub fn with_offset(now_ms: i64, offset: FixedOffset) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
            offset,
        }
    }

    /// Jump to an absolute instant
    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Move forward (or backward, if negative) by `delta_ms`
    pub fn advance_ms(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Move forward by a chrono duration
    pub fn advance(&self, delta: chrono::Duration) {
        self.advance_ms(delta.num_milliseconds());
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn offset_at(&self, _timestamp_ms: i64) -> FixedOffset {
        self.offset
    }
}

/// Resolve a timestamp to a local date-time
pub fn local_datetime<C: Clock + ?Sized>(clock: &C, timestamp_ms: i64) -> DateTime<FixedOffset> {
    let utc = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    utc.with_timezone(&clock.offset_at(timestamp_ms))
}

/// Local calendar date of a timestamp
pub fn local_date<C: Clock + ?Sized>(clock: &C, timestamp_ms: i64) -> NaiveDate {
    local_datetime(clock, timestamp_ms).date_naive()
}

/// Zero-padded local `YYYY-MM-DD` key of a timestamp
pub fn local_date_string<C: Clock + ?Sized>(clock: &C, timestamp_ms: i64) -> String {
    local_date(clock, timestamp_ms).format(DATE_FORMAT).to_string()
}

/// Local hour of day (0-23) of a timestamp
pub fn local_hour<C: Clock + ?Sized>(clock: &C, timestamp_ms: i64) -> usize {
    local_datetime(clock, timestamp_ms).hour() as usize
}

/// Today's local date
pub fn today<C: Clock + ?Sized>(clock: &C) -> NaiveDate {
    local_date(clock, clock.now_ms())
}

/// Today's local `YYYY-MM-DD` key
pub fn today_string<C: Clock + ?Sized>(clock: &C) -> String {
    local_date_string(clock, clock.now_ms())
}

/// Format a date as a `YYYY-MM-DD` key
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

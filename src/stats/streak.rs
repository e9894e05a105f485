//! Streak computation

use crate::stats::types::{DailyStats, UserProgress};

/// Count consecutive history entries, newest first, that stayed within the
/// daily goal. `today` is in progress and never counts. The count stops at
/// the first day over the goal.
pub fn current_streak(history: &[DailyStats], today: &str, daily_goal: u32) -> u32 {
    let mut days: Vec<&DailyStats> = history.iter().filter(|d| d.date != today).collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));

    days.iter()
        .take_while(|d| d.touch_count <= daily_goal)
        .count() as u32
}

/// Recompute the streak counters in `progress`.
///
/// `longest_streak` is monotonic.
pub fn update_streak(progress: &mut UserProgress, history: &[DailyStats], today: &str, daily_goal: u32) {
    let streak = current_streak(history, today, daily_goal);
    progress.current_streak = streak;
    progress.longest_streak = progress.longest_streak.max(streak);
}

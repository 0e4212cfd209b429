//! Streak derivation from the due-date sequence and check-in history.
//!
//! Streaks only count dates the habit was actually due: skipping a day the
//! recurrence never asked for does not break anything. The current streak
//! runs backward from the most recent due date; the longest streak is the
//! best run anywhere in the history. Future due dates never count.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::checkin::CheckIn;
use crate::habit::Habit;

/// Derived streak figures for one habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Ordered due dates for `habit` from its start date through `through`.
pub fn due_dates(habit: &Habit, through: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut day = habit.start_date;
    while day <= through {
        if habit.is_due_on(day) {
            dates.push(day);
        }
        day += Duration::days(1);
    }
    dates
}

/// Recompute both streak figures from the full check-in history.
///
/// A habit with no due dates on or before `today` yields 0/0. The result
/// always satisfies `current_streak <= longest_streak`.
pub fn recompute(habit: &Habit, check_ins: &[CheckIn], today: NaiveDate) -> StreakSummary {
    let due = due_dates(habit, today);
    if due.is_empty() {
        return StreakSummary::default();
    }

    let completed: HashSet<NaiveDate> = check_ins
        .iter()
        .filter(|c| c.habit_id == habit.id && c.completed)
        .map(|c| c.date)
        .collect();

    let mut current = 0u32;
    for day in due.iter().rev() {
        if completed.contains(day) {
            current += 1;
        } else {
            break;
        }
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    for day in &due {
        if completed.contains(day) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }

    StreakSummary {
        current_streak: current,
        longest_streak: longest,
    }
}

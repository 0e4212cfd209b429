//! Dashboard figures derived from habits, check-ins, and goals.
//!
//! Pure derivations over already-fetched records: today's completion rate
//! over the habits actually due, a 7-day completion series for charting,
//! and a mood summary over the most recent check-ins.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::checkin::CheckIn;
use crate::goal::{Goal, GoalStatus};
use crate::habit::Habit;

/// How many recent check-ins feed the mood summary.
const MOOD_SAMPLE: usize = 10;

/// Completed check-in count for one day of the weekly series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    /// Short weekday label for chart axes ("Mon", "Tue", ...).
    pub label: String,
    pub count: usize,
}

/// Occurrences of one mood rating in the sampled window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodCount {
    pub rating: u8,
    pub count: usize,
    pub percentage: u32,
}

/// Mood aggregation over the most recent check-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSummary {
    pub average: Option<f64>,
    /// Per-rating counts, most frequent first.
    pub counts: Vec<MoodCount>,
    pub sampled_check_ins: usize,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub active_habits: usize,
    pub due_today: usize,
    pub completed_today: usize,
    /// Percentage of today's due habits with a completed check-in.
    pub completion_rate: u32,
    pub goals_achieved: usize,
    /// Last seven days, oldest first.
    pub week: Vec<DayCount>,
    pub mood: MoodSummary,
}

/// Build the dashboard report for `today`.
pub fn dashboard(
    habits: &[Habit],
    check_ins: &[CheckIn],
    goals: &[Goal],
    today: NaiveDate,
) -> DashboardReport {
    let active_habits = habits.iter().filter(|h| h.active).count();

    let due: Vec<&Habit> = habits.iter().filter(|h| h.is_due_on(today)).collect();
    let completed_today = due
        .iter()
        .filter(|h| {
            check_ins
                .iter()
                .any(|c| c.habit_id == h.id && c.date == today && c.completed)
        })
        .count();
    let completion_rate = if due.is_empty() {
        0
    } else {
        (completed_today as f64 / due.len() as f64 * 100.0).round() as u32
    };

    let goals_achieved = goals
        .iter()
        .filter(|g| g.status == GoalStatus::Completed)
        .count();

    let week = (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let count = check_ins
                .iter()
                .filter(|c| c.date == date && c.completed)
                .count();
            DayCount {
                date,
                label: date.format("%a").to_string(),
                count,
            }
        })
        .collect();

    DashboardReport {
        active_habits,
        due_today: due.len(),
        completed_today,
        completion_rate,
        goals_achieved,
        week,
        mood: mood_summary(check_ins),
    }
}

/// Aggregate mood ratings over the most recent check-ins.
fn mood_summary(check_ins: &[CheckIn]) -> MoodSummary {
    let mut recent: Vec<&CheckIn> = check_ins.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(MOOD_SAMPLE);

    let ratings: Vec<u8> = recent.iter().filter_map(|c| c.mood_rating).collect();
    let sampled_check_ins = recent.len();

    let average = if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64)
    };

    let mut tally: BTreeMap<u8, usize> = BTreeMap::new();
    for rating in &ratings {
        *tally.entry(*rating).or_insert(0) += 1;
    }
    let mut counts: Vec<MoodCount> = tally
        .into_iter()
        .map(|(rating, count)| MoodCount {
            rating,
            count,
            percentage: if sampled_check_ins == 0 {
                0
            } else {
                (count as f64 / sampled_check_ins as f64 * 100.0).round() as u32
            },
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.rating.cmp(&b.rating)));

    MoodSummary {
        average,
        counts,
        sampled_check_ins,
    }
}

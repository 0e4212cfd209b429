//! Goals: habit targets tracked against completed check-in counts.
//!
//! A goal's `current_value` is derived, never hand-edited: it counts the
//! habit's completed check-ins from the goal's counting boundary onward.
//! Only the `Active -> Completed` transition fires automatically; pausing,
//! resuming, and cancelling are user decisions that recomputation must
//! never overwrite.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkin::CheckIn;
use crate::error::GoalError;
use crate::habit::Habit;

/// Lifecycle status of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Paused => "paused",
            GoalStatus::Completed => "completed",
            GoalStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GoalStatus::Active),
            "paused" => Some(GoalStatus::Paused),
            "completed" => Some(GoalStatus::Completed),
            "cancelled" => Some(GoalStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority bucket for display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    Low,
    Medium,
    High,
}

impl GoalPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPriority::Low => "low",
            GoalPriority::Medium => "medium",
            GoalPriority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(GoalPriority::Low),
            "medium" => Some(GoalPriority::Medium),
            "high" => Some(GoalPriority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for GoalPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target number of completed check-ins for one habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub habit_id: String,
    pub title: String,
    pub target_value: u32,
    pub target_unit: Option<String>,
    pub current_value: u32,
    /// Counting boundary: completed check-ins dated before this are not
    /// counted. Pinned at creation to the later of the creation date and
    /// the habit's start date.
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub completed_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub priority: GoalPriority,
    pub is_overdue: bool,
    pub progress_percentage: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Create a goal for an existing habit.
    ///
    /// # Errors
    /// Returns [`GoalError::InvalidTarget`] when `target_value` is not
    /// positive.
    pub fn new(
        habit: &Habit,
        title: impl Into<String>,
        target_value: i64,
        target_unit: Option<String>,
        due_date: NaiveDate,
        priority: GoalPriority,
        today: NaiveDate,
    ) -> Result<Self, GoalError> {
        if target_value <= 0 {
            return Err(GoalError::InvalidTarget { got: target_value });
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            habit_id: habit.id.clone(),
            title: title.into(),
            target_value: target_value as u32,
            target_unit,
            current_value: 0,
            start_date: today.max(habit.start_date),
            due_date,
            completed_date: None,
            status: GoalStatus::Active,
            priority,
            is_overdue: false,
            progress_percentage: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// User-initiated pause. Only an active goal can be paused.
    pub fn pause(&mut self) -> Result<(), GoalError> {
        self.transition(GoalStatus::Active, GoalStatus::Paused)
    }

    /// User-initiated resume of a paused goal.
    pub fn resume(&mut self) -> Result<(), GoalError> {
        self.transition(GoalStatus::Paused, GoalStatus::Active)
    }

    /// User-initiated cancellation. A completed goal stays completed.
    pub fn cancel(&mut self) -> Result<(), GoalError> {
        if self.status == GoalStatus::Completed {
            return Err(GoalError::InvalidTransition {
                from: self.status,
                to: GoalStatus::Cancelled,
            });
        }
        self.status = GoalStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn transition(&mut self, from: GoalStatus, to: GoalStatus) -> Result<(), GoalError> {
        if self.status != from {
            return Err(GoalError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Recompute the derived goal fields from the habit's check-in history.
///
/// Counts completed check-ins dated on or after the goal's counting
/// boundary, refreshes the progress percentage and overdue flag, and
/// auto-completes an active goal the moment the target is reached.
/// User-chosen statuses (paused, cancelled) are left alone.
pub fn recompute(goal: &Goal, check_ins: &[CheckIn], today: NaiveDate) -> Goal {
    let current_value = check_ins
        .iter()
        .filter(|c| c.habit_id == goal.habit_id && c.completed && c.date >= goal.start_date)
        .count() as u32;

    let progress_percentage = progress_percent(current_value, goal.target_value);

    let mut status = goal.status;
    let mut completed_date = goal.completed_date;
    if status == GoalStatus::Active && current_value >= goal.target_value {
        status = GoalStatus::Completed;
        completed_date = Some(today);
    }

    let is_overdue = goal.due_date < today
        && !matches!(status, GoalStatus::Completed | GoalStatus::Cancelled);

    Goal {
        current_value,
        progress_percentage,
        status,
        completed_date,
        is_overdue,
        updated_at: Utc::now(),
        ..goal.clone()
    }
}

fn progress_percent(current: u32, target: u32) -> u32 {
    if target == 0 {
        return 100;
    }
    let pct = (f64::from(current) / f64::from(target) * 100.0).round() as u32;
    pct.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitCategory;
    use crate::recurrence::{FrequencyKind, RecurrenceSpec};
    use chrono::Duration;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_habit(start: NaiveDate) -> Habit {
        let spec = RecurrenceSpec {
            frequency: FrequencyKind::Daily,
            frequency_count: 1,
            occurrence_days: vec![],
        };
        Habit::new("Read", HabitCategory::Learning, &spec, start).unwrap()
    }

    fn check_in(habit: &Habit, d: NaiveDate, completed: bool) -> CheckIn {
        CheckIn {
            id: format!("c-{d}"),
            habit_id: habit.id.clone(),
            date: d,
            completed,
            actual_value: None,
            mood_rating: None,
            created_at: Utc::now(),
        }
    }

    fn goal_for(habit: &Habit, target: i64, due: NaiveDate, today: NaiveDate) -> Goal {
        Goal::new(habit, "Read 15 times", target, None, due, GoalPriority::Medium, today).unwrap()
    }

    #[test]
    fn target_must_be_positive() {
        let habit = daily_habit(date(2024, 1, 1));
        for bad in [0, -3] {
            let err = Goal::new(
                &habit,
                "Goal",
                bad,
                None,
                date(2024, 3, 1),
                GoalPriority::Low,
                date(2024, 1, 1),
            )
            .unwrap_err();
            assert_eq!(err, GoalError::InvalidTarget { got: bad });
        }
    }

    #[test]
    fn reaching_the_target_auto_completes_an_active_goal() {
        let habit = daily_habit(date(2024, 1, 1));
        let goal = goal_for(&habit, 15, date(2024, 3, 1), date(2024, 1, 1));
        let check_ins: Vec<CheckIn> = (1..=15)
            .map(|d| check_in(&habit, date(2024, 1, d), true))
            .collect();

        let updated = recompute(&goal, &check_ins, date(2024, 1, 15));
        assert_eq!(updated.current_value, 15);
        assert_eq!(updated.progress_percentage, 100);
        assert_eq!(updated.status, GoalStatus::Completed);
        assert_eq!(updated.completed_date, Some(date(2024, 1, 15)));
        assert!(!updated.is_overdue);
    }

    #[test]
    fn paused_and_cancelled_goals_are_never_auto_completed() {
        let habit = daily_habit(date(2024, 1, 1));
        let check_ins: Vec<CheckIn> = (1..=5)
            .map(|d| check_in(&habit, date(2024, 1, d), true))
            .collect();

        let mut paused = goal_for(&habit, 3, date(2024, 3, 1), date(2024, 1, 1));
        paused.pause().unwrap();
        let updated = recompute(&paused, &check_ins, date(2024, 1, 10));
        assert_eq!(updated.status, GoalStatus::Paused);
        // Derived figures still refresh.
        assert_eq!(updated.current_value, 5);

        let mut cancelled = goal_for(&habit, 3, date(2024, 3, 1), date(2024, 1, 1));
        cancelled.cancel().unwrap();
        let updated = recompute(&cancelled, &check_ins, date(2024, 1, 10));
        assert_eq!(updated.status, GoalStatus::Cancelled);
        assert!(!updated.is_overdue);
    }

    #[test]
    fn overdue_requires_open_status_and_past_due_date() {
        let habit = daily_habit(date(2024, 1, 1));
        let goal = goal_for(&habit, 30, date(2024, 1, 10), date(2024, 1, 1));

        let open = recompute(&goal, &[], date(2024, 1, 11));
        assert!(open.is_overdue);

        let not_yet = recompute(&goal, &[], date(2024, 1, 10));
        assert!(!not_yet.is_overdue);
    }

    #[test]
    fn check_ins_before_the_boundary_do_not_count() {
        let habit = daily_habit(date(2024, 1, 1));
        // Goal created on the 10th: the first nine days are history.
        let goal = goal_for(&habit, 5, date(2024, 3, 1), date(2024, 1, 10));
        let check_ins: Vec<CheckIn> = (1..=12)
            .map(|d| check_in(&habit, date(2024, 1, d), true))
            .collect();

        let updated = recompute(&goal, &check_ins, date(2024, 1, 12));
        assert_eq!(updated.current_value, 3); // 10th, 11th, 12th
        assert_eq!(updated.progress_percentage, 60);
    }

    #[test]
    fn incomplete_check_ins_do_not_count() {
        let habit = daily_habit(date(2024, 1, 1));
        let goal = goal_for(&habit, 4, date(2024, 3, 1), date(2024, 1, 1));
        let check_ins = vec![
            check_in(&habit, date(2024, 1, 1), true),
            check_in(&habit, date(2024, 1, 2), false),
        ];
        let updated = recompute(&goal, &check_ins, date(2024, 1, 2));
        assert_eq!(updated.current_value, 1);
        assert_eq!(updated.progress_percentage, 25);
    }

    proptest! {
        /// progress_percentage never decreases as check-ins accumulate,
        /// whatever mix of completed and missed days arrives, and it is
        /// capped at 100.
        #[test]
        fn progress_never_decreases_as_check_ins_accumulate(
            pattern in proptest::collection::vec(any::<bool>(), 1..40),
            target in 1i64..=15,
        ) {
            let start = date(2024, 1, 1);
            let habit = daily_habit(start);
            let goal = goal_for(&habit, target, date(2024, 6, 1), start);
            let mut check_ins = Vec::new();
            let mut last_pct = 0;
            for (i, done) in pattern.iter().enumerate() {
                let day = start + Duration::days(i as i64);
                check_ins.push(check_in(&habit, day, *done));
                let updated = recompute(&goal, &check_ins, day);
                prop_assert!(updated.progress_percentage >= last_pct);
                prop_assert!(updated.progress_percentage <= 100);
                last_pct = updated.progress_percentage;
            }
        }
    }

    #[test]
    fn status_transitions_are_guarded() {
        let habit = daily_habit(date(2024, 1, 1));
        let mut goal = goal_for(&habit, 5, date(2024, 3, 1), date(2024, 1, 1));

        assert!(goal.resume().is_err()); // not paused
        goal.pause().unwrap();
        assert!(goal.pause().is_err()); // already paused
        goal.resume().unwrap();
        assert_eq!(goal.status, GoalStatus::Active);

        goal.status = GoalStatus::Completed;
        assert!(goal.cancel().is_err()); // completed stays completed
    }
}

//! Integration tests for the full daily check-in workflow.
//!
//! These tests drive the ledger and the SQLite store together: create
//! habits, submit a day's check-ins in bulk, persist the committed batch,
//! and recompute streaks and goal progress from the stored history.

use chrono::NaiveDate;
use habitos_core::{
    due_habits, BulkCheckIn, BulkEntry, CheckInLedger, CoreError, DuplicateCheckInError,
    FrequencyKind, Goal, GoalPriority, GoalStatus, Habit, HabitCategory, HabitDb, OccurrenceDay,
    RecurrenceSpec,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn daily_spec() -> RecurrenceSpec {
    RecurrenceSpec {
        frequency: FrequencyKind::Daily,
        frequency_count: 1,
        occurrence_days: vec![],
    }
}

fn weekly_spec(days: &[&str]) -> RecurrenceSpec {
    RecurrenceSpec {
        frequency: FrequencyKind::Weekly,
        frequency_count: days.len() as i64,
        occurrence_days: days
            .iter()
            .map(|d| OccurrenceDay::Weekday(d.to_string()))
            .collect(),
    }
}

fn entry(habit: &Habit, completed: bool) -> BulkEntry {
    BulkEntry {
        habit_id: habit.id.clone(),
        completed,
        actual_value: None,
    }
}

/// Submit one day through the ledger and, when it commits, persist it.
fn submit_day(
    db: &mut HabitDb,
    ledger: &mut CheckInLedger,
    request: &BulkCheckIn,
) -> habitos_core::BulkResult {
    let result = ledger.submit_bulk(request).unwrap();
    if result.is_committed() {
        let day = result.day_entry.as_ref().unwrap();
        db.commit_bulk(day, &result.accepted).unwrap();
    }
    result
}

#[test]
fn full_day_checkin_flow() {
    let mut db = HabitDb::open_memory().unwrap();
    let start = date(2024, 1, 1); // Monday

    let walk = Habit::new("Walk", HabitCategory::Health, &daily_spec(), start).unwrap();
    let gym = Habit::new(
        "Gym",
        HabitCategory::Fitness,
        &weekly_spec(&["Monday", "Thursday"]),
        start,
    )
    .unwrap();
    db.insert_habit(&walk).unwrap();
    db.insert_habit(&gym).unwrap();

    // Monday: both habits are due.
    let today = date(2024, 1, 8);
    let habits = db.list_habits().unwrap();
    let due = due_habits(&habits, today);
    assert_eq!(due.len(), 2);

    let mut ledger =
        CheckInLedger::with_history(db.list_check_ins().unwrap(), db.list_day_entries().unwrap());
    let request = BulkCheckIn {
        date: today,
        entries: due.iter().map(|h| entry(h, true)).collect(),
        mood_rating: Some(8),
        journal_content: Some("Strong start to the week.".to_string()),
    };
    let result = submit_day(&mut db, &mut ledger, &request);
    assert!(result.is_committed());
    assert_eq!(result.accepted.len(), 2);

    // The day is now read-only end to end.
    let day = db.day_entry(today).unwrap().unwrap();
    assert_eq!(day.mood_rating, Some(8));
    assert_eq!(db.check_ins_on(today).unwrap().len(), 2);
}

#[test]
fn resubmitted_day_is_rejected_by_ledger_and_store() {
    let mut db = HabitDb::open_memory().unwrap();
    let start = date(2024, 1, 1);
    let walk = Habit::new("Walk", HabitCategory::Health, &daily_spec(), start).unwrap();
    db.insert_habit(&walk).unwrap();

    let today = date(2024, 1, 5);
    let request = BulkCheckIn {
        date: today,
        entries: vec![entry(&walk, true)],
        mood_rating: Some(6),
        journal_content: None,
    };

    let mut ledger = CheckInLedger::new();
    assert!(submit_day(&mut db, &mut ledger, &request).is_committed());

    // A fresh ledger rebuilt from storage still knows the day is taken.
    let mut rebuilt =
        CheckInLedger::with_history(db.list_check_ins().unwrap(), db.list_day_entries().unwrap());
    let second = rebuilt.submit_bulk(&request).unwrap();
    assert!(!second.is_committed());
    assert!(matches!(
        second.rejected[0].error,
        DuplicateCheckInError::Habit { .. }
    ));

    // And even a writer that skips the ledger loses at the store.
    let doomed = CheckInLedger::new()
        .submit_bulk(&BulkCheckIn {
            date: today,
            entries: vec![entry(&walk, false)],
            mood_rating: None,
            journal_content: None,
        })
        .unwrap();
    let err = db
        .commit_bulk(doomed.day_entry.as_ref().unwrap(), &doomed.accepted)
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateCheckIn(_)));
    assert_eq!(db.check_ins_on(today).unwrap().len(), 1);
}

#[test]
fn streaks_follow_the_stored_history() {
    let mut db = HabitDb::open_memory().unwrap();
    let start = date(2024, 1, 1); // Monday
    let mut gym = Habit::new(
        "Gym",
        HabitCategory::Fitness,
        &weekly_spec(&["Monday", "Wednesday"]),
        start,
    )
    .unwrap();
    db.insert_habit(&gym).unwrap();

    let mut ledger = CheckInLedger::new();
    // Complete Mon 1st and Wed 3rd, miss Mon 8th, complete Wed 10th.
    for (d, done) in [
        (date(2024, 1, 1), true),
        (date(2024, 1, 3), true),
        (date(2024, 1, 8), false),
        (date(2024, 1, 10), true),
    ] {
        let request = BulkCheckIn {
            date: d,
            entries: vec![entry(&gym, done)],
            mood_rating: None,
            journal_content: None,
        };
        assert!(submit_day(&mut db, &mut ledger, &request).is_committed());
    }

    let history = db.check_ins_for_habit(&gym.id).unwrap();
    let summary = habitos_core::streak::recompute(&gym, &history, date(2024, 1, 10));
    assert_eq!(summary.current_streak, 1);
    assert_eq!(summary.longest_streak, 2);

    gym.apply_streak(summary.current_streak, summary.longest_streak);
    db.update_habit(&gym).unwrap();
    let stored = db.get_habit(&gym.id).unwrap().unwrap();
    assert_eq!(stored.current_streak, 1);
    assert_eq!(stored.longest_streak, 2);
}

#[test]
fn history_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitos.db");
    let start = date(2024, 1, 1);
    let walk = Habit::new("Walk", HabitCategory::Health, &daily_spec(), start).unwrap();

    {
        let mut db = HabitDb::open_at(&path).unwrap();
        db.insert_habit(&walk).unwrap();
        let mut ledger = CheckInLedger::new();
        let request = BulkCheckIn {
            date: start,
            entries: vec![entry(&walk, true)],
            mood_rating: Some(9),
            journal_content: Some("Fresh start.".to_string()),
        };
        assert!(submit_day(&mut db, &mut ledger, &request).is_committed());
    }

    let db = HabitDb::open_at(&path).unwrap();
    assert_eq!(db.list_habits().unwrap().len(), 1);
    let day = db.day_entry(start).unwrap().unwrap();
    assert_eq!(day.journal_content.as_deref(), Some("Fresh start."));
    assert_eq!(db.check_ins_for_habit(&walk.id).unwrap().len(), 1);
}

#[test]
fn goal_auto_completes_from_persisted_check_ins() {
    let mut db = HabitDb::open_memory().unwrap();
    let start = date(2024, 1, 1);
    let walk = Habit::new("Walk", HabitCategory::Health, &daily_spec(), start).unwrap();
    db.insert_habit(&walk).unwrap();

    let goal = Goal::new(
        &walk,
        "Walk 3 times",
        3,
        None,
        date(2024, 2, 1),
        GoalPriority::Medium,
        start,
    )
    .unwrap();
    db.insert_goal(&goal).unwrap();

    let mut ledger = CheckInLedger::new();
    for d in 1..=3 {
        let request = BulkCheckIn {
            date: date(2024, 1, d),
            entries: vec![entry(&walk, true)],
            mood_rating: Some(7),
            journal_content: None,
        };
        assert!(submit_day(&mut db, &mut ledger, &request).is_committed());
    }

    let history = db.check_ins_for_habit(&walk.id).unwrap();
    let updated = habitos_core::goal::recompute(&goal, &history, date(2024, 1, 3));
    assert_eq!(updated.status, GoalStatus::Completed);
    assert_eq!(updated.progress_percentage, 100);
    db.update_goal(&updated).unwrap();

    let stored = db.get_goal(&goal.id).unwrap().unwrap();
    assert_eq!(stored.status, GoalStatus::Completed);
    assert_eq!(stored.completed_date, Some(date(2024, 1, 3)));
}

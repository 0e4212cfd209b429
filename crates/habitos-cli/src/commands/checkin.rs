//! Daily check-in commands for CLI.
//!
//! `checkin submit` is the one write path: it builds the day's batch for
//! every due habit, runs it through the ledger, persists the committed
//! batch, and refreshes the derived streak and goal figures.

use chrono::NaiveDate;
use clap::Subcommand;
use habitos_core::{due_habits, BulkCheckIn, BulkEntry, CheckInLedger, Habit, HabitDb};

use super::resolve_date;

#[derive(Subcommand)]
pub enum CheckinAction {
    /// List habits due on a date
    Due {
        /// Date to check (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Submit one day's check-ins for all due habits
    Submit {
        /// Date to submit for (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Habit IDs completed that day (repeatable)
        #[arg(long)]
        done: Vec<String>,
        /// Measured value per habit, as habit_id=value (repeatable)
        #[arg(long)]
        value: Vec<String>,
        /// Mood rating for the day (1-10)
        #[arg(long)]
        mood: Option<u8>,
        /// Journal entry for the day
        #[arg(long)]
        journal: Option<String>,
    },
    /// Show a submitted day: its shared entry and check-ins
    Status {
        /// Date to show (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: CheckinAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = HabitDb::open()?;

    match action {
        CheckinAction::Due { date } => {
            let day = resolve_date(date);
            let habits = db.list_habits()?;
            let due = due_habits(&habits, day);
            println!("{}", serde_json::to_string_pretty(&due)?);
        }
        CheckinAction::Submit {
            date,
            done,
            value,
            mood,
            journal,
        } => {
            let day = resolve_date(date);
            let habits = db.list_habits()?;
            let due = due_habits(&habits, day);
            if due.is_empty() {
                return Err(format!("no habits due on {day}").into());
            }
            let values = parse_values(&value)?;

            let request = BulkCheckIn {
                date: day,
                entries: build_entries(&due, &done, &values, day)?,
                mood_rating: mood,
                journal_content: journal,
            };

            let mut ledger =
                CheckInLedger::with_history(db.list_check_ins()?, db.list_day_entries()?);
            let result = ledger.submit_bulk(&request)?;
            if !result.is_committed() {
                println!("{}", serde_json::to_string_pretty(&result.rejected)?);
                return Err(format!("check-ins for {day} were already submitted").into());
            }
            let day_entry = result
                .day_entry
                .as_ref()
                .ok_or("committed batch is missing its day entry")?;
            db.commit_bulk(day_entry, &result.accepted)?;

            refresh_derived(&db, &result.accepted, day)?;
            println!("Checked in {} habit(s) for {day}", result.accepted.len());
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        CheckinAction::Status { date } => {
            let day = resolve_date(date);
            let report = serde_json::json!({
                "date": day,
                "day_entry": db.day_entry(day)?,
                "check_ins": db.check_ins_on(day)?,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Recompute streaks and goal progress for every habit the batch touched.
fn refresh_derived(
    db: &HabitDb,
    accepted: &[habitos_core::CheckIn],
    today: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    for check_in in accepted {
        let Some(mut habit) = db.get_habit(&check_in.habit_id)? else {
            continue;
        };
        let history = db.check_ins_for_habit(&habit.id)?;

        let summary = habitos_core::streak::recompute(&habit, &history, today);
        habit.apply_streak(summary.current_streak, summary.longest_streak);
        db.update_habit(&habit)?;

        for goal in db.goals_for_habit(&habit.id)? {
            let updated = habitos_core::goal::recompute(&goal, &history, today);
            db.update_goal(&updated)?;
        }
    }
    Ok(())
}

/// One entry per due habit, completed iff listed in `--done`.
///
/// A committed day is read-only, so a `--done` or `--value` id that matches
/// no due habit must fail the command here; silently dropping it would
/// permanently record the habit as missed.
fn build_entries(
    due: &[&Habit],
    done: &[String],
    values: &[(String, f64)],
    day: NaiveDate,
) -> Result<Vec<BulkEntry>, String> {
    for id in done.iter().chain(values.iter().map(|(id, _)| id)) {
        if !due.iter().any(|h| h.id == *id) {
            return Err(format!("habit {id} is not due on {day}"));
        }
    }
    Ok(due
        .iter()
        .map(|h| BulkEntry {
            habit_id: h.id.clone(),
            completed: done.contains(&h.id),
            actual_value: values.iter().find(|(id, _)| *id == h.id).map(|(_, v)| *v),
        })
        .collect())
}

/// Parse repeated `habit_id=value` flags.
fn parse_values(pairs: &[String]) -> Result<Vec<(String, f64)>, Box<dyn std::error::Error>> {
    pairs
        .iter()
        .map(|pair| {
            let (id, raw) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected habit_id=value, got '{pair}'"))?;
            let value: f64 = raw
                .parse()
                .map_err(|_| format!("cannot parse '{raw}' as a number"))?;
            Ok((id.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use habitos_core::{FrequencyKind, HabitCategory, RecurrenceSpec};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_habit(title: &str) -> Habit {
        let spec = RecurrenceSpec {
            frequency: FrequencyKind::Daily,
            frequency_count: 1,
            occurrence_days: vec![],
        };
        Habit::new(title, HabitCategory::Health, &spec, date(2024, 1, 1)).unwrap()
    }

    #[test]
    fn build_entries_marks_done_habits_completed() {
        let walk = daily_habit("Walk");
        let read = daily_habit("Read");
        let due = vec![&walk, &read];

        let entries = build_entries(
            &due,
            &[walk.id.clone()],
            &[(walk.id.clone(), 30.0)],
            date(2024, 1, 5),
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        let walked = entries.iter().find(|e| e.habit_id == walk.id).unwrap();
        assert!(walked.completed);
        assert_eq!(walked.actual_value, Some(30.0));
        let unread = entries.iter().find(|e| e.habit_id == read.id).unwrap();
        assert!(!unread.completed);
        assert_eq!(unread.actual_value, None);
    }

    #[test]
    fn build_entries_rejects_unknown_done_id() {
        let walk = daily_habit("Walk");
        let due = vec![&walk];

        // A typo'd id must fail the command, never commit the day with the
        // real habit recorded as missed.
        let err = build_entries(
            &due,
            &["walk-typo-id".to_string()],
            &[],
            date(2024, 1, 5),
        )
        .unwrap_err();
        assert!(err.contains("walk-typo-id"));
        assert!(err.contains("2024-01-05"));
    }

    #[test]
    fn build_entries_rejects_unknown_value_id() {
        let walk = daily_habit("Walk");
        let due = vec![&walk];

        let err = build_entries(
            &due,
            &[],
            &[("read-typo-id".to_string(), 10.0)],
            date(2024, 1, 5),
        )
        .unwrap_err();
        assert!(err.contains("read-typo-id"));
    }
}

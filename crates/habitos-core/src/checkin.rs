//! Daily check-ins and the one-per-day ledger.
//!
//! A check-in records whether a habit was completed on one calendar date.
//! The user checks in for all due habits at once; the batch shares a single
//! mood rating and journal entry, stored once per date as a [`DayEntry`].
//! The ledger enforces the core invariant: at most one check-in per
//! `(habit_id, date)`, and a committed day is read-only.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DuplicateCheckInError, ValidationError, ValidationErrors};

/// A single daily completion record. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: String,
    pub habit_id: String,
    /// Calendar-day key; no time component.
    pub date: NaiveDate,
    pub completed: bool,
    /// Habit-specific measurement (reps, minutes, pages).
    pub actual_value: Option<f64>,
    /// Copy of the day's shared mood rating.
    pub mood_rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

/// Per-day record shared by every check-in submitted for that date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub mood_rating: Option<u8>,
    pub journal_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One habit's slot in a bulk submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkEntry {
    pub habit_id: String,
    pub completed: bool,
    #[serde(default)]
    pub actual_value: Option<f64>,
}

/// A full day's check-in submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkCheckIn {
    pub date: NaiveDate,
    pub entries: Vec<BulkEntry>,
    #[serde(default)]
    pub mood_rating: Option<u8>,
    #[serde(default)]
    pub journal_content: Option<String>,
}

/// An entry turned away because its day was already committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedCheckIn {
    pub habit_id: String,
    pub error: DuplicateCheckInError,
}

/// Outcome of a bulk submission: either every entry was accepted, or the
/// whole batch was rejected and `rejected` names the conflicts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkResult {
    pub accepted: Vec<CheckIn>,
    pub rejected: Vec<RejectedCheckIn>,
    pub day_entry: Option<DayEntry>,
}

impl BulkResult {
    /// True when the batch committed (no conflicts).
    pub fn is_committed(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// The authoritative per-habit, per-day completion record.
///
/// Built over the already-fetched history; persistence replays committed
/// batches through the store's compare-and-set (`HabitDb::commit_bulk`).
#[derive(Debug, Clone, Default)]
pub struct CheckInLedger {
    check_ins: BTreeMap<(String, NaiveDate), CheckIn>,
    days: BTreeMap<NaiveDate, DayEntry>,
}

impl CheckInLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the ledger from stored history.
    pub fn with_history(check_ins: Vec<CheckIn>, days: Vec<DayEntry>) -> Self {
        let mut ledger = Self::new();
        for entry in days {
            ledger.days.insert(entry.date, entry);
        }
        for check_in in check_ins {
            // The day entry may be absent for history loaded per habit;
            // the check-in itself still locks its key.
            ledger
                .check_ins
                .insert((check_in.habit_id.clone(), check_in.date), check_in);
        }
        ledger
    }

    /// Whether a check-in exists for `(habit_id, date)`.
    pub fn contains(&self, habit_id: &str, date: NaiveDate) -> bool {
        self.check_ins
            .contains_key(&(habit_id.to_string(), date))
    }

    /// Whether the day was already submitted as a whole.
    pub fn day_committed(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
            || self.check_ins.keys().any(|(_, d)| *d == date)
    }

    pub fn day_entry(&self, date: NaiveDate) -> Option<&DayEntry> {
        self.days.get(&date)
    }

    /// All check-ins for one habit, ordered by date.
    pub fn check_ins_for(&self, habit_id: &str) -> Vec<&CheckIn> {
        self.check_ins
            .iter()
            .filter(|((id, _), _)| id == habit_id)
            .map(|(_, c)| c)
            .collect()
    }

    /// Submit one day's check-ins for all due habits, atomically.
    ///
    /// Structural problems (empty batch, a habit listed twice, mood rating
    /// off the 1-10 scale) block the submission entirely and are returned
    /// as `Err`. Conflicts with already-committed days reject the whole
    /// batch: `accepted` stays empty and `rejected` lists every conflicting
    /// habit. Only a conflict-free batch commits, producing one check-in
    /// per entry plus the shared day entry.
    pub fn submit_bulk(&mut self, request: &BulkCheckIn) -> Result<BulkResult, ValidationErrors> {
        let mut errors: Vec<ValidationError> = Vec::new();

        if request.entries.is_empty() {
            errors.push(ValidationError::EmptyBatch);
        }
        if let Some(mood) = request.mood_rating {
            if !(1..=10).contains(&mood) {
                errors.push(ValidationError::MoodRatingOutOfRange { got: mood });
            }
        }
        let mut seen: Vec<&str> = Vec::new();
        for entry in &request.entries {
            if seen.contains(&entry.habit_id.as_str()) {
                errors.push(ValidationError::DuplicateHabitInBatch {
                    habit_id: entry.habit_id.clone(),
                });
            } else {
                seen.push(&entry.habit_id);
            }
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let date = request.date;
        let mut rejected: Vec<RejectedCheckIn> = Vec::new();
        if self.day_committed(date) {
            // The day is read-only: every entry is turned away, with the
            // precise per-habit conflict where one exists.
            for entry in &request.entries {
                let error = if self.contains(&entry.habit_id, date) {
                    DuplicateCheckInError::Habit {
                        habit_id: entry.habit_id.clone(),
                        date,
                    }
                } else {
                    DuplicateCheckInError::DayLocked { date }
                };
                rejected.push(RejectedCheckIn {
                    habit_id: entry.habit_id.clone(),
                    error,
                });
            }
        }
        if !rejected.is_empty() {
            return Ok(BulkResult {
                accepted: Vec::new(),
                rejected,
                day_entry: None,
            });
        }

        let now = Utc::now();
        let day_entry = DayEntry {
            date,
            mood_rating: request.mood_rating,
            journal_content: request.journal_content.clone(),
            created_at: now,
        };
        let accepted: Vec<CheckIn> = request
            .entries
            .iter()
            .map(|entry| CheckIn {
                id: Uuid::new_v4().to_string(),
                habit_id: entry.habit_id.clone(),
                date,
                completed: entry.completed,
                actual_value: entry.actual_value,
                mood_rating: request.mood_rating,
                created_at: now,
            })
            .collect();

        for check_in in &accepted {
            self.check_ins
                .insert((check_in.habit_id.clone(), check_in.date), check_in.clone());
        }
        self.days.insert(date, day_entry.clone());

        Ok(BulkResult {
            accepted,
            rejected: Vec::new(),
            day_entry: Some(day_entry),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(habit_id: &str, completed: bool) -> BulkEntry {
        BulkEntry {
            habit_id: habit_id.to_string(),
            completed,
            actual_value: None,
        }
    }

    fn request(d: NaiveDate, entries: Vec<BulkEntry>, mood: Option<u8>) -> BulkCheckIn {
        BulkCheckIn {
            date: d,
            entries,
            mood_rating: mood,
            journal_content: Some("Good day.".to_string()),
        }
    }

    #[test]
    fn bulk_submit_creates_one_check_in_per_entry() {
        let mut ledger = CheckInLedger::new();
        let result = ledger
            .submit_bulk(&request(
                date(2024, 2, 1),
                vec![entry("habit-a", true), entry("habit-b", false)],
                Some(7),
            ))
            .unwrap();

        assert!(result.is_committed());
        assert_eq!(result.accepted.len(), 2);
        for check_in in &result.accepted {
            assert_eq!(check_in.date, date(2024, 2, 1));
            assert_eq!(check_in.mood_rating, Some(7));
        }
        let day = result.day_entry.unwrap();
        assert_eq!(day.mood_rating, Some(7));
        assert_eq!(day.journal_content.as_deref(), Some("Good day."));
    }

    #[test]
    fn resubmission_is_rejected_wholesale() {
        let mut ledger = CheckInLedger::new();
        let d = date(2024, 2, 1);
        ledger
            .submit_bulk(&request(d, vec![entry("habit-a", true)], Some(7)))
            .unwrap();

        // Same habit plus a brand-new one: the day is read-only, so both
        // are turned away and nothing commits.
        let second = ledger
            .submit_bulk(&request(
                d,
                vec![entry("habit-a", true), entry("habit-b", true)],
                Some(8),
            ))
            .unwrap();
        assert!(!second.is_committed());
        assert!(second.accepted.is_empty());
        assert_eq!(second.rejected.len(), 2);
        assert!(matches!(
            second.rejected[0].error,
            DuplicateCheckInError::Habit { .. }
        ));
        assert!(matches!(
            second.rejected[1].error,
            DuplicateCheckInError::DayLocked { .. }
        ));

        // The original day entry survives untouched.
        assert_eq!(ledger.day_entry(d).unwrap().mood_rating, Some(7));
        assert_eq!(ledger.check_ins_for("habit-b").len(), 0);
    }

    #[test]
    fn identical_payload_twice_commits_once() {
        let mut ledger = CheckInLedger::new();
        let req = request(date(2024, 2, 1), vec![entry("habit-a", true)], Some(5));

        let first = ledger.submit_bulk(&req).unwrap();
        let second = ledger.submit_bulk(&req).unwrap();

        assert!(first.is_committed());
        assert!(!second.is_committed());
        assert_eq!(ledger.check_ins_for("habit-a").len(), 1);
    }

    #[test]
    fn different_dates_do_not_conflict() {
        let mut ledger = CheckInLedger::new();
        let req1 = request(date(2024, 2, 1), vec![entry("habit-a", true)], None);
        let req2 = request(date(2024, 2, 2), vec![entry("habit-a", true)], None);
        assert!(ledger.submit_bulk(&req1).unwrap().is_committed());
        assert!(ledger.submit_bulk(&req2).unwrap().is_committed());
        assert_eq!(ledger.check_ins_for("habit-a").len(), 2);
    }

    #[test]
    fn mood_rating_is_range_checked() {
        let mut ledger = CheckInLedger::new();
        let errors = ledger
            .submit_bulk(&request(date(2024, 2, 1), vec![entry("a", true)], Some(11)))
            .unwrap_err();
        assert_eq!(
            errors.0,
            vec![ValidationError::MoodRatingOutOfRange { got: 11 }]
        );
        // Nothing was committed.
        assert!(!ledger.day_committed(date(2024, 2, 1)));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let mut ledger = CheckInLedger::new();
        let errors = ledger
            .submit_bulk(&request(date(2024, 2, 1), vec![], None))
            .unwrap_err();
        assert_eq!(errors.0, vec![ValidationError::EmptyBatch]);
    }

    #[test]
    fn habit_listed_twice_is_rejected() {
        let mut ledger = CheckInLedger::new();
        let errors = ledger
            .submit_bulk(&request(
                date(2024, 2, 1),
                vec![entry("habit-a", true), entry("habit-a", false)],
                None,
            ))
            .unwrap_err();
        assert!(matches!(
            errors.0[0],
            ValidationError::DuplicateHabitInBatch { .. }
        ));
    }

    #[test]
    fn history_without_day_entry_still_locks_keys() {
        let existing = CheckIn {
            id: "c-1".to_string(),
            habit_id: "habit-a".to_string(),
            date: date(2024, 2, 1),
            completed: true,
            actual_value: None,
            mood_rating: None,
            created_at: Utc::now(),
        };
        let mut ledger = CheckInLedger::with_history(vec![existing], vec![]);
        let result = ledger
            .submit_bulk(&request(date(2024, 2, 1), vec![entry("habit-a", true)], None))
            .unwrap();
        assert!(!result.is_committed());
    }
}

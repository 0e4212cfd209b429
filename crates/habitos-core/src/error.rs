//! Core error types for habitos-core.
//!
//! This module defines a structured error hierarchy using thiserror.
//! Validation and duplicate-check-in failures are plain data: callers
//! surface them field-by-field instead of treating them as fatal.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::goal::GoalStatus;

/// Core error type for habitos-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Recurrence or check-in input failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A check-in batch targeted an already-committed day
    #[error("{0}")]
    DuplicateCheckIn(#[from] DuplicateCheckInError),

    /// Goal-related errors
    #[error("Goal error: {0}")]
    Goal(#[from] GoalError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// A single field-level validation failure.
///
/// Each variant maps to exactly one form field via [`ValidationError::field`],
/// so callers can render feedback next to the offending input.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Frequency count below zero
    #[error("frequency count cannot be negative (got {got})")]
    NegativeFrequencyCount { got: i64 },

    /// Frequency count above the supported maximum
    #[error("frequency count cannot exceed {max} (got {got})")]
    FrequencyCountTooLarge { got: i64, max: i64 },

    /// Occurrence days supplied for a frequency that takes none
    #[error("{frequency} habits do not take occurrence days")]
    UnexpectedOccurrenceDays { frequency: String },

    /// Fewer days selected than the frequency count requires
    #[error("select {missing} more day(s)")]
    SelectMoreDays { missing: usize },

    /// More days selected than the frequency count allows
    #[error("selected {selected} days but frequency count is {required}")]
    TooManyDays { selected: usize, required: usize },

    /// Unparseable weekday name in a weekly rule
    #[error("'{name}' is not a weekday name")]
    UnknownWeekday { name: String },

    /// Weekly rules take weekday names, not numbers
    #[error("weekly habits take weekday names (got '{got}')")]
    ExpectedWeekdayName { got: String },

    /// Monthly rules take day-of-month numbers, not weekday names
    #[error("monthly habits take days of the month (got '{got}')")]
    ExpectedMonthDay { got: String },

    /// Day-of-month outside 1..=31
    #[error("day of month must be between 1 and 31 (got {day})")]
    MonthDayOutOfRange { day: i64 },

    /// The same occurrence day selected twice
    #[error("'{day}' is selected more than once")]
    DuplicateOccurrenceDay { day: String },

    /// Mood rating outside the 1-10 scale
    #[error("mood rating must be between 1 and 10 (got {got})")]
    MoodRatingOutOfRange { got: u8 },

    /// Bulk check-in with no entries
    #[error("check-in batch is empty")]
    EmptyBatch,

    /// The same habit listed twice in one bulk check-in
    #[error("habit {habit_id} appears more than once in the batch")]
    DuplicateHabitInBatch { habit_id: String },
}

impl ValidationError {
    /// The form field this error should be attached to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NegativeFrequencyCount { .. }
            | ValidationError::FrequencyCountTooLarge { .. } => "frequency_count",
            ValidationError::UnexpectedOccurrenceDays { .. }
            | ValidationError::SelectMoreDays { .. }
            | ValidationError::TooManyDays { .. }
            | ValidationError::UnknownWeekday { .. }
            | ValidationError::ExpectedWeekdayName { .. }
            | ValidationError::ExpectedMonthDay { .. }
            | ValidationError::MonthDayOutOfRange { .. }
            | ValidationError::DuplicateOccurrenceDay { .. } => "occurrence_days",
            ValidationError::MoodRatingOutOfRange { .. } => "mood_rating",
            ValidationError::EmptyBatch
            | ValidationError::DuplicateHabitInBatch { .. } => "entries",
        }
    }
}

/// The full list of validation failures for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

/// A check-in write hit an already-committed `(habit, date)` key or day.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DuplicateCheckInError {
    /// The habit already has a check-in on this date
    #[error("habit {habit_id} already has a check-in on {date}")]
    Habit { habit_id: String, date: NaiveDate },

    /// The whole day was already submitted and is read-only
    #[error("check-ins for {date} were already submitted")]
    DayLocked { date: NaiveDate },
}

impl DuplicateCheckInError {
    /// Date of the conflicting check-in.
    pub fn date(&self) -> NaiveDate {
        match self {
            DuplicateCheckInError::Habit { date, .. } => *date,
            DuplicateCheckInError::DayLocked { date } => *date,
        }
    }
}

/// Goal-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GoalError {
    /// Target value must be a positive integer
    #[error("goal target must be positive (got {got})")]
    InvalidTarget { got: i64 },

    /// Status change not allowed from the current status
    #[error("cannot move goal from {from} to {to}")]
    InvalidTransition { from: GoalStatus, to: GoalStatus },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

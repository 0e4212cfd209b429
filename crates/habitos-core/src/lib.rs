//! # HabitOS Core Library
//!
//! This library provides the core business logic for the HabitOS habit
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary over the same core library.
//!
//! ## Architecture
//!
//! - **Recurrence**: Validated recurrence rules (daily, weekly, monthly,
//!   custom cadence) deciding which dates a habit is due
//! - **Check-in Ledger**: At most one check-in per habit per day; a day is
//!   submitted as a whole and is read-only afterwards
//! - **Derivations**: Streaks, goal progress, and dashboard figures are
//!   recomputed from the check-in history, never hand-edited
//! - **Storage**: SQLite-based persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Habit`]: The habit aggregate with its validated [`Recurrence`]
//! - [`CheckInLedger`]: The per-habit, per-day completion record
//! - [`HabitDb`]: Persistence with a transactional compare-and-set for
//!   bulk check-in submission
//! - [`Goal`]: Targets tracked against completed check-in counts

pub mod checkin;
pub mod error;
pub mod goal;
pub mod habit;
pub mod recurrence;
pub mod stats;
pub mod storage;
pub mod streak;

pub use checkin::{BulkCheckIn, BulkEntry, BulkResult, CheckIn, CheckInLedger, DayEntry};
pub use error::{
    ConfigError, CoreError, DatabaseError, DuplicateCheckInError, GoalError, Result,
    ValidationError, ValidationErrors,
};
pub use goal::{Goal, GoalPriority, GoalStatus};
pub use habit::{due_habits, Habit, HabitCategory, HabitRecord};
pub use recurrence::{FrequencyKind, OccurrenceDay, Recurrence, RecurrenceSpec};
pub use stats::{DashboardReport, MoodSummary};
pub use storage::{Config, HabitDb};
pub use streak::StreakSummary;

//! The habit aggregate.
//!
//! `Habit` carries a validated [`Recurrence`]; its serde representation is
//! the flat boundary record (`frequency` + `frequency_count` +
//! `occurrence_days`), converted through [`HabitRecord`] so an inconsistent
//! recurrence can never be deserialized into the domain type.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::recurrence::{FrequencyKind, OccurrenceDay, Recurrence, RecurrenceSpec};

/// Category a habit is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitCategory {
    Personal,
    Health,
    Fitness,
    Productivity,
    Mindfulness,
    Learning,
    Social,
    Creative,
    Other,
}

impl HabitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitCategory::Personal => "personal",
            HabitCategory::Health => "health",
            HabitCategory::Fitness => "fitness",
            HabitCategory::Productivity => "productivity",
            HabitCategory::Mindfulness => "mindfulness",
            HabitCategory::Learning => "learning",
            HabitCategory::Social => "social",
            HabitCategory::Creative => "creative",
            HabitCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(HabitCategory::Personal),
            "health" => Some(HabitCategory::Health),
            "fitness" => Some(HabitCategory::Fitness),
            "productivity" => Some(HabitCategory::Productivity),
            "mindfulness" => Some(HabitCategory::Mindfulness),
            "learning" => Some(HabitCategory::Learning),
            "social" => Some(HabitCategory::Social),
            "creative" => Some(HabitCategory::Creative),
            "other" => Some(HabitCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for HabitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "HabitRecord", try_from = "HabitRecord")]
pub struct Habit {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: HabitCategory,
    pub recurrence: Recurrence,
    pub frequency_count: i64,
    pub start_date: NaiveDate,
    pub active: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    /// Create a habit from a boundary recurrence definition.
    ///
    /// # Errors
    /// Returns the field-level validation failures if the recurrence
    /// definition is inconsistent.
    pub fn new(
        title: impl Into<String>,
        category: HabitCategory,
        spec: &RecurrenceSpec,
        start_date: NaiveDate,
    ) -> Result<Self, ValidationErrors> {
        let recurrence = spec.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            category,
            recurrence,
            frequency_count: spec.frequency_count.max(0),
            start_date,
            active: true,
            current_streak: 0,
            longest_streak: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether this habit expects a check-in on `date`.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.recurrence.is_due_on(self.start_date, self.active, date)
    }

    /// Replace the recurrence definition. Runs the same validation as
    /// creation; on failure the habit is left unchanged.
    pub fn set_recurrence(&mut self, spec: &RecurrenceSpec) -> Result<(), ValidationErrors> {
        self.recurrence = spec.validate()?;
        self.frequency_count = spec.frequency_count.max(0);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Store freshly derived streak figures.
    pub fn apply_streak(&mut self, current: u32, longest: u32) {
        self.current_streak = current;
        self.longest_streak = longest.max(current);
        self.updated_at = Utc::now();
    }
}

/// Active habits due on the given date.
pub fn due_habits(habits: &[Habit], date: NaiveDate) -> Vec<&Habit> {
    habits.iter().filter(|h| h.is_due_on(date)).collect()
}

/// Flat boundary record for a habit, as exchanged with collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: HabitCategory,
    pub frequency: FrequencyKind,
    #[serde(default)]
    pub frequency_count: i64,
    #[serde(default)]
    pub occurrence_days: Vec<OccurrenceDay>,
    pub start_date: NaiveDate,
    pub active: bool,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Habit> for HabitRecord {
    fn from(habit: Habit) -> Self {
        let spec = habit.recurrence.to_spec(habit.frequency_count);
        Self {
            id: habit.id,
            title: habit.title,
            description: habit.description,
            category: habit.category,
            frequency: spec.frequency,
            frequency_count: spec.frequency_count,
            occurrence_days: spec.occurrence_days,
            start_date: habit.start_date,
            active: habit.active,
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            created_at: habit.created_at,
            updated_at: habit.updated_at,
        }
    }
}

impl TryFrom<HabitRecord> for Habit {
    type Error = ValidationErrors;

    fn try_from(record: HabitRecord) -> Result<Self, Self::Error> {
        let spec = RecurrenceSpec {
            frequency: record.frequency,
            frequency_count: record.frequency_count,
            occurrence_days: record.occurrence_days,
        };
        let recurrence = spec.validate()?;
        Ok(Self {
            id: record.id,
            title: record.title,
            description: record.description,
            category: record.category,
            recurrence,
            frequency_count: spec.frequency_count.max(0),
            start_date: record.start_date,
            active: record.active,
            current_streak: record.current_streak,
            longest_streak: record.longest_streak,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

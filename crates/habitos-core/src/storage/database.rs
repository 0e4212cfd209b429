//! SQLite-based persistence for habits, check-ins, day entries, and goals.
//!
//! The one-check-in-per-day invariant is carried by the schema itself:
//! `day_entries.date` is the primary key and `check_ins(habit_id, date)` is
//! unique, so [`HabitDb::commit_bulk`] is a compare-and-set. Whichever
//! writer loses the race gets a [`DuplicateCheckInError`] and the whole
//! batch rolls back.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::checkin::{CheckIn, DayEntry};
use crate::error::{CoreError, DatabaseError, DuplicateCheckInError, Result};
use crate::goal::{Goal, GoalPriority, GoalStatus};
use crate::habit::{Habit, HabitCategory};
use crate::recurrence::{FrequencyKind, OccurrenceDay, RecurrenceSpec};

/// SQLite database for habit storage.
pub struct HabitDb {
    conn: Connection,
}

impl HabitDb {
    /// Open the database at `~/.config/habitos/habitos.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("habitos.db"))
    }

    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl Into<std::path::PathBuf>) -> Result<Self> {
        let path = path.into();
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral use).
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS habits (
                    id              TEXT PRIMARY KEY,
                    title           TEXT NOT NULL,
                    description     TEXT,
                    category        TEXT NOT NULL,
                    frequency       TEXT NOT NULL,
                    frequency_count INTEGER NOT NULL DEFAULT 0,
                    occurrence_days TEXT NOT NULL DEFAULT '[]',
                    start_date      TEXT NOT NULL,
                    active          INTEGER NOT NULL DEFAULT 1,
                    current_streak  INTEGER NOT NULL DEFAULT 0,
                    longest_streak  INTEGER NOT NULL DEFAULT 0,
                    created_at      TEXT NOT NULL,
                    updated_at      TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS check_ins (
                    id           TEXT PRIMARY KEY,
                    habit_id     TEXT NOT NULL,
                    date         TEXT NOT NULL,
                    completed    INTEGER NOT NULL,
                    actual_value REAL,
                    mood_rating  INTEGER,
                    created_at   TEXT NOT NULL,
                    UNIQUE (habit_id, date)
                );

                CREATE TABLE IF NOT EXISTS day_entries (
                    date            TEXT PRIMARY KEY,
                    mood_rating     INTEGER,
                    journal_content TEXT,
                    created_at      TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS goals (
                    id                  TEXT PRIMARY KEY,
                    habit_id            TEXT NOT NULL,
                    title               TEXT NOT NULL,
                    target_value        INTEGER NOT NULL,
                    target_unit         TEXT,
                    current_value       INTEGER NOT NULL DEFAULT 0,
                    start_date          TEXT NOT NULL,
                    due_date            TEXT NOT NULL,
                    completed_date      TEXT,
                    status              TEXT NOT NULL,
                    priority            TEXT NOT NULL,
                    is_overdue          INTEGER NOT NULL DEFAULT 0,
                    progress_percentage INTEGER NOT NULL DEFAULT 0,
                    created_at          TEXT NOT NULL,
                    updated_at          TEXT NOT NULL
                );

                -- Create indexes for common query patterns
                CREATE INDEX IF NOT EXISTS idx_check_ins_habit_id ON check_ins(habit_id);
                CREATE INDEX IF NOT EXISTS idx_check_ins_date ON check_ins(date);
                CREATE INDEX IF NOT EXISTS idx_goals_habit_id ON goals(habit_id);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // === Habits ===

    /// Insert a new habit.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_habit(&self, habit: &Habit) -> Result<()> {
        let days = occurrence_days_json(habit)?;
        self.conn.execute(
            "INSERT INTO habits (id, title, description, category, frequency, frequency_count,
                                 occurrence_days, start_date, active, current_streak,
                                 longest_streak, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                habit.id,
                habit.title,
                habit.description,
                habit.category.as_str(),
                habit.recurrence.kind().as_str(),
                habit.frequency_count,
                days,
                format_date(habit.start_date),
                habit.active,
                habit.current_streak,
                habit.longest_streak,
                habit.created_at.to_rfc3339(),
                habit.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Overwrite an existing habit's row.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn update_habit(&self, habit: &Habit) -> Result<()> {
        let days = occurrence_days_json(habit)?;
        self.conn.execute(
            "UPDATE habits
             SET title = ?2, description = ?3, category = ?4, frequency = ?5,
                 frequency_count = ?6, occurrence_days = ?7, start_date = ?8, active = ?9,
                 current_streak = ?10, longest_streak = ?11, updated_at = ?12
             WHERE id = ?1",
            params![
                habit.id,
                habit.title,
                habit.description,
                habit.category.as_str(),
                habit.recurrence.kind().as_str(),
                habit.frequency_count,
                days,
                format_date(habit.start_date),
                habit.active,
                habit.current_streak,
                habit.longest_streak,
                habit.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch one habit by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or the stored row is corrupt.
    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![id],
                read_habit_row,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        row.map(habit_from_row).transpose()
    }

    /// All habits, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row is corrupt.
    pub fn list_habits(&self) -> Result<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits ORDER BY created_at DESC"
        ))?;
        let rows = stmt
            .query_map([], read_habit_row)?
            .collect::<rusqlite::Result<Vec<HabitRow>>>()
            .map_err(DatabaseError::from)?;
        rows.into_iter().map(habit_from_row).collect()
    }

    /// Delete a habit along with its check-ins and goals.
    ///
    /// # Errors
    /// Returns an error if any of the deletes fail.
    pub fn delete_habit(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        tx.execute("DELETE FROM check_ins WHERE habit_id = ?1", params![id])?;
        tx.execute("DELETE FROM goals WHERE habit_id = ?1", params![id])?;
        tx.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(())
    }

    // === Check-ins ===

    /// Persist one committed day: the shared day entry plus one check-in
    /// per habit, all or nothing.
    ///
    /// The schema enforces the ledger's invariant. A second submission for
    /// the same date loses on the `day_entries` primary key; a habit that
    /// already checked in (even on a day with no day entry) loses on the
    /// `check_ins(habit_id, date)` unique index. Either way nothing from
    /// the batch is kept.
    ///
    /// # Errors
    /// Returns [`CoreError::DuplicateCheckIn`] on conflict, or a database
    /// error if the writes fail.
    pub fn commit_bulk(&mut self, day: &DayEntry, check_ins: &[CheckIn]) -> Result<()> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        tx.execute(
            "INSERT INTO day_entries (date, mood_rating, journal_content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                format_date(day.date),
                day.mood_rating,
                day.journal_content,
                day.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                CoreError::DuplicateCheckIn(DuplicateCheckInError::DayLocked { date: day.date })
            } else {
                e.into()
            }
        })?;
        for check_in in check_ins {
            tx.execute(
                "INSERT INTO check_ins (id, habit_id, date, completed, actual_value,
                                        mood_rating, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    check_in.id,
                    check_in.habit_id,
                    format_date(check_in.date),
                    check_in.completed,
                    check_in.actual_value,
                    check_in.mood_rating,
                    check_in.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    CoreError::DuplicateCheckIn(DuplicateCheckInError::Habit {
                        habit_id: check_in.habit_id.clone(),
                        date: check_in.date,
                    })
                } else {
                    e.into()
                }
            })?;
        }
        tx.commit().map_err(DatabaseError::from)?;
        Ok(())
    }

    /// All check-ins for one habit, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn check_ins_for_habit(&self, habit_id: &str) -> Result<Vec<CheckIn>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE habit_id = ?1 ORDER BY date ASC"
        ))?;
        let rows = stmt
            .query_map(params![habit_id], read_check_in_row)?
            .collect::<rusqlite::Result<Vec<CheckIn>>>()
            .map_err(DatabaseError::from)?;
        Ok(rows)
    }

    /// All check-ins on one date.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn check_ins_on(&self, date: NaiveDate) -> Result<Vec<CheckIn>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE date = ?1 ORDER BY habit_id ASC"
        ))?;
        let rows = stmt
            .query_map(params![format_date(date)], read_check_in_row)?
            .collect::<rusqlite::Result<Vec<CheckIn>>>()
            .map_err(DatabaseError::from)?;
        Ok(rows)
    }

    /// The full check-in history, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_check_ins(&self) -> Result<Vec<CheckIn>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins ORDER BY date ASC, habit_id ASC"
        ))?;
        let rows = stmt
            .query_map([], read_check_in_row)?
            .collect::<rusqlite::Result<Vec<CheckIn>>>()
            .map_err(DatabaseError::from)?;
        Ok(rows)
    }

    /// The shared day entry for one date, if the day was submitted.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn day_entry(&self, date: NaiveDate) -> Result<Option<DayEntry>> {
        let row = self
            .conn
            .query_row(
                "SELECT date, mood_rating, journal_content, created_at
                 FROM day_entries WHERE date = ?1",
                params![format_date(date)],
                read_day_entry_row,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(row)
    }

    /// Every submitted day entry, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_day_entries(&self) -> Result<Vec<DayEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, mood_rating, journal_content, created_at
             FROM day_entries ORDER BY date ASC",
        )?;
        let rows = stmt
            .query_map([], read_day_entry_row)?
            .collect::<rusqlite::Result<Vec<DayEntry>>>()
            .map_err(DatabaseError::from)?;
        Ok(rows)
    }

    // === Goals ===

    /// Insert a new goal.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_goal(&self, goal: &Goal) -> Result<()> {
        self.conn.execute(
            "INSERT INTO goals (id, habit_id, title, target_value, target_unit, current_value,
                                start_date, due_date, completed_date, status, priority,
                                is_overdue, progress_percentage, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                goal.id,
                goal.habit_id,
                goal.title,
                goal.target_value,
                goal.target_unit,
                goal.current_value,
                format_date(goal.start_date),
                format_date(goal.due_date),
                goal.completed_date.map(format_date),
                goal.status.as_str(),
                goal.priority.as_str(),
                goal.is_overdue,
                goal.progress_percentage,
                goal.created_at.to_rfc3339(),
                goal.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Overwrite an existing goal's row.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn update_goal(&self, goal: &Goal) -> Result<()> {
        self.conn.execute(
            "UPDATE goals
             SET title = ?2, target_value = ?3, target_unit = ?4, current_value = ?5,
                 due_date = ?6, completed_date = ?7, status = ?8, priority = ?9,
                 is_overdue = ?10, progress_percentage = ?11, updated_at = ?12
             WHERE id = ?1",
            params![
                goal.id,
                goal.title,
                goal.target_value,
                goal.target_unit,
                goal.current_value,
                format_date(goal.due_date),
                goal.completed_date.map(format_date),
                goal.status.as_str(),
                goal.priority.as_str(),
                goal.is_overdue,
                goal.progress_percentage,
                goal.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch one goal by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get_goal(&self, id: &str) -> Result<Option<Goal>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
                params![id],
                read_goal_row,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(row)
    }

    /// All goals, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals ORDER BY created_at DESC"
        ))?;
        let rows = stmt
            .query_map([], read_goal_row)?
            .collect::<rusqlite::Result<Vec<Goal>>>()
            .map_err(DatabaseError::from)?;
        Ok(rows)
    }

    /// All goals attached to one habit.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn goals_for_habit(&self, habit_id: &str) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE habit_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt
            .query_map(params![habit_id], read_goal_row)?
            .collect::<rusqlite::Result<Vec<Goal>>>()
            .map_err(DatabaseError::from)?;
        Ok(rows)
    }

    /// Delete one goal.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_goal(&self, id: &str) -> Result<()> {
        self.conn.execute("DELETE FROM goals WHERE id = ?1", params![id])?;
        Ok(())
    }
}

const HABIT_COLUMNS: &str = "id, title, description, category, frequency, frequency_count, \
                             occurrence_days, start_date, active, current_streak, \
                             longest_streak, created_at, updated_at";

const CHECK_IN_COLUMNS: &str =
    "id, habit_id, date, completed, actual_value, mood_rating, created_at";

const GOAL_COLUMNS: &str = "id, habit_id, title, target_value, target_unit, current_value, \
                            start_date, due_date, completed_date, status, priority, \
                            is_overdue, progress_percentage, created_at, updated_at";

/// Raw habit row; recurrence is validated separately in [`habit_from_row`].
struct HabitRow {
    id: String,
    title: String,
    description: Option<String>,
    category: String,
    frequency: String,
    frequency_count: i64,
    occurrence_days: String,
    start_date: String,
    active: bool,
    current_streak: u32,
    longest_streak: u32,
    created_at: String,
    updated_at: String,
}

fn read_habit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitRow> {
    Ok(HabitRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        frequency: row.get(4)?,
        frequency_count: row.get(5)?,
        occurrence_days: row.get(6)?,
        start_date: row.get(7)?,
        active: row.get(8)?,
        current_streak: row.get(9)?,
        longest_streak: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn habit_from_row(row: HabitRow) -> Result<Habit> {
    let occurrence_days: Vec<OccurrenceDay> = serde_json::from_str(&row.occurrence_days)?;
    let spec = RecurrenceSpec {
        frequency: parse_frequency(&row.frequency),
        frequency_count: row.frequency_count,
        occurrence_days,
    };
    let recurrence = spec.validate()?;
    Ok(Habit {
        id: row.id,
        title: row.title,
        description: row.description,
        category: parse_category(&row.category),
        recurrence,
        frequency_count: row.frequency_count.max(0),
        start_date: parse_date(&row.start_date),
        active: row.active,
        current_streak: row.current_streak,
        longest_streak: row.longest_streak,
        created_at: parse_datetime(&row.created_at),
        updated_at: parse_datetime(&row.updated_at),
    })
}

fn read_check_in_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CheckIn> {
    let date: String = row.get(2)?;
    let created_at: String = row.get(6)?;
    Ok(CheckIn {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        date: parse_date(&date),
        completed: row.get(3)?,
        actual_value: row.get(4)?,
        mood_rating: row.get(5)?,
        created_at: parse_datetime(&created_at),
    })
}

fn read_day_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DayEntry> {
    let date: String = row.get(0)?;
    let created_at: String = row.get(3)?;
    Ok(DayEntry {
        date: parse_date(&date),
        mood_rating: row.get(1)?,
        journal_content: row.get(2)?,
        created_at: parse_datetime(&created_at),
    })
}

fn read_goal_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Goal> {
    let start_date: String = row.get(6)?;
    let due_date: String = row.get(7)?;
    let completed_date: Option<String> = row.get(8)?;
    let status: String = row.get(9)?;
    let priority: String = row.get(10)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;
    Ok(Goal {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        title: row.get(2)?,
        target_value: row.get(3)?,
        target_unit: row.get(4)?,
        current_value: row.get(5)?,
        start_date: parse_date(&start_date),
        due_date: parse_date(&due_date),
        completed_date: completed_date.as_deref().map(parse_date),
        status: parse_status(&status),
        priority: parse_priority(&priority),
        is_overdue: row.get(11)?,
        progress_percentage: row.get(12)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

fn occurrence_days_json(habit: &Habit) -> Result<String> {
    Ok(serde_json::to_string(&habit.recurrence.occurrence_days())?)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_category(s: &str) -> HabitCategory {
    HabitCategory::parse(s).unwrap_or(HabitCategory::Other)
}

fn parse_frequency(s: &str) -> FrequencyKind {
    FrequencyKind::parse(s).unwrap_or(FrequencyKind::Daily)
}

fn parse_status(s: &str) -> GoalStatus {
    GoalStatus::parse(s).unwrap_or(GoalStatus::Active)
}

fn parse_priority(s: &str) -> GoalPriority {
    GoalPriority::parse(s).unwrap_or(GoalPriority::Medium)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

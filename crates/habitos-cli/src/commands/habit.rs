//! Habit management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use habitos_core::{Config, Habit, HabitCategory, HabitDb, OccurrenceDay, RecurrenceSpec};

use super::resolve_date;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Create {
        /// Habit title
        title: String,
        /// Habit description
        #[arg(long)]
        description: Option<String>,
        /// Category (defaults to the configured default_category)
        #[arg(long)]
        category: Option<String>,
        /// Recurrence: daily, weekly, monthly, or custom
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// Times per week/month, or the day interval for custom
        #[arg(long, default_value = "0")]
        frequency_count: i64,
        /// Comma-separated occurrence days (weekday names for weekly,
        /// day numbers for monthly)
        #[arg(long)]
        days: Option<String>,
        /// First day the habit is due (default: today)
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },
    /// List habits
    List {
        /// Only habits due on the given date (default: today)
        #[arg(long)]
        due: bool,
        /// Date to check against, with --due
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Get habit details
    Get {
        /// Habit ID
        id: String,
    },
    /// Update a habit
    Update {
        /// Habit ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// New recurrence frequency
        #[arg(long)]
        frequency: Option<String>,
        /// New frequency count
        #[arg(long)]
        frequency_count: Option<i64>,
        /// New comma-separated occurrence days
        #[arg(long)]
        days: Option<String>,
        /// Activate or deactivate the habit
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a habit along with its check-ins and goals
    Delete {
        /// Habit ID
        id: String,
    },
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = HabitDb::open()?;

    match action {
        HabitAction::Create {
            title,
            description,
            category,
            frequency,
            frequency_count,
            days,
            start_date,
        } => {
            let category = parse_category(
                &category.unwrap_or_else(|| Config::load_or_default().default_category),
            )?;
            let spec = RecurrenceSpec {
                frequency: parse_frequency(&frequency)?,
                frequency_count,
                occurrence_days: parse_days(days.as_deref()),
            };
            let mut habit = Habit::new(title, category, &spec, resolve_date(start_date))?;
            habit.description = description;
            db.insert_habit(&habit)?;
            println!("Habit created: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { due, date } => {
            let habits = db.list_habits()?;
            if due {
                let day = resolve_date(date);
                let due_now: Vec<&Habit> = habitos_core::due_habits(&habits, day);
                println!("{}", serde_json::to_string_pretty(&due_now)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            }
        }
        HabitAction::Get { id } => {
            let habit = db.get_habit(&id)?.ok_or(format!("habit not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Update {
            id,
            title,
            description,
            category,
            frequency,
            frequency_count,
            days,
            active,
        } => {
            let mut habit = db.get_habit(&id)?.ok_or(format!("habit not found: {id}"))?;
            if let Some(title) = title {
                habit.title = title;
            }
            if description.is_some() {
                habit.description = description;
            }
            if let Some(category) = category {
                habit.category = parse_category(&category)?;
            }
            if frequency.is_some() || frequency_count.is_some() || days.is_some() {
                // Unchanged recurrence fields carry over from the habit.
                let current = habit.recurrence.to_spec(habit.frequency_count);
                let spec = RecurrenceSpec {
                    frequency: match frequency {
                        Some(f) => parse_frequency(&f)?,
                        None => current.frequency,
                    },
                    frequency_count: frequency_count.unwrap_or(current.frequency_count),
                    occurrence_days: match days.as_deref() {
                        Some(d) => parse_days(Some(d)),
                        None => current.occurrence_days,
                    },
                };
                habit.set_recurrence(&spec)?;
            }
            if let Some(active) = active {
                habit.active = active;
            }
            db.update_habit(&habit)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Delete { id } => {
            db.delete_habit(&id)?;
            println!("Habit deleted: {id}");
        }
    }

    Ok(())
}

fn parse_category(s: &str) -> Result<HabitCategory, String> {
    HabitCategory::parse(s).ok_or(format!("unknown category: {s}"))
}

fn parse_frequency(s: &str) -> Result<habitos_core::FrequencyKind, String> {
    habitos_core::FrequencyKind::parse(s).ok_or(format!("unknown frequency: {s}"))
}

/// Comma-separated day tokens: numbers become days of the month, anything
/// else is taken as a weekday name. Validation happens in the recurrence.
fn parse_days(days: Option<&str>) -> Vec<OccurrenceDay> {
    days.map(|d| {
        d.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| match t.parse::<i64>() {
                Ok(n) => OccurrenceDay::DayOfMonth(n),
                Err(_) => OccurrenceDay::Weekday(t.to_string()),
            })
            .collect()
    })
    .unwrap_or_default()
}

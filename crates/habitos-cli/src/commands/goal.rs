//! Goal management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use habitos_core::{Goal, GoalPriority, HabitDb};

use super::resolve_date;

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a new goal for a habit
    Create {
        /// Habit ID the goal tracks
        habit_id: String,
        /// Goal title
        title: String,
        /// Number of completed check-ins to reach
        target: i64,
        /// Unit label for the target (e.g. "sessions")
        #[arg(long)]
        unit: Option<String>,
        /// Deadline for the goal
        #[arg(long)]
        due_date: NaiveDate,
        /// Priority: low, medium, or high
        #[arg(long, default_value = "medium")]
        priority: String,
    },
    /// List goals
    List {
        /// Only goals for one habit
        #[arg(long)]
        habit_id: Option<String>,
    },
    /// Get goal details
    Get {
        /// Goal ID
        id: String,
    },
    /// Pause an active goal
    Pause {
        /// Goal ID
        id: String,
    },
    /// Resume a paused goal
    Resume {
        /// Goal ID
        id: String,
    },
    /// Cancel a goal
    Cancel {
        /// Goal ID
        id: String,
    },
    /// Delete a goal
    Delete {
        /// Goal ID
        id: String,
    },
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;

    match action {
        GoalAction::Create {
            habit_id,
            title,
            target,
            unit,
            due_date,
            priority,
        } => {
            let habit = db
                .get_habit(&habit_id)?
                .ok_or(format!("habit not found: {habit_id}"))?;
            let priority =
                GoalPriority::parse(&priority).ok_or(format!("unknown priority: {priority}"))?;
            let goal = Goal::new(
                &habit,
                title,
                target,
                unit,
                due_date,
                priority,
                resolve_date(None),
            )?;
            db.insert_goal(&goal)?;
            println!("Goal created: {}", goal.id);
            println!("{}", serde_json::to_string_pretty(&goal)?);
        }
        GoalAction::List { habit_id } => {
            let goals = match habit_id {
                Some(id) => db.goals_for_habit(&id)?,
                None => db.list_goals()?,
            };
            println!("{}", serde_json::to_string_pretty(&goals)?);
        }
        GoalAction::Get { id } => {
            let goal = db.get_goal(&id)?.ok_or(format!("goal not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&goal)?);
        }
        GoalAction::Pause { id } => {
            let mut goal = db.get_goal(&id)?.ok_or(format!("goal not found: {id}"))?;
            goal.pause()?;
            db.update_goal(&goal)?;
            println!("Goal paused: {id}");
        }
        GoalAction::Resume { id } => {
            let mut goal = db.get_goal(&id)?.ok_or(format!("goal not found: {id}"))?;
            goal.resume()?;
            db.update_goal(&goal)?;
            println!("Goal resumed: {id}");
        }
        GoalAction::Cancel { id } => {
            let mut goal = db.get_goal(&id)?.ok_or(format!("goal not found: {id}"))?;
            goal.cancel()?;
            db.update_goal(&goal)?;
            println!("Goal cancelled: {id}");
        }
        GoalAction::Delete { id } => {
            db.delete_goal(&id)?;
            println!("Goal deleted: {id}");
        }
    }

    Ok(())
}

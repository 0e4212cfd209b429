//! Dashboard statistics commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use habitos_core::{stats, HabitDb};

use super::resolve_date;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Show the dashboard: completion rate, weekly chart, mood summary
    Dashboard {
        /// Date to treat as "today" (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;

    match action {
        StatsAction::Dashboard { date } => {
            let today = resolve_date(date);
            let habits = db.list_habits()?;
            let check_ins = db.list_check_ins()?;
            let goals = db.list_goals()?;
            let report = stats::dashboard(&habits, &check_ins, &goals, today);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

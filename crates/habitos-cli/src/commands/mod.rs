pub mod checkin;
pub mod config;
pub mod goal;
pub mod habit;
pub mod stats;

use chrono::NaiveDate;
use habitos_core::Config;

/// The date a command operates on: an explicit `--date`, or "today" per
/// the configured timezone offset.
pub fn resolve_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Config::load_or_default().today())
}

mod config;
pub mod database;

pub use config::Config;
pub use database::HabitDb;

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/habitos[-dev]/` based on HABITOS_ENV.
///
/// Set HABITOS_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HABITOS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("habitos-dev")
    } else {
        base_dir.join("habitos")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

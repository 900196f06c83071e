//! Centralized path resolution for tickie's on-disk state.
//!
//! Everything lives under `$HOME/.tickie` unless an environment variable
//! points elsewhere.

fn home_file(name: &str) -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    format!("{home}/.tickie/{name}")
}

/// Resolve the database path.
/// Checks `TICKIE_DB` env var, falls back to `$HOME/.tickie/tickie.db`.
pub fn db_path() -> String {
    std::env::var("TICKIE_DB").unwrap_or_else(|_| home_file("tickie.db"))
}

/// Resolve the config file path.
/// Checks `TICKIE_CONFIG` env var, falls back to `$HOME/.tickie/config.toml`.
pub fn config_path() -> String {
    std::env::var("TICKIE_CONFIG").unwrap_or_else(|_| home_file("config.toml"))
}

/// Resolve the log file used by long-running commands.
/// Checks `TICKIE_LOG` env var, falls back to `$HOME/.tickie/tickie.log`.
pub fn log_path() -> String {
    std::env::var("TICKIE_LOG").unwrap_or_else(|_| home_file("tickie.log"))
}

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::model::Filter;
use crate::paths;
use crate::reminder::{ReminderOptions, DEFAULT_INTERVAL};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReminderConfig {
    pub enabled: Option<bool>,
    pub interval_secs: Option<u64>,
    pub prune_orphans: Option<bool>,
}

impl ReminderConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn interval(&self) -> Duration {
        self.interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INTERVAL)
    }

    pub fn options(&self) -> ReminderOptions {
        ReminderOptions {
            prune_orphans: self.prune_orphans.unwrap_or(false),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    pub filter: Option<Filter>,
}

impl Config {
    /// Load config from `~/.tickie/config.toml` (or `TICKIE_CONFIG`).
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(&paths::config_path()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.reminders.interval_secs == Some(0) {
            bail!(
                "failed to parse {}: reminders.interval_secs must be greater than zero",
                path.display()
            );
        }
        Ok(())
    }
}

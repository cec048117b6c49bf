use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use tracing::Level;

use crate::error::ValidationError;
use crate::schedule::{reference_date, reference_from};
use crate::storage::db_path;

/// Runtime settings gathered from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: PathBuf,
    /// Fixed "today", used instead of the local clock when set.
    pub today: Option<NaiveDate>,
    pub log_level: Level,
    /// `BANANA_CARE_LOG` value that was not a level, reported once logging is up.
    pub ignored_log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: db_path(),
            today: None,
            log_level: Level::WARN,
            ignored_log_level: None,
        }
    }
}

impl Config {
    /// Reads `BANANA_CARE_DB`, `BANANA_CARE_TODAY` and `BANANA_CARE_LOG`.
    pub fn from_env() -> Result<Self, ValidationError> {
        let mut config = Self::default();
        if let Ok(today) = std::env::var("BANANA_CARE_TODAY") {
            config.today = Some(reference_date(&today)?);
        }
        if let Ok(level) = std::env::var("BANANA_CARE_LOG") {
            config.set_log_level(&level);
        }
        Ok(config)
    }

    /// Applies a level name such as `debug`; anything else is kept in `ignored_log_level`.
    pub fn set_log_level(&mut self, raw: &str) {
        match raw.trim().parse::<Level>() {
            Ok(level) => self.log_level = level,
            Err(_) => self.ignored_log_level = Some(raw.to_string()),
        }
    }

    /// Overrides the reference day from a command-line value.
    pub fn with_today(mut self, today: Option<&str>) -> Result<Self, ValidationError> {
        if let Some(raw) = today {
            self.today = Some(reference_date(raw)?);
        }
        Ok(self)
    }

    /// The configured reference day, or the local calendar day.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| reference_from(Local::now()))
    }
}

/// Local wall-clock time to the minute, stamped on new log entries.
pub fn clock_time() -> NaiveTime {
    let now = Local::now().time();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

use crate::error::ConfigError;
use core_types::Timeframe;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an absent file or an empty section is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub analytics: AnalyticsSettings,
    pub journal: JournalSettings,
}

impl Config {
    /// Rejects values that would make the application misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.level must not be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.analytics.monthly_window == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.monthly_window must be at least 1".to_string(),
            ));
        }
        if !is_leverage(&self.journal.default_leverage) {
            return Err(ConfigError::ValidationError(format!(
                "journal.default_leverage '{}' is not of the form 'a:b'",
                self.journal.default_leverage
            )));
        }
        Ok(())
    }
}

/// Where and how verbosely the application logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, e.g. `"info"` or `"journal=debug,info"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "tradebook.log".to_string(),
        }
    }
}

/// Connection settings for the PostgreSQL trade store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Falls back to the `DATABASE_URL` environment variable.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseSettings {
    pub fn resolved_url(&self) -> Option<String> {
        self.url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Presentation options for the aggregate statistics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Number of months shown by the monthly P&L breakdown.
    pub monthly_window: usize,
    /// Sort months by date before keeping the most recent ones. When false,
    /// months keep the order in which they first appear in the snapshot.
    pub chronological_months: bool,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            monthly_window: 6,
            chronological_months: true,
        }
    }
}

/// Defaults applied to new trade forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalSettings {
    pub default_timeframe: Timeframe,
    pub default_leverage: String,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            default_timeframe: Timeframe::H1,
            default_leverage: "1:1".to_string(),
        }
    }
}

fn is_leverage(value: &str) -> bool {
    let parts: Vec<&str> = value.split(':').collect();
    parts.len() == 2 && parts.iter().all(|p| p.trim().parse::<f64>().is_ok())
}

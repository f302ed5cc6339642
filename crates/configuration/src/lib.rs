use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{AnalyticsSettings, Config, DatabaseSettings, JournalSettings, LoggingSettings};

/// The file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tradebook.toml";

/// Prefix of environment overrides, e.g. `TRADEBOOK__DATABASE__URL`.
pub const ENV_PREFIX: &str = "TRADEBOOK";

/// Loads the application configuration.
///
/// Reads `path` (required to exist when given) or the optional
/// `tradebook.toml`, layers `TRADEBOOK__SECTION__KEY` environment variables on
/// top, deserializes into `Config` and validates it.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

    let builder = config::Config::builder()
        .add_source(config::File::from(file).required(path.is_some()))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(file = %file.display(), "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Timeframe;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analytics.monthly_window, 6);
        assert!(config.analytics.chronological_months);
        assert_eq!(config.journal.default_leverage, "1:1");
    }

    #[test]
    fn reads_sections_from_toml() {
        let file = write_config(
            r#"
            [logging]
            level = "debug"

            [analytics]
            monthly_window = 12
            chronological_months = false

            [journal]
            default_timeframe = "4h"
            "#,
        );
        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.analytics.monthly_window, 12);
        assert!(!config.analytics.chronological_months);
        assert_eq!(config.journal.default_timeframe, Timeframe::H4);
        // Untouched sections keep their defaults.
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.journal.default_leverage, "1:1");
    }

    #[test]
    fn rejects_zero_month_window() {
        let file = write_config("[analytics]\nmonthly_window = 0\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rejects_malformed_leverage() {
        let file = write_config("[journal]\ndefault_leverage = \"ten\"\n");
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let missing = Path::new("/definitely/not/here/tradebook.toml");
        assert!(matches!(
            load_config(Some(missing)),
            Err(ConfigError::LoadError(_))
        ));
    }
}

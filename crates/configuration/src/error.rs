use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read tradebook configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid tradebook configuration: {0}")]
    ValidationError(String),
}

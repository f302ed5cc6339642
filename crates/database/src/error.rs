use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Database operation failed: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// Also returned when the record exists but belongs to another user.
    #[error("The requested trade was not found.")]
    NotFound,

    #[error("The write was rejected: {0}")]
    Rejected(#[from] CoreError),

    #[error("Stored trade could not be decoded: {0}")]
    Corrupt(String),
}

use core_types::CoreError;
use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    /// The request itself was invalid or broke the trade lifecycle.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// The store could not complete the operation. Nothing was changed.
    #[error("Storage error: {0}")]
    Storage(#[source] DbError),
}

impl From<DbError> for JournalError {
    fn from(e: DbError) -> Self {
        match e {
            // The store enforces the lifecycle atomically; surface its verdict
            // as the domain error it is.
            DbError::Rejected(core) => JournalError::Core(core),
            other => JournalError::Storage(other),
        }
    }
}

impl JournalError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, JournalError::Storage(DbError::NotFound))
    }
}

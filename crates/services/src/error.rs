//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::EngineError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("could not serialize progress: {0}")]
    Serialization(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted when importing progress text.
///
/// The store is left untouched for every variant except `Progress`, which is
/// raised by the final write.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("import is not valid JSON: {0}")]
    Malformed(String),
    #[error("import must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

/// Errors emitted by `LearningSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("option {index} does not exist; the quiz has {options} options")]
    InvalidOption { index: usize, options: usize },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

impl SessionError {
    /// True when the user tried to advance without picking an option.
    #[must_use]
    pub fn is_no_selection(&self) -> bool {
        matches!(self, SessionError::Engine(EngineError::NoSelection))
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::PayloadError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Failures reported by the remote and local quiz sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("quiz resource not found")]
    NotFound,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("quiz resource unreadable: {0}")]
    Unreadable(String),
}

/// Errors surfaced to the onboarding layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz is available")]
    NotFound,
    #[error("invalid quiz payload: {0}")]
    InvalidPayload(#[from] PayloadError),
    #[error("progress storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("network failure: {0}")]
    Network(String),
    #[error("quiz fetch was superseded by a newer request")]
    Cancelled,
    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl From<SourceError> for QuizError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound => QuizError::NotFound,
            SourceError::Transport(reason) => QuizError::Network(reason),
            SourceError::Unreadable(reason) => QuizError::Unknown(reason),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

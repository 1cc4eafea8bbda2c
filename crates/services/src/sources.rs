use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::SourceError;

/// Remote provider of the quiz payload.
#[async_trait]
pub trait QuizRemoteSource: Send + Sync {
    /// Fetch the raw quiz JSON.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` on any transport-level failure.
    async fn fetch(&self) -> Result<Vec<u8>, SourceError>;
}

/// Local provider used when the remote source fails.
pub trait QuizLocalSource: Send + Sync {
    /// Load the raw quiz JSON.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::NotFound` if the resource is absent.
    fn load(&self) -> Result<Vec<u8>, SourceError>;
}

/// Remote source used when no remote endpoint is configured; always fails over.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledRemoteSource;

#[async_trait]
impl QuizRemoteSource for DisabledRemoteSource {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::Transport("remote source not configured".into()))
    }
}

/// Reads the quiz from a JSON file on disk.
#[derive(Clone, Debug)]
pub struct FileQuizSource {
    path: PathBuf,
}

impl FileQuizSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QuizLocalSource for FileQuizSource {
    fn load(&self) -> Result<Vec<u8>, SourceError> {
        std::fs::read(&self.path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound,
            _ => SourceError::Unreadable(format!("{}: {err}", self.path.display())),
        })
    }
}

/// Serves a quiz compiled into the binary.
#[derive(Clone, Copy, Debug)]
pub struct BundledQuizSource {
    bytes: &'static [u8],
}

impl BundledQuizSource {
    #[must_use]
    pub fn new(bytes: &'static [u8]) -> Self {
        Self { bytes }
    }
}

impl Default for BundledQuizSource {
    fn default() -> Self {
        Self::new(include_bytes!("../assets/quiz_mock.json"))
    }
}

impl QuizLocalSource for BundledQuizSource {
    fn load(&self) -> Result<Vec<u8>, SourceError> {
        if self.bytes.is_empty() {
            return Err(SourceError::NotFound);
        }
        Ok(self.bytes.to_vec())
    }
}

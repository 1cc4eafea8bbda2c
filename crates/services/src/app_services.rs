use std::sync::Arc;

use storage::ProgressStore;
use storage::repository::Storage;

use crate::config::QuizConfig;
use crate::error::AppServicesError;
use crate::onboarding::OnboardingService;
use crate::remote::HttpRemoteSource;
use crate::resolver::QuizResolver;
use crate::sources::{
    BundledQuizSource, DisabledRemoteSource, FileQuizSource, QuizLocalSource, QuizRemoteSource,
};

/// Assembles the resolver and progress store from configuration.
#[derive(Clone)]
pub struct AppServices {
    resolver: Arc<QuizResolver>,
    progress: ProgressStore,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the HTTP client fails.
    pub async fn new_sqlite(config: &QuizConfig) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.db_url).await?;
        Self::with_storage(config, &storage)
    }

    /// Build services over an existing storage backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn with_storage(config: &QuizConfig, storage: &Storage) -> Result<Self, AppServicesError> {
        let remote: Arc<dyn QuizRemoteSource> = match config.remote.clone() {
            Some(remote) => Arc::new(HttpRemoteSource::new(remote)?),
            None => Arc::new(DisabledRemoteSource),
        };
        let local: Arc<dyn QuizLocalSource> = match config.fallback_path.clone() {
            Some(path) => Arc::new(FileQuizSource::new(path)),
            None => Arc::new(BundledQuizSource::default()),
        };

        Ok(Self {
            resolver: Arc::new(QuizResolver::new(remote, local)),
            progress: ProgressStore::new(Arc::clone(&storage.kv)),
        })
    }

    #[must_use]
    pub fn resolver(&self) -> Arc<QuizResolver> {
        Arc::clone(&self.resolver)
    }

    #[must_use]
    pub fn progress(&self) -> ProgressStore {
        self.progress.clone()
    }

    #[must_use]
    pub fn onboarding(&self) -> OnboardingService {
        OnboardingService::new(self.resolver(), self.progress())
    }
}

use std::sync::{Arc, Mutex};

use quiz_core::model::QuizDefinition;
use tokio::sync::watch;

use crate::error::QuizError;
use crate::sources::{QuizLocalSource, QuizRemoteSource};

#[derive(Default)]
struct ResolverState {
    generation: u64,
    cached: Option<Arc<QuizDefinition>>,
}

/// Resolves the quiz definition: remote first, bundled fallback second.
///
/// Only one fetch is live at a time. Starting a new fetch cancels the one in
/// flight, which then returns `QuizError::Cancelled` without touching the cache.
pub struct QuizResolver {
    remote: Arc<dyn QuizRemoteSource>,
    local: Arc<dyn QuizLocalSource>,
    state: Mutex<ResolverState>,
    latest: watch::Sender<u64>,
}

impl QuizResolver {
    #[must_use]
    pub fn new(remote: Arc<dyn QuizRemoteSource>, local: Arc<dyn QuizLocalSource>) -> Self {
        let (latest, _) = watch::channel(0);
        Self {
            remote,
            local,
            state: Mutex::new(ResolverState::default()),
            latest,
        }
    }

    /// The last successfully decoded quiz, kept for the life of the resolver.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<QuizDefinition>> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.cached.clone())
    }

    /// Fetch, decode and cache the quiz.
    ///
    /// A transport failure on the remote source falls back to the local source
    /// once. Decode failures are never retried against the other source.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` / `QuizError::Network` when both sources
    /// fail, `QuizError::InvalidPayload` when the payload does not decode, and
    /// `QuizError::Cancelled` when a newer fetch superseded this one.
    pub async fn fetch_quiz(&self) -> Result<Arc<QuizDefinition>, QuizError> {
        let ticket = self.begin()?;
        let superseded = wait_until_superseded(self.latest.subscribe(), ticket);

        let bytes = tokio::select! {
            () = superseded => {
                tracing::debug!(ticket, "quiz fetch superseded");
                return Err(QuizError::Cancelled);
            }
            bytes = self.load_bytes() => bytes?,
        };

        let quiz = Arc::new(QuizDefinition::from_json(&bytes)?);

        let mut state = self.lock_state()?;
        if state.generation != ticket {
            tracing::warn!(ticket, "dropping stale quiz fetch result");
            return Err(QuizError::Cancelled);
        }
        state.cached = Some(Arc::clone(&quiz));
        tracing::debug!(version = quiz.version(), "quiz cached");
        Ok(quiz)
    }

    fn begin(&self) -> Result<u64, QuizError> {
        let mut state = self.lock_state()?;
        state.generation += 1;
        let ticket = state.generation;
        self.latest.send_replace(ticket);
        Ok(ticket)
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ResolverState>, QuizError> {
        self.state
            .lock()
            .map_err(|err| QuizError::Unknown(err.to_string()))
    }

    async fn load_bytes(&self) -> Result<Vec<u8>, QuizError> {
        match self.remote.fetch().await {
            Ok(bytes) => Ok(bytes),
            Err(remote_err) => {
                tracing::warn!(error = %remote_err, "remote quiz unavailable; using local quiz");
                self.local.load().map_err(|local_err| {
                    tracing::warn!(error = %local_err, "local quiz unavailable");
                    QuizError::from(local_err)
                })
            }
        }
    }
}

async fn wait_until_superseded(mut latest: watch::Receiver<u64>, ticket: u64) {
    while latest.changed().await.is_ok() {
        if *latest.borrow_and_update() != ticket {
            return;
        }
    }
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const QUIZ: &str = r##"{"version":7,"questions":[{"id":"q1","type":"color","navTitle":"n",
        "title":"t","options":[{"type":"color","id":"red","hex":"#f00"}]}]}"##;

    struct StaticRemote(Result<&'static str, ()>);

    #[async_trait]
    impl QuizRemoteSource for StaticRemote {
        async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
            self.0
                .map(|s| s.as_bytes().to_vec())
                .map_err(|()| SourceError::Transport("offline".into()))
        }
    }

    struct CountingLocal {
        payload: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl CountingLocal {
        fn new(payload: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                payload,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl QuizLocalSource for CountingLocal {
        fn load(&self) -> Result<Vec<u8>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payload
                .map(|s| s.as_bytes().to_vec())
                .ok_or(SourceError::NotFound)
        }
    }

    #[tokio::test]
    async fn remote_success_skips_local() {
        let local = CountingLocal::new(None);
        let resolver = QuizResolver::new(Arc::new(StaticRemote(Ok(QUIZ))), local.clone());

        let quiz = resolver.fetch_quiz().await.unwrap();
        assert_eq!(quiz.version(), 7);
        assert_eq!(local.calls.load(Ordering::SeqCst), 0);
        assert_eq!(resolver.cached().unwrap().version(), 7);
    }

    #[tokio::test]
    async fn remote_decode_error_is_not_retried_locally() {
        let local = CountingLocal::new(Some(QUIZ));
        let resolver = QuizResolver::new(Arc::new(StaticRemote(Ok("{\"nope\":1}"))), local.clone());

        let err = resolver.fetch_quiz().await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidPayload(_)));
        assert_eq!(local.calls.load(Ordering::SeqCst), 0);
        assert!(resolver.cached().is_none());
    }

    #[tokio::test]
    async fn local_decode_error_propagates() {
        let local = CountingLocal::new(Some("[]"));
        let resolver = QuizResolver::new(Arc::new(StaticRemote(Err(()))), local);

        let err = resolver.fetch_quiz().await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidPayload(_)));
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use services::{QuizError, QuizLocalSource, QuizRemoteSource, QuizResolver, SourceError};
use tokio::sync::Notify;

const REMOTE_QUIZ: &str = r#"{"version":2,"title":"Remote","questions":[{"id":"q1",
    "type":"checkbox","navTitle":"Goals","title":"Goals?","options":[
    {"type":"text","id":"a","title":"A"}]}]}"#;

const LOCAL_QUIZ: &str = r#"{"version":1,"title":"Bundled","questions":[{"id":"q1",
    "type":"grid","navTitle":"Style","title":"Style?","options":[
    {"type":"image","id":"boho","title":"Boho","image":"style_boho"}]}]}"#;

struct FailingRemote;

#[async_trait]
impl QuizRemoteSource for FailingRemote {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::Transport("connection refused".into()))
    }
}

struct FixedLocal(Option<&'static str>);

impl QuizLocalSource for FixedLocal {
    fn load(&self) -> Result<Vec<u8>, SourceError> {
        self.0
            .map(|payload| payload.as_bytes().to_vec())
            .ok_or(SourceError::NotFound)
    }
}

/// Hangs on its first call until cancelled; later calls answer immediately.
struct StallingRemote {
    calls: AtomicUsize,
    entered: Notify,
}

#[async_trait]
impl QuizRemoteSource for StallingRemote {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if call == 0 {
            std::future::pending::<()>().await;
        }
        Ok(REMOTE_QUIZ.as_bytes().to_vec())
    }
}

#[tokio::test]
async fn falls_back_to_local_when_remote_fails() {
    let resolver = QuizResolver::new(
        Arc::new(FailingRemote),
        Arc::new(FixedLocal(Some(LOCAL_QUIZ))),
    );

    let quiz = resolver.fetch_quiz().await.expect("local quiz");
    assert_eq!(quiz.title(), Some("Bundled"));
    assert_eq!(quiz.questions()[0].options()[0].asset(), Some("style_boho"));
    assert_eq!(resolver.cached().expect("cached"), quiz);
}

#[tokio::test]
async fn both_sources_failing_yields_not_found() {
    let resolver = QuizResolver::new(Arc::new(FailingRemote), Arc::new(FixedLocal(None)));

    let err = resolver.fetch_quiz().await.unwrap_err();
    assert!(matches!(err, QuizError::NotFound));
    assert!(resolver.cached().is_none());
}

#[tokio::test]
async fn new_fetch_cancels_the_one_in_flight() {
    let remote = Arc::new(StallingRemote {
        calls: AtomicUsize::new(0),
        entered: Notify::new(),
    });
    let resolver = Arc::new(QuizResolver::new(
        remote.clone(),
        Arc::new(FixedLocal(Some(LOCAL_QUIZ))),
    ));

    let first = tokio::spawn({
        let resolver = Arc::clone(&resolver);
        async move { resolver.fetch_quiz().await }
    });
    remote.entered.notified().await;

    let second = resolver.fetch_quiz().await.expect("second fetch");
    assert_eq!(second.title(), Some("Remote"));

    let first = first.await.expect("join");
    assert!(matches!(first, Err(QuizError::Cancelled)));
    assert_eq!(resolver.cached().expect("cached").title(), Some("Remote"));
}

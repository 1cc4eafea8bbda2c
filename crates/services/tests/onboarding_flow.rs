use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use quiz_core::FlowAction;
use quiz_core::model::{AnswerLists, OptionId, QuestionId};
use services::{
    DisabledRemoteSource, OnboardingEvent, OnboardingService, QuizLoad, QuizLocalSource,
    QuizResolver, SourceError,
};
use storage::ProgressStore;
use storage::progress::{ANSWERS_KEY, INDEX_KEY};
use storage::repository::{InMemoryStore, KeyValueStore};

const QUIZ: &str = r##"{"version":1,"questions":[
    {"id":"q1","type":"checkbox","navTitle":"Goals","title":"Goals?","options":[
        {"type":"text","id":"a","title":"A"},{"type":"text","id":"b","title":"B"}]},
    {"id":"q2","type":"color","navTitle":"Colors","title":"Colors?","options":[
        {"type":"color","id":"red","hex":"#FF0000"},{"type":"color","id":"blue","hex":"#0000FF"}]}]}"##;

/// Fails until `available` is flipped, like a bundle that appears on retry.
struct FlakyLocal {
    available: AtomicBool,
}

impl QuizLocalSource for FlakyLocal {
    fn load(&self) -> Result<Vec<u8>, SourceError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(QUIZ.as_bytes().to_vec())
        } else {
            Err(SourceError::NotFound)
        }
    }
}

fn onboarding(kv: &InMemoryStore, local: Arc<dyn QuizLocalSource>) -> OnboardingService {
    let resolver = Arc::new(QuizResolver::new(Arc::new(DisabledRemoteSource), local));
    OnboardingService::new(resolver, ProgressStore::new(Arc::new(kv.clone())))
}

fn available() -> Arc<FlakyLocal> {
    Arc::new(FlakyLocal {
        available: AtomicBool::new(true),
    })
}

fn toggle(id: &str) -> FlowAction {
    FlowAction::ToggleOption(OptionId::new(id))
}

#[tokio::test]
async fn completes_quiz_and_clears_progress() {
    let kv = InMemoryStore::new();
    let mut service = onboarding(&kv, available());

    let event = service.take_quiz().await;
    assert!(matches!(event, QuizLoad::Loaded(_)));
    assert!(!service.intro().is_loading);

    assert_eq!(service.dispatch(toggle("a")).await.unwrap(), None);
    assert_eq!(service.dispatch(FlowAction::Continue).await.unwrap(), None);
    assert_eq!(service.dispatch(toggle("red")).await.unwrap(), None);
    assert!(kv.get(ANSWERS_KEY).await.unwrap().is_some());

    let event = service.dispatch(FlowAction::Continue).await.unwrap();
    let mut expected = AnswerLists::new();
    expected.insert(QuestionId::new("q1"), vec![OptionId::new("a")]);
    expected.insert(QuestionId::new("q2"), vec![OptionId::new("red")]);
    assert_eq!(event, Some(OnboardingEvent::FlowFinished(expected)));

    assert!(service.flow().is_none());
    assert_eq!(kv.get(ANSWERS_KEY).await.unwrap(), None);
    assert_eq!(kv.get(INDEX_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn resumes_saved_progress_in_a_new_session() {
    let kv = InMemoryStore::new();
    {
        let mut first = onboarding(&kv, available());
        first.take_quiz().await;
        first.dispatch(toggle("b")).await.unwrap();
        first.dispatch(FlowAction::Continue).await.unwrap();
        first.dispatch(toggle("blue")).await.unwrap();
    }

    let mut second = onboarding(&kv, available());
    second.take_quiz().await;
    let flow = second.flow().expect("flow");
    assert_eq!(flow.index(), 1);
    assert!(flow.is_selected("blue"));
    assert!(flow.answers().is_selected("q1", "b"));
}

#[tokio::test]
async fn ignored_actions_do_not_write_progress() {
    let kv = InMemoryStore::new();
    let mut service = onboarding(&kv, available());
    service.take_quiz().await;

    assert_eq!(service.dispatch(FlowAction::Continue).await.unwrap(), None);
    assert_eq!(service.dispatch(FlowAction::Back).await.unwrap(), None);
    assert_eq!(kv.get(ANSWERS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn corrupt_progress_starts_fresh() {
    let kv = InMemoryStore::new();
    kv.set(ANSWERS_KEY, b"{broken").await.unwrap();

    let mut service = onboarding(&kv, available());
    let event = service.take_quiz().await;
    assert!(matches!(event, QuizLoad::Loaded(_)));
    assert_eq!(service.flow().expect("flow").index(), 0);
    assert_eq!(kv.get(ANSWERS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn load_failure_is_reported_and_retryable() {
    let kv = InMemoryStore::new();
    let local = Arc::new(FlakyLocal {
        available: AtomicBool::new(false),
    });
    let mut service = onboarding(&kv, local.clone());

    let event = service.take_quiz().await;
    assert!(matches!(event, QuizLoad::Failed(_)));
    assert!(matches!(
        OnboardingEvent::from(event),
        OnboardingEvent::QuizLoadFailed(_)
    ));
    assert!(service.intro().last_error.is_some());
    assert!(service.flow().is_none());
    assert_eq!(service.dispatch(FlowAction::Continue).await.unwrap(), None);

    local.available.store(true, Ordering::SeqCst);
    let event = service.take_quiz().await;
    assert!(matches!(event, QuizLoad::Loaded(_)));
    assert!(service.intro().last_error.is_none());
}

#[tokio::test]
async fn reset_discards_flow_and_progress() {
    let kv = InMemoryStore::new();
    let mut service = onboarding(&kv, available());
    service.take_quiz().await;
    service.dispatch(toggle("a")).await.unwrap();

    service.reset().await.unwrap();
    assert!(service.flow().is_none());
    assert_eq!(kv.get(ANSWERS_KEY).await.unwrap(), None);
}

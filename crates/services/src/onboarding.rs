use std::sync::Arc;

use quiz_core::model::{AnswerLists, QuizDefinition};
use quiz_core::{FlowAction, FlowOutcome, QuizFlow};
use storage::ProgressStore;

use crate::error::QuizError;
use crate::resolver::QuizResolver;

const DEFAULT_INTRO_TITLE: &str = "Online Personal Styling.\nOutfits for Every Woman.";

/// Presenter-facing state of the intro screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroState {
    pub title: String,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

impl Default for IntroState {
    fn default() -> Self {
        Self {
            title: DEFAULT_INTRO_TITLE.into(),
            is_loading: false,
            last_error: None,
        }
    }
}

/// Signals the onboarding layer hands to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingEvent {
    QuizLoaded(Arc<QuizDefinition>),
    QuizLoadFailed(String),
    FlowFinished(AnswerLists),
}

/// Result of entering the quiz from the intro screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizLoad {
    Loaded(Arc<QuizDefinition>),
    Failed(String),
}

impl From<QuizLoad> for OnboardingEvent {
    fn from(load: QuizLoad) -> Self {
        match load {
            QuizLoad::Loaded(quiz) => Self::QuizLoaded(quiz),
            QuizLoad::Failed(reason) => Self::QuizLoadFailed(reason),
        }
    }
}

/// Coordinates quiz loading, the live flow and progress persistence.
///
/// Progress is saved after every action that changes the flow and cleared
/// once the flow finishes.
pub struct OnboardingService {
    resolver: Arc<QuizResolver>,
    progress: ProgressStore,
    intro: IntroState,
    flow: Option<QuizFlow>,
}

impl OnboardingService {
    #[must_use]
    pub fn new(resolver: Arc<QuizResolver>, progress: ProgressStore) -> Self {
        Self {
            resolver,
            progress,
            intro: IntroState::default(),
            flow: None,
        }
    }

    #[must_use]
    pub fn intro(&self) -> &IntroState {
        &self.intro
    }

    #[must_use]
    pub fn flow(&self) -> Option<&QuizFlow> {
        self.flow.as_ref()
    }

    /// Fetch the quiz and enter the flow, resuming saved progress when present.
    ///
    /// Load failures are reported as `QuizLoad::Failed` and can be retried by
    /// calling this again.
    pub async fn take_quiz(&mut self) -> QuizLoad {
        self.intro.is_loading = true;
        self.intro.last_error = None;

        let result = self.resolver.fetch_quiz().await;
        self.intro.is_loading = false;

        let quiz = match result {
            Ok(quiz) => quiz,
            Err(err) => {
                tracing::warn!(error = %err, "quiz load failed");
                let message = err.to_string();
                self.intro.last_error = Some(message.clone());
                return QuizLoad::Failed(message);
            }
        };

        match self.start_flow(Arc::clone(&quiz)).await {
            Ok(flow) => {
                self.flow = Some(flow);
                QuizLoad::Loaded(quiz)
            }
            Err(err) => {
                let message = err.to_string();
                self.intro.last_error = Some(message.clone());
                QuizLoad::Failed(message)
            }
        }
    }

    async fn start_flow(&self, quiz: Arc<QuizDefinition>) -> Result<QuizFlow, QuizError> {
        let checkpoint = match self.progress.load().await {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable quiz progress");
                if let Err(clear_err) = self.progress.clear().await {
                    tracing::warn!(error = %clear_err, "failed to clear quiz progress");
                }
                None
            }
        };

        let flow = match checkpoint {
            Some(checkpoint) => {
                tracing::debug!(index = checkpoint.index, "resuming quiz progress");
                QuizFlow::resume(quiz, checkpoint)
            }
            None => QuizFlow::new(quiz),
        };
        flow.map_err(|err| QuizError::Unknown(err.to_string()))
    }

    /// Forward a user action to the live flow.
    ///
    /// Returns `Ok(None)` when no flow is active or nothing terminal happened.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if saving progress fails; the flow state has
    /// already advanced in that case.
    pub async fn dispatch(
        &mut self,
        action: FlowAction,
    ) -> Result<Option<OnboardingEvent>, QuizError> {
        let Some(flow) = self.flow.as_mut() else {
            return Ok(None);
        };

        match flow.apply(action) {
            FlowOutcome::Ignored => Ok(None),
            FlowOutcome::Updated => {
                self.save_progress().await?;
                Ok(None)
            }
            FlowOutcome::Finished(answers) => {
                self.flow = None;
                if let Err(err) = self.progress.clear().await {
                    tracing::warn!(error = %err, "failed to clear finished quiz progress");
                }
                Ok(Some(OnboardingEvent::FlowFinished(answers)))
            }
        }
    }

    /// Persist the live flow's position and answers.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the write fails.
    pub async fn save_progress(&self) -> Result<(), QuizError> {
        let Some(flow) = self.flow.as_ref() else {
            return Ok(());
        };
        let checkpoint = flow.checkpoint();
        self.progress
            .save(checkpoint.index, &checkpoint.answers)
            .await?;
        Ok(())
    }

    /// Drop any live flow and stored progress.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if clearing fails.
    pub async fn reset(&mut self) -> Result<(), QuizError> {
        self.flow = None;
        self.progress.clear().await?;
        Ok(())
    }
}

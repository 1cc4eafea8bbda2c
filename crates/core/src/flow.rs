use std::sync::Arc;

use thiserror::Error;

use crate::model::{
    AnswerLists, AnswerSet, OptionId, ProgressCheckpoint, Question, QuestionId, QuizDefinition,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlowError {
    #[error("quiz has no questions to present")]
    EmptyQuiz,
}

/// User intents understood by the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    ToggleOption(OptionId),
    Continue,
    Back,
}

/// Result of applying a `FlowAction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Position or answers changed.
    Updated,
    /// The action was not applicable; state is unchanged.
    Ignored,
    /// The last question was confirmed. The owner should discard the flow.
    Finished(AnswerLists),
}

/// Position within the quiz, useful for a progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowProgress {
    /// 1-based number of the current question.
    pub position: usize,
    pub total: usize,
}

//
// ─── FLOW ──────────────────────────────────────────────────────────────────────
//

/// Live traversal of a quiz.
///
/// `index` always stays within `0..question_count`. Invalid transitions are
/// reported as `FlowOutcome::Ignored` rather than errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizFlow {
    quiz: Arc<QuizDefinition>,
    index: usize,
    answers: AnswerSet,
}

impl QuizFlow {
    /// Start at the first question with no answers.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::EmptyQuiz` if the quiz has no questions.
    pub fn new(quiz: Arc<QuizDefinition>) -> Result<Self, FlowError> {
        if quiz.questions().is_empty() {
            return Err(FlowError::EmptyQuiz);
        }
        Ok(Self {
            quiz,
            index: 0,
            answers: AnswerSet::new(),
        })
    }

    /// Resume from a stored checkpoint.
    ///
    /// The index is clamped to the last question and answers referring to
    /// questions or options the quiz no longer offers are dropped.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::EmptyQuiz` if the quiz has no questions.
    pub fn resume(
        quiz: Arc<QuizDefinition>,
        checkpoint: ProgressCheckpoint,
    ) -> Result<Self, FlowError> {
        let mut flow = Self::new(quiz)?;
        flow.index = checkpoint.index.min(flow.question_count() - 1);

        let answers: AnswerLists = checkpoint
            .answers
            .into_iter()
            .filter_map(|(question_id, options)| {
                let question = flow.quiz.question(question_id.as_str())?;
                let options = options
                    .into_iter()
                    .filter(|option| question.has_option(option.as_str()))
                    .collect::<Vec<_>>();
                Some((question_id, options))
            })
            .collect();
        flow.answers = AnswerSet::from(answers);
        Ok(flow)
    }

    #[must_use]
    pub fn quiz(&self) -> &Arc<QuizDefinition> {
        &self.quiz
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.quiz.questions().len()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.quiz.questions()[self.index]
    }

    fn current_id(&self) -> &QuestionId {
        self.current_question().id()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.question_count()
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    /// The only enforced rule: the current question has at least one selection.
    ///
    /// Declared `min`/`max` bounds are not consulted.
    #[must_use]
    pub fn is_current_valid(&self) -> bool {
        self.answers.has_selection(self.current_id().as_str())
    }

    #[must_use]
    pub fn is_selected(&self, option: &str) -> bool {
        self.answers.is_selected(self.current_id().as_str(), option)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    #[must_use]
    pub fn progress(&self) -> FlowProgress {
        FlowProgress {
            position: self.index + 1,
            total: self.question_count(),
        }
    }

    /// Snapshot for persistence.
    #[must_use]
    pub fn checkpoint(&self) -> ProgressCheckpoint {
        ProgressCheckpoint::new(self.index, self.answers.to_lists())
    }

    /// Apply a user action to the flow.
    pub fn apply(&mut self, action: FlowAction) -> FlowOutcome {
        match action {
            FlowAction::ToggleOption(option) => self.toggle(&option),
            FlowAction::Continue => self.advance(),
            FlowAction::Back => self.back(),
        }
    }

    fn toggle(&mut self, option: &OptionId) -> FlowOutcome {
        let question = &self.quiz.questions()[self.index];
        if !question.has_option(option.as_str()) {
            return FlowOutcome::Ignored;
        }
        let question_id = question.id().clone();
        self.answers.toggle(&question_id, option);
        FlowOutcome::Updated
    }

    fn advance(&mut self) -> FlowOutcome {
        if !self.is_current_valid() {
            return FlowOutcome::Ignored;
        }
        if self.is_last() {
            return FlowOutcome::Finished(self.answers.to_lists());
        }
        self.index += 1;
        FlowOutcome::Updated
    }

    fn back(&mut self) -> FlowOutcome {
        if !self.can_go_back() {
            return FlowOutcome::Ignored;
        }
        self.index -= 1;
        FlowOutcome::Updated
    }
}

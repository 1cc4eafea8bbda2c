use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Raised when a quiz payload cannot be decoded, encoded, or fails validation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PayloadError {
    #[error("malformed quiz payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("quiz has no questions")]
    NoQuestions,

    #[error("duplicate question id `{0}`")]
    DuplicateQuestion(QuestionId),

    #[error("duplicate option id `{option}` in question `{question}`")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Versioned, ordered questionnaire. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    questions: Vec<Question>,
}

impl QuizDefinition {
    #[must_use]
    pub fn new(version: i64, title: Option<String>, questions: Vec<Question>) -> Self {
        Self {
            version,
            title,
            questions,
        }
    }

    /// Decode and validate a quiz from its JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::Malformed` for missing fields, mismatched types or an
    /// unknown `type` discriminator, and the validation variants for an empty
    /// quiz or duplicated ids.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PayloadError> {
        let quiz: Self = serde_json::from_slice(bytes)?;
        quiz.validate()?;
        Ok(quiz)
    }

    /// Encode into the JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::Malformed` if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Check structural invariants that the wire format cannot express.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` when there are no questions or ids repeat.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.questions.is_empty() {
            return Err(PayloadError::NoQuestions);
        }

        let mut question_ids = HashSet::with_capacity(self.questions.len());
        for question in &self.questions {
            if !question_ids.insert(question.id()) {
                return Err(PayloadError::DuplicateQuestion(question.id().clone()));
            }

            let mut option_ids = HashSet::with_capacity(question.options.len());
            for option in &question.options {
                if !option_ids.insert(option.id()) {
                    return Err(PayloadError::DuplicateOption {
                        question: question.id().clone(),
                        option: option.id().clone(),
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id().as_str() == id)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Presentation family of a question. Wire names are `checkbox`, `grid` and `color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "checkbox")]
    Checklist,
    #[serde(rename = "grid")]
    Grid,
    #[serde(rename = "color")]
    ColorSwatch,
}

impl QuestionKind {
    /// The option shape a presenter of this question expects.
    #[must_use]
    pub fn option_kind(self) -> OptionKind {
        match self {
            QuestionKind::Checklist => OptionKind::Text,
            QuestionKind::Grid => OptionKind::Image,
            QuestionKind::ColorSwatch => OptionKind::Color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "type")]
    kind: QuestionKind,
    nav_title: String,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subtitle: Option<String>,
    /// Declared selection bounds. Carried as hints only; never enforced.
    #[serde(rename = "min", default, skip_serializing_if = "Option::is_none")]
    min_select: Option<i64>,
    #[serde(rename = "max", default, skip_serializing_if = "Option::is_none")]
    max_select: Option<i64>,
    options: Vec<QuizOption>,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        nav_title: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            nav_title: nav_title.into(),
            title: title.into(),
            subtitle: None,
            min_select: None,
            max_select: None,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_selection_bounds(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_select = min;
        self.max_select = max;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<QuizOption>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn nav_title(&self) -> &str {
        &self.nav_title
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    #[must_use]
    pub fn min_select(&self) -> Option<i64> {
        self.min_select
    }

    #[must_use]
    pub fn max_select(&self) -> Option<i64> {
        self.max_select
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn has_option(&self, id: &str) -> bool {
        self.options.iter().any(|o| o.id().as_str() == id)
    }

    /// Options whose shape fits this question's kind; others are skipped by presenters.
    pub fn options_matching_kind(&self) -> impl Iterator<Item = &QuizOption> {
        let expected = self.kind.option_kind();
        self.options.iter().filter(move |o| o.kind() == expected)
    }
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Text,
    Image,
    Color,
}

/// A selectable answer. The tag decides which extra fields exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuizOption {
    Text {
        id: OptionId,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
    },
    Image {
        id: OptionId,
        title: String,
        #[serde(rename = "image")]
        asset: String,
    },
    Color {
        id: OptionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(rename = "hex")]
        color_hex: String,
    },
}

impl QuizOption {
    #[must_use]
    pub fn id(&self) -> &OptionId {
        match self {
            QuizOption::Text { id, .. }
            | QuizOption::Image { id, .. }
            | QuizOption::Color { id, .. } => id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> OptionKind {
        match self {
            QuizOption::Text { .. } => OptionKind::Text,
            QuizOption::Image { .. } => OptionKind::Image,
            QuizOption::Color { .. } => OptionKind::Color,
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            QuizOption::Text { title, .. } | QuizOption::Image { title, .. } => Some(title),
            QuizOption::Color { title, .. } => title.as_deref(),
        }
    }

    #[must_use]
    pub fn subtitle(&self) -> Option<&str> {
        match self {
            QuizOption::Text { subtitle, .. } => subtitle.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn asset(&self) -> Option<&str> {
        match self {
            QuizOption::Image { asset, .. } => Some(asset),
            _ => None,
        }
    }

    #[must_use]
    pub fn color_hex(&self) -> Option<&str> {
        match self {
            QuizOption::Color { color_hex, .. } => Some(color_hex),
            _ => None,
        }
    }
}

mod answers;
mod checkpoint;
mod ids;
mod quiz;

pub use answers::{AnswerLists, AnswerSet};
pub use checkpoint::ProgressCheckpoint;
pub use ids::{OptionId, QuestionId};
pub use quiz::{OptionKind, PayloadError, Question, QuestionKind, QuizDefinition, QuizOption};

use crate::model::answers::AnswerLists;

/// Persisted snapshot of a flow: position plus answers, enough to resume later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressCheckpoint {
    pub index: usize,
    pub answers: AnswerLists,
}

impl ProgressCheckpoint {
    #[must_use]
    pub fn new(index: usize, answers: AnswerLists) -> Self {
        Self { index, answers }
    }
}

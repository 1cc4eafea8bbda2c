use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::{OptionId, QuestionId};

/// Answers in their persisted and emitted shape: question id -> selected option ids.
///
/// Element order follows set iteration order and carries no meaning.
pub type AnswerLists = BTreeMap<QuestionId, Vec<OptionId>>;

/// Per-question multi-select answers.
///
/// Questions whose selection becomes empty are dropped, so every stored set is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    selections: BTreeMap<QuestionId, BTreeSet<OptionId>>,
}

impl AnswerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the selection of `option` for `question`. Returns `true` if it is now selected.
    pub fn toggle(&mut self, question: &QuestionId, option: &OptionId) -> bool {
        let selected = self.selections.entry(question.clone()).or_default();
        let now_selected = if selected.remove(option) {
            false
        } else {
            selected.insert(option.clone());
            true
        };
        if selected.is_empty() {
            self.selections.remove(question);
        }
        now_selected
    }

    #[must_use]
    pub fn is_selected(&self, question: &str, option: &str) -> bool {
        self.selections
            .get(question)
            .is_some_and(|set| set.contains(option))
    }

    #[must_use]
    pub fn has_selection(&self, question: &str) -> bool {
        self.selections
            .get(question)
            .is_some_and(|set| !set.is_empty())
    }

    /// Selected option ids for a question, in set order.
    pub fn selected(&self, question: &str) -> impl Iterator<Item = &OptionId> {
        self.selections.get(question).into_iter().flatten()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    #[must_use]
    pub fn to_lists(&self) -> AnswerLists {
        self.selections
            .iter()
            .map(|(question, set)| (question.clone(), set.iter().cloned().collect()))
            .collect()
    }
}

impl From<AnswerLists> for AnswerSet {
    fn from(lists: AnswerLists) -> Self {
        let selections = lists
            .into_iter()
            .map(|(question, options)| (question, options.into_iter().collect::<BTreeSet<_>>()))
            .filter(|(_, set)| !set.is_empty())
            .collect();
        Self { selections }
    }
}

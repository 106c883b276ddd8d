use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::{OptionId, QuestionId};

/// Selected option per answered question.
///
/// At most one option per question; inserting again replaces the prior choice.
/// Membership checks against the question catalog happen in the session layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<QuestionId, OptionId>);

impl AnswerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option` for `question`, returning the replaced selection.
    pub fn insert(&mut self, question: QuestionId, option: OptionId) -> Option<OptionId> {
        self.0.insert(question, option)
    }

    #[must_use]
    pub fn get(&self, question: &QuestionId) -> Option<&OptionId> {
        self.0.get(question)
    }

    #[must_use]
    pub fn contains(&self, question: &QuestionId) -> bool {
        self.0.contains_key(question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &OptionId)> {
        self.0.iter()
    }
}

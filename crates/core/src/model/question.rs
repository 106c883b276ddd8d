use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("maturity score must be between 1 and 4, got {0}")]
    InvalidScore(u8),

    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {question} lists option {option} more than once")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("question prompt cannot be empty")]
    EmptyPrompt,
}

//
// ─── MATURITY SCORE ────────────────────────────────────────────────────────────
//

/// Maturity level attached to an option (1 = ad hoc, 4 = optimised).
///
/// Carried for reporting; navigation never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MaturityScore(u8);

impl MaturityScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    /// # Errors
    ///
    /// Returns `QuestionError::InvalidScore` outside `1..=4`.
    pub fn new(value: u8) -> Result<Self, QuestionError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(QuestionError::InvalidScore(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MaturityScore {
    type Error = QuestionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MaturityScore> for u8 {
    fn from(score: MaturityScore) -> Self {
        score.0
    }
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
    pub score: MaturityScore,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>, score: MaturityScore) -> Self {
        Self {
            id,
            text: text.into(),
            score,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Authored survey question.
///
/// `category` and `topic` are display labels only. `step_index` is the 0-based
/// step the question was written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    category: String,
    topic: String,
    #[serde(rename = "question")]
    prompt: String,
    #[serde(rename = "helptext", default)]
    help_text: String,
    options: Vec<AnswerOption>,
    step_index: usize,
}

/// Input used to build a validated `Question`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub category: String,
    pub topic: String,
    pub prompt: String,
    pub help_text: String,
    pub options: Vec<AnswerOption>,
    pub step_index: usize,
}

impl Question {
    /// Builds a question from a draft.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are no options,
    /// or option ids repeat.
    pub fn new(id: QuestionId, draft: QuestionDraft) -> Result<Self, QuestionError> {
        let question = Self {
            id,
            category: draft.category,
            topic: draft.topic,
            prompt: draft.prompt,
            help_text: draft.help_text,
            options: draft.options,
            step_index: draft.step_index,
        };
        question.validate()?;
        Ok(question)
    }

    /// Re-checks invariants, used after deserializing authored content.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Question::new`].
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions(self.id.clone()));
        }
        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if !seen.insert(&option.id) {
                return Err(QuestionError::DuplicateOption {
                    question: self.id.clone(),
                    option: option.id.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|option| &option.id == id)
    }

    #[must_use]
    pub fn has_option(&self, id: &OptionId) -> bool {
        self.option(id).is_some()
    }
}

//! Shared error types for the services crate.

use thiserror::Error;

use assess_core::model::{DefinitionError, OptionId, QuestionId, StepNumber};
use storage::StorageError;

/// Errors emitted by the assessment session and its orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("cannot move from step {from} to step {to}")]
    InvalidTransition { from: StepNumber, to: StepNumber },
    #[error("unknown question: {0}")]
    UnknownQuestion(QuestionId),
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
    #[error("step {0} has no question")]
    NoQuestionOnStep(StepNumber),
    #[error("submit is only available on the final step ({current} of {last})")]
    NotAtFinalStep { current: StepNumber, last: StepNumber },
    #[error("step {0} still needs an answer")]
    Blocked(StepNumber),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AssessmentError {
    /// True for errors caused by stale or malformed presentation input.
    #[must_use]
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownQuestion(_)
                | Self::UnknownOption { .. }
                | Self::NoQuestionOnStep(_)
                | Self::InvalidTransition { .. }
        )
    }
}

/// Errors emitted by the session gate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("a login attempt is already in progress")]
    LoginInProgress,
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

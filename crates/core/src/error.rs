use thiserror::Error;

use crate::model::{DefinitionError, ParseIdError, QuestionError};

/// Umbrella error for callers that do not care which domain check failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

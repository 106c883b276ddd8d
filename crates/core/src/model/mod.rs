mod access;
mod answers;
mod ids;
mod question;
mod step;

pub use access::{resolve, Route, RouteDecision, SessionFlag, SessionStatus};
pub use answers::AnswerSet;
pub use ids::{AttemptId, OptionId, ParseIdError, QuestionId, StepNumber};
pub use question::{AnswerOption, MaturityScore, Question, QuestionDraft, QuestionError};
pub use step::{AssessmentDefinition, DefinitionError, QuestionBinding, Step};

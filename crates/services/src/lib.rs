#![forbid(unsafe_code)]

pub mod assessment;
pub mod auth;
pub mod error;

pub use assess_core::Clock;

pub use error::{AssessmentError, AuthError};

pub use assessment::{
    AssessmentIntent, AssessmentProgress, AssessmentService, AssessmentSession,
    AssessmentSubmission, AssessmentView, IntentOutcome, NextOutcome,
};
pub use auth::{
    CredentialValidator, Credentials, LoginOutcome, SessionGate, StaticCredentialValidator,
};

mod controller;
mod progress;
mod view;
mod workflow;

// Public API of the assessment subsystem.
pub use crate::error::AssessmentError;
pub use controller::{AssessmentSession, AssessmentSubmission, NextOutcome};
pub use progress::AssessmentProgress;
pub use view::{AssessmentIntent, AssessmentView, IntentOutcome};
pub use workflow::AssessmentService;

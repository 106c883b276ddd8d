use std::sync::Arc;

use assess_core::model::{AssessmentDefinition, QuestionBinding};
use storage::{BuiltinCatalog, QuestionRepository, CIS_STEP_TITLES};

use super::controller::{AssessmentSession, AssessmentSubmission};
use crate::Clock;
use crate::error::AssessmentError;

/// Orchestrates loading content and starting or submitting attempts.
#[derive(Clone)]
pub struct AssessmentService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    titles: Vec<String>,
    binding: QuestionBinding,
}

impl AssessmentService {
    /// Service over `questions`, using the CIS stepper titles and `QuestionBinding::Reference`.
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionRepository>) -> Self {
        Self {
            clock,
            questions,
            titles: CIS_STEP_TITLES.iter().map(|t| (*t).to_owned()).collect(),
            binding: QuestionBinding::default(),
        }
    }

    /// Service over the built-in CIS catalog.
    #[must_use]
    pub fn builtin(clock: Clock) -> Self {
        Self::new(clock, Arc::new(BuiltinCatalog))
    }

    #[must_use]
    pub fn with_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.titles = titles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_binding(mut self, binding: QuestionBinding) -> Self {
        self.binding = binding;
        self
    }

    #[must_use]
    pub fn binding(&self) -> QuestionBinding {
        self.binding
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Load questions and build the step list.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Storage` if the repository fails, or
    /// `AssessmentError::Definition` if content and titles do not fit together.
    pub async fn load_definition(&self) -> Result<Arc<AssessmentDefinition>, AssessmentError> {
        let questions = self.questions.list_questions().await?;
        let definition =
            AssessmentDefinition::new(self.titles.iter().cloned(), questions, self.binding)?;
        Ok(Arc::new(definition))
    }

    /// Start a fresh attempt on step 1.
    ///
    /// # Errors
    ///
    /// Same as [`load_definition`](Self::load_definition).
    pub async fn start(&self) -> Result<AssessmentSession, AssessmentError> {
        let definition = self.load_definition().await?;
        let session = AssessmentSession::new(definition, self.clock.now());
        tracing::info!(
            attempt = %session.attempt_id(),
            steps = session.total_steps(),
            binding = ?self.binding,
            "assessment started"
        );
        Ok(session)
    }

    /// Submit from the final step, stamped with the service clock.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NotAtFinalStep` or `AssessmentError::Blocked`.
    pub fn submit(&self, session: &AssessmentSession) -> Result<AssessmentSubmission, AssessmentError> {
        session.submit(self.clock.now())
    }
}

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use assess_core::model::{
    AnswerSet, AssessmentDefinition, AttemptId, OptionId, Question, QuestionId, Step, StepNumber,
};

use super::progress::AssessmentProgress;
use crate::error::AssessmentError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of asking the stepper to move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOutcome {
    Advanced(StepNumber),
    /// The current step's question is unanswered.
    Blocked,
    /// Already on the last step; `submit` is the only forward action.
    AtFinalStep,
}

/// Snapshot handed to the results page when the user submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentSubmission {
    pub attempt_id: AttemptId,
    pub answers: AnswerSet,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One assessment attempt: the current step and the answers given so far.
///
/// Starts at step 1. Forward movement is sequential and gated by
/// [`is_next_allowed`](Self::is_next_allowed); backward movement is free.
pub struct AssessmentSession {
    attempt_id: AttemptId,
    definition: Arc<AssessmentDefinition>,
    current: StepNumber,
    answers: AnswerSet,
    started_at: DateTime<Utc>,
}

impl AssessmentSession {
    /// `started_at` should come from the services layer clock.
    #[must_use]
    pub fn new(definition: Arc<AssessmentDefinition>, started_at: DateTime<Utc>) -> Self {
        Self {
            attempt_id: AttemptId::generate(),
            definition,
            current: StepNumber::FIRST,
            answers: AnswerSet::new(),
            started_at,
        }
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn definition(&self) -> &AssessmentDefinition {
        &self.definition
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn current_step(&self) -> StepNumber {
        self.current
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.definition.len()
    }

    #[must_use]
    pub fn last_step(&self) -> StepNumber {
        self.definition.last_step()
    }

    #[must_use]
    pub fn is_final_step(&self) -> bool {
        self.current == self.last_step()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    #[must_use]
    pub fn step(&self) -> Option<&Step> {
        self.definition.step(self.current)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.definition.question_for_step(self.current)
    }

    /// Option chosen for the question shown on the current step.
    #[must_use]
    pub fn selected_for_current(&self) -> Option<&OptionId> {
        self.current_question()
            .and_then(|question| self.answers.get(question.id()))
    }

    /// Steps the user may jump back to (`1..=current`).
    pub fn reachable_steps(&self) -> impl Iterator<Item = &Step> {
        self.definition.steps().iter().take(self.current.index() + 1)
    }

    #[must_use]
    pub fn is_reachable(&self, step: StepNumber) -> bool {
        step <= self.current && self.definition.contains(step)
    }

    /// True unless the current step shows a question that has not been answered.
    #[must_use]
    pub fn is_next_allowed(&self) -> bool {
        self.current_question()
            .is_none_or(|question| self.answers.contains(question.id()))
    }

    /// Whether `go_next` would advance right now.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        !self.is_final_step() && self.is_next_allowed()
    }

    /// Whether `submit` would succeed right now.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.is_final_step() && self.is_next_allowed()
    }

    /// `current / N`, in `(0, 1]`.
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        f64::from(self.current.value()) / self.total_steps() as f64
    }

    #[must_use]
    pub fn progress(&self) -> AssessmentProgress {
        AssessmentProgress {
            current: self.current,
            total: self.total_steps(),
            fraction: self.progress_fraction(),
            answered: self.answers.len(),
        }
    }

    pub fn go_next(&mut self) -> NextOutcome {
        if self.is_final_step() {
            return NextOutcome::AtFinalStep;
        }
        if !self.is_next_allowed() {
            tracing::debug!(step = %self.current, "next blocked by unanswered question");
            return NextOutcome::Blocked;
        }
        self.current = self.current.next();
        tracing::debug!(step = %self.current, "advanced");
        NextOutcome::Advanced(self.current)
    }

    /// Step back once. Returns `false` on step 1.
    pub fn go_prev(&mut self) -> bool {
        match self.current.prev() {
            Some(prev) => {
                self.current = prev;
                tracing::debug!(step = %self.current, "stepped back");
                true
            }
            None => false,
        }
    }

    /// Jump to an already reached step.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::InvalidTransition` if `step` is ahead of the
    /// current step or outside the assessment; the session is left unchanged.
    pub fn jump_to(&mut self, step: StepNumber) -> Result<StepNumber, AssessmentError> {
        if !self.is_reachable(step) {
            return Err(AssessmentError::InvalidTransition {
                from: self.current,
                to: step,
            });
        }
        self.current = step;
        tracing::debug!(step = %self.current, "jumped");
        Ok(self.current)
    }

    /// Record (or replace) the selected option for a question.
    ///
    /// Returns the previously selected option, if any.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::UnknownQuestion` if the question is not part of
    /// this assessment, or `AssessmentError::UnknownOption` if the option
    /// belongs to another question.
    pub fn set_answer(
        &mut self,
        question: &QuestionId,
        option: &OptionId,
    ) -> Result<Option<OptionId>, AssessmentError> {
        let Some(found) = self.definition.question(question) else {
            return Err(AssessmentError::UnknownQuestion(question.clone()));
        };
        if !found.has_option(option) {
            return Err(AssessmentError::UnknownOption {
                question: question.clone(),
                option: option.clone(),
            });
        }
        let previous = self.answers.insert(question.clone(), option.clone());
        tracing::debug!(question = %question, option = %option, "answer recorded");
        Ok(previous)
    }

    /// Answer the question shown on the current step.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NoQuestionOnStep` if the step has no question,
    /// or `AssessmentError::UnknownOption` for a foreign option.
    pub fn answer_current(&mut self, option: &OptionId) -> Result<Option<OptionId>, AssessmentError> {
        let Some(question) = self.current_question().map(|q| q.id().clone()) else {
            return Err(AssessmentError::NoQuestionOnStep(self.current));
        };
        self.set_answer(&question, option)
    }

    /// Finish the attempt from the final step.
    ///
    /// The session itself is not modified; callers drop it after navigating away.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NotAtFinalStep` before the last step and
    /// `AssessmentError::Blocked` if its question is unanswered.
    pub fn submit(&self, submitted_at: DateTime<Utc>) -> Result<AssessmentSubmission, AssessmentError> {
        if !self.is_final_step() {
            return Err(AssessmentError::NotAtFinalStep {
                current: self.current,
                last: self.last_step(),
            });
        }
        if !self.is_next_allowed() {
            return Err(AssessmentError::Blocked(self.current));
        }
        tracing::info!(
            attempt = %self.attempt_id,
            answers = self.answers.len(),
            "assessment submitted"
        );
        Ok(AssessmentSubmission {
            attempt_id: self.attempt_id,
            answers: self.answers.clone(),
            started_at: self.started_at,
            submitted_at,
        })
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("attempt_id", &self.attempt_id)
            .field("steps", &self.definition.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::QuestionBinding;
    use assess_core::time::fixed_now;
    use storage::CIS_STEP_TITLES;
    use storage::catalog::cis_questions;

    fn session_with(
        titles: &[&str],
        questions: Vec<Question>,
        binding: QuestionBinding,
    ) -> AssessmentSession {
        let definition =
            AssessmentDefinition::new(titles.iter().copied(), questions, binding).unwrap();
        AssessmentSession::new(Arc::new(definition), fixed_now())
    }

    fn session() -> AssessmentSession {
        session_with(&CIS_STEP_TITLES, cis_questions().unwrap(), QuestionBinding::Reference)
    }

    fn q(id: &str) -> QuestionId {
        QuestionId::new(id).unwrap()
    }

    fn o(id: &str) -> OptionId {
        OptionId::new(id).unwrap()
    }

    fn step(n: u32) -> StepNumber {
        StepNumber::new(n).unwrap()
    }

    #[test]
    fn starts_on_first_step_with_gate_closed() {
        let session = session();
        assert_eq!(session.current_step(), step(1));
        assert_eq!(session.total_steps(), 20);
        assert!(!session.is_next_allowed());
        assert_eq!(session.current_question().unwrap().id(), &q("q1"));
    }

    #[test]
    fn prev_on_first_step_is_noop() {
        let mut session = session();
        assert!(!session.go_prev());
        assert_eq!(session.current_step(), step(1));
    }

    #[test]
    fn next_is_blocked_until_answered() {
        let mut session = session();
        assert_eq!(session.go_next(), NextOutcome::Blocked);
        assert_eq!(session.current_step(), step(1));

        session.set_answer(&q("q1"), &o("q1-opt2")).unwrap();
        assert!(session.is_next_allowed());
        assert_eq!(session.go_next(), NextOutcome::Advanced(step(2)));
    }

    #[test]
    fn jump_forward_is_rejected_without_side_effects() {
        let mut session = session();
        session.set_answer(&q("q1"), &o("q1-opt1")).unwrap();
        session.go_next();

        let err = session.jump_to(step(5)).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidTransition { .. }));
        assert_eq!(session.current_step(), step(2));

        assert_eq!(session.jump_to(step(1)).unwrap(), step(1));
        assert_eq!(session.jump_to(step(1)).unwrap(), step(1));
    }

    #[test]
    fn reanswering_overwrites() {
        let mut session = session();
        session.set_answer(&q("q1"), &o("q1-opt1")).unwrap();
        let previous = session.set_answer(&q("q1"), &o("q1-opt4")).unwrap();
        assert_eq!(previous, Some(o("q1-opt1")));
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.selected_for_current(), Some(&o("q1-opt4")));
    }

    #[test]
    fn unknown_question_and_option_are_rejected() {
        let mut session = session();
        let err = session.set_answer(&q("q99"), &o("q1-opt1")).unwrap_err();
        assert!(matches!(err, AssessmentError::UnknownQuestion(_)));

        let err = session.set_answer(&q("q1"), &o("q2-opt1")).unwrap_err();
        assert!(matches!(err, AssessmentError::UnknownOption { .. }));
        assert!(err.is_programmer_error());
        assert!(session.answers().is_empty());
    }

    #[test]
    fn progress_is_current_over_total() {
        let mut session = session();
        assert!((session.progress_fraction() - 0.05).abs() < f64::EPSILON);
        session.set_answer(&q("q1"), &o("q1-opt1")).unwrap();
        session.go_next();
        let progress = session.progress();
        assert_eq!(progress.current, step(2));
        assert!((progress.fraction - 0.1).abs() < f64::EPSILON);
        assert_eq!(progress.answered, 1);
    }

    #[test]
    fn single_step_assessment_submits_immediately() {
        let mut session = session_with(&["Only"], Vec::new(), QuestionBinding::Unbound);
        assert!(session.current_question().is_none());
        assert!(matches!(
            session.answer_current(&o("q1-opt1")),
            Err(AssessmentError::NoQuestionOnStep(_))
        ));
        assert_eq!(session.go_next(), NextOutcome::AtFinalStep);
        assert!(!session.go_prev());
        assert!((session.progress_fraction() - 1.0).abs() < f64::EPSILON);
        let submission = session.submit(fixed_now()).unwrap();
        assert!(submission.answers.is_empty());
    }

    #[test]
    fn submit_before_final_step_fails() {
        let session = session();
        let err = session.submit(fixed_now()).unwrap_err();
        assert!(matches!(err, AssessmentError::NotAtFinalStep { .. }));
    }

    #[test]
    fn reachable_steps_track_current() {
        let mut session = session();
        session.set_answer(&q("q1"), &o("q1-opt1")).unwrap();
        session.go_next();
        let reachable: Vec<u32> = session.reachable_steps().map(|s| s.number().value()).collect();
        assert_eq!(reachable, vec![1, 2]);
        assert!(!session.is_reachable(step(3)));
        assert!(!session.is_reachable(step(21)));
    }
}

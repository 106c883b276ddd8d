use chrono::{DateTime, Utc};

use assess_core::model::{OptionId, Question, QuestionId, StepNumber};

use super::controller::{AssessmentSession, AssessmentSubmission, NextOutcome};
use crate::error::AssessmentError;

/// Everything the presentation layer needs to render the stepper.
///
/// Controls should be enabled from `next_allowed` / `submit_allowed` only,
/// never from their own copy of the gating rule.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentView<'a> {
    pub current_step: StepNumber,
    pub total_steps: usize,
    pub step_title: &'a str,
    pub progress_fraction: f64,
    pub question: Option<&'a Question>,
    pub selected: Option<&'a OptionId>,
    pub next_allowed: bool,
    pub submit_allowed: bool,
    pub is_final_step: bool,
}

/// User intents forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssessmentIntent {
    Next,
    Prev,
    Jump(StepNumber),
    Answer {
        question: QuestionId,
        option: OptionId,
    },
    Submit,
}

/// What happened after dispatching an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Moved(StepNumber),
    Unchanged,
    /// Forward movement refused until the current question is answered.
    Blocked,
    /// `Next` on the last step; the caller should offer `Submit`.
    AtFinalStep,
    Answered,
    Submitted(AssessmentSubmission),
    /// Stale or malformed input; logged and dropped.
    Ignored,
}

impl AssessmentSession {
    #[must_use]
    pub fn view(&self) -> AssessmentView<'_> {
        AssessmentView {
            current_step: self.current_step(),
            total_steps: self.total_steps(),
            step_title: self.step().map_or("", |step| step.title()),
            progress_fraction: self.progress_fraction(),
            question: self.current_question(),
            selected: self.selected_for_current(),
            next_allowed: self.can_advance(),
            submit_allowed: self.can_submit(),
            is_final_step: self.is_final_step(),
        }
    }

    /// Apply one intent. Never fails: malformed input is logged and ignored.
    ///
    /// `now` stamps the submission when `intent` is `Submit`.
    pub fn dispatch(&mut self, intent: AssessmentIntent, now: DateTime<Utc>) -> IntentOutcome {
        match intent {
            AssessmentIntent::Next => match self.go_next() {
                NextOutcome::Advanced(step) => IntentOutcome::Moved(step),
                NextOutcome::Blocked => IntentOutcome::Blocked,
                NextOutcome::AtFinalStep => IntentOutcome::AtFinalStep,
            },
            AssessmentIntent::Prev => {
                if self.go_prev() {
                    IntentOutcome::Moved(self.current_step())
                } else {
                    IntentOutcome::Unchanged
                }
            }
            AssessmentIntent::Jump(step) => match self.jump_to(step) {
                Ok(step) => IntentOutcome::Moved(step),
                Err(err) => ignore(&err),
            },
            AssessmentIntent::Answer { question, option } => {
                match self.set_answer(&question, &option) {
                    Ok(_) => IntentOutcome::Answered,
                    Err(err) => ignore(&err),
                }
            }
            AssessmentIntent::Submit => match self.submit(now) {
                Ok(submission) => IntentOutcome::Submitted(submission),
                Err(AssessmentError::Blocked(_)) => IntentOutcome::Blocked,
                Err(err) => ignore(&err),
            },
        }
    }
}

fn ignore(err: &AssessmentError) -> IntentOutcome {
    tracing::warn!(error = %err, "ignoring assessment intent");
    IntentOutcome::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{AssessmentDefinition, QuestionBinding};
    use assess_core::time::fixed_now;
    use std::sync::Arc;
    use storage::CIS_STEP_TITLES;
    use storage::catalog::cis_questions;

    fn session() -> AssessmentSession {
        let definition = AssessmentDefinition::new(
            CIS_STEP_TITLES,
            cis_questions().unwrap(),
            QuestionBinding::Reference,
        )
        .unwrap();
        AssessmentSession::new(Arc::new(definition), fixed_now())
    }

    fn answer(question: &str, option: &str) -> AssessmentIntent {
        AssessmentIntent::Answer {
            question: QuestionId::new(question).unwrap(),
            option: OptionId::new(option).unwrap(),
        }
    }

    #[test]
    fn view_reflects_gate_and_selection() {
        let mut session = session();
        let view = session.view();
        assert_eq!(view.step_title, "Inventory and Control of Enterprise Assets");
        assert!(!view.next_allowed);
        assert!(view.selected.is_none());

        session.dispatch(answer("q1", "q1-opt3"), fixed_now());
        let view = session.view();
        assert!(view.next_allowed);
        assert!(!view.submit_allowed);
        assert_eq!(view.selected.map(OptionId::as_str), Some("q1-opt3"));
    }

    #[test]
    fn malformed_intents_are_ignored() {
        let mut session = session();
        assert_eq!(
            session.dispatch(answer("q7", "q7-opt1"), fixed_now()),
            IntentOutcome::Ignored
        );
        assert_eq!(
            session.dispatch(answer("q1", "q3-opt1"), fixed_now()),
            IntentOutcome::Ignored
        );
        assert_eq!(
            session.dispatch(
                AssessmentIntent::Jump(StepNumber::new(4).unwrap()),
                fixed_now()
            ),
            IntentOutcome::Ignored
        );
        assert_eq!(
            session.dispatch(AssessmentIntent::Submit, fixed_now()),
            IntentOutcome::Ignored
        );
        assert_eq!(session.current_step(), StepNumber::FIRST);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn next_and_prev_report_movement() {
        let mut session = session();
        assert_eq!(session.dispatch(AssessmentIntent::Next, fixed_now()), IntentOutcome::Blocked);
        assert_eq!(session.dispatch(AssessmentIntent::Prev, fixed_now()), IntentOutcome::Unchanged);
        session.dispatch(answer("q1", "q1-opt1"), fixed_now());
        assert_eq!(
            session.dispatch(AssessmentIntent::Next, fixed_now()),
            IntentOutcome::Moved(StepNumber::new(2).unwrap())
        );
        assert_eq!(
            session.dispatch(AssessmentIntent::Prev, fixed_now()),
            IntentOutcome::Moved(StepNumber::FIRST)
        );
    }
}

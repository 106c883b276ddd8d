use std::sync::Arc;

use assess_core::model::{OptionId, QuestionBinding, QuestionId, StepNumber};
use assess_core::time::fixed_now;
use services::{
    AssessmentError, AssessmentIntent, AssessmentService, Clock, IntentOutcome, NextOutcome,
};
use storage::InMemoryRepository;
use storage::catalog::cis_questions;

fn q(id: &str) -> QuestionId {
    QuestionId::new(id).unwrap()
}

fn o(id: &str) -> OptionId {
    OptionId::new(id).unwrap()
}

fn step(n: u32) -> StepNumber {
    StepNumber::new(n).unwrap()
}

#[tokio::test]
async fn twenty_step_walkthrough() {
    let service = AssessmentService::builtin(Clock::fixed(fixed_now()));
    let mut session = service.start().await.unwrap();
    assert_eq!(session.total_steps(), 20);
    assert_eq!(session.current_step(), step(1));

    session.set_answer(&q("q1"), &o("q1-opt2")).unwrap();
    assert!(session.is_next_allowed());
    assert_eq!(session.go_next(), NextOutcome::Advanced(step(2)));

    let err = session.jump_to(step(5)).unwrap_err();
    assert!(matches!(err, AssessmentError::InvalidTransition { .. }));
    assert_eq!(session.current_step(), step(2));

    assert!(!session.is_next_allowed());
    session.set_answer(&q("q2"), &o("q2-opt3")).unwrap();
    assert_eq!(session.go_next(), NextOutcome::Advanced(step(3)));

    assert!(!session.is_next_allowed());
    session.set_answer(&q("q3"), &o("q3-opt1")).unwrap();
    assert_eq!(session.go_next(), NextOutcome::Advanced(step(4)));

    for n in 4..20 {
        assert_eq!(session.current_step(), step(n));
        assert_eq!(session.current_question().unwrap().id(), &q("q3"));
        assert!(session.is_next_allowed());
        assert_eq!(session.go_next(), NextOutcome::Advanced(step(n + 1)));
    }

    assert_eq!(session.current_step(), step(20));
    assert!(!session.view().next_allowed);
    assert!(session.view().submit_allowed);
    assert_eq!(session.go_next(), NextOutcome::AtFinalStep);
    assert_eq!(session.current_step(), step(20));
    assert!((session.progress_fraction() - 1.0).abs() < f64::EPSILON);

    let submission = service.submit(&session).unwrap();
    assert_eq!(submission.answers.len(), 3);
    assert_eq!(submission.submitted_at, fixed_now());
    assert_eq!(submission.attempt_id, session.attempt_id());
}

#[tokio::test]
async fn jumping_back_keeps_answers_and_progress_drops() {
    let service = AssessmentService::builtin(Clock::fixed(fixed_now()));
    let mut session = service.start().await.unwrap();

    for (question, option) in [("q1", "q1-opt1"), ("q2", "q2-opt1"), ("q3", "q3-opt1")] {
        session.set_answer(&q(question), &o(option)).unwrap();
        session.go_next();
    }
    assert_eq!(session.current_step(), step(4));
    let before = session.progress_fraction();

    session.jump_to(step(2)).unwrap();
    assert!(session.progress_fraction() < before);
    assert_eq!(session.selected_for_current(), Some(&o("q2-opt1")));
    assert_eq!(session.answers().len(), 3);

    // Moving back does not re-lock earlier steps.
    assert_eq!(session.go_next(), NextOutcome::Advanced(step(3)));
}

#[tokio::test]
async fn dispatch_drives_the_same_state_machine() {
    let service = AssessmentService::builtin(Clock::fixed(fixed_now()));
    let mut session = service.start().await.unwrap();
    let now = fixed_now();

    assert_eq!(session.dispatch(AssessmentIntent::Next, now), IntentOutcome::Blocked);
    assert_eq!(
        session.dispatch(
            AssessmentIntent::Answer {
                question: q("q1"),
                option: o("q1-opt4"),
            },
            now
        ),
        IntentOutcome::Answered
    );
    assert_eq!(
        session.dispatch(AssessmentIntent::Next, now),
        IntentOutcome::Moved(step(2))
    );
    assert_eq!(
        session.dispatch(AssessmentIntent::Jump(step(3)), now),
        IntentOutcome::Ignored
    );
    assert_eq!(session.current_step(), step(2));
}

#[tokio::test]
async fn unbound_binding_frees_trailing_steps() {
    let repo = InMemoryRepository::with_questions(cis_questions().unwrap());
    let service = AssessmentService::new(Clock::fixed(fixed_now()), Arc::new(repo))
        .with_titles(["A", "B", "C", "D", "E"])
        .with_binding(QuestionBinding::Unbound);
    let mut session = service.start().await.unwrap();

    for (question, option) in [("q1", "q1-opt1"), ("q2", "q2-opt1"), ("q3", "q3-opt1")] {
        session.set_answer(&q(question), &o(option)).unwrap();
        session.go_next();
    }
    assert_eq!(session.current_step(), step(4));
    assert!(session.current_question().is_none());
    assert!(session.is_next_allowed());
    assert_eq!(session.go_next(), NextOutcome::Advanced(step(5)));
    assert!(session.can_submit());
}

#[tokio::test]
async fn titles_shorter_than_questions_fail_to_load() {
    let service = AssessmentService::builtin(Clock::fixed(fixed_now())).with_titles(["Only"]);
    let err = service.start().await.unwrap_err();
    assert!(matches!(err, AssessmentError::Definition(_)));
}

#[tokio::test]
async fn empty_repository_still_walks_all_steps() {
    let service = AssessmentService::new(
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryRepository::new()),
    )
    .with_titles(["One", "Two"]);
    let mut session = service.start().await.unwrap();
    assert!(session.is_next_allowed());
    assert_eq!(session.go_next(), NextOutcome::Advanced(step(2)));
    assert!(service.submit(&session).is_ok());
}

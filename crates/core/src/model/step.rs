use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::ids::{QuestionId, StepNumber};
use crate::model::question::{Question, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("an assessment needs at least one step")]
    NoSteps,

    #[error("step title cannot be empty (step {0})")]
    EmptyTitle(StepNumber),

    #[error("question {0} is defined more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question {question} targets step index {step_index}, but only {steps} steps exist")]
    StepOutOfRange {
        question: QuestionId,
        step_index: usize,
        steps: usize,
    },

    #[error("step index {0} has more than one question")]
    StepAlreadyBound(usize),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

//
// ─── BINDING POLICY ────────────────────────────────────────────────────────────
//

/// How steps without an authored question pick one.
///
/// Every policy first binds a step to the question whose `step_index` matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionBinding {
    /// Remaining steps re-display the third question (last one if fewer exist).
    ///
    /// A question authored for a later step still takes that step; with the
    /// built-in three questions every step from 4 on shows the third one.
    #[default]
    Reference,
    /// Remaining steps re-display the last question.
    RepeatLast,
    /// Remaining steps carry no question and are always navigable.
    Unbound,
}

impl QuestionBinding {
    const REFERENCE_FALLBACK: usize = 2;

    fn fallback(self, questions: &[Question]) -> Option<&Question> {
        match self {
            Self::Reference => questions
                .get(Self::REFERENCE_FALLBACK)
                .or_else(|| questions.last()),
            Self::RepeatLast => questions.last(),
            Self::Unbound => None,
        }
    }
}

//
// ─── STEP ──────────────────────────────────────────────────────────────────────
//

/// One position in the assessment stepper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    number: StepNumber,
    title: String,
    question: Option<QuestionId>,
}

impl Step {
    #[must_use]
    pub fn number(&self) -> StepNumber {
        self.number
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn question(&self) -> Option<&QuestionId> {
        self.question.as_ref()
    }
}

//
// ─── DEFINITION ────────────────────────────────────────────────────────────────
//

/// Immutable step list plus the questions it draws from.
///
/// Step numbers are always the contiguous range `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentDefinition {
    steps: Vec<Step>,
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
    binding: QuestionBinding,
}

impl AssessmentDefinition {
    /// Builds the step list from ordered titles and authored questions.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError` when there are no titles, a title is blank,
    /// question ids repeat, or a question targets a missing/already bound step.
    pub fn new<I, S>(
        titles: I,
        questions: Vec<Question>,
        binding: QuestionBinding,
    ) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let titles: Vec<String> = titles.into_iter().map(Into::into).collect();
        if titles.is_empty() {
            return Err(DefinitionError::NoSteps);
        }

        let mut index = HashMap::with_capacity(questions.len());
        let mut by_step: HashMap<usize, usize> = HashMap::with_capacity(questions.len());
        for (pos, question) in questions.iter().enumerate() {
            question.validate()?;
            if index.insert(question.id().clone(), pos).is_some() {
                return Err(DefinitionError::DuplicateQuestion(question.id().clone()));
            }
            if question.step_index() >= titles.len() {
                return Err(DefinitionError::StepOutOfRange {
                    question: question.id().clone(),
                    step_index: question.step_index(),
                    steps: titles.len(),
                });
            }
            if by_step.insert(question.step_index(), pos).is_some() {
                return Err(DefinitionError::StepAlreadyBound(question.step_index()));
            }
        }

        let fallback = binding.fallback(&questions).map(|q| q.id().clone());
        let mut steps = Vec::with_capacity(titles.len());
        for (i, title) in titles.into_iter().enumerate() {
            let number = StepNumber::from_index(i);
            if title.trim().is_empty() {
                return Err(DefinitionError::EmptyTitle(number));
            }
            let question = match by_step.get(&i) {
                Some(&pos) => Some(questions[pos].id().clone()),
                None => fallback.clone(),
            };
            steps.push(Step {
                number,
                title,
                question,
            });
        }

        Ok(Self {
            steps,
            questions,
            index,
            binding,
        })
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn binding(&self) -> QuestionBinding {
        self.binding
    }

    /// Number of steps (`N`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn last_step(&self) -> StepNumber {
        StepNumber::from_index(self.steps.len() - 1)
    }

    #[must_use]
    pub fn contains(&self, step: StepNumber) -> bool {
        step.index() < self.steps.len()
    }

    #[must_use]
    pub fn step(&self, step: StepNumber) -> Option<&Step> {
        self.steps.get(step.index())
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.index.get(id).map(|&pos| &self.questions[pos])
    }

    /// Question displayed (and gated) at `step`, if any.
    #[must_use]
    pub fn question_for_step(&self, step: StepNumber) -> Option<&Question> {
        self.step(step)
            .and_then(Step::question)
            .and_then(|id| self.question(id))
    }
}

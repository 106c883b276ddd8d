use assess_core::model::StepNumber;

/// Aggregated view of stepper progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssessmentProgress {
    pub current: StepNumber,
    pub total: usize,
    /// `current / total`.
    pub fraction: f64,
    pub answered: usize,
}

impl AssessmentProgress {
    /// Fraction as a whole percentage, rounded to nearest.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        (self.fraction * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

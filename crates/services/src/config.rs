use course_core::model::QuizError;

/// Default minimum quiz score (percent) that counts as a pass.
pub const DEFAULT_QUIZ_PASS_SCORE: u8 = 60;

/// Tunables shared by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    quiz_pass_score: u8,
}

impl ServiceConfig {
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPassScore` when `quiz_pass_score > 100`.
    pub fn new(quiz_pass_score: u8) -> Result<Self, QuizError> {
        if quiz_pass_score > 100 {
            return Err(QuizError::InvalidPassScore(quiz_pass_score));
        }
        Ok(Self { quiz_pass_score })
    }

    #[must_use]
    pub fn quiz_pass_score(&self) -> u8 {
        self.quiz_pass_score
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            quiz_pass_score: DEFAULT_QUIZ_PASS_SCORE,
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use course_core::model::{AnswerId, ChapterId, Question, QuestionId, QuizResult, UserId};
use storage::repository::QuizRepository;

use crate::Clock;
use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Grades chapter quizzes and keeps every attempt.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    config: ServiceConfig,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, config: ServiceConfig, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self {
            clock,
            config,
            quizzes,
        }
    }

    /// Questions of a chapter's quiz, in display order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn questions(&self, chapter_id: ChapterId) -> Result<Vec<Question>, ServiceError> {
        Ok(self.quizzes.list_questions(chapter_id).await?)
    }

    /// Grade one attempt and append it to the user's results.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NoQuiz` when the chapter has no questions and
    /// `ServiceError::Storage` if repository access fails.
    pub async fn submit_quiz(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
        selections: &HashMap<QuestionId, AnswerId>,
    ) -> Result<QuizResult, ServiceError> {
        let questions = self.quizzes.list_questions(chapter_id).await?;
        if questions.is_empty() {
            return Err(ServiceError::NoQuiz(chapter_id));
        }

        let result = QuizResult::grade(
            user_id,
            chapter_id,
            &questions,
            selections,
            self.config.quiz_pass_score(),
            self.clock.now(),
        )?;
        let attempt = self.quizzes.insert_quiz_result(&result).await?;

        tracing::info!(
            %user_id,
            %chapter_id,
            attempt,
            score = result.score.value(),
            status = result.status.as_str(),
            "quiz graded"
        );
        Ok(result)
    }

    /// All attempts of a user on a chapter, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn quiz_results(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
    ) -> Result<Vec<QuizResult>, ServiceError> {
        Ok(self.quizzes.list_quiz_results(user_id, chapter_id).await?)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::model::enrollment::Progress;
use crate::model::ids::{AnswerId, ChapterId, QuestionId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("answer text cannot be empty")]
    EmptyAnswer,

    #[error("question {0} needs at least two answers")]
    TooFewAnswers(QuestionId),

    #[error("question {0} has no correct answer")]
    NoCorrectAnswer(QuestionId),

    #[error("answer {0} appears more than once")]
    DuplicateAnswer(AnswerId),

    #[error("chapter has no quiz questions")]
    EmptyQuiz,

    #[error("pass score must be between 0 and 100, got {0}")]
    InvalidPassScore(u8),

    #[error("unknown quiz status: {0}")]
    UnknownStatus(String),
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
    pub is_correct: bool,
    pub order: u32,
}

impl AnswerOption {
    /// # Errors
    ///
    /// Returns `QuizError::EmptyAnswer` for blank text.
    pub fn new(
        id: AnswerId,
        text: impl Into<String>,
        is_correct: bool,
        order: u32,
    ) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyAnswer);
        }
        Ok(Self {
            id,
            text: text.trim().to_owned(),
            is_correct,
            order,
        })
    }
}

/// A multiple-choice question attached to a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    chapter_id: ChapterId,
    text: String,
    order: u32,
    answers: Vec<AnswerOption>,
}

impl Question {
    /// Creates a question; answers are sorted by their `order`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for blank text, fewer than two answers, duplicate
    /// answer ids, or no correct answer.
    pub fn new(
        id: QuestionId,
        chapter_id: ChapterId,
        text: impl Into<String>,
        order: u32,
        mut answers: Vec<AnswerOption>,
    ) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyQuestion);
        }
        if answers.len() < 2 {
            return Err(QuizError::TooFewAnswers(id));
        }
        let mut seen = HashSet::with_capacity(answers.len());
        for answer in &answers {
            if !seen.insert(answer.id) {
                return Err(QuizError::DuplicateAnswer(answer.id));
            }
        }
        if !answers.iter().any(|a| a.is_correct) {
            return Err(QuizError::NoCorrectAnswer(id));
        }
        answers.sort_by_key(|a| a.order);

        Ok(Self {
            id,
            chapter_id,
            text: text.trim().to_owned(),
            order,
            answers,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn chapter_id(&self) -> ChapterId {
        self.chapter_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerOption] {
        &self.answers
    }

    /// True when `answer` is one of this question's correct options.
    #[must_use]
    pub fn is_correct(&self, answer: AnswerId) -> bool {
        self.answers
            .iter()
            .any(|option| option.id == answer && option.is_correct)
    }
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuizStatus {
    Passed,
    Failed,
}

impl QuizStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizStatus::Passed => "passed",
            QuizStatus::Failed => "failed",
        }
    }

    /// # Errors
    ///
    /// Returns `QuizError::UnknownStatus` for unrecognised text.
    pub fn parse(raw: &str) -> Result<Self, QuizError> {
        match raw {
            "passed" => Ok(QuizStatus::Passed),
            "failed" => Ok(QuizStatus::Failed),
            other => Err(QuizError::UnknownStatus(other.to_owned())),
        }
    }
}

/// One graded quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub user_id: UserId,
    pub chapter_id: ChapterId,
    pub score: Progress,
    pub status: QuizStatus,
    pub completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Grades `selections` against `questions`.
    ///
    /// Score is the rounded percentage of questions answered correctly;
    /// unanswered questions count as wrong and selections for questions not in
    /// the quiz are ignored. The attempt passes when `score >= pass_score`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuiz` when `questions` is empty and
    /// `QuizError::InvalidPassScore` when `pass_score > 100`.
    pub fn grade(
        user_id: UserId,
        chapter_id: ChapterId,
        questions: &[Question],
        selections: &HashMap<QuestionId, AnswerId>,
        pass_score: u8,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        if pass_score > 100 {
            return Err(QuizError::InvalidPassScore(pass_score));
        }

        let correct = questions
            .iter()
            .filter(|q| {
                selections
                    .get(&q.id())
                    .is_some_and(|answer| q.is_correct(*answer))
            })
            .count();
        let score = Progress::from_counts(correct, questions.len())
            .map_err(|_| QuizError::EmptyQuiz)?;
        let status = if score.value() >= pass_score {
            QuizStatus::Passed
        } else {
            QuizStatus::Failed
        };

        Ok(Self {
            user_id,
            chapter_id,
            score,
            status,
            completed_at,
        })
    }
}

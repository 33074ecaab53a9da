use std::collections::HashMap;

use course_core::model::{
    AnswerId, AnswerOption, ChapterId, Question, QuestionId, QuizResult, UserId,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, get_u32, get_u64, id_to_i64, map_quiz_result_row, ser};
use crate::repository::{QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let question_id = id_to_i64("question_id", question.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO questions (id, chapter_id, question_text, question_order)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                chapter_id = excluded.chapter_id,
                question_text = excluded.question_text,
                question_order = excluded.question_order
            ",
        )
        .bind(question_id)
        .bind(id_to_i64("chapter_id", question.chapter_id().value())?)
        .bind(question.text())
        .bind(i64::from(question.order()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM answers WHERE question_id = ?1")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for answer in question.answers() {
            sqlx::query(
                r"
                INSERT INTO answers (id, question_id, answer_text, is_correct, answer_order)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(id_to_i64("answer_id", answer.id.value())?)
            .bind(question_id)
            .bind(answer.text.as_str())
            .bind(answer.is_correct)
            .bind(i64::from(answer.order))
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
                other => conn(other),
            })?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn list_questions(&self, chapter_id: ChapterId) -> Result<Vec<Question>, StorageError> {
        let chapter = id_to_i64("chapter_id", chapter_id.value())?;

        let answer_rows = sqlx::query(
            r"
            SELECT a.id, a.question_id, a.answer_text, a.is_correct, a.answer_order
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.chapter_id = ?1
            ORDER BY a.question_id ASC, a.answer_order ASC
            ",
        )
        .bind(chapter)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut answers: HashMap<u64, Vec<AnswerOption>> = HashMap::new();
        for row in &answer_rows {
            let option = AnswerOption::new(
                AnswerId::new(get_u64(row, "id")?),
                row.try_get::<String, _>("answer_text").map_err(ser)?,
                row.try_get::<bool, _>("is_correct").map_err(ser)?,
                get_u32(row, "answer_order")?,
            )
            .map_err(ser)?;
            answers
                .entry(get_u64(row, "question_id")?)
                .or_default()
                .push(option);
        }

        let question_rows = sqlx::query(
            r"
            SELECT id, chapter_id, question_text, question_order
            FROM questions
            WHERE chapter_id = ?1
            ORDER BY question_order ASC, id ASC
            ",
        )
        .bind(chapter)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in &question_rows {
            let id = get_u64(row, "id")?;
            questions.push(
                Question::new(
                    QuestionId::new(id),
                    ChapterId::new(get_u64(row, "chapter_id")?),
                    row.try_get::<String, _>("question_text").map_err(ser)?,
                    get_u32(row, "question_order")?,
                    answers.remove(&id).unwrap_or_default(),
                )
                .map_err(ser)?,
            );
        }
        Ok(questions)
    }

    async fn insert_quiz_result(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO quiz_results (user_id, chapter_id, score, status, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_to_i64("user_id", result.user_id.value())?)
        .bind(id_to_i64("chapter_id", result.chapter_id.value())?)
        .bind(i64::from(result.score.value()))
        .bind(result.status.as_str())
        .bind(result.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_quiz_results(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
    ) -> Result<Vec<QuizResult>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, chapter_id, score, status, completed_at
            FROM quiz_results
            WHERE user_id = ?1 AND chapter_id = ?2
            ORDER BY completed_at ASC, id ASC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("chapter_id", chapter_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_quiz_result_row).collect()
    }
}

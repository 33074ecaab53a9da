use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 5),
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS chapters (
            id INTEGER PRIMARY KEY,
            course_id INTEGER NOT NULL,
            chapter_order INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            video_url TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (course_id, chapter_order),
            FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS enrollments (
            user_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL,
            progress INTEGER NOT NULL CHECK (progress BETWEEN 0 AND 100),
            status TEXT NOT NULL,
            enrolled_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, course_id),
            FOREIGN KEY (course_id) REFERENCES courses(id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS chapter_progress (
            user_id INTEGER NOT NULL,
            chapter_id INTEGER NOT NULL,
            is_completed INTEGER NOT NULL CHECK (is_completed IN (0, 1)),
            completed_at TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, chapter_id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            chapter_id INTEGER NOT NULL,
            question_text TEXT NOT NULL,
            question_order INTEGER NOT NULL,
            FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS answers (
            id INTEGER PRIMARY KEY,
            question_id INTEGER NOT NULL,
            answer_text TEXT NOT NULL,
            is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
            answer_order INTEGER NOT NULL,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            chapter_id INTEGER NOT NULL,
            score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 100),
            status TEXT NOT NULL,
            completed_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_chapters_course_order
            ON chapters (course_id, chapter_order);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_chapter_order
            ON questions (chapter_id, question_order);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_results_user_chapter
            ON quiz_results (user_id, chapter_id, completed_at);
    ",
];

const SCHEMA_V2: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS cuisines (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        );
    ",
    "ALTER TABLE courses ADD COLUMN cuisine_id INTEGER REFERENCES cuisines(id);",
    "ALTER TABLE courses ADD COLUMN creator_id INTEGER;",
    "ALTER TABLE courses ADD COLUMN duration TEXT;",
    "ALTER TABLE courses ADD COLUMN image_url TEXT;",
    r"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            created_at TEXT NOT NULL,
            FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_courses_status_cuisine
            ON courses (status, cuisine_id);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_comments_course
            ON comments (course_id, id);
    ",
];

const MIGRATIONS: &[(i64, &[&str])] = &[(1, SCHEMA_V1), (2, SCHEMA_V2)];

/// Runs the versioned schema migrations in order, each in its own transaction.
///
/// Version 1 creates the catalog, enrollment, chapter progress and quiz tables.
/// Version 2 adds cuisines, course catalog details and rated comments.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    for (version, statements) in MIGRATIONS {
        if is_applied(pool, *version).await? {
            continue;
        }
        let mut tx = pool.begin().await?;

        for statement in *statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(*version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = *version, "applied sqlite schema migration");
    }

    Ok(())
}

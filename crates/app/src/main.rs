use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use course_core::model::{AnswerId, ChapterId, Course, CourseId, CuisineId, QuestionId, UserId};
use course_core::progression::ChapterState;
use services::{AppServices, Clock, DEFAULT_QUIZ_PASS_SCORE, ServiceConfig};

#[derive(Debug, Parser)]
#[command(name = "coursectl", version, about = "Enroll learners and track chapter progress")]
struct Cli {
    /// SQLite database URL or file path
    #[arg(long = "db", env = "COURSE_DB_URL", default_value = "sqlite://course.sqlite3", global = true)]
    db_url: String,

    /// Minimum quiz score (percent) that counts as a pass
    #[arg(
        long,
        env = "COURSE_QUIZ_PASS_SCORE",
        default_value_t = DEFAULT_QUIZ_PASS_SCORE,
        value_parser = clap::value_parser!(u8).range(0..=100),
        global = true
    )]
    pass_score: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the built-in demo catalog
    Seed,
    /// List cuisines
    Cuisines,
    /// List active courses
    Courses {
        #[arg(long, default_value_t = 50)]
        limit: u32,
        /// Only courses filed under this cuisine
        #[arg(long, conflicts_with = "creator")]
        cuisine: Option<CuisineId>,
        /// Only courses authored by this user
        #[arg(long)]
        creator: Option<UserId>,
    },
    /// Enroll a user in a course
    Join {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        course: CourseId,
    },
    /// Mark a chapter as watched
    Complete {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        course: CourseId,
        #[arg(long)]
        chapter: ChapterId,
    },
    /// Show progress and the chapter step indicator
    Status {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        course: CourseId,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Submit quiz answers for a chapter
    Quiz {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        chapter: ChapterId,
        /// Selected answer as QUESTION=ANSWER; repeat per question
        #[arg(long = "answer", value_parser = parse_selection)]
        answers: Vec<(QuestionId, AnswerId)>,
    },
    /// Comment on a course and rate it
    Comment {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        course: CourseId,
        /// Stars from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        #[arg(long)]
        text: String,
    },
    /// Show a course's comments and average rating
    Comments {
        #[arg(long)]
        course: CourseId,
    },
}

fn parse_selection(raw: &str) -> Result<(QuestionId, AnswerId), String> {
    let (question, answer) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=ANSWER, got {raw:?}"))?;
    let question = question.parse::<QuestionId>().map_err(|e| e.to_string())?;
    let answer = answer.parse::<AnswerId>().map_err(|e| e.to_string())?;
    Ok((question, answer))
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Creates the database file (and parent directories) so sqlx can open it.
fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

fn not_recorded_message(user: UserId, course: CourseId, chapter: ChapterId) -> String {
    format!(
        "nothing recorded: user {user} is not enrolled in course {course}, \
         or the course or chapter {chapter} is unknown"
    )
}

fn course_line(course: &Course) -> String {
    let mut line = format!(
        "{:>4}  {}  (difficulty {}, {} chapters",
        course.id(),
        course.title(),
        course.difficulty(),
        course.total_chapters()
    );
    if let Some(duration) = course.duration() {
        line.push_str(", ");
        line.push_str(duration);
    }
    line.push(')');
    line
}

fn state_label(state: ChapterState) -> &'static str {
    match state {
        ChapterState::Completed => "done",
        ChapterState::Unlocked => "open",
        ChapterState::Locked => "locked",
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;

    let config = ServiceConfig::new(cli.pass_score)?;
    let app = AppServices::new_sqlite(&db_url, Clock::system(), config)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    tracing::debug!(%db_url, "storage ready");

    match cli.command {
        Command::Seed => {
            let summary = app.seed_demo().await?;
            println!(
                "seeded {} cuisines, {} courses, {} chapters, {} questions",
                summary.cuisines, summary.courses, summary.chapters, summary.questions
            );
        }
        Command::Cuisines => {
            for cuisine in app.catalog().cuisines().await? {
                println!("{:>4}  {}", cuisine.id(), cuisine.name());
            }
        }
        Command::Courses {
            limit,
            cuisine,
            creator,
        } => {
            let catalog = app.catalog();
            let courses = match (cuisine, creator) {
                (Some(cuisine), _) => catalog.courses_by_cuisine(cuisine, limit).await?,
                (None, Some(creator)) => catalog.courses_by_creator(creator, limit).await?,
                (None, None) => catalog.active_courses(limit).await?,
            };
            for course in &courses {
                println!("{}", course_line(course));
            }
        }
        Command::Join { user, course } => {
            let enrollment = app.enrollments().join(user, course).await?;
            println!(
                "user {user} enrolled in course {course}: {} ({})",
                enrollment.progress(),
                enrollment.status()
            );
        }
        Command::Complete {
            user,
            course,
            chapter,
        } => match app.progress().complete_chapter(user, chapter, course).await? {
            Some(enrollment) => println!(
                "chapter {chapter} completed: {} ({})",
                enrollment.progress(),
                enrollment.status()
            ),
            None => println!("{}", not_recorded_message(user, course, chapter)),
        },
        Command::Status { user, course, json } => {
            let enrollment = app.enrollments().enrollment(user, course).await?;
            let steps = app.sequencer().chapter_states(user, course).await?;
            if json {
                let doc = serde_json::json!({
                    "user_id": user,
                    "course_id": course,
                    "enrollment": enrollment,
                    "chapters": steps,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                match &enrollment {
                    Some(e) => println!("progress: {} ({})", e.progress(), e.status()),
                    None => println!("not enrolled"),
                }
                for step in &steps {
                    println!(
                        "  [{:<6}] {:>2}. {}",
                        state_label(step.state),
                        step.order,
                        step.title
                    );
                }
            }
        }
        Command::Quiz {
            user,
            chapter,
            answers,
        } => {
            let selections: HashMap<QuestionId, AnswerId> = answers.into_iter().collect();
            let result = app.quizzes().submit_quiz(user, chapter, &selections).await?;
            println!(
                "quiz for chapter {chapter}: {} {}",
                result.score,
                result.status.as_str()
            );
        }
        Command::Comment {
            user,
            course,
            rating,
            text,
        } => {
            let comment = app
                .comments()
                .add_comment(user, course, &text, rating)
                .await?;
            println!("comment {} saved on course {course}", comment.id());
        }
        Command::Comments { course } => {
            let comments = app.comments();
            match comments.course_rating(course).await? {
                Some(rating) => println!("rating: {rating}"),
                None => println!("no ratings yet"),
            }
            for comment in comments.comments(course).await? {
                println!(
                    "  [{}/5] user {}: {}",
                    comment.rating().value(),
                    comment.user_id(),
                    comment.text()
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}

use std::collections::HashMap;

use chrono::Duration;
use course_core::model::{
    AnswerId, ChapterId, CourseId, CuisineId, EnrollmentStatus, QuestionId, QuizStatus,
    UserId,
};
use course_core::progression::ChapterState;
use course_core::time::fixed_now;
use services::{AppServices, Clock, ServiceConfig, ServiceError};
use storage::Storage;

const FRIED_RICE: CourseId = CourseId::new(1);
const KUNG_PAO: CourseId = CourseId::new(2);

async fn seeded(storage: Storage) -> AppServices {
    let app = AppServices::from_storage(storage, Clock::fixed(fixed_now()), ServiceConfig::default());
    app.seed_demo().await.unwrap();
    app
}

fn chapter(n: u64) -> ChapterId {
    ChapterId::new(n)
}

/// Walks the four fried-rice chapters and checks every intermediate state.
async fn four_chapter_walkthrough(storage: Storage) {
    let app = seeded(storage.clone()).await;
    let user = UserId::new(1);
    let sequencer = app.sequencer();
    let progress = app.progress();

    let joined = app.enrollments().join(user, FRIED_RICE).await.unwrap();
    assert_eq!(joined.progress().value(), 0);
    assert_eq!(joined.status(), EnrollmentStatus::InProgress);
    assert!(sequencer.is_unlocked(user, chapter(1), FRIED_RICE).await.unwrap());
    assert!(!sequencer.is_unlocked(user, chapter(2), FRIED_RICE).await.unwrap());

    let mut seen = Vec::new();
    for n in 1..=4 {
        let enrollment = progress
            .complete_chapter(user, chapter(n), FRIED_RICE)
            .await
            .unwrap()
            .expect("enrolled");
        seen.push(enrollment.progress().value());

        if n < 4 {
            assert!(sequencer.is_unlocked(user, chapter(n + 1), FRIED_RICE).await.unwrap());
        } else {
            assert_eq!(enrollment.status(), EnrollmentStatus::Completed);
        }
    }
    assert_eq!(seen, vec![25, 50, 75, 100]);

    let steps = sequencer.chapter_states(user, FRIED_RICE).await.unwrap();
    assert_eq!(steps.len(), 4);
    assert!(steps.iter().all(|s| s.state == ChapterState::Completed));

    let stored = app
        .enrollments()
        .enrollment(user, FRIED_RICE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.progress().value(), 100);

    // Chapter 5 belongs to another course and must never be seeded from here.
    let records = storage
        .chapter_progress
        .list_chapter_progress(user, &(1..=5).map(chapter).collect::<Vec<_>>())
        .await
        .unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.is_completed()));
}

#[tokio::test]
async fn four_chapter_course_in_memory() {
    four_chapter_walkthrough(Storage::in_memory()).await;
}

#[tokio::test]
async fn four_chapter_course_on_sqlite() {
    let storage = Storage::sqlite("sqlite:file:memdb_services_walkthrough?mode=memory&cache=shared")
        .await
        .unwrap();
    four_chapter_walkthrough(storage).await;
}

#[tokio::test]
async fn chapter_three_stays_locked_until_two_is_done() {
    let app = seeded(Storage::in_memory()).await;
    let user = UserId::new(2);
    app.enrollments().join(user, FRIED_RICE).await.unwrap();
    app.progress()
        .complete_chapter(user, chapter(1), FRIED_RICE)
        .await
        .unwrap();

    let sequencer = app.sequencer();
    assert!(sequencer.is_unlocked(user, chapter(2), FRIED_RICE).await.unwrap());
    assert!(!sequencer.is_unlocked(user, chapter(3), FRIED_RICE).await.unwrap());

    let states: Vec<ChapterState> = sequencer
        .chapter_states(user, FRIED_RICE)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.state)
        .collect();
    assert_eq!(
        states,
        vec![
            ChapterState::Completed,
            ChapterState::Unlocked,
            ChapterState::Locked,
            ChapterState::Locked,
        ]
    );
}

#[tokio::test]
async fn progress_never_decreases_across_repeats() {
    let app = seeded(Storage::in_memory()).await;
    let user = UserId::new(3);
    app.enrollments().join(user, FRIED_RICE).await.unwrap();

    let mut last = 0;
    for n in [1, 1, 2, 1, 2, 3] {
        let enrollment = app
            .progress()
            .complete_chapter(user, chapter(n), FRIED_RICE)
            .await
            .unwrap()
            .unwrap();
        assert!(enrollment.progress().value() >= last);
        last = enrollment.progress().value();
    }
    assert_eq!(last, 75);
}

#[tokio::test]
async fn deleted_course_refuses_new_learners() {
    let app = seeded(Storage::in_memory()).await;
    let err = app
        .enrollments()
        .join(UserId::new(4), KUNG_PAO)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::CourseUnavailable(_)));

    let active: Vec<CourseId> = app
        .catalog()
        .active_courses(10)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id())
        .collect();
    assert_eq!(active, vec![CourseId::new(1), CourseId::new(3)]);
}

#[tokio::test]
async fn completion_without_enrollment_is_a_no_op() {
    let app = seeded(Storage::in_memory()).await;
    let user = UserId::new(5);
    let outcome = app
        .progress()
        .complete_chapter(user, chapter(1), FRIED_RICE)
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(app.enrollments().enrollments_for_user(user).await.unwrap().is_empty());
    assert!(!app.sequencer().is_unlocked(user, chapter(2), FRIED_RICE).await.unwrap());
}

#[tokio::test]
async fn seeded_quiz_grades_attempts() {
    let mut clock = Clock::fixed(fixed_now());
    let storage = Storage::in_memory();
    let app = AppServices::from_storage(storage.clone(), clock, ServiceConfig::default());
    app.seed_demo().await.unwrap();
    let user = UserId::new(6);

    // Carbonara quiz: guanciale (32) and cream (41) are correct.
    let mut picks = HashMap::new();
    picks.insert(QuestionId::new(3), AnswerId::new(32));
    picks.insert(QuestionId::new(4), AnswerId::new(40));
    let first = app.quizzes().submit_quiz(user, chapter(10), &picks).await.unwrap();
    assert_eq!(first.score.value(), 50);
    assert_eq!(first.status, QuizStatus::Failed);

    clock.advance(Duration::minutes(5));
    let retry = AppServices::from_storage(storage, clock, ServiceConfig::default());
    picks.insert(QuestionId::new(4), AnswerId::new(41));
    let second = retry.quizzes().submit_quiz(user, chapter(10), &picks).await.unwrap();
    assert_eq!(second.score.value(), 100);
    assert_eq!(second.status, QuizStatus::Passed);
    assert!(second.completed_at > first.completed_at);

    let history = app.quizzes().quiz_results(user, chapter(10)).await.unwrap();
    assert_eq!(history, vec![first, second]);

    let err = app
        .quizzes()
        .submit_quiz(user, chapter(11), &picks)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoQuiz(_)));
}

#[tokio::test]
async fn active_listing_limit_skips_deleted_course_on_sqlite() {
    let storage = Storage::sqlite("sqlite:file:memdb_services_catalog?mode=memory&cache=shared")
        .await
        .unwrap();
    let app = seeded(storage).await;

    // Kung pao (id 2) is deleted, so a limit of two reaches carbonara.
    let active: Vec<CourseId> = app
        .catalog()
        .active_courses(2)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id())
        .collect();
    assert_eq!(active, vec![FRIED_RICE, CourseId::new(3)]);

    let western: Vec<CourseId> = app
        .catalog()
        .courses_by_cuisine(CuisineId::new(2), 10)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id())
        .collect();
    assert_eq!(western, vec![CourseId::new(3)]);
    assert_eq!(app.catalog().cuisines().await.unwrap().len(), 4);
}

#[tokio::test]
async fn learners_rate_a_course_they_joined() {
    let app = seeded(Storage::in_memory()).await;
    let comments = app.comments();

    let err = comments
        .add_comment(UserId::new(2), FRIED_RICE, "Looks great", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotEnrolled { .. }));

    for (user, stars) in [(2, 5), (3, 4), (4, 4)] {
        app.enrollments().join(UserId::new(user), FRIED_RICE).await.unwrap();
        comments
            .add_comment(UserId::new(user), FRIED_RICE, "Grains finally separate", stars)
            .await
            .unwrap();
    }

    let rating = comments.course_rating(FRIED_RICE).await.unwrap().unwrap();
    assert_eq!(rating.count, 3);
    assert_eq!(rating.to_string(), "4.3/5 (3 ratings)");
    assert!(comments.course_rating(CourseId::new(3)).await.unwrap().is_none());
}

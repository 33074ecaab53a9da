use chrono::Duration;
use course_core::model::{
    Chapter, ChapterId, ChapterProgress, Comment, CommentId, Course, CourseId, CourseStatus,
    Cuisine, CuisineId, Enrollment, NewComment, Progress, QuizResult, QuizStatus, Rating, UserId,
};
use course_core::time::fixed_now;
use storage::repository::{
    ChapterProgressRepository, CommentRepository, CourseFilter, CourseRepository,
    CuisineRepository, EnrollmentRepository, QuizRepository, StorageError,
};
use storage::seed::{demo_questions, seed_demo_catalog};
use storage::sqlite::SqliteRepository;
use storage::Storage;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn chapter(id: u64, course: u64, order: u32) -> Chapter {
    Chapter::new(
        ChapterId::new(id),
        CourseId::new(course),
        order,
        format!("Chapter {order}"),
        Some("notes".into()),
        Some("https://videos.example.com/c.mp4"),
        fixed_now(),
    )
    .unwrap()
}

fn course(id: u64, chapters: Vec<Chapter>) -> Course {
    Course::new(
        CourseId::new(id),
        "Ramen Workshop",
        Some("Broth, noodles, toppings".into()),
        5,
        CourseStatus::Active,
        chapters,
        fixed_now(),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrips_course_with_sorted_chapters() {
    let repo = connect("memdb_course_roundtrip").await;
    let original = course(8, vec![chapter(33, 8, 3), chapter(31, 8, 1), chapter(32, 8, 2)]);
    repo.upsert_course(&original).await.unwrap();

    let fetched = repo.get_course(CourseId::new(8)).await.unwrap().expect("course");
    assert_eq!(fetched, original);
    let ids: Vec<ChapterId> = fetched.chapters().iter().map(Chapter::id).collect();
    assert_eq!(
        ids,
        vec![ChapterId::new(31), ChapterId::new(32), ChapterId::new(33)]
    );

    assert!(repo.get_course(CourseId::new(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_upsert_reorders_and_drops_chapters() {
    let repo = connect("memdb_course_reorder").await;
    repo.upsert_course(&course(1, vec![chapter(1, 1, 1), chapter(2, 1, 2), chapter(3, 1, 3)]))
        .await
        .unwrap();

    repo.upsert_course(&course(1, vec![chapter(2, 1, 1), chapter(1, 1, 2)]))
        .await
        .unwrap();

    let fetched = repo.get_course(CourseId::new(1)).await.unwrap().unwrap();
    let ids: Vec<ChapterId> = fetched.chapters().iter().map(Chapter::id).collect();
    assert_eq!(ids, vec![ChapterId::new(2), ChapterId::new(1)]);
}

#[tokio::test]
async fn sqlite_roundtrips_course_catalog_details() {
    let repo = connect("memdb_course_details").await;
    let thai = Cuisine::new(CuisineId::new(4), "Thai", None, fixed_now()).unwrap();
    repo.upsert_cuisine(&thai).await.unwrap();

    let detailed = course(5, vec![chapter(51, 5, 1)])
        .with_cuisine(CuisineId::new(4))
        .with_creator(UserId::new(12))
        .with_duration("90 min")
        .with_image_url("https://images.example.com/ramen.jpg")
        .unwrap();
    repo.upsert_course(&detailed).await.unwrap();

    let fetched = repo.get_course(CourseId::new(5)).await.unwrap().unwrap();
    assert_eq!(fetched, detailed);
    assert_eq!(repo.get_cuisine(CuisineId::new(4)).await.unwrap(), Some(thai));
}

#[tokio::test]
async fn sqlite_course_listing_filters_before_limit() {
    let repo = connect("memdb_course_filter").await;
    for (id, name) in [(1, "Italian"), (2, "Chinese")] {
        let cuisine = Cuisine::new(CuisineId::new(id), name, None, fixed_now()).unwrap();
        repo.upsert_cuisine(&cuisine).await.unwrap();
    }
    for id in 1..=5_u64 {
        let mut entry = course(id, vec![])
            .with_cuisine(CuisineId::new(if id % 2 == 0 { 2 } else { 1 }))
            .with_creator(UserId::new(id % 2 + 10));
        if id <= 2 {
            entry = entry.with_status(CourseStatus::Deleted);
        }
        repo.upsert_course(&entry).await.unwrap();
    }

    let ids = |courses: Vec<Course>| courses.iter().map(Course::id).collect::<Vec<_>>();

    let active = repo.list_courses(&CourseFilter::active(), 2).await.unwrap();
    assert_eq!(ids(active), vec![CourseId::new(3), CourseId::new(4)]);

    let italian = CourseFilter::active().with_cuisine(CuisineId::new(1));
    let listed = repo.list_courses(&italian, 10).await.unwrap();
    assert_eq!(ids(listed), vec![CourseId::new(3), CourseId::new(5)]);

    let by_creator = CourseFilter::default().with_creator(UserId::new(10));
    let listed = repo.list_courses(&by_creator, 10).await.unwrap();
    assert_eq!(ids(listed), vec![CourseId::new(2), CourseId::new(4)]);

    let names: Vec<String> = repo
        .list_cuisines()
        .await
        .unwrap()
        .iter()
        .map(|c| c.name().to_owned())
        .collect();
    assert_eq!(names, vec!["Chinese", "Italian"]);
}

#[tokio::test]
async fn sqlite_comments_keep_insertion_order_and_ratings() {
    let repo = connect("memdb_comments").await;
    repo.upsert_course(&course(3, vec![])).await.unwrap();

    let mut ids = Vec::new();
    for (user, stars) in [(1, 5), (2, 3)] {
        let comment = NewComment::new(
            CourseId::new(3),
            UserId::new(user),
            "  great broth  ",
            Rating::new(stars).unwrap(),
            fixed_now(),
        )
        .unwrap();
        ids.push(repo.insert_comment(&comment).await.unwrap());
    }
    assert!(ids[0] < ids[1]);

    let comments = repo.list_comments(CourseId::new(3)).await.unwrap();
    let ratings: Vec<u8> = comments.iter().map(|c| c.rating().value()).collect();
    assert_eq!(ratings, vec![5, 3]);
    assert_eq!(comments[0].text(), "great broth");
    assert_eq!(comments.iter().map(Comment::id).collect::<Vec<CommentId>>(), ids);
    assert!(repo.list_comments(CourseId::new(4)).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_rejects_out_of_range_rating_rows() {
    let repo = connect("memdb_comment_check").await;
    repo.upsert_course(&course(6, vec![])).await.unwrap();

    let err = sqlx::query(
        "INSERT INTO comments (course_id, user_id, text, rating, created_at) \
         VALUES (6, 1, 'too good', 6, '2024-01-01T00:00:00Z')",
    )
    .execute(repo.pool())
    .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn sqlite_enrollment_insert_update_and_conflict() {
    let repo = connect("memdb_enrollments").await;
    repo.upsert_course(&course(1, vec![chapter(1, 1, 1)])).await.unwrap();
    repo.upsert_course(&course(2, vec![chapter(2, 2, 1)])).await.unwrap();

    let user = UserId::new(7);
    let mut enrollment = Enrollment::new(user, CourseId::new(2), fixed_now());
    repo.insert_enrollment(&enrollment).await.unwrap();
    repo.insert_enrollment(&Enrollment::new(user, CourseId::new(1), fixed_now()))
        .await
        .unwrap();

    let err = repo.insert_enrollment(&enrollment).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    enrollment.apply_progress(Progress::COMPLETE, fixed_now() + Duration::hours(1));
    repo.update_enrollment(&enrollment).await.unwrap();

    let fetched = repo
        .get_enrollment(user, CourseId::new(2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, enrollment);

    let listed = repo.list_enrollments(user).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].course_id(), CourseId::new(1));

    let missing = Enrollment::new(UserId::new(99), CourseId::new(1), fixed_now());
    let err = repo.update_enrollment(&missing).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_chapter_progress_insert_if_absent_and_upsert() {
    let repo = connect("memdb_chapter_progress").await;
    let user = UserId::new(1);

    let fresh = ChapterProgress::reachable(user, ChapterId::new(1), fixed_now());
    assert!(repo.insert_chapter_progress_if_absent(&fresh).await.unwrap());
    assert!(!repo.insert_chapter_progress_if_absent(&fresh).await.unwrap());

    let mut done = fresh.clone();
    done.complete(fixed_now() + Duration::minutes(3));
    repo.upsert_chapter_progress(&done).await.unwrap();
    repo.insert_chapter_progress_if_absent(&ChapterProgress::reachable(
        user,
        ChapterId::new(2),
        fixed_now(),
    ))
    .await
    .unwrap();

    let records = repo
        .list_chapter_progress(user, &[ChapterId::new(1), ChapterId::new(2), ChapterId::new(3)])
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], done);
    assert!(!records[1].is_completed());

    assert!(repo.list_chapter_progress(user, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_quiz_questions_and_results() {
    let storage = Storage::sqlite("sqlite:file:memdb_quiz?mode=memory&cache=shared")
        .await
        .expect("storage");
    seed_demo_catalog(&storage, fixed_now()).await.unwrap();

    let questions = storage.quizzes.list_questions(ChapterId::new(10)).await.unwrap();
    let expected: Vec<_> = demo_questions()
        .unwrap()
        .into_iter()
        .filter(|q| q.chapter_id() == ChapterId::new(10))
        .collect();
    assert_eq!(questions, expected);

    let result = QuizResult {
        user_id: UserId::new(1),
        chapter_id: ChapterId::new(10),
        score: Progress::new(50).unwrap(),
        status: QuizStatus::Failed,
        completed_at: fixed_now(),
    };
    let first = storage.quizzes.insert_quiz_result(&result).await.unwrap();
    let second = storage.quizzes.insert_quiz_result(&result).await.unwrap();
    assert!(second > first);

    let results = storage
        .quizzes
        .list_quiz_results(UserId::new(1), ChapterId::new(10))
        .await
        .unwrap();
    assert_eq!(results, vec![result.clone(), result]);
}

#[tokio::test]
async fn sqlite_file_database_uses_wal_journal() {
    let path = std::env::temp_dir().join(format!("coursectl-wal-{}.sqlite3", std::process::id()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let repo = SqliteRepository::connect(&url).await.expect("connect");

    let mode: String = sqlx::query_scalar("PRAGMA journal_mode;")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");

    repo.pool().close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

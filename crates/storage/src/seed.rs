//! Built-in demo catalog used by `coursectl seed` and integration tests.

use chrono::{DateTime, Utc};
use course_core::model::{
    AnswerId, AnswerOption, Chapter, ChapterId, Course, CourseId, CourseStatus, Cuisine,
    CuisineId, Question, QuestionId, UserId,
};
use thiserror::Error;

use crate::repository::{Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Domain(#[from] course_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Counts of what a seed run wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub cuisines: usize,
    pub courses: usize,
    pub chapters: usize,
    pub questions: usize,
}

struct ChapterSeed {
    id: u64,
    title: &'static str,
    description: &'static str,
}

struct CuisineSeed {
    id: u64,
    name: &'static str,
    description: &'static str,
}

struct CourseSeed {
    id: u64,
    title: &'static str,
    description: &'static str,
    difficulty: u8,
    status: CourseStatus,
    cuisine_id: u64,
    duration: &'static str,
    chapters: &'static [ChapterSeed],
}

/// Author of every demo course.
pub const DEMO_CREATOR: UserId = UserId::new(1);

const CUISINES: &[CuisineSeed] = &[
    CuisineSeed {
        id: 1,
        name: "Chinese",
        description: "Wok cooking from Yangzhou to Sichuan",
    },
    CuisineSeed {
        id: 2,
        name: "Western",
        description: "Italian and French styles",
    },
    CuisineSeed {
        id: 3,
        name: "Japanese",
        description: "Natural flavours and careful plating",
    },
    CuisineSeed {
        id: 4,
        name: "Korean",
        description: "Heat and fermented foods",
    },
];

struct QuestionSeed {
    id: u64,
    chapter_id: u64,
    text: &'static str,
    order: u32,
    answers: [&'static str; 4],
    correct: usize,
}

const COURSES: &[CourseSeed] = &[
    CourseSeed {
        id: 1,
        title: "Perfect Yangzhou Fried Rice Mastery",
        description: "Separated grains, balanced flavours and restaurant-quality presentation.",
        difficulty: 3,
        status: CourseStatus::Active,
        cuisine_id: 1,
        duration: "45 min",
        chapters: &[
            ChapterSeed {
                id: 1,
                title: "Introduction to Yangzhou Fried Rice",
                description: "History and cultural significance of the dish",
            },
            ChapterSeed {
                id: 2,
                title: "Ingredient Selection and Preparation",
                description: "Selecting and preparing the right ingredients",
            },
            ChapterSeed {
                id: 3,
                title: "Wok Techniques and Cooking",
                description: "Essential wok techniques for fried rice",
            },
            ChapterSeed {
                id: 4,
                title: "Plating and Final Touches",
                description: "Professional plating",
            },
        ],
    },
    CourseSeed {
        id: 2,
        title: "Authentic Kung Pao Chicken",
        description: "Sichuan peppercorn heat, sauce consistency and tender chicken.",
        difficulty: 4,
        status: CourseStatus::Deleted,
        cuisine_id: 1,
        duration: "60 min",
        chapters: &[
            ChapterSeed {
                id: 5,
                title: "Understanding Kung Pao Chicken",
                description: "Origins and variations of the Sichuan classic",
            },
            ChapterSeed {
                id: 6,
                title: "Marinating and Velveting Chicken",
                description: "Tender, juicy chicken",
            },
            ChapterSeed {
                id: 7,
                title: "Preparing the Kung Pao Sauce",
                description: "Sweet, sour and spicy in balance",
            },
            ChapterSeed {
                id: 8,
                title: "Stir-Frying Techniques",
                description: "High-heat wok cooking",
            },
            ChapterSeed {
                id: 9,
                title: "Assembly and Garnishing",
                description: "Assembly and presentation",
            },
        ],
    },
    CourseSeed {
        id: 3,
        title: "Classic Italian Carbonara",
        description: "Roman-style carbonara with silky egg sauce and crispy guanciale.",
        difficulty: 2,
        status: CourseStatus::Active,
        cuisine_id: 2,
        duration: "30 min",
        chapters: &[
            ChapterSeed {
                id: 10,
                title: "Carbonara Fundamentals",
                description: "The Roman recipe and common mistakes",
            },
            ChapterSeed {
                id: 11,
                title: "Cooking Pasta and Guanciale",
                description: "Pasta texture and crispy guanciale",
            },
            ChapterSeed {
                id: 12,
                title: "Creating the Creamy Sauce",
                description: "Egg and cheese emulsion without scrambling",
            },
        ],
    },
];

const QUESTIONS: &[QuestionSeed] = &[
    QuestionSeed {
        id: 1,
        chapter_id: 1,
        text: "What is the key authentic characteristic of Yangzhou Fried Rice?",
        order: 1,
        answers: [
            "Soy sauce heavy color",
            "Gold wrapped silver",
            "Perfectly separated grains with distinct ingredients",
            "Sticky and clumpy texture",
        ],
        correct: 2,
    },
    QuestionSeed {
        id: 2,
        chapter_id: 1,
        text: "Which ingredient is NOT typically found in authentic Yangzhou Fried Rice?",
        order: 2,
        answers: ["Shrimp", "Sea Cucumber", "Chili Paste", "Ham"],
        correct: 2,
    },
    QuestionSeed {
        id: 3,
        chapter_id: 10,
        text: "What is the traditional meat used in Carbonara?",
        order: 1,
        answers: ["Bacon", "Pancetta", "Guanciale", "Prosciutto"],
        correct: 2,
    },
    QuestionSeed {
        id: 4,
        chapter_id: 10,
        text: "Which ingredient should NEVER be added to authentic Roman Carbonara?",
        order: 2,
        answers: ["Pecorino Romano", "Cream", "Black Pepper", "Egg Yolks"],
        correct: 1,
    },
];

/// Builds the demo cuisines.
///
/// # Errors
///
/// Returns `course_core::Error` if a seed entry fails validation.
pub fn demo_cuisines(now: DateTime<Utc>) -> Result<Vec<Cuisine>, course_core::Error> {
    CUISINES
        .iter()
        .map(|seed| {
            Cuisine::new(
                CuisineId::new(seed.id),
                seed.name,
                Some(seed.description.to_owned()),
                now,
            )
            .map_err(course_core::Error::from)
        })
        .collect()
}

/// Builds the demo courses.
///
/// # Errors
///
/// Returns `course_core::Error` if a seed entry fails validation.
pub fn demo_courses(now: DateTime<Utc>) -> Result<Vec<Course>, course_core::Error> {
    COURSES
        .iter()
        .map(|seed| -> Result<Course, course_core::Error> {
            let chapters = seed
                .chapters
                .iter()
                .zip(1_u32..)
                .map(|(chapter, order)| {
                    let video = format!("https://www.youtube.com/watch?v=example{}", chapter.id);
                    Chapter::new(
                        ChapterId::new(chapter.id),
                        CourseId::new(seed.id),
                        order,
                        chapter.title,
                        Some(chapter.description.to_owned()),
                        Some(video.as_str()),
                        now,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            let image = format!("https://images.example.com/courses/{}.jpg", seed.id);
            Ok(Course::new(
                CourseId::new(seed.id),
                seed.title,
                Some(seed.description.to_owned()),
                seed.difficulty,
                seed.status,
                chapters,
                now,
            )?
            .with_cuisine(CuisineId::new(seed.cuisine_id))
            .with_creator(DEMO_CREATOR)
            .with_duration(seed.duration)
            .with_image_url(&image)?)
        })
        .collect()
}

/// Builds the demo quiz questions.
///
/// # Errors
///
/// Returns `course_core::Error` if a seed entry fails validation.
pub fn demo_questions() -> Result<Vec<Question>, course_core::Error> {
    QUESTIONS
        .iter()
        .map(|seed| -> Result<Question, course_core::Error> {
            let answers = seed
                .answers
                .iter()
                .zip(0_u64..)
                .map(|(text, idx)| {
                    AnswerOption::new(
                        AnswerId::new(seed.id * 10 + idx),
                        *text,
                        usize::try_from(idx).is_ok_and(|i| i == seed.correct),
                        u32::try_from(idx + 1).unwrap_or(u32::MAX),
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Question::new(
                QuestionId::new(seed.id),
                ChapterId::new(seed.chapter_id),
                seed.text,
                seed.order,
                answers,
            )?)
        })
        .collect()
}

/// Writes the demo catalog into `storage`. Safe to run repeatedly.
///
/// # Errors
///
/// Returns `SeedError` if validation or persistence fails.
pub async fn seed_demo_catalog(
    storage: &Storage,
    now: DateTime<Utc>,
) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    for cuisine in demo_cuisines(now)? {
        storage.cuisines.upsert_cuisine(&cuisine).await?;
        summary.cuisines += 1;
    }
    for course in demo_courses(now)? {
        storage.courses.upsert_course(&course).await?;
        summary.courses += 1;
        summary.chapters += course.total_chapters();
    }
    for question in demo_questions()? {
        storage.quizzes.upsert_question(&question).await?;
        summary.questions += 1;
    }

    tracing::info!(
        cuisines = summary.cuisines,
        courses = summary.courses,
        chapters = summary.chapters,
        questions = summary.questions,
        "seeded demo catalog"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::CourseFilter;
    use course_core::time::fixed_now;

    #[test]
    fn demo_catalog_is_valid() {
        let courses = demo_courses(fixed_now()).unwrap();
        assert_eq!(courses.len(), 3);
        assert_eq!(courses[0].total_chapters(), 4);
        assert_eq!(courses[1].status(), CourseStatus::Deleted);
        assert_eq!(courses[2].cuisine_id(), Some(CuisineId::new(2)));
        assert!(courses.iter().all(|c| c.creator_id() == Some(DEMO_CREATOR)));
        assert_eq!(demo_cuisines(fixed_now()).unwrap().len(), 4);

        let questions = demo_questions().unwrap();
        assert_eq!(questions.len(), 4);
        assert!(questions[0].is_correct(AnswerId::new(12)));
        assert!(questions[3].is_correct(AnswerId::new(41)));
    }

    #[tokio::test]
    async fn seeding_twice_is_harmless() {
        let storage = Storage::in_memory();
        let first = seed_demo_catalog(&storage, fixed_now()).await.unwrap();
        let second = seed_demo_catalog(&storage, fixed_now()).await.unwrap();
        assert_eq!(first, second);

        assert_eq!(first.cuisines, 4);

        let listed = storage
            .courses
            .list_courses(&CourseFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);
        let chinese = CourseFilter::active().with_cuisine(CuisineId::new(1));
        let ids: Vec<CourseId> = storage
            .courses
            .list_courses(&chinese, 10)
            .await
            .unwrap()
            .iter()
            .map(Course::id)
            .collect();
        assert_eq!(ids, vec![CourseId::new(1)]);
        let questions = storage.quizzes.list_questions(ChapterId::new(1)).await.unwrap();
        assert_eq!(questions.len(), 2);
    }
}

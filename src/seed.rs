use crate::{auth, db::Store, error::ApiError, models::Question};

const DEMO_PASSWORD: &str = "password123";

/// Loads a demo instructor, student, course, two lessons and a quiz.
pub async fn demo_data(db: &Store) -> Result<(), ApiError> {
    let hash = auth::hash_password(DEMO_PASSWORD)?;
    let instructor = db.create_user("instructor", "instructor@example.com", &hash).await;
    db.create_user("student", "student@example.com", &hash).await;

    let course = db
        .create_course(
            "Introduction to Python",
            "Learn the basics of Python programming language",
            instructor.id,
        )
        .await;
    let first = db
        .create_lesson(
            course.id,
            "Getting Started with Python",
            "Python is a high-level, interpreted programming language...",
            1,
        )
        .await;
    db.create_lesson(
        course.id,
        "Variables and Data Types",
        "In Python, variables are created when you assign a value to it...",
        2,
    )
    .await;

    db.create_quiz(
        first.id,
        "Python Basics Quiz",
        vec![
            question(
                "What is Python?",
                &["A snake", "A programming language", "A web framework", "A database"],
                1,
            ),
            question(
                "Which of the following is not a Python data type?",
                &["Integer", "Float", "Character", "String"],
                2,
            ),
        ],
    )
    .await;

    tracing::info!(course_id=%course.id, "seeded demo data");
    Ok(())
}

fn question(text: &str, options: &[&str], correct: usize) -> Question {
    Question {
        question: text.to_owned(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_option_index: correct,
    }
}

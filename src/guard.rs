//! Reference resolution and instructor checks for course sub-resources.
//! Existence is always checked before ownership.

use uuid::Uuid;

use crate::{
    db::Store,
    error::ApiError,
    models::{Course, Lesson, Quiz},
};

pub async fn course_or_404(db: &Store, course_id: Uuid) -> Result<Course, ApiError> {
    db.get_course(course_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))
}

/// A lesson that exists but sits under another course is reported as missing.
pub async fn lesson_in_course(db: &Store, course: &Course, lesson_id: Uuid) -> Result<Lesson, ApiError> {
    db.get_lesson(lesson_id)
        .await
        .filter(|l| l.course_id == course.id)
        .ok_or_else(|| ApiError::NotFound("Lesson not found".into()))
}

pub async fn quiz_in_lesson(db: &Store, lesson: &Lesson, quiz_id: Uuid) -> Result<Quiz, ApiError> {
    db.get_quiz(quiz_id)
        .await
        .filter(|q| q.lesson_id == lesson.id)
        .ok_or_else(|| ApiError::NotFound("Quiz not found".into()))
}

pub fn ensure_instructor(course: &Course, acting_user: Uuid, what: &str) -> Result<(), ApiError> {
    if course.instructor_id != acting_user {
        return Err(ApiError::Forbidden(format!(
            "Only the course instructor can add {what}"
        )));
    }
    Ok(())
}

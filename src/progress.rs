//! Course completion tracking.
//!
//! `overall_progress` is recomputed from scratch on every update against the
//! lessons the course has at that moment, so completions recorded for
//! lessons that are gone drop out of both sides of the ratio.

use uuid::Uuid;

use crate::{db::Store, models::CourseProgress};

/// Sets the completion flag for one lesson and returns the refreshed record.
pub async fn update_progress(
    db: &Store,
    user_id: Uuid,
    course_id: Uuid,
    lesson_id: Uuid,
    completed: bool,
) -> CourseProgress {
    db.with_progress(user_id, course_id, |progress, lesson_ids| {
        progress.lessons_completed.insert(lesson_id, completed);
        progress.overall_progress = overall_progress(progress, lesson_ids);
        progress.clone()
    })
    .await
}

/// The stored record, or an empty one that is not persisted.
pub async fn get_progress(db: &Store, user_id: Uuid, course_id: Uuid) -> CourseProgress {
    db.get_progress_record(user_id, course_id)
        .await
        .unwrap_or_else(|| CourseProgress::empty(user_id, course_id))
}

pub fn overall_progress(progress: &CourseProgress, lesson_ids: &[Uuid]) -> f64 {
    if lesson_ids.is_empty() {
        return 0.0;
    }
    let done = lesson_ids
        .iter()
        .filter(|id| progress.lessons_completed.get(*id).copied().unwrap_or(false))
        .count();
    100.0 * done as f64 / lesson_ids.len() as f64
}

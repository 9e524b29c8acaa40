use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Course, CourseProgress, Lesson, Question, Quiz, QuizAttempt, User};

pub type Db = Arc<Store>;

pub fn connect() -> Db {
    Arc::new(Store::default())
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    quizzes: Vec<Quiz>,
    // user_id -> attempts, in submission order
    attempts: HashMap<Uuid, Vec<QuizAttempt>>,
    progress: HashMap<(Uuid, Uuid), CourseProgress>,
}

/// Process-local holder of every entity. Stores what it is given; parent
/// references and uniqueness are the caller's business.
#[derive(Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    // --- users ---

    pub async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: Utc::now(),
        };
        self.tables.write().await.users.push(user.clone());
        user
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Option<User> {
        self.find_user(|u| u.id == id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.find_user(|u| u.email == email).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.find_user(|u| u.username == username).await
    }

    async fn find_user(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.tables.read().await.users.iter().find(|u| pred(*u)).cloned()
    }

    // --- courses ---

    pub async fn create_course(&self, title: &str, description: &str, instructor_id: Uuid) -> Course {
        let course = Course {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            description: description.to_owned(),
            instructor_id,
            created_at: Utc::now(),
        };
        self.tables.write().await.courses.push(course.clone());
        course
    }

    pub async fn get_course(&self, id: Uuid) -> Option<Course> {
        self.tables.read().await.courses.iter().find(|c| c.id == id).cloned()
    }

    pub async fn list_courses(&self) -> Vec<Course> {
        self.tables.read().await.courses.clone()
    }

    // --- lessons ---

    pub async fn create_lesson(&self, course_id: Uuid, title: &str, content: &str, order: i64) -> Lesson {
        let lesson = Lesson {
            id: Uuid::new_v4(),
            course_id,
            title: title.to_owned(),
            content: content.to_owned(),
            order,
            created_at: Utc::now(),
        };
        self.tables.write().await.lessons.push(lesson.clone());
        lesson
    }

    pub async fn get_lesson(&self, id: Uuid) -> Option<Lesson> {
        self.tables.read().await.lessons.iter().find(|l| l.id == id).cloned()
    }

    /// Insertion order; `order` is left for the caller to interpret.
    pub async fn get_lessons_by_course(&self, course_id: Uuid) -> Vec<Lesson> {
        self.tables
            .read()
            .await
            .lessons
            .iter()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect()
    }

    /// No endpoint reaches this. Progress records are left as they are.
    pub async fn remove_lesson(&self, id: Uuid) -> Option<Lesson> {
        let mut t = self.tables.write().await;
        let idx = t.lessons.iter().position(|l| l.id == id)?;
        Some(t.lessons.remove(idx))
    }

    // --- quizzes ---

    pub async fn create_quiz(&self, lesson_id: Uuid, title: &str, questions: Vec<Question>) -> Quiz {
        let quiz = Quiz {
            id: Uuid::new_v4(),
            lesson_id,
            title: title.to_owned(),
            questions,
            created_at: Utc::now(),
        };
        self.tables.write().await.quizzes.push(quiz.clone());
        quiz
    }

    pub async fn get_quiz(&self, id: Uuid) -> Option<Quiz> {
        self.tables.read().await.quizzes.iter().find(|q| q.id == id).cloned()
    }

    pub async fn get_quizzes_by_lesson(&self, lesson_id: Uuid) -> Vec<Quiz> {
        self.tables
            .read()
            .await
            .quizzes
            .iter()
            .filter(|q| q.lesson_id == lesson_id)
            .cloned()
            .collect()
    }

    // --- attempts ---

    pub async fn record_quiz_attempt(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        answers: Vec<usize>,
        score: f64,
    ) -> QuizAttempt {
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            user_id,
            quiz_id,
            answers,
            score,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .attempts
            .entry(user_id)
            .or_default()
            .push(attempt.clone());
        attempt
    }

    pub async fn get_quiz_attempts_by_user(&self, user_id: Uuid) -> Vec<QuizAttempt> {
        self.tables
            .read()
            .await
            .attempts
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    // --- progress ---

    pub async fn get_progress_record(&self, user_id: Uuid, course_id: Uuid) -> Option<CourseProgress> {
        self.tables.read().await.progress.get(&(user_id, course_id)).cloned()
    }

    pub async fn list_progress_by_user(&self, user_id: Uuid) -> Vec<CourseProgress> {
        let t = self.tables.read().await;
        let mut out: Vec<CourseProgress> = t
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|p| p.course_id);
        out
    }

    /// Runs `f` on the (user, course) record, creating an empty one first if
    /// needed, together with the ids of the lessons the course has right now.
    /// The whole read-modify-write happens under one write lock.
    pub async fn with_progress<R>(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        f: impl FnOnce(&mut CourseProgress, &[Uuid]) -> R,
    ) -> R {
        let mut guard = self.tables.write().await;
        let t = &mut *guard;
        let lesson_ids: Vec<Uuid> = t
            .lessons
            .iter()
            .filter(|l| l.course_id == course_id)
            .map(|l| l.id)
            .collect();
        let record = t
            .progress
            .entry((user_id, course_id))
            .or_insert_with(|| CourseProgress::empty(user_id, course_id));
        f(record, &lesson_ids)
    }
}

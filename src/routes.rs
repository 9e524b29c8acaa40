use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    routing::{get, post},
    Form, Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::{self, AuthUser, TokenKeys},
    config::Config,
    db::Db,
    error::ApiError,
    guard, progress,
    models::*,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(db: Db, cfg: &Config) -> Self {
        AppState {
            db,
            tokens: TokenKeys::new(&cfg.jwt_secret, cfg.token_expire_minutes),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        // auth
        .route("/auth/register", post(register))
        .route("/auth/token", post(login))
        .route("/auth/me", get(me))
        // courses
        .route("/courses", post(create_course).get(list_courses))
        .route("/courses/:course_id", get(get_course))
        .route("/courses/:course_id/lessons", post(create_lesson).get(list_lessons))
        .route("/courses/:course_id/lessons/:lesson_id", get(get_lesson))
        .route(
            "/courses/:course_id/lessons/:lesson_id/quizzes",
            post(create_quiz).get(list_quizzes),
        )
        .route(
            "/courses/:course_id/lessons/:lesson_id/quizzes/:quiz_id/attempts",
            post(submit_attempt),
        )
        // progress
        .route("/courses/:course_id/progress", post(update_progress).get(get_progress))
        .route("/me/progress", get(my_progress))
        .route("/me/attempts", get(my_attempts))
        .with_state(state)
}

// --- auth ---

async fn register(
    State(st): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> Result<Json<PublicUser>, ApiError> {
    if st.db.get_user_by_email(&req.email).await.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }
    if st.db.get_user_by_username(&req.username).await.is_some() {
        return Err(ApiError::Conflict("Username already taken".into()));
    }

    let hash = auth::hash_password(&req.password)?;
    let user = st.db.create_user(&req.username, &req.email, &hash).await;
    tracing::info!(user_id=%user.id, username=%user.username, "registered user");
    Ok(Json(PublicUser::from(&user)))
}

async fn login(
    State(st): State<AppState>,
    form: LoginForm,
) -> Result<Json<TokenResponse>, ApiError> {
    // the form's username field carries the email
    let user = st
        .db
        .get_user_by_email(&form.username)
        .await
        .filter(|u| auth::verify_password(&form.password, &u.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Incorrect email or password".into()))?;

    Ok(Json(TokenResponse {
        access_token: st.tokens.issue(user.id)?,
        token_type: "bearer".into(),
    }))
}

async fn me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

/// Accepts the credentials either url-encoded or as multipart form data.
#[async_trait]
impl<S: Send + Sync> FromRequest<S> for LoginForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(form) = Form::<LoginForm>::from_request(req, state).await.map_err(e422)?;
            return Ok(form);
        }

        let mut mp = Multipart::from_request(req, state).await.map_err(e422)?;
        let (mut username, mut password) = (None, None);
        while let Some(field) = mp.next_field().await.map_err(e422)? {
            let name = field.name().unwrap_or("").to_string();
            if name == "username" {
                username = Some(field.text().await.map_err(e422)?);
            } else if name == "password" {
                password = Some(field.text().await.map_err(e422)?);
            }
        }
        match (username, password) {
            (Some(username), Some(password)) => Ok(LoginForm { username, password }),
            _ => Err(e422("username and password are required")),
        }
    }
}

// --- courses & lessons ---

async fn create_course(
    State(st): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateCourseReq>,
) -> Json<Course> {
    let course = st.db.create_course(&req.title, &req.description, user.id).await;
    tracing::info!(course_id=%course.id, instructor_id=%user.id, "created course");
    Json(course)
}

async fn list_courses(State(st): State<AppState>) -> Json<Vec<Course>> {
    Json(st.db.list_courses().await)
}

async fn get_course(
    State(st): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Course>, ApiError> {
    Ok(Json(guard::course_or_404(&st.db, course_id).await?))
}

async fn create_lesson(
    State(st): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateLessonReq>,
) -> Result<Json<Lesson>, ApiError> {
    let course = guard::course_or_404(&st.db, course_id).await?;
    guard::ensure_instructor(&course, user.id, "lessons")?;

    let lesson = st
        .db
        .create_lesson(course.id, &req.title, &req.content, req.order)
        .await;
    tracing::info!(lesson_id=%lesson.id, course_id=%course.id, "created lesson");
    Ok(Json(lesson))
}

async fn list_lessons(
    State(st): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    let course = guard::course_or_404(&st.db, course_id).await?;
    Ok(Json(st.db.get_lessons_by_course(course.id).await))
}

async fn get_lesson(
    State(st): State<AppState>,
    Path((course_id, lesson_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Lesson>, ApiError> {
    let course = guard::course_or_404(&st.db, course_id).await?;
    Ok(Json(guard::lesson_in_course(&st.db, &course, lesson_id).await?))
}

// --- quizzes ---

async fn create_quiz(
    State(st): State<AppState>,
    AuthUser(user): AuthUser,
    Path((course_id, lesson_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateQuizReq>,
) -> Result<Json<Quiz>, ApiError> {
    let course = guard::course_or_404(&st.db, course_id).await?;
    let lesson = guard::lesson_in_course(&st.db, &course, lesson_id).await?;
    guard::ensure_instructor(&course, user.id, "quizzes")?;

    let quiz = st.db.create_quiz(lesson.id, &req.title, req.questions).await;
    tracing::info!(quiz_id=%quiz.id, lesson_id=%lesson.id, "created quiz");
    Ok(Json(quiz))
}

async fn list_quizzes(
    State(st): State<AppState>,
    Path((course_id, lesson_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<Quiz>>, ApiError> {
    let course = guard::course_or_404(&st.db, course_id).await?;
    let lesson = guard::lesson_in_course(&st.db, &course, lesson_id).await?;
    Ok(Json(st.db.get_quizzes_by_lesson(lesson.id).await))
}

async fn submit_attempt(
    State(st): State<AppState>,
    AuthUser(user): AuthUser,
    Path((course_id, lesson_id, quiz_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<SubmitAttemptReq>,
) -> Result<Json<QuizAttempt>, ApiError> {
    let course = guard::course_or_404(&st.db, course_id).await?;
    let lesson = guard::lesson_in_course(&st.db, &course, lesson_id).await?;
    let quiz = guard::quiz_in_lesson(&st.db, &lesson, quiz_id).await?;

    if req.answers.len() != quiz.questions.len() {
        return Err(e422(format!(
            "expected {} answers, got {}",
            quiz.questions.len(),
            req.answers.len()
        )));
    }
    let score = quiz.score(&req.answers);
    let attempt = st
        .db
        .record_quiz_attempt(user.id, quiz.id, req.answers, score)
        .await;
    tracing::info!(attempt_id=%attempt.id, quiz_id=%quiz.id, score, "recorded quiz attempt");
    Ok(Json(attempt))
}

async fn my_attempts(State(st): State<AppState>, AuthUser(user): AuthUser) -> Json<Vec<QuizAttempt>> {
    Json(st.db.get_quiz_attempts_by_user(user.id).await)
}

// --- progress ---

async fn update_progress(
    State(st): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<Uuid>,
    Json(req): Json<ProgressUpdateReq>,
) -> Result<Json<CourseProgress>, ApiError> {
    let course = guard::course_or_404(&st.db, course_id).await?;
    let lesson = guard::lesson_in_course(&st.db, &course, req.lesson_id).await?;

    let p = progress::update_progress(&st.db, user.id, course.id, lesson.id, req.completed).await;
    tracing::debug!(user_id=%user.id, course_id=%course.id, overall=p.overall_progress, "progress updated");
    Ok(Json(p))
}

async fn get_progress(
    State(st): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseProgress>, ApiError> {
    let course = guard::course_or_404(&st.db, course_id).await?;
    Ok(Json(progress::get_progress(&st.db, user.id, course.id).await))
}

async fn my_progress(State(st): State<AppState>, AuthUser(user): AuthUser) -> Json<Vec<CourseProgress>> {
    Json(st.db.list_progress_by_user(user.id).await)
}

// --- helpers ---
fn e422<E: std::fmt::Display>(e: E) -> ApiError {
    ApiError::Validation(e.to_string())
}

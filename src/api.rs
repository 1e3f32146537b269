use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Json, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::db::Db;
use crate::error::StoreError;
use crate::models::{
    AnswerEvent, Direction, DueItem, Learner, LearnerStatistics, ProgressRecord, StudyMode, Word,
};
use crate::session::{AnswerOutcome, Prompt, StudySession};

#[derive(Clone)]
pub struct ApiState {
    pub db: Db,
    pub batch_size: u32,
    pub session_ttl: Duration,
    sessions: Arc<Mutex<HashMap<Uuid, Arc<Mutex<StudySession>>>>>,
}

impl ApiState {
    pub fn new(db: Db, batch_size: u32) -> Self {
        Self {
            db,
            batch_size,
            session_ttl: Config::default().session_ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Drops sessions nobody has touched within the TTL. A session busy with a request is kept.
    async fn evict_idle_sessions(&self, now: DateTime<Utc>) {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => !session.is_idle(now, self.session_ttl),
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            log::info!("evicted {} idle session(s)", evicted);
        }
    }

    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<StudySession>>, ApiError> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("session {}", id)))
    }
}

pub enum ApiError {
    Store(StoreError),
    NotFound(String),
    BadRequest(String),
    /// The request could not be extracted (bad body, path or query).
    Rejected(StatusCode, String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

// Extractors that answer with the same `{"error": ...}` body as every other failure.

#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
struct ApiPath<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
struct ApiQuery<T>(T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Rejected(status, message) => (status, message),
            ApiError::Store(e) => {
                let status = match &e {
                    StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    StoreError::Conflict(_) => StatusCode::CONFLICT,
                    StoreError::Encoding(_) | StoreError::Database(_) => {
                        log::error!("request failed: {}", e);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn app_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/words", get(list_words).post(add_word))
        .route("/api/levels", get(levels))
        .route("/api/learners", get(find_learner).post(create_learner))
        .route("/api/learners/:learner_id/due", get(due_words))
        .route("/api/learners/:learner_id/due/count", get(count_due))
        .route("/api/learners/:learner_id/progress/:word_id", get(word_progress))
        .route("/api/learners/:learner_id/answers", post(record_answer))
        .route("/api/learners/:learner_id/events", get(events))
        .route("/api/learners/:learner_id/statistics", get(statistics))
        .route("/api/learners/:learner_id/progress", delete(reset_progress))
        .route("/api/learners/:learner_id/state", get(all_states).delete(clear_all_states))
        .route(
            "/api/learners/:learner_id/state/:key",
            get(load_state).put(save_state).delete(clear_state),
        )
        .route("/api/learners/:learner_id/sessions", post(start_session))
        .route("/api/sessions/:session_id", get(current_prompt).delete(end_session))
        .route("/api/sessions/:session_id/answer", post(submit_answer))
        .route("/api/sessions/:session_id/reveal", post(reveal_answer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn require_learner(state: &ApiState, learner_id: i64) -> Result<(), ApiError> {
    match state.db.get_learner(learner_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("learner {}", learner_id))),
    }
}

#[derive(Deserialize)]
struct LevelQuery {
    level: Option<String>,
}

async fn list_words(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<LevelQuery>,
) -> ApiResult<Vec<Word>> {
    Ok(Json(state.db.list_words(query.level.as_deref()).await?))
}

#[derive(Deserialize)]
struct AddWordRequest {
    term: String,
    pronunciation: Option<String>,
    meaning: String,
    level: String,
}

async fn add_word(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<AddWordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.term.trim().is_empty() || payload.meaning.trim().is_empty() {
        return Err(ApiError::BadRequest("term and meaning are required".to_string()));
    }
    let word = state
        .db
        .add_word(
            payload.term.trim(),
            payload.pronunciation.as_deref(),
            payload.meaning.trim(),
            payload.level.trim(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(word)))
}

async fn levels(State(state): State<ApiState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.db.levels().await?))
}

#[derive(Deserialize)]
struct NameQuery {
    name: String,
}

async fn find_learner(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<NameQuery>,
) -> ApiResult<Learner> {
    match state.db.find_learner(&query.name).await? {
        Some(learner) => Ok(Json(learner)),
        None => Err(ApiError::NotFound(format!("learner '{}'", query.name))),
    }
}

#[derive(Deserialize)]
struct CreateLearnerRequest {
    name: String,
}

async fn create_learner(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<CreateLearnerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("learner name must not be empty".to_string()));
    }
    let learner = state.db.create_learner(name).await?;
    Ok((StatusCode::CREATED, Json(learner)))
}

#[derive(Deserialize)]
struct DueQuery {
    limit: Option<u32>,
    level: Option<String>,
}

async fn due_words(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<DueQuery>,
) -> ApiResult<Vec<DueItem>> {
    require_learner(&state, learner_id).await?;
    let limit = query.limit.unwrap_or(state.batch_size);
    let items = state
        .db
        .query_due(learner_id, Utc::now(), limit, query.level.as_deref())
        .await?;
    Ok(Json(items))
}

async fn count_due(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<LevelQuery>,
) -> ApiResult<serde_json::Value> {
    require_learner(&state, learner_id).await?;
    let due = state
        .db
        .count_due(learner_id, Utc::now(), query.level.as_deref())
        .await?;
    Ok(Json(json!({ "due": due })))
}

/// A word the learner has never answered reports the fresh record.
async fn word_progress(
    State(state): State<ApiState>,
    ApiPath((learner_id, word_id)): ApiPath<(i64, i64)>,
) -> ApiResult<ProgressRecord> {
    require_learner(&state, learner_id).await?;
    if state.db.get_word(word_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("word {}", word_id)));
    }
    let record = state
        .db
        .get_progress(learner_id, word_id)
        .await?
        .unwrap_or_else(ProgressRecord::fresh);
    Ok(Json(record))
}

#[derive(Deserialize)]
struct AnswerRequest {
    word_id: i64,
    correct: bool,
    mode: Direction,
}

async fn record_answer(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AnswerRequest>,
) -> ApiResult<ProgressRecord> {
    let record = state
        .db
        .record_answer(learner_id, payload.word_id, payload.correct, payload.mode, Utc::now())
        .await?;
    Ok(Json(record))
}

#[derive(Deserialize)]
struct EventsQuery {
    limit: Option<u32>,
}

async fn events(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<EventsQuery>,
) -> ApiResult<Vec<AnswerEvent>> {
    require_learner(&state, learner_id).await?;
    let limit = query.limit.unwrap_or(50);
    Ok(Json(state.db.events(learner_id, limit).await?))
}

async fn statistics(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
) -> ApiResult<LearnerStatistics> {
    require_learner(&state, learner_id).await?;
    Ok(Json(state.db.statistics(learner_id, Utc::now()).await?))
}

async fn reset_progress(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
) -> ApiResult<serde_json::Value> {
    require_learner(&state, learner_id).await?;
    let removed = state.db.reset_progress(learner_id).await?;
    Ok(Json(json!({ "removed": removed })))
}

async fn all_states(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
) -> ApiResult<BTreeMap<String, serde_json::Value>> {
    require_learner(&state, learner_id).await?;
    Ok(Json(state.db.all_states(learner_id).await?))
}

async fn clear_all_states(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
) -> ApiResult<serde_json::Value> {
    require_learner(&state, learner_id).await?;
    let removed = state.db.clear_state(learner_id, None).await?;
    Ok(Json(json!({ "removed": removed })))
}

async fn load_state(
    State(state): State<ApiState>,
    ApiPath((learner_id, key)): ApiPath<(i64, String)>,
) -> ApiResult<serde_json::Value> {
    require_learner(&state, learner_id).await?;
    match state.db.load_state(learner_id, &key).await? {
        Some(value) => Ok(Json(value)),
        None => Err(ApiError::NotFound(format!("state '{}'", key))),
    }
}

async fn save_state(
    State(state): State<ApiState>,
    ApiPath((learner_id, key)): ApiPath<(i64, String)>,
    ApiJson(value): ApiJson<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    require_learner(&state, learner_id).await?;
    state.db.save_state(learner_id, &key, &value).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_state(
    State(state): State<ApiState>,
    ApiPath((learner_id, key)): ApiPath<(i64, String)>,
) -> ApiResult<serde_json::Value> {
    require_learner(&state, learner_id).await?;
    let removed = state.db.clear_state(learner_id, Some(&key)).await?;
    Ok(Json(json!({ "removed": removed })))
}

#[derive(Deserialize)]
struct StartSessionRequest {
    #[serde(default)]
    mode: StudyMode,
    level: Option<String>,
    limit: Option<u32>,
}

#[derive(Serialize)]
struct SessionView {
    session_id: Uuid,
    total: usize,
    remaining: usize,
    finished: bool,
    prompt: Option<Prompt>,
}

impl SessionView {
    fn of(session: &StudySession) -> Self {
        Self {
            session_id: session.id,
            total: session.total(),
            remaining: session.remaining(),
            finished: session.is_finished(),
            prompt: session.current(),
        }
    }
}

async fn start_session(
    State(state): State<ApiState>,
    ApiPath(learner_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<StartSessionRequest>,
) -> ApiResult<SessionView> {
    require_learner(&state, learner_id).await?;
    let now = Utc::now();
    let limit = payload.limit.unwrap_or(state.batch_size);
    let session = StudySession::start(&state.db, learner_id, payload.mode, payload.level, limit, now).await?;
    state.evict_idle_sessions(now).await;

    let view = SessionView::of(&session);
    // An empty batch is a finished session, not an error; there is nothing to keep around.
    if !session.is_finished() {
        state
            .sessions
            .lock()
            .await
            .insert(session.id, Arc::new(Mutex::new(session)));
    }
    Ok(Json(view))
}

async fn current_prompt(
    State(state): State<ApiState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<SessionView> {
    let handle = state.session(session_id).await?;
    let mut session = handle.lock().await;
    session.touch(Utc::now());
    Ok(Json(SessionView::of(&session)))
}

async fn end_session(
    State(state): State<ApiState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.lock().await.remove(&session_id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound(format!("session {}", session_id))),
    }
}

#[derive(Deserialize)]
struct SubmitRequest {
    answer: String,
}

#[derive(Serialize)]
struct SubmitResponse {
    outcome: AnswerOutcome,
    next: SessionView,
}

async fn submit_answer(
    State(state): State<ApiState>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<SubmitRequest>,
) -> ApiResult<SubmitResponse> {
    let handle = state.session(session_id).await?;
    let mut session = handle.lock().await;
    let outcome = session
        .submit(&state.db, &payload.answer, Utc::now())
        .await?
        .ok_or_else(|| ApiError::BadRequest("session is already finished".to_string()))?;
    finish_if_done(&state, &session).await;
    Ok(Json(SubmitResponse {
        next: SessionView::of(&session),
        outcome,
    }))
}

async fn reveal_answer(
    State(state): State<ApiState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<SubmitResponse> {
    let handle = state.session(session_id).await?;
    let mut session = handle.lock().await;
    let outcome = session
        .reveal(&state.db, Utc::now())
        .await?
        .ok_or_else(|| ApiError::BadRequest("session is already finished".to_string()))?;
    finish_if_done(&state, &session).await;
    Ok(Json(SubmitResponse {
        next: SessionView::of(&session),
        outcome,
    }))
}

async fn finish_if_done(state: &ApiState, session: &StudySession) {
    if session.is_finished() {
        state.sessions.lock().await.remove(&session.id);
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;

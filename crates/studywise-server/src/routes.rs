//! Request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use studywise_core::{
    grade, Analysis, ExtractError, GeminiClient, GenerativeError, PomodoroSession, QuizQuestion,
    QuizScore, SessionRecord, SessionStats,
};

use crate::error::ApiError;
use crate::upload::Upload;
use crate::AppState;

type Shared = State<Arc<AppState>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ai_configured: bool,
}

pub async fn health(State(state): Shared) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        ai_configured: state.gemini.is_some(),
    })
}

fn gemini(state: &AppState) -> Result<&GeminiClient, ApiError> {
    state
        .gemini
        .as_ref()
        .ok_or(ApiError::Generative(GenerativeError::MissingCredential))
}

/// POST /upload-and-analyze
pub async fn upload_and_analyze(
    State(state): Shared,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Analysis>, ApiError> {
    let upload = Upload::receive(multipart, &state.upload_dir).await?;
    let text = upload.text().await?;
    // Spooled file is no longer needed once the text is out.
    drop(upload);

    let analysis = gemini(&state)?.analyze(&text).await?;
    tracing::info!(
        summary_chars = analysis.summary.len(),
        questions = analysis.quiz.len(),
        "Document analyzed"
    );
    Ok(Json(analysis))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub notes: String,
}

/// POST /analyze with pasted notes.
pub async fn analyze_notes(
    State(state): Shared,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Analysis>, ApiError> {
    if req.notes.trim().is_empty() {
        return Err(ExtractError::Empty.into());
    }
    let analysis = gemini(&state)?.analyze(&req.notes).await?;
    Ok(Json(analysis))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub text: String,
}

/// POST /extract
pub async fn extract_text(
    State(state): Shared,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let upload = Upload::receive(multipart, &state.upload_dir).await?;
    let text = upload.text().await?;
    Ok(Json(ExtractResponse { text }))
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub answers: HashMap<usize, String>,
}

/// POST /quiz/grade
pub async fn grade_quiz(Json(req): Json<GradeRequest>) -> Json<QuizScore> {
    Json(grade(&req.quiz, &req.answers))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Appended {
    pub id: i64,
}

/// POST /users/:user_id/sessions
pub async fn append_session(
    State(state): Shared,
    Path(user_id): Path<String>,
    Json(session): Json<PomodoroSession>,
) -> Result<(StatusCode, Json<Appended>), ApiError> {
    if session.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("Session subject must not be empty.".into()));
    }
    if session.duration_minutes == 0 {
        return Err(ApiError::BadRequest("Session duration must be at least one minute.".into()));
    }

    let log = state.sessions.clone();
    let id = tokio::task::spawn_blocking(move || log.append(&user_id, &session))
        .await
        .map_err(|e| ApiError::Internal(format!("session log task failed: {e}")))??;
    Ok((StatusCode::CREATED, Json(Appended { id })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// GET /users/:user_id/sessions
pub async fn list_sessions(
    State(state): Shared,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SessionRecord>>, ApiError> {
    let log = state.sessions.clone();
    let records = tokio::task::spawn_blocking(move || log.list(&user_id, query.limit))
        .await
        .map_err(|e| ApiError::Internal(format!("session log task failed: {e}")))??;
    Ok(Json(records))
}

/// GET /users/:user_id/stats
pub async fn session_stats(
    State(state): Shared,
    Path(user_id): Path<String>,
) -> Result<Json<SessionStats>, ApiError> {
    let log = state.sessions.clone();
    let stats = tokio::task::spawn_blocking(move || log.stats(&user_id))
        .await
        .map_err(|e| ApiError::Internal(format!("session log task failed: {e}")))??;
    Ok(Json(stats))
}

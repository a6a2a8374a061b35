// Interview HTTP routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use intervo_core::{
    AdvanceOutput, CandidateInput, EngineError, InterviewerEvent, ReportEvent, Session,
    StageMachine,
};

/// App state for interview routes
#[derive(Clone)]
pub struct AppState {
    pub machine: Arc<StageMachine>,
}

impl AppState {
    pub fn new(machine: Arc<StageMachine>) -> Self {
        Self { machine }
    }
}

/// Create interview routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/interviews", post(create_interview))
        .route(
            "/v1/interviews/:interview_id",
            get(get_interview).delete(delete_interview),
        )
        .route("/v1/interviews/:interview_id/messages", post(post_message))
        .route("/v1/interviews/:interview_id/code", post(post_code))
        .route("/v1/interviews/:interview_id/report", get(get_report))
        .with_state(state)
}

/// Request to start a new interview session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateInterviewRequest {
    /// Target role, e.g. "Backend Developer"
    #[schema(example = "Backend Developer")]
    pub role: String,
    #[schema(example = "Alex")]
    pub candidate_name: String,
}

/// A freshly created session plus its opening greeting
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateInterviewResponse {
    pub session: Session,
    pub event: InterviewerEvent,
}

/// One candidate voice message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub text: String,
}

/// One candidate code submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostCodeRequest {
    pub code: String,
    /// Language tag, e.g. "python" or "javascript"
    #[schema(example = "python")]
    pub language: String,
    pub explanation: Option<String>,
}

fn error_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::UnsupportedLanguage(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /v1/interviews - Start a new interview session
#[utoipa::path(
    post,
    path = "/v1/interviews",
    request_body = CreateInterviewRequest,
    responses(
        (status = 201, description = "Interview session created", body = CreateInterviewResponse)
    ),
    tag = "interviews"
)]
pub async fn create_interview(
    State(state): State<AppState>,
    Json(req): Json<CreateInterviewRequest>,
) -> (StatusCode, Json<CreateInterviewResponse>) {
    let (session, event) = state.machine.start(&req.role, &req.candidate_name);
    (
        StatusCode::CREATED,
        Json(CreateInterviewResponse { session, event }),
    )
}

/// POST /v1/interviews/{interview_id}/messages - Send a voice message
#[utoipa::path(
    post,
    path = "/v1/interviews/{interview_id}/messages",
    params(
        ("interview_id" = Uuid, Path, description = "Interview session ID")
    ),
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "Next interviewer event", body = AdvanceOutput),
        (status = 404, description = "Session not found"),
        (status = 422, description = "Input kind not accepted at the current stage")
    ),
    tag = "interviews"
)]
pub async fn post_message(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<AdvanceOutput>, StatusCode> {
    let output = state
        .machine
        .advance(interview_id, CandidateInput::Text(req.text))
        .await
        .map_err(|e| {
            tracing::warn!(session_id = %interview_id, "message rejected: {}", e);
            error_status(&e)
        })?;
    Ok(Json(output))
}

/// POST /v1/interviews/{interview_id}/code - Submit code for evaluation
#[utoipa::path(
    post,
    path = "/v1/interviews/{interview_id}/code",
    params(
        ("interview_id" = Uuid, Path, description = "Interview session ID")
    ),
    request_body = PostCodeRequest,
    responses(
        (status = 200, description = "Evaluation outcome event", body = AdvanceOutput),
        (status = 404, description = "Session not found"),
        (status = 422, description = "Unsupported language or wrong stage")
    ),
    tag = "interviews"
)]
pub async fn post_code(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Json(req): Json<PostCodeRequest>,
) -> Result<Json<AdvanceOutput>, StatusCode> {
    let input = CandidateInput::Code {
        code: req.code,
        language: req.language,
        explanation: req.explanation,
    };
    let output = state.machine.advance(interview_id, input).await.map_err(|e| {
        tracing::warn!(session_id = %interview_id, "code submission rejected: {}", e);
        error_status(&e)
    })?;
    Ok(Json(output))
}

/// GET /v1/interviews/{interview_id} - Get session state
#[utoipa::path(
    get,
    path = "/v1/interviews/{interview_id}",
    params(
        ("interview_id" = Uuid, Path, description = "Interview session ID")
    ),
    responses(
        (status = 200, description = "Session found", body = Session),
        (status = 404, description = "Session not found")
    ),
    tag = "interviews"
)]
pub async fn get_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<Session>, StatusCode> {
    let session = state
        .machine
        .store()
        .get(interview_id)
        .map_err(|e| error_status(&e))?;
    Ok(Json(session))
}

/// GET /v1/interviews/{interview_id}/report - Get the final report
#[utoipa::path(
    get,
    path = "/v1/interviews/{interview_id}/report",
    params(
        ("interview_id" = Uuid, Path, description = "Interview session ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ReportEvent),
        (status = 404, description = "No report for this session")
    ),
    tag = "interviews"
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<ReportEvent>, StatusCode> {
    let report = state
        .machine
        .store()
        .report(interview_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ReportEvent { report }))
}

/// DELETE /v1/interviews/{interview_id} - Delete a session
#[utoipa::path(
    delete,
    path = "/v1/interviews/{interview_id}",
    params(
        ("interview_id" = Uuid, Path, description = "Interview session ID")
    ),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Session not found")
    ),
    tag = "interviews"
)]
pub async fn delete_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> StatusCode {
    if state.machine.store().delete(interview_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

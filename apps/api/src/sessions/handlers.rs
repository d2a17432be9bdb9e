//! Axum route handlers for the Sessions API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::interviews::store::get_interview;
use crate::sessions::agent::{CallHandle, VoiceEvent};
use crate::sessions::context::{InterviewContext, InterviewSnapshot};
use crate::sessions::controller::{SessionSnapshot, VoiceSessionController};
use crate::sessions::registry::EventAck;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub interview_id: Uuid,
    pub user_name: String,
    pub user_email: String,
}

impl CreateSessionRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.user_name.trim().is_empty() {
            return Err(AppError::Validation("user_name is required".to_string()));
        }
        if self.user_email.trim().is_empty() {
            return Err(AppError::Validation("user_email is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session: SessionSnapshot,
    pub call: CallHandle,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Opens a voice session for a candidate and starts the call.
pub async fn handle_create_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let agent = state.voice.clone().ok_or_else(|| {
        AppError::MissingConfiguration(
            "VAPI_API_KEY is not set; voice sessions are disabled".to_string(),
        )
    })?;
    request.validate()?;

    let row = get_interview(&state.db, request.interview_id).await?;
    let context = InterviewContext {
        user_name: request.user_name.trim().to_string(),
        user_email: request.user_email.trim().to_string(),
        interview: InterviewSnapshot::from_row(&row),
    };

    let session_id = Uuid::new_v4();
    state.contexts.save(session_id, &context).await?;

    let mut controller =
        VoiceSessionController::new(session_id, context, agent, Arc::clone(&state.feedback));
    let call = controller.start().await?;
    let session = state.sessions.spawn(controller).await;

    info!(
        "Session {session_id} opened for interview {} ({})",
        request.interview_id, request.user_email
    );
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { session, call })))
}

/// GET /api/v1/sessions/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.snapshot(session_id).await?))
}

/// GET /api/v1/sessions/:session_id/context
///
/// Rehydrates the interview context after a client reload.
pub async fn handle_get_context(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<InterviewContext>, AppError> {
    state
        .contexts
        .load(session_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No context for session {session_id}")))
}

/// POST /api/v1/sessions/:session_id/events
pub async fn handle_session_event(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    ApiJson(event): ApiJson<VoiceEvent>,
) -> Result<Json<EventAck>, AppError> {
    Ok(Json(state.sessions.deliver(session_id, event).await?))
}

/// POST /api/v1/sessions/:session_id/stop
pub async fn handle_stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.stop(session_id).await?))
}

/// DELETE /api/v1/sessions/:session_id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

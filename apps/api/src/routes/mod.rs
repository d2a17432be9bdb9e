pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::feedback::handlers as feedback;
use crate::interviews::handlers as interviews;
use crate::questions::handlers as questions;
use crate::sessions::handlers as sessions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Question generation
        .route(
            "/api/v1/questions/generate",
            post(questions::handle_generate_questions),
        )
        // Interviews
        .route(
            "/api/v1/interviews",
            post(interviews::handle_create_interview).get(interviews::handle_list_interviews),
        )
        .route(
            "/api/v1/interviews/:interview_id",
            get(interviews::handle_get_interview),
        )
        .route(
            "/api/v1/interviews/:interview_id/candidates",
            get(feedback::handle_list_candidates),
        )
        // Feedback
        .route(
            "/api/v1/feedback/generate",
            post(feedback::handle_generate_feedback),
        )
        .route(
            "/api/v1/feedback/:feedback_id/report",
            get(feedback::handle_get_report),
        )
        // Voice sessions
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:session_id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:session_id/context",
            get(sessions::handle_get_context),
        )
        .route(
            "/api/v1/sessions/:session_id/events",
            post(sessions::handle_session_event),
        )
        .route(
            "/api/v1/sessions/:session_id/stop",
            post(sessions::handle_stop_session),
        )
        .with_state(state)
}

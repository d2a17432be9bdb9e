//! Axum route handlers for the Questions API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::models::interview::QuestionItem;
use crate::questions::generator::{generate_questions, QuestionRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<QuestionItem>,
}

/// POST /api/v1/questions/generate
///
/// Generates an ordered question list from job metadata. Nothing is persisted;
/// the recruiter reviews the list and then creates the interview.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuestionRequest>,
) -> Result<Json<GenerateQuestionsResponse>, AppError> {
    let questions = generate_questions(&request, &state.llm).await?;
    Ok(Json(GenerateQuestionsResponse { questions }))
}

//! Axum route handlers for the Interviews API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::interviews::store::{
    count_candidates, create_interview, get_interview, list_interviews, NewInterview,
};
use crate::models::interview::{InterviewRow, QuestionItem};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListInterviewsQuery {
    pub user_email: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InterviewSummary {
    pub interview_id: Uuid,
    pub job_position: String,
    pub duration: String,
    pub created_at: DateTime<Utc>,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct InterviewDetail {
    pub interview_id: Uuid,
    pub job_position: String,
    pub job_description: String,
    pub duration: String,
    pub interview_types: Vec<String>,
    pub questions: Vec<QuestionItem>,
    pub created_at: DateTime<Utc>,
    pub link: String,
    pub candidate_count: i64,
}

impl InterviewDetail {
    fn from_row(row: &InterviewRow, link: String, candidate_count: i64) -> Self {
        Self {
            interview_id: row.interview_id,
            job_position: row.job_position.clone(),
            job_description: row.job_description.clone(),
            duration: row.duration.clone(),
            interview_types: row.type_labels(),
            questions: row.questions(),
            created_at: row.created_at,
            link,
            candidate_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateInterviewResponse {
    pub interview: InterviewDetail,
    pub remaining_credits: i32,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
///
/// Saves the interview and consumes one credit atomically. Returns the shareable link.
pub async fn handle_create_interview(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewInterview>,
) -> Result<(StatusCode, Json<CreateInterviewResponse>), AppError> {
    let created = create_interview(&state.db, &request).await?;
    let link = state.config.interview_link(created.interview.interview_id);

    Ok((
        StatusCode::CREATED,
        Json(CreateInterviewResponse {
            interview: InterviewDetail::from_row(&created.interview, link, 0),
            remaining_credits: created.remaining_credits,
        }),
    ))
}

/// GET /api/v1/interviews?user_email=...&limit=6
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListInterviewsQuery>,
) -> Result<Json<Vec<InterviewSummary>>, AppError> {
    if params.user_email.trim().is_empty() {
        return Err(AppError::Validation("user_email cannot be empty".to_string()));
    }

    let rows = list_interviews(&state.db, params.user_email.trim(), params.limit).await?;
    let summaries = rows
        .into_iter()
        .map(|row| InterviewSummary {
            link: state.config.interview_link(row.interview_id),
            interview_id: row.interview_id,
            job_position: row.job_position,
            duration: row.duration,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(summaries))
}

/// GET /api/v1/interviews/:interview_id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<InterviewDetail>, AppError> {
    let row = get_interview(&state.db, interview_id).await?;
    let candidate_count = count_candidates(&state.db, interview_id).await?;
    let link = state.config.interview_link(interview_id);
    Ok(Json(InterviewDetail::from_row(&row, link, candidate_count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_decodes_types_and_questions() {
        let row = InterviewRow {
            id: 7,
            interview_id: Uuid::new_v4(),
            user_email: "recruiter@example.com".to_string(),
            job_position: "Data Engineer".to_string(),
            job_description: "Pipelines".to_string(),
            duration: "45 Min".to_string(),
            interview_type: r#"["Technical","Experience"]"#.to_string(),
            question_list: json!([{"question": "How do you model late data?", "type": "Technical"}]),
            created_at: Utc::now(),
        };

        let detail = InterviewDetail::from_row(&row, "https://x/interview/1".to_string(), 3);
        assert_eq!(detail.interview_types, vec!["Technical", "Experience"]);
        assert_eq!(detail.questions.len(), 1);
        assert_eq!(detail.candidate_count, 3);

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["questions"][0]["type"], "Technical");
    }
}

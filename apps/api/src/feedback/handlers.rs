//! Axum route handlers for the Feedback API.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::feedback::generator::{generate_feedback, FeedbackReport};
use crate::feedback::report::{initial, CandidateReport};
use crate::feedback::store::{get_feedback, list_feedback};
use crate::interviews::store::get_interview;
use crate::sessions::transcript::{ConversationTurn, Transcript};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateFeedbackRequest {
    pub conversation: ConversationPayload,
}

/// A conversation as a list of turns, or as that list JSON-encoded into a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ConversationPayload {
    Turns(Vec<ConversationTurn>),
    Encoded(String),
}

impl ConversationPayload {
    pub fn into_turns(self) -> Result<Vec<ConversationTurn>, AppError> {
        match self {
            ConversationPayload::Turns(turns) => Ok(turns),
            ConversationPayload::Encoded(raw) => serde_json::from_str(&raw).map_err(|e| {
                AppError::Validation(format!("conversation is not a JSON list of turns: {e}"))
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub feedback_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub initial: String,
    pub completed_at: DateTime<Utc>,
    pub recommended: bool,
}

/// POST /api/v1/feedback/generate
///
/// Assesses a conversation without persisting anything.
pub async fn handle_generate_feedback(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateFeedbackRequest>,
) -> Result<Json<FeedbackReport>, AppError> {
    let turns = request.conversation.into_turns()?;
    let mut transcript = Transcript::new();
    transcript.merge(&turns);
    transcript.finalize();

    let report = generate_feedback(&transcript, &state.llm).await?;
    Ok(Json(report))
}

/// GET /api/v1/interviews/:interview_id/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<Vec<CandidateSummary>>, AppError> {
    // 404 for unknown interviews rather than an empty list.
    get_interview(&state.db, interview_id).await?;

    let candidates = list_feedback(&state.db, interview_id)
        .await?
        .into_iter()
        .map(|row| CandidateSummary {
            feedback_id: row.id,
            initial: initial(&row.user_name),
            user_name: row.user_name,
            user_email: row.user_email,
            completed_at: row.created_at,
            recommended: row.recommended,
        })
        .collect();

    Ok(Json(candidates))
}

/// GET /api/v1/feedback/:feedback_id/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(feedback_id): Path<Uuid>,
) -> Result<Json<CandidateReport>, AppError> {
    let row = get_feedback(&state.db, feedback_id).await?;
    Ok(Json(CandidateReport::from_row(&row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::transcript::Speaker;
    use serde_json::json;

    fn request(body: serde_json::Value) -> GenerateFeedbackRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_conversation_accepts_list_of_turns() {
        let turns = request(json!({
            "conversation": [{"role": "assistant", "content": "Hi"}]
        }))
        .conversation
        .into_turns()
        .unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Speaker::Assistant);
    }

    #[test]
    fn test_conversation_accepts_encoded_string() {
        let encoded = json!([
            {"role": "assistant", "content": "What is a lifetime?"},
            {"role": "user", "content": "A scope for a borrow."}
        ])
        .to_string();
        let turns = request(json!({ "conversation": encoded }))
            .conversation
            .into_turns()
            .unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Speaker::User);
        assert_eq!(turns[1].content, "A scope for a borrow.");
    }

    #[test]
    fn test_malformed_encoded_conversation_is_a_validation_error() {
        let result = request(json!({ "conversation": "not json" }))
            .conversation
            .into_turns();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_other_conversation_shapes_are_rejected() {
        let result = serde_json::from_value::<GenerateFeedbackRequest>(json!({
            "conversation": 42
        }));
        assert!(result.is_err());
    }
}

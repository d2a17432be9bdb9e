use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::generator::generate_feedback;
use crate::feedback::store::{insert_feedback, NewFeedback};
use crate::llm_client::LlmClient;
use crate::sessions::controller::EndReason;
use crate::sessions::transcript::Transcript;

/// Everything the feedback step needs from a finished session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub interview_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub transcript: Transcript,
    pub reason: EndReason,
}

/// Receives a session's outcome exactly once, when the session ends.
/// Returns the id of the stored feedback record.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn deliver(&self, outcome: SessionOutcome) -> Result<Uuid, AppError>;
}

/// Generates feedback from the transcript and persists it.
#[derive(Clone)]
pub struct StoredFeedbackSink {
    db: PgPool,
    llm: LlmClient,
}

impl StoredFeedbackSink {
    pub fn new(db: PgPool, llm: LlmClient) -> Self {
        Self { db, llm }
    }
}

#[async_trait]
impl FeedbackSink for StoredFeedbackSink {
    async fn deliver(&self, outcome: SessionOutcome) -> Result<Uuid, AppError> {
        info!(
            "Generating feedback for session {} ({:?}, {} turns)",
            outcome.session_id,
            outcome.reason,
            outcome.transcript.len()
        );
        let report = generate_feedback(&outcome.transcript, &self.llm).await?;
        let row = insert_feedback(
            &self.db,
            NewFeedback {
                interview_id: outcome.interview_id,
                user_name: &outcome.user_name,
                user_email: &outcome.user_email,
                report: &report,
            },
        )
        .await?;
        Ok(row.id)
    }
}

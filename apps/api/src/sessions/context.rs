//! Session-scoped interview context ("interviewInfo").
//!
//! Written once when a session opens so the candidate's client can rehydrate
//! after a reload. Stored in Redis with a TTL.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{InterviewRow, QuestionItem};

const KEY_PREFIX: &str = "interviewInfo";

/// The job fields and questions a session was opened against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSnapshot {
    pub interview_id: Uuid,
    pub job_position: String,
    pub job_description: String,
    pub duration: String,
    pub interview_types: Vec<String>,
    pub questions: Vec<QuestionItem>,
}

impl InterviewSnapshot {
    pub fn from_row(row: &InterviewRow) -> Self {
        Self {
            interview_id: row.interview_id,
            job_position: row.job_position.clone(),
            job_description: row.job_description.clone(),
            duration: row.duration.clone(),
            interview_types: row.type_labels(),
            questions: row.questions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewContext {
    pub user_name: String,
    pub user_email: String,
    pub interview: InterviewSnapshot,
}

impl InterviewContext {
    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize context: {e}")))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn save(&self, session_id: Uuid, context: &InterviewContext) -> Result<(), AppError>;
    async fn load(&self, session_id: Uuid) -> Result<Option<InterviewContext>, AppError>;
}

pub fn context_key(session_id: Uuid) -> String {
    format!("{KEY_PREFIX}:{session_id}")
}

#[derive(Clone)]
pub struct RedisContextStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisContextStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }
}

#[async_trait]
impl ContextStore for RedisContextStore {
    async fn save(&self, session_id: Uuid, context: &InterviewContext) -> Result<(), AppError> {
        let payload = context.to_json()?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(context_key(session_id), payload, self.ttl_secs)
            .await?;
        debug!("Saved context for session {session_id}");
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Option<InterviewContext>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(context_key(session_id)).await?;

        Ok(raw.and_then(|raw| match InterviewContext::from_json(&raw) {
            Ok(context) => Some(context),
            Err(e) => {
                warn!("Discarding unreadable context for session {session_id}: {e}");
                None
            }
        }))
    }
}

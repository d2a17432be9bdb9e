use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One completed candidate session and the structured assessment produced for it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub feedback: Value,
    pub recommended: bool,
    pub created_at: DateTime<Utc>,
}

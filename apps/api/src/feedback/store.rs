use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::generator::FeedbackReport;
use crate::models::feedback::FeedbackRow;

/// Candidate identity and assessment for one finished session.
#[derive(Debug, Clone)]
pub struct NewFeedback<'a> {
    pub interview_id: Uuid,
    pub user_name: &'a str,
    pub user_email: &'a str,
    pub report: &'a FeedbackReport,
}

/// Inserts a feedback record. Records are never updated afterwards.
pub async fn insert_feedback(
    pool: &PgPool,
    new: NewFeedback<'_>,
) -> Result<FeedbackRow, AppError> {
    let feedback = serde_json::to_value(new.report)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize feedback: {e}")))?;

    let row: FeedbackRow = sqlx::query_as(
        r#"
        INSERT INTO interview_feedback
            (id, interview_id, user_name, user_email, feedback, recommended)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.interview_id)
    .bind(new.user_name)
    .bind(new.user_email)
    .bind(&feedback)
    .bind(new.report.recommendation.is_positive())
    .fetch_one(pool)
    .await?;

    info!(
        "Stored feedback {} for interview {} ({})",
        row.id, row.interview_id, row.user_email
    );
    Ok(row)
}

/// All feedback for an interview, newest first.
pub async fn list_feedback(pool: &PgPool, interview_id: Uuid) -> Result<Vec<FeedbackRow>, AppError> {
    let rows = sqlx::query_as::<_, FeedbackRow>(
        "SELECT * FROM interview_feedback WHERE interview_id = $1 ORDER BY created_at DESC",
    )
    .bind(interview_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_feedback(pool: &PgPool, feedback_id: Uuid) -> Result<FeedbackRow, AppError> {
    sqlx::query_as::<_, FeedbackRow>("SELECT * FROM interview_feedback WHERE id = $1")
        .bind(feedback_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Feedback {feedback_id} not found")))
}

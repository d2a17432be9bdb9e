//! Interview persistence.
//!
//! Creating an interview and consuming the recruiter's credit happen in one
//! transaction: either both land or neither does.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{encode_types, InterviewRow, InterviewType, QuestionItem};
use crate::models::user::User;

/// Credits consumed per created interview.
const CREDIT_COST: i32 = 1;
pub const DEFAULT_LIST_LIMIT: i64 = 6;
const MAX_LIST_LIMIT: i64 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct NewInterview {
    pub user_email: String,
    pub job_position: String,
    pub job_description: String,
    pub duration: String,
    pub interview_types: BTreeSet<InterviewType>,
    pub question_list: Vec<QuestionItem>,
}

impl NewInterview {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("user_email", &self.user_email),
            ("job_position", &self.job_position),
            ("job_description", &self.job_description),
            ("duration", &self.duration),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }
        if self.interview_types.is_empty() {
            return Err(AppError::Validation(
                "interview_types must contain at least one type".to_string(),
            ));
        }
        if self.question_list.is_empty() {
            return Err(AppError::Validation(
                "question_list must contain at least one question".to_string(),
            ));
        }
        if let Some(pos) = self
            .question_list
            .iter()
            .position(|q| q.question.trim().is_empty())
        {
            return Err(AppError::Validation(format!(
                "question {} has no text",
                pos + 1
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedInterview {
    pub interview: InterviewRow,
    pub remaining_credits: i32,
}

/// Persists a new interview and decrements the owner's credit as one unit of work.
pub async fn create_interview(
    pool: &PgPool,
    new: &NewInterview,
) -> Result<CreatedInterview, AppError> {
    new.validate()?;

    let question_list = serde_json::to_value(&new.question_list)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize questions: {e}")))?;

    let mut tx = pool.begin().await?;

    let owner: User = sqlx::query_as("SELECT * FROM users WHERE email = $1 FOR UPDATE")
        .bind(new.user_email.trim())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", new.user_email)))?;

    if owner.credits < CREDIT_COST {
        // Dropping `tx` rolls back; nothing has been written.
        return Err(AppError::InsufficientCredits(owner.email));
    }

    let interview: InterviewRow = sqlx::query_as(
        r#"
        INSERT INTO interviews
            (interview_id, user_email, job_position, job_description, duration, type, question_list)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&owner.email)
    .bind(new.job_position.trim())
    .bind(new.job_description.trim())
    .bind(new.duration.trim())
    .bind(encode_types(&new.interview_types))
    .bind(&question_list)
    .fetch_one(&mut *tx)
    .await?;

    let remaining_credits: i32 =
        sqlx::query_scalar("UPDATE users SET credits = credits - $1 WHERE id = $2 RETURNING credits")
            .bind(CREDIT_COST)
            .bind(owner.id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    info!(
        "Created interview {} for {} ({} credits left)",
        interview.interview_id, owner.email, remaining_credits
    );

    Ok(CreatedInterview {
        interview,
        remaining_credits,
    })
}

/// Most recent interviews created by a recruiter, newest first.
pub async fn list_interviews(
    pool: &PgPool,
    user_email: &str,
    limit: Option<i64>,
) -> Result<Vec<InterviewRow>, AppError> {
    let rows = sqlx::query_as::<_, InterviewRow>(
        "SELECT * FROM interviews WHERE user_email = $1 ORDER BY id DESC LIMIT $2",
    )
    .bind(user_email)
    .bind(clamp_limit(limit))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_interview(pool: &PgPool, interview_id: Uuid) -> Result<InterviewRow, AppError> {
    sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE interview_id = $1")
        .bind(interview_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))
}

/// Number of candidates who completed the interview (one feedback record each).
pub async fn count_candidates(pool: &PgPool, interview_id: Uuid) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM interview_feedback WHERE interview_id = $1")
            .bind(interview_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

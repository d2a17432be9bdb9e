use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Interview focus areas a recruiter can pick. Serialized with the labels shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InterviewType {
    Technical,
    Behavioral,
    Experience,
    #[serde(rename = "Problem Solving")]
    ProblemSolving,
    Leadership,
}

impl InterviewType {
    pub fn label(&self) -> &'static str {
        match self {
            InterviewType::Technical => "Technical",
            InterviewType::Behavioral => "Behavioral",
            InterviewType::Experience => "Experience",
            InterviewType::ProblemSolving => "Problem Solving",
            InterviewType::Leadership => "Leadership",
        }
    }
}

/// A single generated interview question. Order within a list is the order asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: i64,
    pub interview_id: Uuid,
    pub user_email: String,
    pub job_position: String,
    pub job_description: String,
    pub duration: String,
    /// JSON-encoded list of interview type labels.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub interview_type: String,
    pub question_list: Value,
    pub created_at: DateTime<Utc>,
}

impl InterviewRow {
    /// Decodes the stored type labels. Malformed data yields an empty list.
    pub fn type_labels(&self) -> Vec<String> {
        serde_json::from_str(&self.interview_type).unwrap_or_default()
    }

    /// Decodes the stored question list. Malformed entries are skipped.
    pub fn questions(&self) -> Vec<QuestionItem> {
        self.question_list
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Serializes a type set to the stored string form, e.g. `["Technical","Leadership"]`.
pub fn encode_types(types: &BTreeSet<InterviewType>) -> String {
    let labels: Vec<&str> = types.iter().map(InterviewType::label).collect();
    serde_json::to_string(&labels).unwrap_or_else(|_| "[]".to_string())
}

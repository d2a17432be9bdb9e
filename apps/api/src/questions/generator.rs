//! Question generation: sends job metadata to the LLM and validates the returned batch.
//!
//! The batch is accepted whole or not at all: an unparsable response, a non-array,
//! an empty array, or any element without question text rejects every question.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{extract_json, LlmClient};
use crate::models::interview::{InterviewType, QuestionItem};
use crate::questions::prompts::{questions_prompt, QUESTIONS_ROLE};

/// Tag applied when the model omits a question's type.
const DEFAULT_QUESTION_TYPE: &str = "General";

/// Job metadata a recruiter submits to get questions.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    pub job_position: String,
    pub job_description: String,
    pub duration: String,
    pub interview_types: BTreeSet<InterviewType>,
}

impl QuestionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
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
        Ok(())
    }

    fn type_labels(&self) -> String {
        self.interview_types
            .iter()
            .map(InterviewType::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Generates an ordered question list for the given job.
pub async fn generate_questions(
    request: &QuestionRequest,
    llm: &LlmClient,
) -> Result<Vec<QuestionItem>, AppError> {
    request.validate()?;

    let prompt = build_prompt(request);
    let raw = llm
        .call_text(&prompt, &json_system(QUESTIONS_ROLE))
        .await
        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    let questions = parse_question_list(&raw)?;
    info!(
        "Generated {} questions for '{}'",
        questions.len(),
        request.job_position
    );
    Ok(questions)
}

fn build_prompt(request: &QuestionRequest) -> String {
    questions_prompt(
        request.job_position.trim(),
        request.job_description.trim(),
        request.duration.trim(),
        &request.type_labels(),
    )
}

/// Extracts and validates the question array from raw (possibly fenced) model output.
pub fn parse_question_list(raw: &str) -> Result<Vec<QuestionItem>, AppError> {
    let value: Value = extract_json(raw).map_err(|e| {
        warn!("Unparsable question list from LLM: {e}");
        AppError::UnprocessableEntity(format!("AI returned questions that could not be parsed: {e}"))
    })?;

    let items = value.as_array().ok_or_else(|| {
        AppError::UnprocessableEntity("AI response was not a list of questions".to_string())
    })?;

    if items.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "AI returned an empty list of questions".to_string(),
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_question_item(index, item))
        .collect()
}

fn parse_question_item(index: usize, item: &Value) -> Result<QuestionItem, AppError> {
    let question = item
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            AppError::UnprocessableEntity(format!("Question {} has no question text", index + 1))
        })?;

    let question_type = item
        .get("type")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_QUESTION_TYPE);

    Ok(QuestionItem {
        question: question.to_string(),
        question_type: question_type.to_string(),
    })
}

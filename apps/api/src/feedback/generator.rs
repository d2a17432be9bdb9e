//! Feedback generation: turns a finished transcript into a structured assessment.
//!
//! Parsing is lenient about missing or oddly-typed fields (they default) but a
//! response that is not a JSON object at all is a hard failure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::feedback::prompts::{FEEDBACK_PROMPT_TEMPLATE, FEEDBACK_ROLE};
use crate::llm_client::prompts::json_system;
use crate::llm_client::{extract_json, LlmClient};
use crate::sessions::transcript::Transcript;

const MAX_RATING: f64 = 10.0;
const OVERALL_KEY: &str = "overall_rating";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub rating: Ratings,
    pub summary: Vec<String>,
    pub recommendation: Recommendation,
}

/// Per-skill scores (0–10) plus the overall score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_rating: Option<f64>,
    #[serde(flatten)]
    pub skills: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    pub recommendation_message: String,
}

impl Recommendation {
    pub fn is_positive(&self) -> bool {
        self.recommendation.trim().eq_ignore_ascii_case("yes")
    }
}

/// Generates feedback for a finished session. An empty transcript is rejected
/// without calling the model.
pub async fn generate_feedback(
    transcript: &Transcript,
    llm: &LlmClient,
) -> Result<FeedbackReport, AppError> {
    if transcript.is_empty() {
        return Err(AppError::Validation(
            "conversation is empty; nothing to assess".to_string(),
        ));
    }

    let prompt =
        FEEDBACK_PROMPT_TEMPLATE.replace("{{conversation}}", &transcript.to_conversation_json());
    let raw = llm
        .call_text(&prompt, &json_system(FEEDBACK_ROLE))
        .await
        .map_err(|e| AppError::Llm(format!("Feedback generation failed: {e}")))?;

    let report = parse_feedback(&raw)?;
    info!(
        "Generated feedback over {} turns: overall={:?}, recommended={}",
        transcript.len(),
        report.rating.overall_rating,
        report.recommendation.is_positive()
    );
    Ok(report)
}

/// Extracts a feedback report from raw (possibly fenced) model output.
pub fn parse_feedback(raw: &str) -> Result<FeedbackReport, AppError> {
    let value: Value = extract_json(raw).map_err(|e| {
        warn!("Unparsable feedback from LLM: {e}");
        AppError::UnprocessableEntity(format!("AI feedback could not be parsed: {e}"))
    })?;
    parse_feedback_value(&value)
}

/// Builds a report from an already-decoded value. Accepts the report itself or
/// one wrapped as `{"feedback": {...}}`.
pub fn parse_feedback_value(value: &Value) -> Result<FeedbackReport, AppError> {
    let object = value
        .get("feedback")
        .and_then(Value::as_object)
        .or_else(|| value.as_object())
        .ok_or_else(|| {
            AppError::UnprocessableEntity("AI feedback was not a JSON object".to_string())
        })?;

    if !["rating", "summary", "recommendation"]
        .iter()
        .any(|key| object.contains_key(*key))
    {
        return Err(AppError::UnprocessableEntity(
            "AI feedback had no rating, summary or recommendation".to_string(),
        ));
    }

    Ok(FeedbackReport {
        rating: object.get("rating").map(parse_ratings).unwrap_or_default(),
        summary: object.get("summary").map(parse_summary).unwrap_or_default(),
        recommendation: parse_recommendation(object),
    })
}

fn parse_ratings(value: &Value) -> Ratings {
    let mut ratings = Ratings::default();
    let Some(map) = value.as_object() else {
        return ratings;
    };

    for (key, raw) in map {
        let Some(score) = as_score(raw) else {
            warn!("Ignoring non-numeric rating {key}={raw}");
            continue;
        };
        if key == OVERALL_KEY {
            ratings.overall_rating = Some(score);
        } else {
            ratings.skills.insert(key.clone(), score);
        }
    }
    ratings
}

fn as_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches("/10").trim().parse().ok()?,
        _ => return None,
    };
    score
        .is_finite()
        .then(|| score.clamp(0.0, MAX_RATING))
}

fn parse_summary(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn parse_recommendation(object: &Map<String, Value>) -> Recommendation {
    let text = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    match object.get("recommendation") {
        Some(Value::Object(rec)) => Recommendation {
            recommendation: text(rec.get("recommendation")),
            recommendation_message: text(rec.get("recommendation_message")),
        },
        Some(Value::String(verdict)) => Recommendation {
            recommendation: verdict.trim().to_string(),
            recommendation_message: text(object.get("recommendation_message")),
        },
        _ => Recommendation::default(),
    }
}

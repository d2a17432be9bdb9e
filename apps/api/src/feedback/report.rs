//! Display model for a candidate's feedback report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::feedback::generator::{parse_feedback_value, FeedbackReport};
use crate::models::feedback::FeedbackRow;

const RECOMMENDED_TITLE: &str = "Recommended for Hiring";
const NOT_RECOMMENDED_TITLE: &str = "Not Recommended for Hiring";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRow {
    pub skill: String,
    pub score: f64,
    /// e.g. "communication: 7/10"
    pub display: String,
    /// Progress-bar fill, 0–100.
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    /// e.g. "8/10", or "N/A/10" when the model gave no overall score.
    pub overall: String,
    pub skills: Vec<SkillRow>,
    pub summary: Vec<String>,
    pub recommended: bool,
    pub recommendation_title: &'static str,
    pub recommendation_message: String,
}

impl ReportView {
    pub fn render(report: &FeedbackReport) -> Self {
        let overall = report
            .rating
            .overall_rating
            .map(format_score)
            .unwrap_or_else(|| "N/A".to_string());

        let skills = report
            .rating
            .skills
            .iter()
            .map(|(skill, score)| {
                let skill = skill.replace('_', " ");
                SkillRow {
                    display: format!("{skill}: {}/10", format_score(*score)),
                    skill,
                    score: *score,
                    percent: score * 10.0,
                }
            })
            .collect();

        let recommended = report.recommendation.is_positive();

        Self {
            overall: format!("{overall}/10"),
            skills,
            summary: report.summary.clone(),
            recommended,
            recommendation_title: if recommended {
                RECOMMENDED_TITLE
            } else {
                NOT_RECOMMENDED_TITLE
            },
            recommendation_message: report.recommendation.recommendation_message.clone(),
        }
    }
}

/// A stored feedback record rendered for the recruiter.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub feedback_id: Uuid,
    pub interview_id: Uuid,
    pub candidate_name: String,
    pub candidate_initial: String,
    pub candidate_email: String,
    pub interviewed_at: DateTime<Utc>,
    pub report: ReportView,
}

impl CandidateReport {
    /// Stored feedback that no longer parses renders as an empty report.
    pub fn from_row(row: &FeedbackRow) -> Self {
        let report = parse_feedback_value(&row.feedback).unwrap_or_default();
        Self {
            feedback_id: row.id,
            interview_id: row.interview_id,
            candidate_name: row.user_name.clone(),
            candidate_initial: initial(&row.user_name),
            candidate_email: row.user_email.clone(),
            interviewed_at: row.created_at,
            report: ReportView::render(&report),
        }
    }
}

/// First letter of a name, upper-cased; "U" for unnamed candidates.
pub fn initial(name: &str) -> String {
    name.trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "U".to_string())
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{score:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::generator::parse_feedback;
    use serde_json::json;

    #[test]
    fn test_example_report_renders() {
        let report = parse_feedback(
            r#"{"rating":{"overall_rating":8,"communication":7},"summary":["Clear answers"],"recommendation":{"recommendation":"Yes","recommendation_message":"Strong fit"}}"#,
        )
        .unwrap();

        let view = ReportView::render(&report);
        assert_eq!(view.overall, "8/10");
        assert_eq!(view.skills.len(), 1);
        assert_eq!(view.skills[0].display, "communication: 7/10");
        assert_eq!(view.skills[0].percent, 70.0);
        assert_eq!(view.summary, vec!["Clear answers"]);
        assert!(view.recommended);
        assert_eq!(view.recommendation_title, "Recommended for Hiring");
        assert_eq!(view.recommendation_message, "Strong fit");
    }

    #[test]
    fn test_missing_fields_render_defaults() {
        let view = ReportView::render(&FeedbackReport::default());
        assert_eq!(view.overall, "N/A/10");
        assert!(view.skills.is_empty());
        assert!(view.summary.is_empty());
        assert!(!view.recommended);
        assert_eq!(view.recommendation_title, "Not Recommended for Hiring");
    }

    #[test]
    fn test_skill_names_and_fractional_scores() {
        let mut report = FeedbackReport::default();
        report.rating.skills.insert("problem_solving".to_string(), 6.5);
        let view = ReportView::render(&report);
        assert_eq!(view.skills[0].skill, "problem solving");
        assert_eq!(view.skills[0].display, "problem solving: 6.5/10");
    }

    #[test]
    fn test_candidate_report_from_stored_row() {
        let row = FeedbackRow {
            id: Uuid::new_v4(),
            interview_id: Uuid::new_v4(),
            user_name: "ana".to_string(),
            user_email: "ana@example.com".to_string(),
            feedback: json!({"rating": {"overall_rating": 5}, "summary": []}),
            recommended: false,
            created_at: Utc::now(),
        };
        let candidate = CandidateReport::from_row(&row);
        assert_eq!(candidate.candidate_initial, "A");
        assert_eq!(candidate.report.overall, "5/10");
    }

    #[test]
    fn test_initial_falls_back_for_blank_names() {
        assert_eq!(initial("  "), "U");
        assert_eq!(initial("élodie"), "É");
    }
}

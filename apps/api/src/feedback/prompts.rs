/// Role description for feedback generation; the JSON-only rule is appended by `json_system`.
pub const FEEDBACK_ROLE: &str = "You are a senior hiring manager assessing \
    a recorded AI-led interview fairly and concisely.";

/// Feedback prompt template. Replace `{{conversation}}` with the serialized transcript.
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"{{conversation}}

The JSON above is the conversation between an AI interviewer ("assistant") and a candidate ("user").
Assess the candidate's interview.

Rate each of these skills out of 10: technical_skills, communication, problem_solving, experience.
Give an overall_rating out of 10.
Summarize the interview in at most 3 short statements.
State whether the candidate is recommended for hire ("Yes" or "No") with a one-line message.

Return a JSON object with exactly this shape:
{
  "rating": {
    "technical_skills": 5,
    "communication": 6,
    "problem_solving": 4,
    "experience": 7,
    "overall_rating": 6
  },
  "summary": ["...", "...", "..."],
  "recommendation": {
    "recommendation": "Yes",
    "recommendation_message": "..."
  }
}"#;

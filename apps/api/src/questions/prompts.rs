/// Role description for question generation; the JSON-only rule is appended by `json_system`.
pub const QUESTIONS_ROLE: &str = "You are an experienced technical recruiter \
    who writes focused, role-specific interview questions.";

/// Question generation prompt. Every field is substituted in one pass, so
/// placeholder-looking text inside a field is left as written.
pub fn questions_prompt(
    job_position: &str,
    job_description: &str,
    duration: &str,
    interview_types: &str,
) -> String {
    format!(
        r#"Generate interview questions for the role below.

Job Title: {job_position}
Job Description: {job_description}
Interview Duration: {duration}
Interview Type: {interview_types}

Instructions:
- Analyze the job description to identify key responsibilities, required skills, and expected experience.
- Choose the number of questions so the interview fits the duration.
- Cover the requested interview types and keep each question clear and self-contained.
- Order the questions the way they should be asked.

Return a JSON ARRAY, and nothing else:
[
  {{ "question": "Walk me through a service you designed end to end.", "type": "Technical" }}
]

Each "type" MUST be one of: Technical, Behavioral, Experience, Problem Solving, Leadership."#
    )
}

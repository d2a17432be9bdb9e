//! Assistant configuration handed to the voice agent when a call starts.

use serde::Serialize;

use crate::sessions::context::InterviewContext;

const ASSISTANT_NAME: &str = "AI Recruiter";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub name: String,
    pub first_message: String,
    pub transcriber: Transcriber,
    pub voice: Voice,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcriber {
    pub provider: String,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub provider: String,
    pub voice_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

pub fn build_assistant_config(context: &InterviewContext) -> AssistantConfig {
    let position = &context.interview.job_position;

    AssistantConfig {
        name: ASSISTANT_NAME.to_string(),
        first_message: format!(
            "Hi {}! Ready to kickstart your interview for the position of {}? Let's begin!",
            context.user_name, position
        ),
        transcriber: Transcriber {
            provider: "deepgram".to_string(),
            model: "nova-2".to_string(),
            language: "en-US".to_string(),
        },
        voice: Voice {
            provider: "playht".to_string(),
            voice_id: "jennifer".to_string(),
        },
        model: ModelConfig {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            messages: vec![PromptMessage {
                role: "system".to_string(),
                content: system_prompt(position, &question_list(context)),
            }],
        },
    }
}

fn question_list(context: &InterviewContext) -> String {
    context
        .interview
        .questions
        .iter()
        .map(|q| q.question.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn system_prompt(position: &str, questions: &str) -> String {
    format!(
        r#"You are an AI voice assistant conducting an interview for the {position} position.
Your job is to ask the candidate the provided interview questions and assess their responses.
Start with a short, friendly introduction, then ask one question at a time and wait for the candidate to answer.

Questions: {questions}

If the candidate struggles, offer a hint or rephrase the question without giving away the answer.
After each answer give brief, encouraging feedback, e.g. "Nice! That's a solid answer." or "Hmm, not quite. Want to try again?"
Keep the conversation natural and engaging. Keep responses short, as in a real conversation.
After all questions, wrap up by summarizing the candidate's performance and thanking them for their time.
Stay focused on {position} topics throughout."#
    )
}

//! In-memory doubles for the session seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::QuestionItem;
use crate::sessions::agent::{CallHandle, VoiceAgent, VoiceError};
use crate::sessions::assistant::AssistantConfig;
use crate::sessions::context::{ContextStore, InterviewContext, InterviewSnapshot};
use crate::sessions::sink::{FeedbackSink, SessionOutcome};

pub(crate) fn context(questions: &[&str]) -> InterviewContext {
    InterviewContext {
        user_name: "Ana".to_string(),
        user_email: "ana@example.com".to_string(),
        interview: InterviewSnapshot {
            interview_id: Uuid::new_v4(),
            job_position: "Backend Engineer".to_string(),
            job_description: "Build APIs in Rust".to_string(),
            duration: "30 Min".to_string(),
            interview_types: vec!["Technical".to_string()],
            questions: questions
                .iter()
                .map(|q| QuestionItem {
                    question: q.to_string(),
                    question_type: "Technical".to_string(),
                })
                .collect(),
        },
    }
}

#[derive(Default)]
pub(crate) struct FakeAgent {
    starts: AtomicUsize,
    stops: AtomicUsize,
    fail_start: bool,
}

impl FakeAgent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_start: true,
            ..Self::default()
        })
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceAgent for FakeAgent {
    async fn start(&self, _config: &AssistantConfig) -> Result<CallHandle, VoiceError> {
        if self.fail_start {
            return Err(VoiceError::Api {
                status: 503,
                message: "voice service unavailable".to_string(),
            });
        }
        let n = self.starts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CallHandle {
            call_id: format!("call-{n}"),
            join_url: Some(format!("https://rooms.example.com/call-{n}")),
            control_url: Some(format!("https://control.example.com/call-{n}")),
        })
    }

    async fn stop(&self, _call: &CallHandle) -> Result<(), VoiceError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    outcomes: Mutex<Vec<SessionOutcome>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }

    pub fn outcomes(&self) -> Vec<SessionOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackSink for RecordingSink {
    async fn deliver(&self, outcome: SessionOutcome) -> Result<Uuid, AppError> {
        self.outcomes.lock().unwrap().push(outcome);
        if self.fail {
            return Err(AppError::Llm("model unavailable".to_string()));
        }
        Ok(Uuid::new_v4())
    }
}

#[derive(Default)]
pub(crate) struct MemoryContextStore {
    contexts: Mutex<HashMap<Uuid, InterviewContext>>,
}

impl MemoryContextStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn save(&self, session_id: Uuid, context: &InterviewContext) -> Result<(), AppError> {
        self.contexts
            .lock()
            .unwrap()
            .insert(session_id, context.clone());
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Option<InterviewContext>, AppError> {
        Ok(self.contexts.lock().unwrap().get(&session_id).cloned())
    }
}

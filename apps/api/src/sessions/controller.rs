//! Voice session state machine.
//!
//! ```text
//! Idle --start--> Connecting --call-start--> Active(Listening)
//!                                              |  speech-end   -> Active(Thinking)
//!                                              |  speech-start -> Active(Listening)
//! Connecting | Active --call-end | stop--> Ended
//! ```
//!
//! The controller is the only owner of the call handle. Every path into
//! `Ended` runs through `finish`, which dispatches feedback at most once.
//! Events that arrive after `Ended` are ignored.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::sessions::agent::{CallHandle, VoiceAgent, VoiceError, VoiceEvent};
use crate::sessions::assistant::build_assistant_config;
use crate::sessions::context::InterviewContext;
use crate::sessions::sink::{FeedbackSink, SessionOutcome};
use crate::sessions::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// The candidate has the floor.
    Listening,
    /// The candidate stopped speaking; the assistant is responding.
    Thinking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Active(Activity),
    Ended,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Active(_) => "active",
            SessionState::Ended => "ended",
        }
    }

    pub fn activity(&self) -> Option<Activity> {
        match self {
            SessionState::Active(activity) => Some(*activity),
            _ => None,
        }
    }

    fn is_live(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Active(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The voice agent reported the call ended.
    Completed,
    /// Ended by an explicit stop.
    Stopped,
    /// The session was dropped while the call was live.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedbackStatus {
    Pending,
    Saved { feedback_id: Uuid },
    Failed { code: String, message: String },
    /// Abandoned sessions produce no feedback.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Applied,
    Ignored,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("interview has no questions")]
    NoQuestions,

    #[error("session already started")]
    AlreadyStarted,

    #[error("interview not started")]
    NotStarted,

    #[error(transparent)]
    Voice(#[from] VoiceError),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NoQuestions => AppError::Validation(e.to_string()),
            SessionError::AlreadyStarted | SessionError::NotStarted => {
                AppError::Conflict(e.to_string())
            }
            SessionError::Voice(inner) => AppError::Voice(inner.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub interview_id: Uuid,
    pub candidate_name: String,
    pub state: &'static str,
    pub activity: Option<Activity>,
    pub end_reason: Option<EndReason>,
    pub call_id: Option<String>,
    pub transcript_turns: usize,
    pub feedback: FeedbackStatus,
}

pub struct VoiceSessionController {
    session_id: Uuid,
    context: InterviewContext,
    agent: Arc<dyn VoiceAgent>,
    sink: Arc<dyn FeedbackSink>,
    state: SessionState,
    call: Option<CallHandle>,
    call_id: Option<String>,
    transcript: Transcript,
    end_reason: Option<EndReason>,
    feedback: FeedbackStatus,
    feedback_dispatched: bool,
}

impl VoiceSessionController {
    pub fn new(
        session_id: Uuid,
        context: InterviewContext,
        agent: Arc<dyn VoiceAgent>,
        sink: Arc<dyn FeedbackSink>,
    ) -> Self {
        Self {
            session_id,
            context,
            agent,
            sink,
            state: SessionState::Idle,
            call: None,
            call_id: None,
            transcript: Transcript::new(),
            end_reason: None,
            feedback: FeedbackStatus::Pending,
            feedback_dispatched: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    /// Idle -> Connecting. A failed start returns to Idle with no call held.
    pub async fn start(&mut self) -> Result<CallHandle, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        if self.context.interview.questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        let config = build_assistant_config(&self.context);
        self.state = SessionState::Connecting;

        match self.agent.start(&config).await {
            Ok(call) => {
                info!(
                    "Session {} connecting on call {} ({} questions)",
                    self.session_id,
                    call.call_id,
                    self.context.interview.questions.len()
                );
                self.call_id = Some(call.call_id.clone());
                self.call = Some(call.clone());
                Ok(call)
            }
            Err(e) => {
                warn!("Session {} failed to start: {e}", self.session_id);
                self.state = SessionState::Idle;
                Err(e.into())
            }
        }
    }

    pub async fn handle_event(&mut self, event: VoiceEvent) -> EventOutcome {
        if !self.state.is_live() {
            warn!(
                "Session {} ignoring {:?} while {}",
                self.session_id,
                event,
                self.state.name()
            );
            return EventOutcome::Ignored;
        }

        match event {
            VoiceEvent::CallStart => {
                if self.state != SessionState::Connecting {
                    debug!("Session {} duplicate call-start", self.session_id);
                    return EventOutcome::Ignored;
                }
                info!("Session {} call started", self.session_id);
                self.state = SessionState::Active(Activity::Listening);
            }
            // Nothing is heard or recorded until the call is up.
            VoiceEvent::SpeechStart | VoiceEvent::SpeechEnd | VoiceEvent::Message { .. }
                if self.state == SessionState::Connecting =>
            {
                return EventOutcome::Ignored;
            }
            VoiceEvent::SpeechStart => self.state = SessionState::Active(Activity::Listening),
            VoiceEvent::SpeechEnd => self.state = SessionState::Active(Activity::Thinking),
            VoiceEvent::Message { conversation } => {
                let added = self.transcript.merge(&conversation);
                debug!(
                    "Session {} transcript +{added} ({} turns)",
                    self.session_id,
                    self.transcript.len()
                );
            }
            VoiceEvent::CallEnd => {
                info!("Session {} call ended by agent", self.session_id);
                // The remote side is already gone; nothing to stop.
                self.call = None;
                self.finish(EndReason::Completed).await;
            }
        }
        EventOutcome::Applied
    }

    /// Manual stop. Idempotent once ended.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => Err(SessionError::NotStarted),
            SessionState::Ended => Ok(()),
            SessionState::Connecting | SessionState::Active(_) => {
                self.hang_up().await;
                self.finish(EndReason::Stopped).await;
                Ok(())
            }
        }
    }

    /// Ends a live session without generating feedback.
    pub async fn teardown(&mut self) {
        if !self.state.is_live() {
            return;
        }
        info!("Session {} torn down while live", self.session_id);
        self.hang_up().await;
        self.state = SessionState::Ended;
        self.end_reason.get_or_insert(EndReason::Abandoned);
        self.transcript.finalize();
        if !std::mem::replace(&mut self.feedback_dispatched, true) {
            self.feedback = FeedbackStatus::Skipped;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            interview_id: self.context.interview.interview_id,
            candidate_name: self.context.user_name.clone(),
            state: self.state.name(),
            activity: self.state.activity(),
            end_reason: self.end_reason,
            call_id: self.call_id.clone(),
            transcript_turns: self.transcript.len(),
            feedback: self.feedback.clone(),
        }
    }

    async fn hang_up(&mut self) {
        if let Some(call) = self.call.take() {
            if let Err(e) = self.agent.stop(&call).await {
                warn!(
                    "Session {} failed to stop call {}: {e}",
                    self.session_id, call.call_id
                );
            }
        }
    }

    async fn finish(&mut self, reason: EndReason) {
        self.state = SessionState::Ended;
        self.end_reason.get_or_insert(reason);
        self.transcript.finalize();

        if std::mem::replace(&mut self.feedback_dispatched, true) {
            return;
        }

        let outcome = SessionOutcome {
            session_id: self.session_id,
            interview_id: self.context.interview.interview_id,
            user_name: self.context.user_name.clone(),
            user_email: self.context.user_email.clone(),
            transcript: self.transcript.clone(),
            reason,
        };

        self.feedback = match self.sink.deliver(outcome).await {
            Ok(feedback_id) => {
                info!(
                    "Session {} ended ({reason:?}); feedback {feedback_id} saved",
                    self.session_id
                );
                FeedbackStatus::Saved { feedback_id }
            }
            Err(e) => {
                error!("Session {} feedback failed: {e}", self.session_id);
                FeedbackStatus::Failed {
                    code: e.code().to_string(),
                    message: e.to_string(),
                }
            }
        };
    }
}

impl Drop for VoiceSessionController {
    fn drop(&mut self) {
        let Some(call) = self.call.take() else {
            return;
        };
        let session_id = self.session_id;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let agent = Arc::clone(&self.agent);
                runtime.spawn(async move {
                    if let Err(e) = agent.stop(&call).await {
                        warn!("Session {session_id} dropped; stopping call failed: {e}");
                    }
                });
            }
            Err(_) => warn!(
                "Session {session_id} dropped outside a runtime; call {} left open",
                call.call_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::testing::{context, FakeAgent, RecordingSink};
    use crate::sessions::transcript::{ConversationTurn, Speaker};

    fn controller(
        questions: &[&str],
        agent: &Arc<FakeAgent>,
        sink: &Arc<RecordingSink>,
    ) -> VoiceSessionController {
        VoiceSessionController::new(
            Uuid::new_v4(),
            context(questions),
            agent.clone(),
            sink.clone(),
        )
    }

    fn message(turns: &[(Speaker, &str)]) -> VoiceEvent {
        VoiceEvent::Message {
            conversation: turns
                .iter()
                .map(|(role, text)| ConversationTurn::new(*role, *text))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_start_requires_questions() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&[], &agent, &sink);

        assert!(matches!(session.start().await, Err(SessionError::NoQuestions)));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(agent.starts(), 0);
    }

    #[tokio::test]
    async fn test_failed_start_returns_to_idle() {
        let agent = FakeAgent::failing();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);

        assert!(matches!(session.start().await, Err(SessionError::Voice(_))));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);

        session.start().await.unwrap();
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(matches!(
            session.start().await,
            Err(SessionError::AlreadyStarted)
        ));

        assert_eq!(session.handle_event(VoiceEvent::CallStart).await, EventOutcome::Applied);
        assert_eq!(session.state(), SessionState::Active(Activity::Listening));

        session.handle_event(VoiceEvent::SpeechEnd).await;
        assert_eq!(session.state(), SessionState::Active(Activity::Thinking));

        session.handle_event(VoiceEvent::SpeechStart).await;
        assert_eq!(session.state(), SessionState::Active(Activity::Listening));

        assert_eq!(session.handle_event(VoiceEvent::CallStart).await, EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_call_end_without_messages_dispatches_once() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);

        session.start().await.unwrap();
        session.handle_event(VoiceEvent::CallStart).await;
        session.handle_event(VoiceEvent::CallEnd).await;

        assert_eq!(session.state(), SessionState::Ended);
        assert_eq!(sink.calls(), 1);
        assert!(sink.outcomes()[0].transcript.is_empty());
        assert_eq!(sink.outcomes()[0].reason, EndReason::Completed);
        // The agent already hung up; no stop request goes out.
        assert_eq!(agent.stops(), 0);
    }

    #[tokio::test]
    async fn test_stop_then_late_call_end_dispatches_once() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);

        session.start().await.unwrap();
        session.handle_event(VoiceEvent::CallStart).await;
        session.stop().await.unwrap();

        assert_eq!(session.handle_event(VoiceEvent::CallEnd).await, EventOutcome::Ignored);
        session.stop().await.unwrap();

        assert_eq!(sink.calls(), 1);
        assert_eq!(agent.stops(), 1);
        assert_eq!(session.snapshot().end_reason, Some(EndReason::Stopped));
    }

    #[tokio::test]
    async fn test_stop_before_start_is_rejected() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);

        assert!(matches!(session.stop().await, Err(SessionError::NotStarted)));
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn test_transcript_keeps_every_turn_seen_before_call_end() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1", "Q2"], &agent, &sink);

        session.start().await.unwrap();
        session.handle_event(VoiceEvent::CallStart).await;
        session
            .handle_event(message(&[
                (Speaker::System, "prompt"),
                (Speaker::Assistant, "Q1"),
            ]))
            .await;
        session
            .handle_event(message(&[
                (Speaker::System, "prompt"),
                (Speaker::Assistant, "Q1"),
                (Speaker::User, "A1"),
                (Speaker::Assistant, "Q2"),
            ]))
            .await;
        // A stale, shorter snapshot does not lose turns.
        session
            .handle_event(message(&[(Speaker::Assistant, "Q1")]))
            .await;
        session.handle_event(VoiceEvent::CallEnd).await;

        let outcome = &sink.outcomes()[0];
        let texts: Vec<_> = outcome
            .transcript
            .turns()
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(texts, ["Q1", "A1", "Q2"]);
        assert!(outcome.transcript.is_finalized());
    }

    #[tokio::test]
    async fn test_messages_after_end_are_ignored() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);

        session.start().await.unwrap();
        session.handle_event(VoiceEvent::CallEnd).await;
        let late = session
            .handle_event(message(&[(Speaker::Assistant, "late")]))
            .await;

        assert_eq!(late, EventOutcome::Ignored);
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_messages_before_call_start_are_ignored() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);

        session.start().await.unwrap();
        let early = session
            .handle_event(message(&[(Speaker::Assistant, "too early")]))
            .await;
        assert_eq!(early, EventOutcome::Ignored);
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(session.transcript().is_empty());

        session.handle_event(VoiceEvent::CallStart).await;
        let heard = session
            .handle_event(message(&[(Speaker::Assistant, "What is Q1?")]))
            .await;
        assert_eq!(heard, EventOutcome::Applied);
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_is_recorded() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::failing();
        let mut session = controller(&["Q1"], &agent, &sink);

        session.start().await.unwrap();
        session.handle_event(VoiceEvent::CallEnd).await;

        match session.snapshot().feedback {
            FeedbackStatus::Failed { code, .. } => assert_eq!(code, "LLM_ERROR"),
            other => panic!("expected failed feedback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_teardown_stops_call_without_feedback() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);

        session.start().await.unwrap();
        session.handle_event(VoiceEvent::CallStart).await;
        session.teardown().await;

        assert!(session.is_ended());
        assert_eq!(agent.stops(), 1);
        assert_eq!(sink.calls(), 0);
        assert_eq!(session.snapshot().feedback, FeedbackStatus::Skipped);

        session.handle_event(VoiceEvent::CallEnd).await;
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn test_drop_with_live_call_stops_it() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);
        session.start().await.unwrap();

        drop(session);
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(agent.stops(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_reports_state() {
        let agent = FakeAgent::new();
        let sink = RecordingSink::new();
        let mut session = controller(&["Q1"], &agent, &sink);
        session.start().await.unwrap();
        session.handle_event(VoiceEvent::CallStart).await;
        session.handle_event(VoiceEvent::SpeechEnd).await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, "active");
        assert_eq!(snapshot.activity, Some(Activity::Thinking));
        assert_eq!(snapshot.call_id.as_deref(), Some("call-1"));
        assert_eq!(snapshot.feedback, FeedbackStatus::Pending);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["activity"], "thinking");
        assert_eq!(value["feedback"]["status"], "pending");
    }

    #[test]
    fn test_session_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(SessionError::NotStarted),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(SessionError::NoQuestions),
            AppError::Validation(_)
        ));
    }
}

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::sessions::agent::VoiceAgent;
use crate::sessions::context::ContextStore;
use crate::sessions::registry::SessionRegistry;
use crate::sessions::sink::FeedbackSink;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub config: Config,
    /// Live voice sessions, one task each.
    pub sessions: SessionRegistry,
    /// Session-scoped interview context. Redis in production.
    pub contexts: Arc<dyn ContextStore>,
    /// `None` when no voice provider key is configured.
    pub voice: Option<Arc<dyn VoiceAgent>>,
    /// Where finished sessions send their transcript.
    pub feedback: Arc<dyn FeedbackSink>,
}

mod config;
mod db;
mod errors;
mod extract;
mod feedback;
mod interviews;
mod llm_client;
mod models;
mod questions;
mod routes;
mod sessions;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::sessions::agent::{VapiAgent, VoiceAgent};
use crate::sessions::context::RedisContextStore;
use crate::sessions::registry::SessionRegistry;
use crate::sessions::sink::StoredFeedbackSink;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let contexts = Arc::new(RedisContextStore::new(redis, config.context_ttl_secs));
    info!("Redis client initialized");

    // Initialize LLM client
    let llm = LlmClient::from_config(&config)?;
    info!("LLM client initialized (model: {})", llm.model());

    // Voice agent is optional; without it session creation fails fast
    let voice: Option<Arc<dyn VoiceAgent>> = match &config.vapi_api_key {
        Some(key) => {
            info!("Voice agent initialized ({})", config.vapi_api_base);
            Some(Arc::new(VapiAgent::new(key.clone(), &config.vapi_api_base)?))
        }
        None => {
            warn!("VAPI_API_KEY not set; voice sessions disabled");
            None
        }
    };

    let feedback = Arc::new(StoredFeedbackSink::new(db.clone(), llm.clone()));

    // Build app state
    let state = AppState {
        db,
        llm,
        config: config.clone(),
        sessions: SessionRegistry::new(Duration::from_secs(config.session_retention_secs)),
        contexts,
        voice,
        feedback,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

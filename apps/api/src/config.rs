use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub llm_api_key: String,
    pub llm_api_base: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    /// Absent key disables voice sessions; creation fails fast instead of connecting.
    pub vapi_api_key: Option<String>,
    pub vapi_api_base: String,
    /// Public origin used to build shareable interview links.
    pub host_url: String,
    pub context_ttl_secs: u64,
    /// How long an ended session's final snapshot stays readable.
    pub session_retention_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_api_base: env_or("LLM_API_BASE", "https://openrouter.ai/api/v1"),
            llm_model: env_or("LLM_MODEL", "mistralai/mistral-7b-instruct:free"),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            vapi_api_key: optional_env("VAPI_API_KEY"),
            vapi_api_base: env_or("VAPI_API_BASE", "https://api.vapi.ai"),
            host_url: env_or("HOST_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            context_ttl_secs: parse_env("CONTEXT_TTL_SECS", 86_400)?,
            session_retention_secs: parse_env("SESSION_RETENTION_SECS", 900)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Link a candidate opens to join the interview.
    pub fn interview_link(&self, interview_id: uuid::Uuid) -> String {
        format!("{}/interview/{}", self.host_url, interview_id)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/interviews_test".to_string(),
        redis_url: "redis://127.0.0.1/".to_string(),
        llm_api_key: "test-key".to_string(),
        llm_api_base: "http://127.0.0.1:9".to_string(),
        llm_model: "test-model".to_string(),
        llm_timeout_secs: 5,
        vapi_api_key: None,
        vapi_api_base: "http://127.0.0.1:9".to_string(),
        host_url: "https://recruit.example.com".to_string(),
        context_ttl_secs: 60,
        session_retention_secs: 60,
        port: 0,
        rust_log: "info".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interview_link_joins_host_and_id() {
        let config = test_config();
        let id = uuid::Uuid::nil();
        assert_eq!(
            config.interview_link(id),
            "https://recruit.example.com/interview/00000000-0000-0000-0000-000000000000"
        );
    }
}

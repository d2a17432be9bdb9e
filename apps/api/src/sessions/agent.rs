//! Voice agent seam: the external real-time voice service that conducts the call.
//!
//! `VoiceAgent` is what the session controller talks to. `VapiAgent` is the
//! production implementation over the Vapi REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::sessions::assistant::AssistantConfig;
use crate::sessions::transcript::ConversationTurn;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Lifecycle events emitted by the voice SDK, relayed by the candidate's client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VoiceEvent {
    CallStart,
    CallEnd,
    SpeechStart,
    SpeechEnd,
    /// Carries the full conversation so far.
    Message {
        #[serde(default)]
        conversation: Vec<ConversationTurn>,
    },
}

/// The one live connection a session owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallHandle {
    pub call_id: String,
    /// URL the candidate's client joins to take part in the call.
    pub join_url: Option<String>,
    #[serde(skip)]
    pub control_url: Option<String>,
}

#[async_trait]
pub trait VoiceAgent: Send + Sync {
    async fn start(&self, config: &AssistantConfig) -> Result<CallHandle, VoiceError>;
    async fn stop(&self, call: &CallHandle) -> Result<(), VoiceError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCallResponse {
    id: String,
    web_call_url: Option<String>,
    monitor: Option<CallMonitor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallMonitor {
    control_url: Option<String>,
}

#[derive(Clone)]
pub struct VapiAgent {
    client: Client,
    api_key: String,
    api_base: String,
}

impl VapiAgent {
    pub fn new(api_key: String, api_base: &str) -> Result<Self, VoiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VoiceAgent for VapiAgent {
    async fn start(&self, config: &AssistantConfig) -> Result<CallHandle, VoiceError> {
        let response = self
            .client
            .post(format!("{}/call/web", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&json!({ "assistant": config }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoiceError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let created: CreateCallResponse = response.json().await?;
        info!("Voice call {} created", created.id);

        Ok(CallHandle {
            call_id: created.id,
            join_url: created.web_call_url,
            control_url: created.monitor.and_then(|m| m.control_url),
        })
    }

    async fn stop(&self, call: &CallHandle) -> Result<(), VoiceError> {
        let Some(control_url) = &call.control_url else {
            debug!("Call {} has no control URL; nothing to stop", call.call_id);
            return Ok(());
        };

        let response = self
            .client
            .post(control_url)
            .json(&json!({ "type": "end-call" }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoiceError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        info!("Voice call {} stopped", call.call_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::QuestionItem;
    use crate::sessions::assistant::build_assistant_config;
    use crate::sessions::context::{InterviewContext, InterviewSnapshot};
    use crate::sessions::transcript::Speaker;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> AssistantConfig {
        let context = InterviewContext {
            user_name: "Ana".to_string(),
            user_email: "ana@example.com".to_string(),
            interview: InterviewSnapshot {
                interview_id: Uuid::new_v4(),
                job_position: "Backend Engineer".to_string(),
                job_description: "Rust".to_string(),
                duration: "15 Min".to_string(),
                interview_types: vec!["Technical".to_string()],
                questions: vec![QuestionItem {
                    question: "Why Rust?".to_string(),
                    question_type: "Technical".to_string(),
                }],
            },
        };
        build_assistant_config(&context)
    }

    #[test]
    fn test_events_deserialize_from_sdk_names() {
        let start: VoiceEvent = serde_json::from_str(r#"{"type": "call-start"}"#).unwrap();
        assert_eq!(start, VoiceEvent::CallStart);
        let end: VoiceEvent = serde_json::from_str(r#"{"type": "speech-end"}"#).unwrap();
        assert_eq!(end, VoiceEvent::SpeechEnd);

        let message: VoiceEvent = serde_json::from_str(
            r#"{"type": "message", "conversation": [{"role": "user", "content": "Hi"}]}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            VoiceEvent::Message {
                conversation: vec![ConversationTurn::new(Speaker::User, "Hi")]
            }
        );
    }

    #[test]
    fn test_message_without_conversation_is_empty() {
        let message: VoiceEvent = serde_json::from_str(r#"{"type": "message"}"#).unwrap();
        assert_eq!(
            message,
            VoiceEvent::Message {
                conversation: vec![]
            }
        );
    }

    #[tokio::test]
    async fn test_vapi_start_and_stop() {
        let server = MockServer::start().await;
        let control_url = format!("{}/control/call-1", server.uri());

        Mock::given(method("POST"))
            .and(path("/call/web"))
            .and(header("authorization", "Bearer vapi-key"))
            .and(body_partial_json(json!({"assistant": {"name": "AI Recruiter"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "call-1",
                "webCallUrl": "https://rooms.example.com/call-1",
                "monitor": {"controlUrl": control_url}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/control/call-1"))
            .and(body_partial_json(json!({"type": "end-call"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let agent = VapiAgent::new("vapi-key".to_string(), &server.uri()).unwrap();
        let call = agent.start(&config()).await.unwrap();
        assert_eq!(call.call_id, "call-1");
        assert_eq!(call.join_url.as_deref(), Some("https://rooms.example.com/call-1"));

        agent.stop(&call).await.unwrap();
    }

    #[tokio::test]
    async fn test_vapi_rejection_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/web"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let agent = VapiAgent::new("bad".to_string(), &server.uri()).unwrap();
        match agent.start(&config()).await {
            Err(VoiceError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid key");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stop_without_control_url_is_noop() {
        let agent = VapiAgent::new("key".to_string(), "http://127.0.0.1:9").unwrap();
        let call = CallHandle {
            call_id: "call-2".to_string(),
            join_url: None,
            control_url: None,
        };
        assert!(agent.stop(&call).await.is_ok());
    }
}

use crate::actors::messages::{ClassifierError, LlmMessage};
use crate::actors::traits::LlmActor;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Extra time the handle waits beyond the request timeout before giving up on the runner.
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// Connection settings for the Gemini text-generation API.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// `None` means the service is not configured and no request will be attempted.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiSettings {
    pub fn generate_content_url(&self) -> Result<Url, ClassifierError> {
        let raw = format!(
            "{}/{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            API_VERSION,
            self.model
        );
        Url::parse(&raw).map_err(|e| {
            ClassifierError::ConfigurationMissing(format!("Invalid Gemini endpoint '{}': {}", raw, e))
        })
    }
}

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    configured: bool,
    reply_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task.
    pub fn new(settings: GeminiSettings) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let configured = settings.api_key.is_some();
        let reply_timeout = settings.timeout + REPLY_GRACE;
        let actor = LlmActorRunner::new(receiver, settings);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            configured,
            reply_timeout,
        }
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    async fn generate(&self, instruction: String) -> Result<String, ClassifierError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Generate {
            instruction,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| ClassifierError::Transport(format!("LLM actor unavailable: {}", e)))?;
        timeout(self.reply_timeout, recv)
            .await?
            .map_err(|e| ClassifierError::Transport(format!("LLM actor dropped the request: {}", e)))?
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    settings: GeminiSettings,
    client: Client,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, settings: GeminiSettings) -> Self {
        Self {
            receiver,
            settings,
            client: Client::new(),
        }
    }

    async fn run(mut self) {
        info!(model = %self.settings.model, "LlmActor started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }

        info!("LlmActor stopped");
    }

    async fn handle_message(&self, msg: LlmMessage) {
        match msg {
            LlmMessage::Generate {
                instruction,
                responder,
            } => {
                let result = self.generate_completion(instruction).await;
                let _ = responder.send(result);
            }
        }
    }

    async fn generate_completion(&self, instruction: String) -> Result<String, ClassifierError> {
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            ClassifierError::ConfigurationMissing("GEMINI_API_KEY is not set".to_string())
        })?;
        let url = self.settings.generate_content_url()?;

        debug!(model = %self.settings.model, chars = instruction.len(), "Requesting completion");

        timeout(self.settings.timeout, self.post_instruction(url, api_key, &instruction)).await?
    }

    async fn post_instruction(
        &self,
        url: Url,
        api_key: &str,
        instruction: &str,
    ) -> Result<String, ClassifierError> {
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": instruction }] }]
        });

        let res = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = res.json().await?;
        Ok(completion_text(&json))
    }
}

/// Concatenates the text parts of the first candidate. Missing fields yield an empty string.
fn completion_text(response: &Value) -> String {
    response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String, api_key: Option<&str>) -> GeminiSettings {
        GeminiSettings {
            api_key: api_key.map(str::to_string),
            base_url,
            model: "test-model".to_string(),
            timeout: Duration::from_millis(500),
        }
    }

    const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

    #[tokio::test]
    async fn test_generate_success() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        let handle = LlmActorHandle::new(settings(mock_server.uri(), Some("secret")));

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header(API_KEY_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"promptType\":" }, { "text": "\"Learning\"}" }] }
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        // 2. Act
        let result = handle.generate("Classify this".to_string()).await;

        // 3. Assert
        assert_eq!(result.unwrap(), "{\"promptType\":\"Learning\"}");
    }

    #[tokio::test]
    async fn test_generate_server_error() {
        let mock_server = MockServer::start().await;
        let handle = LlmActorHandle::new(settings(mock_server.uri(), Some("secret")));

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&mock_server)
            .await;

        let result = handle.generate("Hello".to_string()).await;

        assert_eq!(
            result,
            Err(ClassifierError::Status {
                status: 503,
                body: "overloaded".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_missing_key_skips_network_call() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let handle = LlmActorHandle::new(settings(mock_server.uri(), None));
        assert!(!handle.is_configured());

        let result = handle.generate("Hello".to_string()).await;
        assert!(matches!(result, Err(ClassifierError::ConfigurationMissing(_))));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let mock_server = MockServer::start().await;
        let handle = LlmActorHandle::new(settings(mock_server.uri(), Some("secret")));

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "candidates": [] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let result = handle.generate("Hello".to_string()).await;
        assert!(matches!(result, Err(ClassifierError::Timeout(_))));
    }

    #[test]
    fn test_completion_text_missing_candidates() {
        assert_eq!(completion_text(&json!({})), "");
        assert_eq!(completion_text(&json!({ "candidates": [] })), "");
    }

    #[test]
    fn test_generate_content_url() {
        let url = settings("https://example.com/".to_string(), None)
            .generate_content_url()
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/v1beta/models/test-model:generateContent"
        );
    }
}

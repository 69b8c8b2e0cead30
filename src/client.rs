//! HTTP client for the prompt-manager backend. Streaming endpoints hand
//! their response bodies to the stream consumer; nothing is retried here.

use std::time::Duration;

use chrono::Local;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, PromptError, Result};
use crate::logger::Logger;
use crate::stream::{spawn_stream, StreamHandle, StreamSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Model parameters sent with a test run. Wire names match what the
/// backend's test-prompt handler reads.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f64,
    #[serde(rename = "topP")]
    pub top_p: f64,
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "qwen-turbo".to_string(),
            temperature: 0.7,
            top_p: 0.8,
            max_tokens: 2000,
        }
    }
}

impl ModelSettings {
    /// Settings the backend would reject get caught client-side.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(PromptError::Config {
                code: ErrorCode::InvalidSettings,
                message: "model must not be empty".to_string(),
                context: "settings".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(PromptError::Config {
                code: ErrorCode::InvalidSettings,
                message: format!("temperature {} outside 0..=2", self.temperature),
                context: "settings".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(PromptError::Config {
                code: ErrorCode::InvalidSettings,
                message: format!("topP {} outside 0..=1", self.top_p),
                context: "settings".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct TestPromptRequest<'a> {
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(flatten)]
    settings: &'a ModelSettings,
}

#[derive(Serialize)]
struct OptimizeRequest<'a> {
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OptimizeResponse {
    optimized_prompt: String,
}

#[derive(Deserialize)]
struct TestPromptResponse {
    response: String,
}

pub struct PromptClient {
    http: reqwest::Client,
    base_url: String,
    logger: Logger,
}

impl PromptClient {
    /// `base_url` is the backend origin; the `/api` prefix is appended here.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| PromptError::Transport {
                code: ErrorCode::TransportFailed,
                message: err.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: format!("{}/api", base_url.trim_end_matches('/')),
            logger: Logger::new(generate_rid()),
        })
    }

    /// Streams a chat test run. Each decoded fragment reaches `sink` in
    /// order; the returned handle cancels the session. A non-success
    /// status fails here, before any callback fires.
    pub async fn test_prompt_stream<K>(
        &self,
        messages: &[ChatMessage],
        settings: &ModelSettings,
        sink: K,
        timeout: Option<Duration>,
    ) -> Result<StreamHandle>
    where
        K: StreamSink + 'static,
    {
        settings.validate()?;
        let request = TestPromptRequest {
            messages,
            stream: true,
            settings,
        };
        self.open_stream("/test-prompt", &request, sink, timeout)
            .await
    }

    /// Streams an AI optimization pass over `prompt`.
    pub async fn optimize_prompt_stream<K>(
        &self,
        prompt: &str,
        sink: K,
        timeout: Option<Duration>,
    ) -> Result<StreamHandle>
    where
        K: StreamSink + 'static,
    {
        let request = OptimizeRequest {
            prompt,
            stream: true,
        };
        self.open_stream("/optimize-prompt", &request, sink, timeout)
            .await
    }

    /// Non-streaming test run; returns the full model response at once.
    pub async fn test_prompt(
        &self,
        messages: &[ChatMessage],
        settings: &ModelSettings,
    ) -> Result<String> {
        settings.validate()?;
        let request = TestPromptRequest {
            messages,
            stream: false,
            settings,
        };
        let response = self
            .http
            .post(format!("{}/test-prompt", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        let body: TestPromptResponse = response.json().await.map_err(transport_error)?;
        Ok(body.response)
    }

    /// Non-streaming optimization; returns the full optimized prompt.
    pub async fn optimize_prompt(&self, prompt: &str) -> Result<String> {
        let request = OptimizeRequest {
            prompt,
            stream: false,
        };
        let response = self
            .http
            .post(format!("{}/optimize-prompt", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        let body: OptimizeResponse = response.json().await.map_err(transport_error)?;
        Ok(body.optimized_prompt)
    }

    async fn open_stream<B, K>(
        &self,
        route: &str,
        body: &B,
        sink: K,
        timeout: Option<Duration>,
    ) -> Result<StreamHandle>
    where
        B: Serialize,
        K: StreamSink + 'static,
    {
        let url = format!("{}{}", self.base_url, route);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        self.logger.info("client", "stream_open", route);
        let source = response.bytes_stream().boxed();
        Ok(spawn_stream(source, sink, timeout, self.logger.clone()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(PromptError::Http {
        code: ErrorCode::HttpStatus,
        status: status.as_u16(),
        message,
    })
}

fn transport_error(err: reqwest::Error) -> PromptError {
    PromptError::Transport {
        code: ErrorCode::TransportFailed,
        message: err.to_string(),
    }
}

fn generate_rid() -> u64 {
    ((Local::now().timestamp_millis() as u64) ^ (std::process::id() as u64)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_the_backend_defaults() {
        let settings = ModelSettings::default();
        assert_eq!(settings.model, "qwen-turbo");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_serialize_with_wire_field_names() {
        let json = serde_json::to_value(ModelSettings::default()).unwrap();
        assert!(json.get("topP").is_some());
        assert!(json.get("maxTokens").is_some());
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let mut settings = ModelSettings::default();
        settings.temperature = 3.0;
        assert!(settings.validate().is_err());

        let mut settings = ModelSettings::default();
        settings.model = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_request_flattens_settings_next_to_messages() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let settings = ModelSettings::default();
        let request = TestPromptRequest {
            messages: &messages,
            stream: true,
            settings: &settings,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], serde_json::Value::Bool(true));
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["model"], "qwen-turbo");
    }
}

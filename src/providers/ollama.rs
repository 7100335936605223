use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{BackendFuture, ChatBackend};
use crate::config::Config;
use crate::error::BackendError;
use crate::model::Message;
use crate::providers::http_errors::classify_request_error;

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

fn chat_url(base_url: &str) -> String {
    format!("{}/api/chat", base_url.trim_end_matches('/'))
}

fn to_ollama_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

/// Ollama reports failures as `{"error": "..."}`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<OllamaErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Client for a local Ollama server, bound to one model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    api_url: String,
    model: String,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(cfg: &Config) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.model_timeout_secs))
            .danger_accept_invalid_certs(cfg.tls_accept_invalid_certs)
            .build()
            .map_err(|err| {
                BackendError::invocation(format!("Failed to initialize HTTP client: {err}"))
            })?;

        Ok(Self {
            http,
            api_url: chat_url(&cfg.model_base_url),
            model: cfg.model.clone(),
            timeout_secs: cfg.model_timeout_secs,
        })
    }

    /// Builds a client and sends the probe prompt; only a reachable server
    /// with the model available yields a client.
    pub async fn connect(cfg: &Config) -> Result<Self, BackendError> {
        let client = Self::new(cfg)?;
        client.probe(&cfg.probe_prompt).await?;
        info!(
            api_url = %client.api_url,
            model = %client.model,
            "ollama probe succeeded"
        );
        Ok(client)
    }

    pub async fn probe(&self, prompt: &str) -> Result<(), BackendError> {
        self.send(&[Message::user(prompt)]).await.map(|_| ())
    }

    async fn send(&self, messages: &[Message]) -> Result<String, BackendError> {
        let body = OllamaChatRequest {
            model: &self.model,
            stream: false,
            messages: to_ollama_messages(messages),
        };
        debug!(
            api_url = %self.api_url,
            model = %self.model,
            message_count = messages.len(),
            "sending ollama chat request"
        );

        let response = self
            .http
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    api_url = %self.api_url,
                    model = %self.model,
                    error = %err,
                    "ollama request failed"
                );
                classify_request_error(err, &self.api_url, self.timeout_secs)
            })?;

        let status = response.status();
        if !status.is_success() {
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %self.api_url,
                model = %self.model,
                status = %status,
                response_body_len = response_body.len(),
                "ollama returned non-success status"
            );
            let detail = error_detail(&response_body);
            if status == StatusCode::NOT_FOUND {
                return Err(BackendError::ModelNotFound {
                    model: self.model.clone(),
                    detail,
                });
            }
            return Err(BackendError::invocation(format!(
                "Model request failed with status {status}: {detail}"
            )));
        }

        let parsed: OllamaChatResponse = response.json().await.map_err(|err| {
            BackendError::invocation(format!("Failed to parse model chat response: {err}"))
        })?;
        debug!(
            model = %self.model,
            response_len = parsed.message.content.len(),
            "received ollama chat response"
        );
        Ok(parsed.message.content)
    }
}

impl ChatBackend for OllamaClient {
    fn chat<'a>(&'a self, messages: &'a [Message]) -> BackendFuture<'a> {
        Box::pin(self.send(messages))
    }
}

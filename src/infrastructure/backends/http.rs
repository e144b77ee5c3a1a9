#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendPayload;
use crate::domain::models::BackendRequest;
use crate::domain::models::ChatTurn;
use crate::domain::models::ModelName;
use crate::domain::models::Temperature;
use crate::domain::services::extract_error_message;
use crate::domain::services::normalize_body;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct PromptRequest {
    prompt: String,
    model: ModelName,
    temperature: Temperature,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct HistoryRequest {
    messages: Vec<ChatTurn>,
    model: ModelName,
    temperature: Temperature,
}

fn request_body(request: &BackendRequest) -> Result<serde_json::Value, BackendError> {
    let model = request.settings.model;
    let temperature = request.settings.temperature;

    let body = match &request.payload {
        BackendPayload::Prompt(prompt) => serde_json::to_value(PromptRequest {
            prompt: prompt.to_string(),
            model,
            temperature,
        }),
        BackendPayload::History(messages) => serde_json::to_value(HistoryRequest {
            messages: messages.to_vec(),
            model,
            temperature,
        }),
    };

    return body.map_err(|err| return BackendError::Body(err.to_string()));
}

/// Talks to the chat backend over HTTP. The plain and function calling
/// endpoints share one request and response contract.
pub struct ChatBackend {
    url: String,
    timeout: String,
}

impl Default for ChatBackend {
    fn default() -> ChatBackend {
        return ChatBackend {
            url: Config::get(ConfigKey::BackendURL),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for ChatBackend {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Backend URL is not defined");
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        // Any HTTP answer at all means something is listening.
        if let Err(err) = res {
            tracing::error!(error = ?err, "Backend is not reachable");
            bail!("Backend is not reachable at {}", self.url);
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn call(&self, request: BackendRequest) -> Result<String, BackendError> {
        let route = request.route();
        let url = format!(
            "{url}{path}",
            url = self.url.trim_end_matches('/'),
            path = route.endpoint()
        );
        let body = request_body(&request)?;
        tracing::debug!(url = url, body = ?body, "Completion request");

        let res = reqwest::Client::new()
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, "Failed to reach the backend");
                return BackendError::Network(err.to_string());
            })?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|err| return BackendError::Body(err.to_string()))?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                body = text,
                "Completion request was rejected"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        tracing::debug!(body = text, "Completion response");
        let content = normalize_body(&text);
        if content.is_empty() {
            return Err(BackendError::Empty);
        }

        return Ok(content);
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Serialize;
use strum::EnumString;
use strum::EnumVariantNames;
use thiserror::Error;

use super::Command;
use super::CommandKind;
use super::ConversationSettings;
use super::Role;
use super::GENERIC_FAILURE;

/// A message reduced to what the backend sees in history mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PayloadMode {
    /// `{ prompt, model, temperature }`
    #[default]
    Prompt,
    /// `{ messages, model, temperature }`
    History,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendPayload {
    Prompt(String),
    History(Vec<ChatTurn>),
}

impl BackendPayload {
    /// The text routing is decided on: the prompt itself, or the most recent
    /// user turn of a history.
    pub fn routing_text(&self) -> &str {
        match self {
            BackendPayload::Prompt(prompt) => return prompt,
            BackendPayload::History(turns) => {
                return turns
                    .iter()
                    .rev()
                    .find(|turn| return turn.role == Role::User)
                    .map(|turn| return turn.content.as_str())
                    .unwrap_or("");
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackendRequest {
    pub payload: BackendPayload,
    pub settings: ConversationSettings,
    route: Option<CommandKind>,
}

impl BackendRequest {
    pub fn new(payload: BackendPayload, settings: ConversationSettings) -> BackendRequest {
        return BackendRequest {
            payload,
            settings,
            route: None,
        };
    }

    /// Overrides prefix based routing.
    pub fn with_route(mut self, route: CommandKind) -> BackendRequest {
        self.route = Some(route);
        return self;
    }

    pub fn route(&self) -> CommandKind {
        if let Some(route) = self.route {
            return route;
        }

        return Command::parse(self.payload.routing_text()).kind;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Failed to reach the backend: {0}")]
    Network(String),
    #[error("Backend responded with status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("Failed to read the backend response: {0}")]
    Body(String),
    #[error("Backend returned an empty response")]
    Empty,
}

impl BackendError {
    /// Human readable reason shown next to the failed message.
    pub fn display_message(&self) -> String {
        match self {
            BackendError::Status {
                message: Some(message),
                ..
            } => return message.to_string(),
            BackendError::Empty => return self.to_string(),
            _ => return GENERIC_FAILURE.to_string(),
        }
    }
}

#[async_trait]
pub trait Backend {
    /// Used at startup to verify the backend can be reached at all.
    async fn health_check(&self) -> Result<()>;

    /// Sends one generation request and yields the normalized response text.
    /// Routing between the plain and function calling endpoints is decided by
    /// `BackendRequest::route`.
    async fn call(&self, request: BackendRequest) -> Result<String, BackendError>;
}

pub type BackendBox = Arc<dyn Backend + Send + Sync>;

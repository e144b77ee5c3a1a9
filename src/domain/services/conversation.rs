#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::RwLock;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendError;
use crate::domain::models::BackendPayload;
use crate::domain::models::BackendRequest;
use crate::domain::models::ChatTurn;
use crate::domain::models::Command;
use crate::domain::models::ConversationSettings;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::MessageId;
use crate::domain::models::ModelName;
use crate::domain::models::PayloadMode;
use crate::domain::models::Role;
use crate::domain::models::SettingsError;
use crate::domain::models::Temperature;

#[derive(Clone, Debug, Default)]
pub struct StoreOptions {
    pub payload_mode: PayloadMode,
    /// Prepended as a `system` turn in history mode. Empty disables it.
    pub system_prompt: String,
}

struct Inner {
    backend: BackendBox,
    options: StoreOptions,
    messages: RwLock<Vec<Message>>,
    settings: RwLock<ConversationSettings>,
    listener: Option<mpsc::UnboundedSender<Event>>,
}

/// Owns the ordered message list and mediates every generation request.
///
/// Cloning is cheap and every clone sees the same conversation, so callers
/// can issue sends and regenerations from independent tasks. Locks are never
/// held across a backend call, and every mutation replaces the whole list
/// against its latest snapshot, so completions for different messages can
/// land in any order without touching each other.
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<Inner>,
}

impl ConversationStore {
    pub fn new(
        backend: BackendBox,
        settings: ConversationSettings,
        options: StoreOptions,
    ) -> ConversationStore {
        return ConversationStore {
            inner: Arc::new(Inner {
                backend,
                options,
                messages: RwLock::new(vec![]),
                settings: RwLock::new(settings),
                listener: None,
            }),
        };
    }

    /// Publishes a snapshot to `tx` after every change.
    pub fn with_listener(
        backend: BackendBox,
        settings: ConversationSettings,
        options: StoreOptions,
        tx: mpsc::UnboundedSender<Event>,
    ) -> ConversationStore {
        return ConversationStore {
            inner: Arc::new(Inner {
                backend,
                options,
                messages: RwLock::new(vec![]),
                settings: RwLock::new(settings),
                listener: Some(tx),
            }),
        };
    }

    pub async fn messages(&self) -> Vec<Message> {
        return self.inner.messages.read().await.clone();
    }

    pub async fn settings(&self) -> ConversationSettings {
        return *self.inner.settings.read().await;
    }

    pub async fn set_model(&self, name: &str) -> Result<ConversationSettings, SettingsError> {
        let model = ModelName::parse(name)?;
        let mut settings = self.inner.settings.write().await;
        settings.model = model;
        self.publish(Event::SettingsUpdated(*settings));

        return Ok(*settings);
    }

    pub async fn set_temperature(
        &self,
        value: f64,
    ) -> Result<ConversationSettings, SettingsError> {
        let temperature = Temperature::new(value)?;
        let mut settings = self.inner.settings.write().await;
        settings.temperature = temperature;
        self.publish(Event::SettingsUpdated(*settings));

        return Ok(*settings);
    }

    /// Appends a user message and its loading placeholder, then waits on the
    /// backend and fills the placeholder in. Returns the placeholder's id, or
    /// `None` when the text was blank and nothing happened.
    pub async fn send_message(&self, text: &str) -> Option<MessageId> {
        let prompt = text.trim();
        if prompt.is_empty() {
            tracing::debug!("Ignoring blank prompt");
            return None;
        }

        let user_message = Message::user(prompt);
        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id;

        let payload = {
            let mut messages = self.inner.messages.write().await;
            let mut next = messages.clone();
            next.push(user_message);
            let payload = self.compose_payload(&next);
            next.push(placeholder);

            *messages = next;
            self.publish(Event::ConversationUpdated(messages.clone()));

            payload
        };

        let request = BackendRequest::new(payload, self.settings().await)
            .with_route(Command::parse(prompt).kind);
        self.generate(placeholder_id, request, false).await;

        return Some(placeholder_id);
    }

    /// Re-issues the prompt that produced an assistant message and replaces its
    /// content in place. Returns `false` without calling the backend when the
    /// id is unknown, isn't an assistant message, or has no user message
    /// before it.
    ///
    /// Two regenerations racing on the same id aren't guarded: whichever
    /// resolves last wins.
    pub async fn regenerate_message(&self, message_id: MessageId) -> bool {
        let (payload, route) = {
            let mut messages = self.inner.messages.write().await;
            let Some(idx) = messages.iter().position(|msg| return msg.id == message_id) else {
                tracing::debug!(id = %message_id, "Regenerate ignored, no such message");
                return false;
            };

            if messages[idx].role != Role::Assistant {
                tracing::debug!(id = %message_id, "Regenerate ignored, not an assistant message");
                return false;
            }

            let Some(user_idx) = messages[..idx]
                .iter()
                .rposition(|msg| return msg.role == Role::User)
            else {
                tracing::debug!(id = %message_id, "Regenerate ignored, no preceding prompt");
                return false;
            };

            let payload = self.compose_payload(&messages[..=user_idx]);
            let route = Command::parse(&messages[user_idx].content).kind;

            *messages = messages
                .iter()
                .map(|msg| {
                    if msg.id == message_id {
                        return msg.regenerating();
                    }
                    return msg.clone();
                })
                .collect();
            self.publish(Event::ConversationUpdated(messages.clone()));

            (payload, route)
        };

        let request = BackendRequest::new(payload, self.settings().await).with_route(route);
        self.generate(message_id, request, true).await;

        return true;
    }

    /// `messages` must end with the user message being answered.
    fn compose_payload(&self, messages: &[Message]) -> BackendPayload {
        if self.inner.options.payload_mode == PayloadMode::Prompt {
            let prompt = messages
                .last()
                .map(|msg| return msg.content.to_string())
                .unwrap_or_default();

            return BackendPayload::Prompt(prompt);
        }

        let mut turns: Vec<ChatTurn> = vec![];
        if !self.inner.options.system_prompt.is_empty() {
            turns.push(ChatTurn {
                role: Role::System,
                content: self.inner.options.system_prompt.to_string(),
            });
        }

        turns.extend(
            messages
                .iter()
                .filter(|msg| return msg.is_completed_turn())
                .map(|msg| return msg.as_turn()),
        );

        return BackendPayload::History(turns);
    }

    async fn generate(&self, message_id: MessageId, request: BackendRequest, keep_content: bool) {
        tracing::debug!(id = %message_id, route = ?request.route(), "Requesting completion");

        // A settled message never has blank content.
        let result = match self.inner.backend.call(request).await {
            Ok(content) if content.trim().is_empty() => Err(BackendError::Empty),
            result => result,
        };

        match result {
            Ok(content) => {
                self.replace_by_id(message_id, |msg| return msg.resolved(&content))
                    .await;
            }
            Err(err) => {
                tracing::error!(id = %message_id, error = %err, "Completion request failed");
                let reason = err.display_message();
                self.replace_by_id(message_id, |msg| return msg.failed(&reason, keep_content))
                    .await;
            }
        }
    }

    async fn replace_by_id<F>(&self, message_id: MessageId, update: F)
    where
        F: Fn(&Message) -> Message,
    {
        let mut messages = self.inner.messages.write().await;
        *messages = messages
            .iter()
            .map(|msg| {
                if msg.id == message_id {
                    return update(msg);
                }
                return msg.clone();
            })
            .collect();

        self.publish(Event::ConversationUpdated(messages.clone()));
    }

    fn publish(&self, event: Event) {
        if let Some(tx) = &self.inner.listener {
            // The UI going away first is normal during shutdown.
            if tx.send(event).is_err() {
                tracing::debug!("Conversation listener is closed");
            }
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::RwLock;

use super::ConversationStore;
use super::StoreOptions;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendPayload;
use crate::domain::models::BackendRequest;
use crate::domain::models::ChatTurn;
use crate::domain::models::CommandKind;
use crate::domain::models::ConversationSettings;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::ModelName;
use crate::domain::models::PayloadMode;
use crate::domain::models::Role;

/// Answers every call from a queue, recording what it was asked.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<Vec<Result<String, BackendError>>>,
    calls: Mutex<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    fn replying(replies: Vec<Result<String, BackendError>>) -> Arc<ScriptedBackend> {
        return Arc::new(ScriptedBackend {
            replies: Mutex::new(replies),
            calls: Mutex::new(vec![]),
        });
    }

    fn calls(&self) -> Vec<BackendRequest> {
        return self.calls.lock().unwrap().clone();
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn call(&self, request: BackendRequest) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(BackendError::Network("no scripted reply".to_string()));
        }
        return replies.remove(0);
    }
}

/// Holds each call open until the test releases the reply for its prompt.
#[derive(Default)]
struct GatedBackend {
    gates: Mutex<HashMap<String, oneshot::Receiver<Result<String, BackendError>>>>,
}

impl GatedBackend {
    fn gate(&self, prompt: &str) -> oneshot::Sender<Result<String, BackendError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(prompt.to_string(), rx);
        return tx;
    }
}

#[async_trait]
impl Backend for GatedBackend {
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn call(&self, request: BackendRequest) -> Result<String, BackendError> {
        let prompt = request.payload.routing_text().to_string();
        let rx = self.gates.lock().unwrap().remove(&prompt).unwrap();
        return rx
            .await
            .unwrap_or_else(|_| return Err(BackendError::Network("gate dropped".to_string())));
    }
}

fn store_with(backend: Arc<dyn Backend + Send + Sync>) -> ConversationStore {
    return ConversationStore::new(
        backend,
        ConversationSettings::default(),
        StoreOptions::default(),
    );
}

fn history_store_with(backend: Arc<dyn Backend + Send + Sync>, system: &str) -> ConversationStore {
    return ConversationStore::new(
        backend,
        ConversationSettings::default(),
        StoreOptions {
            payload_mode: PayloadMode::History,
            system_prompt: system.to_string(),
        },
    );
}

impl ConversationStore {
    fn seeded(backend: Arc<dyn Backend + Send + Sync>, messages: Vec<Message>) -> ConversationStore {
        return ConversationStore {
            inner: Arc::new(super::Inner {
                backend,
                options: StoreOptions::default(),
                messages: RwLock::new(messages),
                settings: RwLock::new(ConversationSettings::default()),
                listener: None,
            }),
        };
    }
}

async fn wait_for_len(store: &ConversationStore, len: usize) {
    while store.messages().await.len() < len {
        tokio::task::yield_now().await;
    }
}

mod send_message {
    use super::*;

    #[tokio::test]
    async fn it_appends_a_user_and_assistant_pair() {
        let backend = ScriptedBackend::replying(vec![Ok("Hi there".to_string())]);
        let store = store_with(backend.clone());

        let id = store.send_message("Hello").await.unwrap();
        let messages = store.messages().await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].id, id);
        assert_eq!(messages[1].content, "Hi there");
        assert!(!messages[1].is_loading);
        assert!(!messages[1].error);
    }

    #[tokio::test]
    async fn it_starts_the_placeholder_loading() {
        let backend = Arc::new(GatedBackend::default());
        let gate = backend.gate("Hello");
        let store = store_with(backend);

        let task_store = store.clone();
        let task = tokio::spawn(async move {
            return task_store.send_message("Hello").await;
        });
        wait_for_len(&store, 2).await;

        let messages = store.messages().await;
        assert_eq!(messages[0].content, "Hello");
        assert!(!messages[0].is_loading);
        assert!(messages[1].content.is_empty());
        assert!(messages[1].is_loading);

        gate.send(Ok("Hi there".to_string())).unwrap();
        task.await.unwrap();

        let messages = store.messages().await;
        assert_eq!(messages[1].content, "Hi there");
        assert!(!messages[1].is_loading);
    }

    #[tokio::test]
    async fn it_ignores_blank_prompts() {
        let backend = ScriptedBackend::replying(vec![]);
        let store = store_with(backend.clone());

        assert!(store.send_message("").await.is_none());
        assert!(store.send_message("   \n\t ").await.is_none());

        assert!(store.messages().await.is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn it_trims_prompts() {
        let backend = ScriptedBackend::replying(vec![Ok("ok".to_string())]);
        let store = store_with(backend.clone());

        store.send_message("  Hello  ").await;

        assert_eq!(store.messages().await[0].content, "Hello");
        assert_eq!(
            backend.calls()[0].payload,
            BackendPayload::Prompt("Hello".to_string())
        );
    }

    #[tokio::test]
    async fn it_sends_current_settings() {
        let backend = ScriptedBackend::replying(vec![Ok("ok".to_string())]);
        let store = store_with(backend.clone());
        store.set_model("gpt-4o-mini").await.unwrap();
        store.set_temperature(0.2).await.unwrap();

        store.send_message("Hello").await;

        let calls = backend.calls();
        assert_eq!(calls[0].settings.model, ModelName::Gpt4oMini);
        assert_eq!(calls[0].settings.temperature.value(), 0.2);
    }

    #[tokio::test]
    async fn it_routes_weather_prompts() {
        let backend = ScriptedBackend::replying(vec![Ok("| Date |".to_string())]);
        let store = store_with(backend.clone());

        store.send_message("#weather Paris").await;

        assert_eq!(backend.calls()[0].route(), CommandKind::Weather);
    }

    #[tokio::test]
    async fn it_keeps_failed_placeholders() {
        let backend = ScriptedBackend::replying(vec![Err(BackendError::Network(
            "connection refused".to_string(),
        ))]);
        let store = store_with(backend);

        store.send_message("Hello").await;
        let messages = store.messages().await;

        assert_eq!(messages.len(), 2);
        assert!(messages[1].error);
        assert!(!messages[1].is_loading);
        assert_eq!(messages[1].content, "Error: Failed to get response");
    }

    #[tokio::test]
    async fn it_surfaces_backend_error_messages() {
        let backend = ScriptedBackend::replying(vec![Err(BackendError::Status {
            status: 503,
            message: Some("API call failed: quota".to_string()),
        })]);
        let store = store_with(backend);

        store.send_message("Hello").await;
        let messages = store.messages().await;

        assert_eq!(messages[1].content, "Error: API call failed: quota");
        assert_eq!(
            messages[1].error_message,
            Some("API call failed: quota".to_string())
        );
    }

    #[tokio::test]
    async fn it_fails_blank_replies() {
        let backend = ScriptedBackend::replying(vec![Ok("".to_string())]);
        let store = store_with(backend);

        store.send_message("Hello").await;
        let messages = store.messages().await;

        assert_eq!(messages.len(), 2);
        assert!(messages[1].error);
        assert!(!messages[1].is_loading);
        assert_eq!(
            messages[1].content,
            "Error: Backend returned an empty response"
        );
    }

    #[tokio::test]
    async fn it_matches_out_of_order_completions_by_id() {
        let backend = Arc::new(GatedBackend::default());
        let first_gate = backend.gate("first");
        let second_gate = backend.gate("second");
        let store = store_with(backend);

        let first_store = store.clone();
        let first = tokio::spawn(async move {
            return first_store.send_message("first").await;
        });
        wait_for_len(&store, 2).await;

        let second_store = store.clone();
        let second = tokio::spawn(async move {
            return second_store.send_message("second").await;
        });
        wait_for_len(&store, 4).await;

        second_gate.send(Ok("two".to_string())).unwrap();
        let second_id = second.await.unwrap().unwrap();

        let messages = store.messages().await;
        assert_eq!(messages[3].id, second_id);
        assert_eq!(messages[3].content, "two");
        assert!(!messages[3].is_loading);
        assert!(messages[1].content.is_empty());
        assert!(messages[1].is_loading);

        first_gate.send(Ok("one".to_string())).unwrap();
        let first_id = first.await.unwrap().unwrap();

        let messages = store.messages().await;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].id, first_id);
        assert_eq!(messages[1].content, "one");
        assert_eq!(messages[3].content, "two");
        assert_eq!(
            messages.iter().map(|m| return m.role).collect::<Vec<_>>(),
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn it_publishes_snapshots() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let backend = ScriptedBackend::replying(vec![Ok("Hi".to_string())]);
        let store = ConversationStore::with_listener(
            backend,
            ConversationSettings::default(),
            StoreOptions::default(),
            tx,
        );

        store.send_message("Hello").await;

        match rx.recv().await.unwrap() {
            Event::ConversationUpdated(messages) => {
                assert_eq!(messages.len(), 2);
                assert!(messages[1].is_loading);
            }
            _ => panic!("Wrong event"),
        }
        match rx.recv().await.unwrap() {
            Event::ConversationUpdated(messages) => {
                assert_eq!(messages[1].content, "Hi");
                assert!(!messages[1].is_loading);
            }
            _ => panic!("Wrong event"),
        }
    }
}

mod history_mode {
    use super::*;

    fn turn(role: Role, content: &str) -> ChatTurn {
        return ChatTurn {
            role,
            content: content.to_string(),
        };
    }

    #[tokio::test]
    async fn it_sends_completed_turns() {
        let backend = ScriptedBackend::replying(vec![
            Ok("Hi!".to_string()),
            Err(BackendError::Network("down".to_string())),
            Ok("Sunny".to_string()),
        ]);
        let store = history_store_with(backend.clone(), "");

        store.send_message("Hello").await;
        store.send_message("Broken").await;
        store.send_message("#weather Paris").await;

        let calls = backend.calls();
        assert_eq!(
            calls[0].payload,
            BackendPayload::History(vec![turn(Role::User, "Hello")])
        );
        assert_eq!(
            calls[2].payload,
            BackendPayload::History(vec![
                turn(Role::User, "Hello"),
                turn(Role::Assistant, "Hi!"),
                turn(Role::User, "Broken"),
                turn(Role::User, "#weather Paris"),
            ])
        );
        assert_eq!(calls[2].route(), CommandKind::Weather);
    }

    #[tokio::test]
    async fn it_synthesizes_a_system_turn() {
        let backend = ScriptedBackend::replying(vec![Ok("Hi!".to_string())]);
        let store = history_store_with(backend.clone(), "Answer in markdown.");

        store.send_message("Hello").await;

        assert_eq!(
            backend.calls()[0].payload,
            BackendPayload::History(vec![
                turn(Role::System, "Answer in markdown."),
                turn(Role::User, "Hello"),
            ])
        );
        assert!(store
            .messages()
            .await
            .iter()
            .all(|msg| return msg.role != Role::System));
    }

    #[tokio::test]
    async fn it_regenerates_from_the_triggering_prompt() {
        let backend = ScriptedBackend::replying(vec![
            Ok("One".to_string()),
            Ok("Two".to_string()),
            Ok("One again".to_string()),
        ]);
        let store = history_store_with(backend.clone(), "");

        let first_id = store.send_message("First").await.unwrap();
        store.send_message("Second").await;
        assert!(store.regenerate_message(first_id).await);

        assert_eq!(
            backend.calls()[2].payload,
            BackendPayload::History(vec![turn(Role::User, "First")])
        );
        assert_eq!(store.messages().await[1].content, "One again");
    }
}

mod regenerate_message {
    use super::*;

    #[tokio::test]
    async fn it_replaces_content_in_place() {
        let backend = ScriptedBackend::replying(vec![
            Ok("First answer".to_string()),
            Ok("Second answer".to_string()),
        ]);
        let store = store_with(backend.clone());

        let id = store.send_message("Hello").await.unwrap();
        assert!(store.regenerate_message(id).await);

        let messages = store.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].id, id);
        assert_eq!(messages[1].content, "Second answer");
        assert!(!messages[1].is_loading);
        assert_eq!(
            backend.calls()[1].payload,
            BackendPayload::Prompt("Hello".to_string())
        );
    }

    #[tokio::test]
    async fn it_marks_loading_and_keeps_previous_content() {
        let backend = Arc::new(GatedBackend::default());
        let first_gate = backend.gate("Hello");
        let store = store_with(backend.clone());

        let id = {
            let task_store = store.clone();
            let task = tokio::spawn(async move {
                return task_store.send_message("Hello").await;
            });
            wait_for_len(&store, 2).await;
            first_gate.send(Ok("First answer".to_string())).unwrap();
            task.await.unwrap().unwrap()
        };

        let second_gate = backend.gate("Hello");
        let task_store = store.clone();
        let task = tokio::spawn(async move {
            return task_store.regenerate_message(id).await;
        });
        while !store.messages().await[1].is_loading {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.messages().await[1].content, "First answer");

        second_gate.send(Ok("Second answer".to_string())).unwrap();
        assert!(task.await.unwrap());
        assert_eq!(store.messages().await[1].content, "Second answer");
    }

    #[tokio::test]
    async fn it_uses_settings_at_regeneration_time() {
        let backend = ScriptedBackend::replying(vec![Ok("a".to_string()), Ok("b".to_string())]);
        let store = store_with(backend.clone());

        let id = store.send_message("Hello").await.unwrap();
        store.set_model("gpt-4o-mini").await.unwrap();
        store.regenerate_message(id).await;

        let calls = backend.calls();
        assert_eq!(calls[0].settings.model, ModelName::Gpt4o);
        assert_eq!(calls[1].settings.model, ModelName::Gpt4oMini);
    }

    #[tokio::test]
    async fn it_keeps_content_on_failure() {
        let backend = ScriptedBackend::replying(vec![
            Ok("First answer".to_string()),
            Err(BackendError::Status {
                status: 503,
                message: Some("API call failed".to_string()),
            }),
        ]);
        let store = store_with(backend);

        let id = store.send_message("Hello").await.unwrap();
        assert!(store.regenerate_message(id).await);

        let messages = store.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "First answer");
        assert!(messages[1].error);
        assert!(!messages[1].is_loading);
        assert_eq!(messages[1].error_message, Some("API call failed".to_string()));
    }

    #[tokio::test]
    async fn it_keeps_content_on_blank_replies() {
        let backend = ScriptedBackend::replying(vec![
            Ok("First answer".to_string()),
            Ok("  \n ".to_string()),
        ]);
        let store = store_with(backend);

        let id = store.send_message("Hello").await.unwrap();
        assert!(store.regenerate_message(id).await);

        let messages = store.messages().await;
        assert_eq!(messages[1].content, "First answer");
        assert!(messages[1].error);
        assert!(!messages[1].is_loading);
    }

    #[tokio::test]
    async fn it_clears_errors_on_success() {
        let backend = ScriptedBackend::replying(vec![
            Err(BackendError::Network("down".to_string())),
            Ok("Recovered".to_string()),
        ]);
        let store = store_with(backend);

        let id = store.send_message("Hello").await.unwrap();
        assert!(store.messages().await[1].error);
        store.regenerate_message(id).await;

        let messages = store.messages().await;
        assert_eq!(messages[1].content, "Recovered");
        assert!(!messages[1].error);
        assert_eq!(messages[1].error_message, None);
    }

    #[tokio::test]
    async fn it_ignores_unknown_ids() {
        let backend = ScriptedBackend::replying(vec![Ok("a".to_string())]);
        let store = store_with(backend.clone());
        store.send_message("Hello").await;
        let before = store.messages().await;

        assert!(!store.regenerate_message(Message::placeholder().id).await);

        assert_eq!(store.messages().await, before);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn it_ignores_user_messages() {
        let backend = ScriptedBackend::replying(vec![Ok("a".to_string())]);
        let store = store_with(backend.clone());
        store.send_message("Hello").await;
        let user_id = store.messages().await[0].id;

        assert!(!store.regenerate_message(user_id).await);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn it_ignores_assistant_messages_without_a_prompt() {
        let backend = ScriptedBackend::replying(vec![Ok("a".to_string())]);
        let greeting = Message::placeholder().resolved("How can I help?");
        let store = ConversationStore::seeded(backend.clone(), vec![greeting.clone()]);

        assert!(!store.regenerate_message(greeting.id).await);

        assert_eq!(store.messages().await, vec![greeting]);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn it_uses_the_nearest_preceding_prompt() {
        let backend = ScriptedBackend::replying(vec![Ok("again".to_string())]);
        let first = Message::user("First");
        let second = Message::user("Second");
        let answer = Message::placeholder().resolved("Answer");
        let store = ConversationStore::seeded(
            backend.clone(),
            vec![first, second, answer.clone()],
        );

        assert!(store.regenerate_message(answer.id).await);
        assert_eq!(
            backend.calls()[0].payload,
            BackendPayload::Prompt("Second".to_string())
        );
    }
}

mod settings {
    use super::*;

    #[tokio::test]
    async fn it_rejects_unlisted_values() {
        let store = store_with(ScriptedBackend::replying(vec![]));

        assert!(store.set_model("gpt-3").await.is_err());
        assert!(store.set_temperature(1.2).await.is_err());
        assert_eq!(store.settings().await, ConversationSettings::default());
    }

    #[tokio::test]
    async fn it_updates_listed_values() {
        let store = store_with(ScriptedBackend::replying(vec![]));

        let settings = store.set_temperature(0.9).await.unwrap();
        assert_eq!(settings.temperature.value(), 0.9);
        assert_eq!(store.settings().await.temperature.value(), 0.9);
    }
}

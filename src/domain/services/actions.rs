#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::Result;
use strum::VariantNames;
use tokio::sync::mpsc;

use super::clipboard::ClipboardService;
use super::ConversationStore;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::ModelName;
use crate::domain::models::Notice;
use crate::domain::models::Temperature;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /models (/ml) - Lists all available models.
- /model (/m) [MODEL_NAME,MODEL_INDEX] - Sets the model used for every following message. You can pass either the model name, or the index from /models.
- /temperature (/t) [VALUE] - Sets the sampling temperature. Allowed values are 0.2, 0.7 and 0.9.
- /regenerate (/r) [MESSAGE_NUMBER?] - Regenerates an assistant message in place. Defaults to the last one.
- /weather (/w) - Starts a weather prompt, answered by the function calling endpoint.
- /copy (/c) [CODE_BLOCK_NUMBER?] - Copies the entire chat history to your clipboard. When a CODE_BLOCK_NUMBER is used, only the specified code blocks are copied.
- /copymessage (/cm) [MESSAGE_NUMBER?] - Copies a single assistant message as it was received. Defaults to the last one.
- /quit /exit (/q) - Exit.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Enter - Send the message.
- Tab - Switch focus between the input and the history sidebar.
- Up arrow - Scroll up, or select the previous history entry.
- Down arrow - Scroll down, or select the next history entry.
- CTRL+U / Page up - Page up
- CTRL+D / Page down - Page down
- CTRL+W - Start a weather prompt.
- CTRL+R - Regenerate the last assistant message.
- CTRL+C - Exit.

CODE BLOCKS:
Each code block in an answer is numbered with a (NUMBER) next to its opening fence. The CODE_BLOCK_NUMBER can be set as follows:
- `1` - Selects the first code block
- `1,3,5` - Selects code blocks 1, 3, and 5.
- `2..5`- Selects an inclusive range of code blocks between 2 and 5.
        "#;

    return text.trim().to_string();
}

pub fn model_list_text() -> String {
    return ModelName::VARIANTS
        .iter()
        .enumerate()
        .map(|(idx, model)| {
            let n = idx + 1;
            return format!("- ({n}) {model}");
        })
        .collect::<Vec<String>>()
        .join("\n");
}

/// Accepts a model name or its 1-based index from the model list.
pub fn resolve_model_name(text: &str) -> String {
    let text = text.trim();
    if let Ok(idx) = text.parse::<usize>() {
        if idx >= 1 && idx <= ModelName::VARIANTS.len() {
            return ModelName::VARIANTS[idx - 1].to_string();
        }
    }

    return text.to_string();
}

pub fn format_chat(messages: &[Message]) -> String {
    return messages
        .iter()
        .map(|message| {
            return format!("{}: {}", message.role, message.content);
        })
        .collect::<Vec<String>>()
        .join("\n\n");
}

fn notify(tx: &mpsc::UnboundedSender<Event>, notice: Notice) -> Result<()> {
    tx.send(Event::Notice(notice))?;
    return Ok(());
}

async fn set_model(
    store: &ConversationStore,
    tx: &mpsc::UnboundedSender<Event>,
    text: &str,
) -> Result<()> {
    let model_name = resolve_model_name(text);
    match store.set_model(&model_name).await {
        Ok(settings) => {
            notify(
                tx,
                Notice::info(&format!("{} has entered the chat.", settings.model)),
            )?;
        }
        Err(err) => {
            notify(tx, Notice::error(&err.to_string()))?;
        }
    }

    return Ok(());
}

async fn set_temperature(
    store: &ConversationStore,
    tx: &mpsc::UnboundedSender<Event>,
    text: &str,
) -> Result<()> {
    let res = match Temperature::parse(text) {
        Ok(temperature) => store.set_temperature(temperature.value()).await,
        Err(err) => Err(err),
    };

    match res {
        Ok(settings) => {
            notify(
                tx,
                Notice::info(&format!("Temperature set to {}.", settings.temperature)),
            )?;
        }
        Err(err) => {
            notify(tx, Notice::error(&err.to_string()))?;
        }
    }

    return Ok(());
}

fn copy(tx: &mpsc::UnboundedSender<Event>, text: String, success: &str) -> Result<()> {
    if let Err(err) = ClipboardService::set(text) {
        tracing::error!(error = ?err, "Failed to copy to clipboard");
        return notify(tx, Notice::error(&err.to_string()));
    }

    return notify(tx, Notice::info(success));
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs until every action sender is dropped. Sends and regenerations are
    /// spawned so any number of them can be in flight at once; the store
    /// publishes their progress on its own.
    pub async fn start(
        store: ConversationStore,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        while let Some(action) = rx.recv().await {
            match action {
                Action::SendMessage(text) => {
                    let worker_store = store.clone();
                    tokio::spawn(async move {
                        worker_store.send_message(&text).await;
                    });
                }
                Action::RegenerateMessage(message_id) => {
                    let worker_store = store.clone();
                    let worker_tx = tx.clone();
                    tokio::spawn(async move {
                        if !worker_store.regenerate_message(message_id).await {
                            let _ = notify(
                                &worker_tx,
                                Notice::error("That message can't be regenerated."),
                            );
                        }
                    });
                }
                Action::SetModel(text) => {
                    set_model(&store, &tx, &text).await?;
                }
                Action::SetTemperature(text) => {
                    set_temperature(&store, &tx, &text).await?;
                }
                Action::CopyMessage(message) => {
                    copy(&tx, message.content, "Copied message to clipboard.")?;
                }
                Action::CopyMessages(messages) => {
                    copy(&tx, format_chat(&messages), "Copied chat log to clipboard.")?;
                }
                Action::CopyText(text) => {
                    copy(&tx, text, "Copied code block to clipboard.")?;
                }
            }
        }

        return Ok(());
    }
}

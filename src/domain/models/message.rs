#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use std::fmt;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::ChatTurn;

pub const GENERIC_FAILURE: &str = "Failed to get response";

/// Identifies a message for its whole lifetime. Used as the key for in-place
/// replacement and as the scroll anchor in the UI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> MessageId {
        return MessageId(Uuid::new_v4());
    }
}

impl Default for MessageId {
    fn default() -> MessageId {
        return MessageId::new();
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Only ever synthesized when composing outbound history.
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub is_loading: bool,
    pub error: bool,
    pub error_message: Option<String>,
}

impl Message {
    pub fn user(content: &str) -> Message {
        return Message {
            id: MessageId::new(),
            role: Role::User,
            content: content.to_string(),
            is_loading: false,
            error: false,
            error_message: None,
        };
    }

    pub fn placeholder() -> Message {
        return Message {
            id: MessageId::new(),
            role: Role::Assistant,
            content: "".to_string(),
            is_loading: true,
            error: false,
            error_message: None,
        };
    }

    /// Copy of this message carrying a successful generation.
    pub fn resolved(&self, content: &str) -> Message {
        return Message {
            content: content.to_string(),
            is_loading: false,
            error: false,
            error_message: None,
            ..self.clone()
        };
    }

    /// Copy of this message marking a failed generation. With
    /// `keep_content`, whatever was there before is left untouched, otherwise
    /// the content becomes a readable error line.
    pub fn failed(&self, reason: &str, keep_content: bool) -> Message {
        let mut content = self.content.to_string();
        if !keep_content {
            content = format!("Error: {reason}");
        }

        return Message {
            content,
            is_loading: false,
            error: true,
            error_message: Some(reason.to_string()),
            ..self.clone()
        };
    }

    pub fn regenerating(&self) -> Message {
        return Message {
            is_loading: true,
            ..self.clone()
        };
    }

    /// Loading and failed turns never go back to the backend.
    pub fn is_completed_turn(&self) -> bool {
        return !self.is_loading && !self.error && self.role != Role::System;
    }

    pub fn as_turn(&self) -> ChatTurn {
        return ChatTurn {
            role: self.role,
            content: self.content.to_string(),
        };
    }

    pub fn codeblocks(&self) -> Vec<String> {
        let mut codeblocks: Vec<String> = vec![];
        let mut current_codeblock: Vec<&str> = vec![];
        let mut in_codeblock = false;

        for line in self.content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("```") {
                if in_codeblock {
                    codeblocks.push(current_codeblock.join("\n"));
                    current_codeblock = vec![];
                    in_codeblock = false;
                } else {
                    in_codeblock = true;
                }
                continue;
            }

            if in_codeblock {
                current_codeblock.push(line);
            }
        }

        // Unclosed fences still get a number when rendered.
        if in_codeblock {
            codeblocks.push(current_codeblock.join("\n"));
        }

        return codeblocks;
    }
}

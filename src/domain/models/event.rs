use tui_textarea::Input;

use super::ConversationSettings;
use super::Message;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(text: &str) -> Notice {
        return Notice {
            text: text.to_string(),
            is_error: false,
        };
    }

    pub fn error(text: &str) -> Notice {
        return Notice {
            text: text.to_string(),
            is_error: true,
        };
    }
}

#[derive(Debug)]
pub enum Event {
    ConversationUpdated(Vec<Message>),
    SettingsUpdated(ConversationSettings),
    Notice(Notice),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLR(),
    KeyboardCTRLW(),
    KeyboardEnter(),
    KeyboardPaste(String),
    KeyboardTab(),
    UIResize(),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UITick(),
}

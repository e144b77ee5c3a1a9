#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use std::num::ParseIntError;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::actions::help_text;
use super::actions::model_list_text;
use super::BubbleList;
use super::CodeBlocks;
use super::Scroll;
use super::Sidebar;
use super::Themes;
use crate::domain::models::Action;
use crate::domain::models::ConversationSettings;
use crate::domain::models::Message;
use crate::domain::models::Notice;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::models::WEATHER_PREFIX;

fn parse_message_number(arg: Option<&str>) -> Result<Option<usize>, ParseIntError> {
    return arg.map(|e| return e.trim().parse::<usize>()).transpose();
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Input,
    Sidebar,
}

/// Everything the terminal shows, rebuilt from the snapshots the store
/// publishes. Holds no conversation state of its own.
pub struct AppState {
    pub bubble_list: BubbleList,
    pub codeblocks: CodeBlocks,
    pub focus: Focus,
    pub last_known_height: u16,
    pub last_known_width: u16,
    pub messages: Vec<Message>,
    pub notice: Option<Notice>,
    pub prefill: Option<String>,
    pub scroll: Scroll,
    pub settings: ConversationSettings,
    pub sidebar: Sidebar,
}

impl AppState {
    pub fn new(theme_name: &str, settings: ConversationSettings) -> Result<AppState> {
        let theme = Themes::get(theme_name)?;

        return Ok(AppState {
            bubble_list: BubbleList::new(theme),
            codeblocks: CodeBlocks::default(),
            focus: Focus::default(),
            last_known_height: 0,
            last_known_width: 0,
            messages: vec![],
            notice: None,
            prefill: None,
            scroll: Scroll::default(),
            settings,
            sidebar: Sidebar::default(),
        });
    }

    pub fn handle_conversation_update(&mut self, messages: Vec<Message>) {
        let grew = messages.len() > self.messages.len();
        self.messages = messages;
        self.codeblocks.replace_from_messages(&self.messages);
        self.sidebar.set_messages(&self.messages);
        self.sync_dependants();

        if grew {
            self.scroll.last();
        }
    }

    pub fn handle_settings_update(&mut self, settings: ConversationSettings) {
        self.settings = settings;
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Number of generations still in flight.
    pub fn waiting_count(&self) -> usize {
        return self.messages.iter().filter(|msg| return msg.is_loading).count();
    }

    /// The N-th (1-based) assistant message, or the last one.
    pub fn assistant_message(&self, nth: Option<usize>) -> Option<&Message> {
        let assistants = self
            .messages
            .iter()
            .filter(|msg| return msg.role == Role::Assistant)
            .collect::<Vec<&Message>>();

        return match nth {
            Some(0) => None,
            Some(n) => assistants.get(n - 1).copied(),
            None => assistants.last().copied(),
        };
    }


    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Sidebar,
            Focus::Sidebar => Focus::Input,
        };
    }

    pub fn select_history(&mut self, forward: bool) {
        if forward {
            self.sidebar.select_next();
        } else {
            self.sidebar.select_prev();
        }

        if let Some(offset) = self
            .sidebar
            .selected_id()
            .and_then(|id| return self.bubble_list.line_offset(id))
        {
            self.scroll.to(offset);
        }
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    /// Returns `(should_break, should_continue)`. Slash commands never reach
    /// the backend.
    pub fn handle_slash_commands(
        &mut self,
        input_str: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<(bool, bool)> {
        let Some(command) = SlashCommand::parse(input_str) else {
            return Ok((false, false));
        };

        if command.is_quit() {
            return Ok((true, false));
        }

        if command.is_help() {
            self.set_notice(Notice::info(&help_text()));
        } else if command.is_model_list() {
            self.set_notice(Notice::info(&model_list_text()));
        } else if command.is_model_set() {
            if let Some(model) = command.args.first() {
                tx.send(Action::SetModel(model.to_string()))?;
            } else {
                self.set_notice(Notice::error(
                    "You must specify a model name with `/model` or `/m`. Run `/help` for more details.",
                ));
            }
        } else if command.is_temperature_set() {
            if let Some(temperature) = command.args.first() {
                tx.send(Action::SetTemperature(temperature.to_string()))?;
            } else {
                self.set_notice(Notice::error(
                    "You must specify a temperature with `/temperature` or `/t`. Run `/help` for more details.",
                ));
            }
        } else if command.is_regenerate() {
            self.regenerate(command.args.first().map(|e| return e.as_str()), tx)?;
        } else if command.is_copy_chat() {
            if self.messages.is_empty() {
                self.set_notice(Notice::error("There is nothing to copy yet."));
            } else {
                tx.send(Action::CopyMessages(self.messages.clone()))?;
            }
        } else if command.is_copy_message() {
            self.copy_message(command.args.first().map(|e| return e.as_str()), tx)?;
        } else if command.is_copy_code_block() {
            match self.codeblocks.blocks_from_slash_commands(&command) {
                Ok(text) if text.is_empty() => {
                    self.set_notice(Notice::error("There are no code blocks to copy."));
                }
                Ok(text) => {
                    tx.send(Action::CopyText(text))?;
                }
                Err(err) => {
                    self.set_notice(Notice::error(&err.to_string()));
                }
            }
        } else if command.is_weather() {
            self.prefill = Some(format!("{WEATHER_PREFIX} "));
        }

        return Ok((false, true));
    }

    /// Regenerates the N-th assistant message, or the last one without an
    /// argument. A message still waiting on the backend is left alone.
    pub fn regenerate(
        &mut self,
        arg: Option<&str>,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        let Ok(nth) = parse_message_number(arg) else {
            self.set_notice(Notice::error("Regenerate expects a message number."));
            return Ok(());
        };

        match self.assistant_message(nth).cloned() {
            Some(message) if message.is_loading => {
                self.set_notice(Notice::error(
                    "That message is still waiting for a response.",
                ));
            }
            Some(message) => {
                tx.send(Action::RegenerateMessage(message.id))?;
            }
            None => {
                self.set_notice(Notice::error(
                    "There is no assistant message to regenerate.",
                ));
            }
        }

        return Ok(());
    }

    /// Copies the raw content of the N-th assistant message, or the last one.
    pub fn copy_message(
        &mut self,
        arg: Option<&str>,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        let Ok(nth) = parse_message_number(arg) else {
            self.set_notice(Notice::error("Copy message expects a message number."));
            return Ok(());
        };

        match self.assistant_message(nth).cloned() {
            Some(message) if message.content.is_empty() => {
                self.set_notice(Notice::error("That message has no content yet."));
            }
            Some(message) => {
                tx.send(Action::CopyMessage(message))?;
            }
            None => {
                self.set_notice(Notice::error("There is no assistant message to copy."));
            }
        }

        return Ok(());
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(&self.messages, self.last_known_width as usize);

        let list_length = u16::try_from(self.bubble_list.len()).unwrap_or(u16::MAX);
        self.scroll.set_state(list_length, self.last_known_height);
    }
}

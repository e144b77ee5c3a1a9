#[cfg(test)]
#[path = "sidebar_test.rs"]
mod tests;

use ratatui::prelude::Constraint;
use ratatui::prelude::Direction;
use ratatui::prelude::Layout;
use ratatui::prelude::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::domain::models::ConversationSettings;
use crate::domain::models::Message;
use crate::domain::models::MessageId;
use crate::domain::models::Role;

const LABEL_MAX_CHARS: usize = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: MessageId,
    pub label: String,
}

pub fn truncate_label(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= LABEL_MAX_CHARS {
        return first_line.to_string();
    }

    let truncated = first_line.chars().take(LABEL_MAX_CHARS).collect::<String>();
    return format!("{truncated}...");
}

/// One entry per user message, in conversation order.
pub fn history_entries(messages: &[Message]) -> Vec<HistoryEntry> {
    return messages
        .iter()
        .filter(|msg| return msg.role == Role::User)
        .map(|msg| {
            return HistoryEntry {
                id: msg.id,
                label: truncate_label(&msg.content),
            };
        })
        .collect();
}

#[derive(Default)]
pub struct Sidebar {
    entries: Vec<HistoryEntry>,
    state: ListState,
}

impl Sidebar {
    pub fn set_messages(&mut self, messages: &[Message]) {
        let selected = self.selected_id();
        self.entries = history_entries(messages);

        // Keep the selection on the same message across updates.
        let idx = selected.and_then(|id| {
            return self.entries.iter().position(|entry| return entry.id == id);
        });
        self.state.select(idx);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        return &self.entries;
    }

    pub fn selected_id(&self) -> Option<MessageId> {
        return self
            .state
            .selected()
            .and_then(|idx| return self.entries.get(idx))
            .map(|entry| return entry.id);
    }

    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        let idx = match self.state.selected() {
            Some(idx) => (idx + 1).min(self.entries.len() - 1),
            None => 0,
        };
        self.state.select(Some(idx));
    }

    pub fn select_prev(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        let idx = match self.state.selected() {
            Some(idx) => idx.saturating_sub(1),
            None => self.entries.len() - 1,
        };
        self.state.select(Some(idx));
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        rect: Rect,
        settings: &ConversationSettings,
        focused: bool,
    ) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(4), Constraint::Min(1)])
            .split(rect);

        let settings_lines = vec![
            Line::from(format!("Model: {}", settings.model)),
            Line::from(format!("Temperature: {}", settings.temperature)),
        ];
        frame.render_widget(
            Paragraph::new(settings_lines)
                .block(Block::default().borders(Borders::ALL).title("Settings")),
            layout[0],
        );

        let mut border_style = Style::default();
        if focused {
            border_style = border_style.fg(Color::Yellow);
        }

        let items = self
            .entries
            .iter()
            .map(|entry| return ListItem::new(entry.label.to_string()))
            .collect::<Vec<ListItem>>();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title("History"),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        frame.render_stateful_widget(list, layout[1], &mut self.state);
    }
}

use std::collections::HashMap;

use ratatui::prelude::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use syntect::highlighting::Theme;

use super::Bubble;
use super::BubbleAlignment;
use crate::domain::models::Message;
use crate::domain::models::MessageId;

#[cfg(test)]
#[path = "bubble_list_test.rs"]
mod tests;

struct BubbleCacheEntry {
    codeblock_offset: usize,
    message: Message,
    lines: Vec<Line<'static>>,
}

/// Renders the whole conversation as bubbles. Rendered lines are cached per
/// message id and only rebuilt when that message, its code block numbering or
/// the window width changes, so any message may be updated at any time.
pub struct BubbleList {
    cache: HashMap<MessageId, BubbleCacheEntry>,
    line_offsets: HashMap<MessageId, usize>,
    line_width: usize,
    lines_len: usize,
    order: Vec<MessageId>,
    theme: Theme,
}

impl BubbleList {
    pub fn new(theme: Theme) -> BubbleList {
        return BubbleList {
            cache: HashMap::new(),
            line_offsets: HashMap::new(),
            line_width: 0,
            lines_len: 0,
            order: vec![],
            theme,
        };
    }

    pub fn set_messages(&mut self, messages: &[Message], line_width: usize) {
        if self.line_width != line_width {
            self.cache.clear();
            self.line_width = line_width;
        }

        let mut total_codeblock_counter = 0;
        let mut offset = 0;
        self.line_offsets.clear();
        self.order = messages.iter().map(|message| return message.id).collect();

        for message in messages {
            let is_fresh = self.cache.get(&message.id).is_some_and(|entry| {
                return entry.codeblock_offset == total_codeblock_counter
                    && entry.message == *message;
            });

            if !is_fresh {
                let lines = Bubble::new(
                    message,
                    BubbleAlignment::for_role(message.role),
                    line_width,
                    total_codeblock_counter,
                )
                .as_lines(&self.theme);

                self.cache.insert(
                    message.id,
                    BubbleCacheEntry {
                        codeblock_offset: total_codeblock_counter,
                        message: message.clone(),
                        lines,
                    },
                );
            }

            total_codeblock_counter += message.codeblocks().len();
            self.line_offsets.insert(message.id, offset);
            if let Some(entry) = self.cache.get(&message.id) {
                offset += entry.lines.len();
            }
        }

        self.cache
            .retain(|id, _| return self.line_offsets.contains_key(id));
        self.lines_len = offset;
    }

    pub fn len(&self) -> usize {
        return self.lines_len;
    }

    /// First rendered line of a message, used as a scroll anchor.
    pub fn line_offset(&self, message_id: MessageId) -> Option<usize> {
        return self.line_offsets.get(&message_id).copied();
    }

    pub fn render(&self, frame: &mut Frame, rect: Rect, scroll: u16) {
        let lines: Vec<Line<'static>> = self
            .order
            .iter()
            .filter_map(|id| return self.cache.get(id))
            .flat_map(|entry| return entry.lines.to_owned())
            .collect();

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default())
                .scroll((scroll, 0)),
            rect,
        );
    }
}

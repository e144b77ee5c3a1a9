use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;

const INPUT_TITLE: &str = "Ask anything, /help for commands";

pub struct TextArea {}

impl<'a> TextArea {
    pub fn default() -> tui_textarea::TextArea<'a> {
        let mut textarea = tui_textarea::TextArea::default();
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(INPUT_TITLE)
                .padding(Padding::new(1, 1, 0, 0)),
        );
        textarea.set_cursor_line_style(Style::default());

        return textarea;
    }

    /// Input box seeded with text, cursor placed after it.
    pub fn prefilled(text: &str) -> tui_textarea::TextArea<'a> {
        let mut textarea = TextArea::default();
        textarea.insert_str(text);
        return textarea;
    }

    /// Dims the border while the history sidebar holds focus.
    pub fn set_focused(textarea: &mut tui_textarea::TextArea<'a>, focused: bool) {
        let mut border_style = Style::default();
        if !focused {
            border_style = border_style.fg(Color::DarkGray);
        }

        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border_style)
                .title(INPUT_TITLE)
                .padding(Padding::new(1, 1, 0, 0)),
        );
    }
}

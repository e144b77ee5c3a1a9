#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::Theme;

use super::align_tables;
use super::Syntaxes;
use super::SYNTAX_SET;
use crate::domain::models::Message;
use crate::domain::models::Role;

pub const THINKING: &str = "Thinking...";
pub const REGENERATING: &str = "Regenerating...";

#[derive(PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

impl BubbleAlignment {
    pub fn for_role(role: Role) -> BubbleAlignment {
        if role == Role::User {
            return BubbleAlignment::Right;
        }

        return BubbleAlignment::Left;
    }
}

pub struct Bubble<'a> {
    alignment: BubbleAlignment,
    message: &'a Message,
    window_max_width: usize,
    codeblock_counter: usize,
}

pub struct BubbleConfig {
    pub bubble_padding: usize,
    pub border_elements_length: usize,
    pub outer_padding_percentage: f32,
}

fn width(text: &str) -> usize {
    return text.chars().count();
}

fn padding(total: usize, used: &[usize]) -> String {
    let count = used
        .iter()
        .fold(total, |acc, e| return acc.saturating_sub(*e));

    return " ".repeat(count);
}

/// The text a bubble shows for a message in its current state.
pub fn display_text(message: &Message) -> String {
    let content = align_tables(&message.content.replace('\t', "    "));

    if message.is_loading {
        if content.trim().is_empty() {
            return THINKING.to_string();
        }
        return format!("{content}\n\n{REGENERATING}");
    }

    if message.error {
        if let Some(reason) = &message.error_message {
            // A failed regeneration keeps the previous answer.
            let error_line = format!("Error: {reason}");
            if content != error_line {
                return format!("{content}\n\n{error_line}");
            }
        }
    }

    return content;
}

impl<'a> Bubble<'a> {
    pub fn new(
        message: &'a Message,
        alignment: BubbleAlignment,
        window_max_width: usize,
        codeblock_counter: usize,
    ) -> Bubble<'a> {
        return Bubble {
            alignment,
            message,
            window_max_width,
            codeblock_counter,
        };
    }

    pub fn style_config() -> BubbleConfig {
        return BubbleConfig {
            // Unicode character border + padding.
            bubble_padding: 8,
            // left border + left padding + (text, not counted) + right padding + right border +
            // scrollbar.
            border_elements_length: 5,
            outer_padding_percentage: 0.04,
        };
    }

    fn label(&self) -> &'static str {
        if self.message.role == Role::User {
            return "You";
        }

        return "Assistant";
    }

    pub fn as_lines(&mut self, theme: &Theme) -> Vec<Line<'static>> {
        let text = display_text(self.message);
        let mut highlight = HighlightLines::new(Syntaxes::get(""), theme);
        let mut in_codeblock = false;
        let mut lines: Vec<Line<'static>> = vec![];

        let max_line_length = self.get_max_line_length(&text);

        for line in text.lines() {
            let mut spans = vec![];

            if line.trim().starts_with("```") {
                if !in_codeblock {
                    let lang = line.trim().replace("```", "");
                    highlight = HighlightLines::new(Syntaxes::get(&lang), theme);
                    in_codeblock = true;

                    self.codeblock_counter += 1;
                    spans = vec![
                        Span::from(line.to_string()),
                        Span::styled(
                            format!(" ({})", self.codeblock_counter),
                            Style {
                                fg: Some(Color::White),
                                ..Style::default()
                            },
                        ),
                    ];
                } else {
                    in_codeblock = false;
                }
            } else if in_codeblock {
                // Highlighting is only accurate with a trailing newline, especially across
                // multi-line comments.
                let line_nl = format!("{line}\n");
                if let Ok(highlighted) = highlight.highlight_line(&line_nl, &SYNTAX_SET) {
                    let last = highlighted.len().saturating_sub(1);
                    spans = highlighted
                        .iter()
                        .enumerate()
                        .map(|(idx, (style, content))| {
                            let mut text = content.to_string();
                            if idx == last {
                                text = text.trim_end().to_string();
                            }

                            return Span::styled(
                                text,
                                Style {
                                    fg: Syntaxes::translate_colour(style.foreground),
                                    ..Style::default()
                                },
                            );
                        })
                        .collect();
                }
            }

            if spans.is_empty() {
                spans = vec![self.highlight_span(line.to_string())];
            }

            let mut split_spans = vec![];
            let mut line_char_count = 0;

            for span in spans {
                if width(&span.content) + line_char_count <= max_line_length {
                    line_char_count += width(&span.content);
                    split_spans.push(span);
                    continue;
                }

                let mut word_set: Vec<&str> = vec![];

                for word in span.content.split(' ') {
                    if width(word) + line_char_count > max_line_length {
                        split_spans.push(Span::styled(word_set.join(" "), span.style));
                        lines.push(self.spans_to_line(split_spans, max_line_length));

                        split_spans = vec![];
                        word_set = vec![];
                        line_char_count = 0;
                    }

                    word_set.push(word);
                    line_char_count += width(word) + 1;
                }

                split_spans.push(Span::styled(word_set.join(" "), span.style));
            }

            lines.push(self.spans_to_line(split_spans, max_line_length));
        }

        return self.wrap_lines_in_bubble(lines, max_line_length);
    }

    fn spans_to_line(&self, mut spans: Vec<Span<'static>>, max_line_length: usize) -> Line<'static> {
        let line_str_len: usize = spans.iter().map(|e| return width(&e.content)).sum();
        let fill = padding(max_line_length, &[line_str_len]);
        let formatted_line_length =
            line_str_len + fill.len() + Bubble::style_config().bubble_padding;

        let mut wrapped_spans = vec![self.highlight_span("│ ".to_string())];
        wrapped_spans.append(&mut spans);
        wrapped_spans.push(self.highlight_span(format!("{fill} │")));

        let outer_bubble_padding = padding(self.window_max_width, &[formatted_line_length]);

        if self.alignment == BubbleAlignment::Left {
            wrapped_spans.push(Span::from(outer_bubble_padding));
            return Line::from(wrapped_spans);
        }

        let mut line_spans = vec![Span::from(outer_bubble_padding)];
        line_spans.extend(wrapped_spans);

        return Line::from(line_spans);
    }

    fn get_max_line_length(&self, text: &str) -> usize {
        let style_config = Bubble::style_config();
        // Add a minimum 4% of padding on the side.
        let min_bubble_padding_length = ((self.window_max_width as f32
            * style_config.outer_padding_percentage)
            .ceil()) as usize;

        // Border elements + minimum bubble padding.
        let line_border_width = style_config.border_elements_length + min_bubble_padding_length;
        let max_allowed = self.window_max_width.saturating_sub(line_border_width);

        let mut max_line_length = text.lines().map(width).max().unwrap_or(0);
        if max_line_length > max_allowed {
            max_line_length = max_allowed;
        }

        return max_line_length.max(width(self.label()));
    }

    fn wrap_lines_in_bubble(
        &self,
        lines: Vec<Line<'static>>,
        max_line_length: usize,
    ) -> Vec<Line<'static>> {
        let label = self.label();
        // Add 2 for the vertical bars.
        let inner_bar = "─".repeat(max_line_length + 2);
        let labelled_bar = "─".repeat(max_line_length + 2 - width(label));
        let top_bar = format!("╭{label}{labelled_bar}╮");
        let bottom_bar = format!("╰{inner_bar}╯");
        let bar_bubble_padding = padding(
            self.window_max_width,
            &[max_line_length, Bubble::style_config().bubble_padding],
        );

        let mut res = vec![];
        if self.alignment == BubbleAlignment::Left {
            res.push(self.highlight_line(format!("{top_bar}{bar_bubble_padding}")));
            res.extend(lines);
            res.push(self.highlight_line(format!("{bottom_bar}{bar_bubble_padding}")));
        } else {
            res.push(self.highlight_line(format!("{bar_bubble_padding}{top_bar}")));
            res.extend(lines);
            res.push(self.highlight_line(format!("{bar_bubble_padding}{bottom_bar}")));
        }

        return res;
    }

    fn highlight_span(&self, text: String) -> Span<'static> {
        if self.message.error {
            return Span::styled(
                text,
                Style {
                    fg: Some(Color::Red),
                    ..Style::default()
                },
            );
        }

        if self.message.is_loading {
            return Span::styled(
                text,
                Style {
                    fg: Some(Color::DarkGray),
                    ..Style::default()
                },
            );
        }

        return Span::from(text);
    }

    fn highlight_line(&self, text: String) -> Line<'static> {
        return Line::from(self.highlight_span(text));
    }
}

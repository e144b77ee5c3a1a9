use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::widgets::Wrap;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::ConversationSettings;
use crate::domain::models::Event;
use crate::domain::models::Notice;
use crate::domain::models::TextArea;
use crate::domain::models::WEATHER_PREFIX;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;
use crate::domain::services::Focus;

const SIDEBAR_WIDTH: u16 = 34;

fn waiting_text(count: usize) -> String {
    if count == 1 {
        return "Waiting for 1 response...".to_string();
    }

    return format!("Waiting for {count} responses...");
}

fn render_notice(frame: &mut Frame, rect: Rect, notice: &Notice) {
    let mut style = Style::default();
    let mut title = "Notice";
    if notice.is_error {
        style = style.fg(Color::Red);
        title = "Error";
    }

    frame.render_widget(
        Paragraph::new(notice.text.to_string())
            .style(style)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title)),
        rect,
    );
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState,
    tx: mpsc::UnboundedSender<Action>,
    mut events: EventsService,
) -> Result<()> {
    let mut textarea = TextArea::default();

    loop {
        terminal.draw(|frame| {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
                .split(frame.size());

            let notice_height = app_state
                .notice
                .as_ref()
                .map(|notice| return (notice.text.lines().count() as u16 + 2).min(16))
                .unwrap_or(0);
            let status_height = u16::from(app_state.waiting_count() > 0);

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![
                    Constraint::Min(1),
                    Constraint::Length(notice_height),
                    Constraint::Length(status_height),
                    Constraint::Max(4),
                ])
                .split(columns[1]);

            if rows[0].width != app_state.last_known_width
                || rows[0].height != app_state.last_known_height
            {
                app_state.set_rect(rows[0]);
            }

            app_state
                .sidebar
                .render(frame, columns[0], &app_state.settings, app_state.focus == Focus::Sidebar);

            app_state
                .bubble_list
                .render(frame, rows[0], app_state.scroll.position);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                rows[0].inner(&Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut app_state.scroll.scrollbar_state,
            );

            if let Some(notice) = &app_state.notice {
                render_notice(frame, rows[1], notice);
            }

            if status_height > 0 {
                frame.render_widget(
                    Paragraph::new(waiting_text(app_state.waiting_count()))
                        .style(Style::default().fg(Color::DarkGray)),
                    rows[2],
                );
            }

            TextArea::set_focused(&mut textarea, app_state.focus == Focus::Input);
            frame.render_widget(textarea.widget(), rows[3]);
        })?;

        match events.next().await? {
            Event::ConversationUpdated(messages) => {
                app_state.handle_conversation_update(messages);
            }
            Event::SettingsUpdated(settings) => {
                app_state.handle_settings_update(settings);
            }
            Event::Notice(notice) => {
                app_state.set_notice(notice);
            }
            Event::KeyboardCTRLC() => {
                break;
            }
            Event::KeyboardCTRLR() => {
                app_state.regenerate(None, &tx)?;
            }
            Event::KeyboardCTRLW() => {
                textarea = TextArea::prefilled(&format!("{WEATHER_PREFIX} "));
                app_state.focus = Focus::Input;
            }
            Event::KeyboardTab() => {
                app_state.toggle_focus();
            }
            Event::KeyboardPaste(text) => {
                textarea.insert_str(&text);
            }
            Event::KeyboardEnter() => {
                if app_state.focus == Focus::Sidebar {
                    app_state.toggle_focus();
                    continue;
                }

                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }

                textarea = TextArea::default();
                app_state.notice = None;

                let (should_break, should_continue) =
                    app_state.handle_slash_commands(&input_str, &tx)?;
                if should_break {
                    break;
                }
                if should_continue {
                    if let Some(prefill) = app_state.prefill.take() {
                        textarea = TextArea::prefilled(&prefill);
                    }
                    continue;
                }

                tx.send(Action::SendMessage(input_str))?;
            }
            Event::KeyboardCharInput(input) => {
                if app_state.focus == Focus::Input {
                    textarea.input(input);
                }
            }
            Event::UIScrollDown() => {
                if app_state.focus == Focus::Sidebar {
                    app_state.select_history(true);
                } else {
                    app_state.scroll.down();
                }
            }
            Event::UIScrollUp() => {
                if app_state.focus == Focus::Sidebar {
                    app_state.select_history(false);
                } else {
                    app_state.scroll.up();
                }
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::UIResize() | Event::UITick() => (),
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    // Best effort, the process is going down either way.
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
    settings: ConversationSettings,
) -> Result<()> {
    let mut app_state = AppState::new(&Config::get(ConfigKey::Theme), settings)?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    start_loop(&mut terminal, &mut app_state, tx, EventsService::new(rx)).await?;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return Ok(());
}

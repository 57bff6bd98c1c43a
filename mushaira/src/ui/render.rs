//! Render orchestration for the mushaira TUI

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::widgets::{ChatWidget, InputWidget, StatusBarWidget};

/// Overlay types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let [title_area, chat_area, status_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(area);

    render_title_bar(frame, app, title_area);

    let chat = ChatWidget::new(&app.snapshot.history, &app.theme)
        .scroll(app.chat_scroll)
        .thinking(app.is_thinking(), app.animation_frame)
        .notice(app.notice());
    frame.render_widget(chat, chat_area);

    let status = StatusBarWidget::new(&app.snapshot, &app.theme)
        .thinking(app.is_thinking())
        .letter_hint(app.letter_hint())
        .message(app.status_message());
    frame.render_widget(status, status_area);

    render_input(frame, app, input_area);

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }
}

/// Render the title bar
fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" مشاعره ", app.theme.title_style()),
        Span::styled(
            "| Ctrl+N new game | F1 help | Esc quit ",
            app.theme.system_style(),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the input area
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = &app.snapshot;
    let placeholder = if app.is_thinking() {
        "Waiting for the opponent..."
    } else if snapshot.finished {
        "Game over. Press Enter to play again"
    } else if !snapshot.active {
        "Press Enter to start a game"
    } else {
        "Type your verse..."
    };

    let input_widget = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .enabled(app.input_enabled())
        .placeholder(placeholder);

    frame.render_widget(input_widget, area);
}

/// Render overlay
fn render_overlay(frame: &mut Frame, app: &App, overlay: Overlay, area: Rect) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
    }
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(56, 18, area);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let heading = Style::default().add_modifier(Modifier::UNDERLINED);
    let help_text = vec![
        Line::from(Span::styled(
            " Mushaira - Help ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Recite a Persian verse that starts with the letter"),
        Line::from("shown in the status bar. ا and آ count as the same."),
        Line::from(""),
        Line::from(Span::styled("Keys:", heading)),
        Line::from("  Enter          Submit verse / start a game"),
        Line::from("  Ctrl+N, F2     New game"),
        Line::from("  ↑/↓            Previous verses you typed"),
        Line::from("  PgUp/PgDn      Scroll the chat"),
        Line::from("  Mouse wheel    Scroll the chat"),
        Line::from("  F1             Toggle this help"),
        Line::from("  Esc, Ctrl+C    Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or F1 to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// A rectangle of at most `width` x `height`, centered in `area`.
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

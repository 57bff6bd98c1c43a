//! Status bar widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use mushaira_core::SessionSnapshot;

use crate::ui::theme::GameTheme;

/// Score, required letter, turn state and the latest status text.
pub struct StatusBarWidget<'a> {
    snapshot: &'a SessionSnapshot,
    theme: &'a GameTheme,
    thinking: bool,
    letter_hint: Option<char>,
    message: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(snapshot: &'a SessionSnapshot, theme: &'a GameTheme) -> Self {
        Self {
            snapshot,
            theme,
            thinking: false,
            letter_hint: None,
            message: None,
        }
    }

    pub fn thinking(mut self, thinking: bool) -> Self {
        self.thinking = thinking;
        self
    }

    /// Warn that the typed verse does not start with this letter.
    pub fn letter_hint(mut self, letter: Option<char>) -> Self {
        self.letter_hint = letter;
        self
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    fn state_span(&self) -> Span<'static> {
        if self.thinking {
            Span::styled("Opponent is thinking", self.theme.thinking_style())
        } else if self.snapshot.finished {
            Span::styled("GAME OVER", self.theme.game_over_style())
        } else if self.snapshot.active {
            Span::styled(
                "Your turn",
                Style::default().add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("No game", self.theme.system_style())
        }
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let letter = self
            .snapshot
            .required_letter
            .map(String::from)
            .unwrap_or_else(|| "?".to_string());

        let mut spans = vec![
            Span::raw("Score: "),
            Span::styled(self.snapshot.score.to_string(), self.theme.score_style()),
            Span::raw(" | Letter: "),
            Span::styled(letter, self.theme.letter_style()),
            Span::raw(" | "),
            self.state_span(),
        ];

        if let Some(letter) = self.letter_hint {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("Should start with {letter}"),
                self.theme.rejection_style(),
            ));
        }

                if let Some(message) = self.message {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(message, self.theme.system_style()));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        Paragraph::new(Line::from(spans))
            .block(block)
            .render(area, buf);
    }
}

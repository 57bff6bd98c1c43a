//! Chat transcript widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use mushaira_core::{Origin, TurnMessage};

use crate::ui::theme::GameTheme;

const SPINNER: [&str; 4] = ["·  ", "·· ", "···", " ··"];

/// Build the display lines for one message.
pub fn message_lines<'a>(message: &'a TurnMessage, theme: &GameTheme) -> Vec<Line<'a>> {
    let mut lines = Vec::new();

    match message.origin {
        Origin::Player => {
            for (i, line) in message.text.lines().enumerate() {
                let prefix = if i == 0 { "> " } else { "  " };
                lines.push(Line::from(vec![
                    Span::styled(prefix, theme.player_style()),
                    Span::styled(line, theme.player_style()),
                ]));
            }
        }
        Origin::Opponent if message.is_error => {
            for line in message.text.lines() {
                lines.push(Line::from(Span::styled(line, theme.rejection_style())));
            }
        }
        Origin::Opponent => {
            let style = if message.poet.is_some() {
                theme.verse_style()
            } else {
                theme.opponent_style()
            };
            for line in message.text.lines() {
                lines.push(Line::from(Span::styled(line, style)));
            }
            if let Some(poet) = &message.poet {
                lines.push(Line::from(Span::styled(
                    format!("    — {poet}"),
                    theme.poet_style(),
                )));
            }
        }
    }

    lines
}

/// Widget for displaying the game transcript
pub struct ChatWidget<'a> {
    messages: &'a [TurnMessage],
    scroll: usize,
    theme: &'a GameTheme,
    thinking: bool,
    animation_frame: u8,
    notice: Option<&'a str>,
}

impl<'a> ChatWidget<'a> {
    pub fn new(messages: &'a [TurnMessage], theme: &'a GameTheme) -> Self {
        Self {
            messages,
            scroll: 0,
            theme,
            thinking: false,
            animation_frame: 0,
            notice: None,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Show the opponent as busy, animated by `frame`.
    pub fn thinking(mut self, thinking: bool, frame: u8) -> Self {
        self.thinking = thinking;
        self.animation_frame = frame;
        self
    }

    /// A line shown under the transcript, e.g. after a failed start.
    pub fn notice(mut self, notice: Option<&'a str>) -> Self {
        self.notice = notice;
        self
    }

    fn welcome_lines(&self) -> Vec<Line<'a>> {
        let style = self.theme.system_style();
        vec![
            Line::from(Span::styled("به مشاعره خوش آمدید.", self.theme.opponent_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Each verse must start with the last letter of the one before it.",
                style,
            )),
            Line::from(Span::styled("Press Enter to start a game, F1 for help.", style)),
            Line::from(""),
        ]
    }
}

impl Widget for ChatWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Mushaira ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(true));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();

        if self.messages.is_empty() && !self.thinking {
            lines.extend(self.welcome_lines());
        }

        for message in self.messages {
            lines.extend(message_lines(message, self.theme));
            // Blank line between entries
            lines.push(Line::from(""));
        }

        if self.thinking {
            let frame = SPINNER[usize::from(self.animation_frame / 3) % SPINNER.len()];
            lines.push(Line::from(Span::styled(
                format!("{frame} thinking"),
                self.theme.thinking_style(),
            )));
        }

        if let Some(notice) = self.notice {
            lines.push(Line::from(Span::styled(notice, self.theme.rejection_style())));
        }

        // Calculate scroll position
        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        let paragraph = Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false });

        paragraph.render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);

            // Hint at bottom if more content below
            if scroll < max_scroll {
                let hint = format!(" ↓{} more ", max_scroll - scroll);
                let hint_y = inner.y + inner.height.saturating_sub(1);
                let hint_style = Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM);
                for (i, ch) in hint.chars().enumerate() {
                    let x = inner.x + (i as u16);
                    if x < inner.x + inner.width.saturating_sub(2) {
                        buf[(x, hint_y)].set_char(ch).set_style(hint_style);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mushaira_core::Verse;

    #[test]
    fn test_verse_is_followed_by_poet() {
        let theme = GameTheme::default();
        let message = TurnMessage::verse(Verse::new("بیت۱").by("حافظ"));

        let lines = message_lines(&message, &theme);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].to_string(), "    — حافظ");
    }

    #[test]
    fn test_rejection_uses_rejection_style() {
        let theme = GameTheme::default();
        let message = TurnMessage::error("این بیت معروف نیست");

        let lines = message_lines(&message, &theme);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans[0].style, theme.rejection_style());
    }

    #[test]
    fn test_player_lines_are_prefixed() {
        let theme = GameTheme::default();
        let message = TurnMessage::player("زبان فارسی");

        let lines = message_lines(&message, &theme);
        assert_eq!(lines[0].to_string(), "> زبان فارسی");
    }

    #[test]
    fn test_render_shows_thinking_indicator() {
        let theme = GameTheme::default();
        let messages = vec![TurnMessage::opponent("سلام")];
        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);

        ChatWidget::new(&messages, &theme)
            .thinking(true, 0)
            .render(area, &mut buf);

        let rendered: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(rendered.contains("thinking"));
    }
}

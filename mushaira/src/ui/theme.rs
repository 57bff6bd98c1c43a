//! Color theme and styling for the mushaira TUI

use ratatui::style::{Color, Modifier, Style};

/// Game UI color theme
#[derive(Debug, Clone)]
pub struct GameTheme {
    // Base colors
    pub border: Color,
    pub border_focused: Color,

    // Chat colors
    pub player_text: Color,
    pub opponent_text: Color,
    pub verse_text: Color,
    pub poet_text: Color,
    pub rejection_text: Color,
    pub system_text: Color,

    // Status bar colors
    pub score: Color,
    pub letter: Color,
    pub thinking: Color,
    pub game_over: Color,
}

impl Default for GameTheme {
    fn default() -> Self {
        Self {
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            player_text: Color::Cyan,
            opponent_text: Color::White,
            verse_text: Color::Yellow,
            poet_text: Color::Gray,
            rejection_text: Color::LightRed,
            system_text: Color::DarkGray,

            score: Color::LightGreen,
            letter: Color::LightYellow,
            thinking: Color::LightBlue,
            game_over: Color::LightMagenta,
        }
    }
}

impl GameTheme {
    /// Get style for the player's verses
    pub fn player_style(&self) -> Style {
        Style::default().fg(self.player_text)
    }

    /// Get style for the opponent's plain messages
    pub fn opponent_style(&self) -> Style {
        Style::default().fg(self.opponent_text)
    }

    /// Get style for the opponent's verses
    pub fn verse_style(&self) -> Style {
        Style::default()
            .fg(self.verse_text)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for a poet attribution
    pub fn poet_style(&self) -> Style {
        Style::default()
            .fg(self.poet_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Get style for rejections and failures
    pub fn rejection_style(&self) -> Style {
        Style::default().fg(self.rejection_text)
    }

    /// Get style for system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    pub fn score_style(&self) -> Style {
        Style::default().fg(self.score).add_modifier(Modifier::BOLD)
    }

    pub fn letter_style(&self) -> Style {
        Style::default().fg(self.letter).add_modifier(Modifier::BOLD)
    }

    pub fn thinking_style(&self) -> Style {
        Style::default().fg(self.thinking)
    }

    pub fn game_over_style(&self) -> Style {
        Style::default()
            .fg(self.game_over)
            .add_modifier(Modifier::BOLD)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Get title style
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.border_focused)
            .add_modifier(Modifier::BOLD)
    }
}

//! TUI widgets for the game

pub mod chat;
pub mod input;
pub mod status_bar;

pub use chat::ChatWidget;
pub use input::InputWidget;
pub use status_bar::StatusBarWidget;

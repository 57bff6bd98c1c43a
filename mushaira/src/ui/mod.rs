//! UI module for the mushaira TUI

pub mod render;
pub mod theme;
pub mod widgets;

pub use render::Overlay;

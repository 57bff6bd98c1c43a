//! Event handling for the mushaira TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a mouse event
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global shortcuts (always work)
    match key.code {
        KeyCode::Char('c') if ctrl => return EventResult::Quit,
        KeyCode::Char('n') if ctrl => {
            app.close_overlay();
            app.start_game();
            return EventResult::NeedsRedraw;
        }
        KeyCode::F(2) => {
            app.close_overlay();
            app.start_game();
            return EventResult::NeedsRedraw;
        }
        KeyCode::F(1) => {
            app.toggle_help();
            return EventResult::NeedsRedraw;
        }
        _ => {}
    }

    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    match key.code {
        KeyCode::Esc => EventResult::Quit,

        KeyCode::Enter => {
            app.enter();
            EventResult::NeedsRedraw
        }

        // Chat scrolling
        KeyCode::PageUp => {
            app.scroll_up(10);
            EventResult::NeedsRedraw
        }
        KeyCode::PageDown => {
            app.scroll_down(10);
            EventResult::NeedsRedraw
        }

        _ if !app.input_enabled() => EventResult::Continue,

        // Input editing
        KeyCode::Left => {
            app.cursor_left();
            EventResult::NeedsRedraw
        }
        KeyCode::Right => {
            app.cursor_right();
            EventResult::NeedsRedraw
        }
        KeyCode::Home => {
            app.cursor_home();
            EventResult::NeedsRedraw
        }
        KeyCode::End => {
            app.cursor_end();
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            app.backspace();
            EventResult::NeedsRedraw
        }
        KeyCode::Delete => {
            app.delete();
            EventResult::NeedsRedraw
        }
        KeyCode::Up => {
            app.history_prev();
            EventResult::NeedsRedraw
        }
        KeyCode::Down => {
            app.history_next();
            EventResult::NeedsRedraw
        }

        // Character input
        KeyCode::Char(c) if !ctrl => {
            app.type_char(c);
            EventResult::NeedsRedraw
        }

        _ => EventResult::Continue,
    }
}

/// Handle key when overlay is open
fn handle_overlay_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mushaira_core::{GameSession, SessionSnapshot, WorkerRequest};
    use tokio::sync::{mpsc, watch};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn app_with(
        snapshot: SessionSnapshot,
    ) -> (App, mpsc::Receiver<WorkerRequest>, watch::Sender<SessionSnapshot>) {
        let (request_tx, request_rx) = mpsc::channel(8);
        let (_response_tx, response_rx) = mpsc::channel(8);
        let (updates, updates_rx) = watch::channel(snapshot);
        (App::new(request_tx, response_rx, updates_rx), request_rx, updates)
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _rx, _updates) = app_with(GameSession::new().snapshot());
        assert_eq!(handle_event(&mut app, ctrl('c')), EventResult::Quit);
        assert_eq!(handle_event(&mut app, key(KeyCode::Esc)), EventResult::Quit);
    }

    #[test]
    fn test_new_game_shortcuts() {
        let (mut app, mut rx, _updates) = app_with(GameSession::new().snapshot());

        handle_event(&mut app, ctrl('n'));
        assert!(matches!(rx.try_recv(), Ok(WorkerRequest::StartGame)));

        handle_event(&mut app, key(KeyCode::F(2)));
        assert!(matches!(rx.try_recv(), Ok(WorkerRequest::StartGame)));
    }

    #[test]
    fn test_typing_ignored_while_pending() {
        let pending = SessionSnapshot {
            active: true,
            pending: true,
            ..SessionSnapshot::default()
        };
        let (mut app, mut rx, _updates) = app_with(pending);

        handle_event(&mut app, key(KeyCode::Char('ز')));
        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.input_buffer(), "");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_escape_closes_help_first() {
        let (mut app, _rx, _updates) = app_with(GameSession::new().snapshot());

        handle_event(&mut app, key(KeyCode::F(1)));
        assert!(app.has_overlay());

        assert_eq!(handle_event(&mut app, key(KeyCode::Esc)), EventResult::NeedsRedraw);
        assert!(!app.has_overlay());
    }
}

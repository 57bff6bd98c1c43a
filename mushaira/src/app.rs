//! Main application state and logic

use std::collections::VecDeque;

use mushaira_core::letters;
use mushaira_core::session::START_FAILURE_MESSAGE;
use mushaira_core::{
    CommandError, SessionSnapshot, TurnOutcome, WorkerHandle, WorkerRequest, WorkerResponse,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::ui::theme::GameTheme;
use crate::ui::Overlay;

const INPUT_HISTORY_LIMIT: usize = 100;

/// Main application state
pub struct App {
    // Channel communication with the game worker
    request_tx: mpsc::Sender<WorkerRequest>,
    response_rx: mpsc::Receiver<WorkerResponse>,
    updates: watch::Receiver<SessionSnapshot>,

    // Latest session state for rendering
    pub snapshot: SessionSnapshot,

    // UI state
    pub theme: GameTheme,
    overlay: Option<Overlay>,

    // Chat display
    pub chat_scroll: usize,
    pub scroll_locked_to_bottom: bool, // True = auto-scroll on new content
    notice: Option<String>,

    // Input state
    input_buffer: String,
    cursor_position: usize,
    pub input_history: VecDeque<String>,
    pub history_index: Option<usize>,
    pub saved_input: Option<String>, // Saved current input when browsing history

    // Status
    status_message: Option<String>,

    // Animation
    pub animation_frame: u8,

    // A request has been sent and not answered yet
    awaiting_worker: bool,
}

impl App {
    /// Create a new application with channel endpoints to the worker
    pub fn new(
        request_tx: mpsc::Sender<WorkerRequest>,
        response_rx: mpsc::Receiver<WorkerResponse>,
        updates: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        let snapshot = updates.borrow().clone();
        Self {
            request_tx,
            response_rx,
            updates,
            snapshot,
            theme: GameTheme::default(),
            overlay: None,
            chat_scroll: 0,
            scroll_locked_to_bottom: true,
            notice: None,
            input_buffer: String::new(),
            cursor_position: 0,
            input_history: VecDeque::with_capacity(INPUT_HISTORY_LIMIT),
            history_index: None,
            saved_input: None,
            status_message: None,
            animation_frame: 0,
            awaiting_worker: false,
        }
    }

    pub fn from_handle(handle: WorkerHandle) -> (Self, tokio::task::JoinHandle<()>) {
        let app = Self::new(handle.requests, handle.responses, handle.updates);
        (app, handle.task)
    }

    /// Pick up new snapshots and worker responses. Returns true if anything
    /// changed.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;

        if self.updates.has_changed().unwrap_or(false) {
            let snapshot = self.updates.borrow_and_update().clone();
            self.apply_snapshot(snapshot);
            changed = true;
        }

        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response);
            changed = true;
        }

        changed
    }

    /// Replace the rendered session state
    pub fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        let grew = snapshot.history.len() != self.snapshot.history.len();
        self.snapshot = snapshot;
        if grew && self.scroll_locked_to_bottom {
            self.scroll_to_bottom();
        }
    }

    /// React to the worker finishing a request
    pub fn handle_response(&mut self, response: WorkerResponse) {
        debug!(?response, "Worker response");
        match response {
            WorkerResponse::Started => {
                self.awaiting_worker = false;
                self.set_status("Your turn");
            }
            WorkerResponse::StartFailed(e) => {
                self.awaiting_worker = false;
                warn!(error = %e, "Game did not start");
                self.notice = Some(START_FAILURE_MESSAGE.to_string());
                self.set_status("Press Enter to try again");
            }
            WorkerResponse::TurnComplete(outcome) => {
                self.awaiting_worker = false;
                let status = match outcome {
                    TurnOutcome::Answered => "Your turn",
                    TurnOutcome::Rejected => "Verse rejected, try another",
                    TurnOutcome::Won => "You won! Press Enter to play again",
                    TurnOutcome::Incomplete | TurnOutcome::Failed => "Something went wrong, try again",
                };
                self.set_status(status);
            }
            WorkerResponse::Rejected(CommandError::Pending) => {
                // The request that is in flight still gets its own response.
                self.set_status("Please wait for the opponent");
            }
            WorkerResponse::Rejected(e) => {
                self.awaiting_worker = false;
                self.set_status(e.to_string());
            }
        }
    }

    /// The opponent is working on a reply
    pub fn is_thinking(&self) -> bool {
        self.snapshot.pending || self.awaiting_worker
    }

    /// Whether typing is accepted
    pub fn input_enabled(&self) -> bool {
        self.snapshot.accepts_verse() && !self.awaiting_worker
    }

    /// Enter: submit a verse, or start a game when there is none to play.
    pub fn enter(&mut self) {
        if self.is_thinking() {
            self.set_status("Please wait for the opponent");
        } else if !self.snapshot.active || self.snapshot.finished {
            self.start_game();
        } else if let Some(verse) = self.submit_input() {
            if !self.send(WorkerRequest::SubmitVerse(verse.clone())) {
                // Keep the verse editable so it can be sent again.
                self.cursor_position = verse.chars().count();
                self.input_buffer = verse;
            }
        }
    }

    /// Ask the worker for a new game
    pub fn start_game(&mut self) {
        self.notice = None;
        self.set_status("Opening a new game...");
        self.send(WorkerRequest::StartGame);
    }

    /// Returns whether the worker got the request.
    fn send(&mut self, request: WorkerRequest) -> bool {
        // Try to send the request (non-blocking)
        match self.request_tx.try_send(request) {
            Ok(()) => {
                self.awaiting_worker = true;
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not reach worker");
                self.set_status("Worker busy, please wait...");
                false
            }
        }
    }

    /// The required letter, when the verse being typed does not start with it.
    ///
    /// Only a hint; the judge has the final word.
    pub fn letter_hint(&self) -> Option<char> {
        let required = self.snapshot.required_letter?;
        let typed = self.input_buffer.trim();
        if !self.input_enabled() || letters::first_letter(typed).is_none() {
            return None;
        }
        (!letters::starts_with_letter(typed, Some(required))).then_some(required)
    }

    /// Ask the worker to stop
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.try_send(WorkerRequest::Shutdown);
    }

    /// Scroll chat to bottom and lock to bottom
    pub fn scroll_to_bottom(&mut self) {
        // Set to max value - the widget will cap it to actual max_scroll
        self.chat_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    /// Estimate max scroll based on chat content
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 60;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 20;

        let estimated_lines: usize = self
            .snapshot
            .history
            .iter()
            .map(|message| {
                let text_lines: usize = message
                    .text
                    .lines()
                    .map(|line| (line.chars().count() / ESTIMATED_WIDTH).max(1))
                    .sum();
                // Attribution line, then blank line between entries
                text_lines + usize::from(message.poet.is_some()) + 1
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    /// Scroll chat up (unlocks from bottom)
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        if self.chat_scroll > max_scroll {
            self.chat_scroll = max_scroll;
        }
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    /// Scroll chat down, locking to the bottom once it gets there
    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
        if self.chat_scroll >= max_scroll {
            self.scroll_to_bottom();
        }
    }

    /// Submit current input
    pub fn submit_input(&mut self) -> Option<String> {
        if self.input_buffer.trim().is_empty() {
            return None;
        }

        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;

        self.input_history.push_front(input.clone());
        if self.input_history.len() > INPUT_HISTORY_LIMIT {
            self.input_history.pop_back();
        }

        self.history_index = None;
        self.saved_input = None;
        self.scroll_to_bottom();

        Some(input)
    }

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        // Convert cursor position (character index) to byte index
        let byte_pos = self
            .input_buffer
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len());
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position) {
            self.input_buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Navigate to previous input in history
    pub fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        // Save current input if we're just starting to browse history
        if self.history_index.is_none() && !self.input_buffer.is_empty() {
            self.saved_input = Some(self.input_buffer.clone());
        }

        let idx = match self.history_index {
            None => 0,
            Some(i) if i + 1 < self.input_history.len() => i + 1,
            Some(i) => i, // Already at oldest
        };

        if let Some(entry) = self.input_history.get(idx) {
            self.input_buffer = entry.clone();
            self.cursor_position = self.input_buffer.chars().count();
            self.history_index = Some(idx);
        }
    }

    /// Navigate to next input in history
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                // Return to saved input or empty
                self.input_buffer = self.saved_input.take().unwrap_or_default();
                self.cursor_position = self.input_buffer.chars().count();
                self.history_index = None;
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1) {
                    self.input_buffer = entry.clone();
                    self.cursor_position = self.input_buffer.chars().count();
                    self.history_index = Some(i - 1);
                }
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    /// Tick for animations
    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

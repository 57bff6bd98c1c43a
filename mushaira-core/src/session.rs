//! Game session state and its transitions.
//!
//! `GameSession` is a plain value. Every change goes through one of the
//! transition methods below; the controller only decides when to call them.
//! Each issued judgment request is identified by a [`TurnToken`], and a
//! transition carrying a token that no longer matches the session is ignored.

use crate::oracle::JudgmentError;
use crate::verdict::{JudgmentVerdict, Verse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Shown when the oracle cannot be reached or its reply is unusable.
pub const CONNECTION_FAILURE_MESSAGE: &str = "خطایی رخ داد. لطفاً مجدد تلاش کنید.";

/// Shown when an accepted verse gets neither a reply verse nor a concession.
pub const INCOMPLETE_REPLY_MESSAGE: &str =
    "هوش مصنوعی پاسخ کاملی نداد. لطفاً بیت دیگری بفرستید.";

/// Reported to the player when a game cannot be opened.
pub const START_FAILURE_MESSAGE: &str = "خطا در اتصال به هوش مصنوعی. لطفاً دوباره تلاش کنید.";

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Player,
    Opponent,
}

/// One entry in the game transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub id: Uuid,
    pub text: String,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poet: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl TurnMessage {
    fn new(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            origin,
            poet: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    pub fn player(text: impl Into<String>) -> Self {
        Self::new(text, Origin::Player)
    }

    pub fn opponent(text: impl Into<String>) -> Self {
        Self::new(text, Origin::Opponent)
    }

    /// An opponent message that is a verse, carrying its attribution.
    pub fn verse(verse: Verse) -> Self {
        Self {
            poet: verse.poet,
            ..Self::new(verse.text, Origin::Opponent)
        }
    }

    /// An opponent message flagged as a rejection or failure.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(text, Origin::Opponent)
        }
    }
}

/// Why a command was refused. Refusals never change the session.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No game in progress")]
    NotActive,

    #[error("The game is over")]
    Finished,

    #[error("Still waiting for the opponent")]
    Pending,

    #[error("Verse is empty")]
    EmptyVerse,

    #[error("Could not open a game: {0}")]
    Connection(#[source] JudgmentError),
}

/// Identifies one outstanding judgment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnToken {
    generation: u64,
    turn: u64,
}

/// An opponent verse held back for pacing.
///
/// Produced by a verdict transition and applied later with
/// [`GameSession::apply_deferred`]. The session stays pending until then.
#[derive(Debug, Clone)]
pub struct DeferredAppend {
    token: TurnToken,
    message: TurnMessage,
    required_letter: Option<char>,
}

impl DeferredAppend {
    pub fn token(&self) -> TurnToken {
        self.token
    }

    pub fn message(&self) -> &TurnMessage {
        &self.message
    }
}

/// Read-only view handed to front ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub active: bool,
    pub required_letter: Option<char>,
    pub score: u32,
    pub pending: bool,
    pub history: Vec<TurnMessage>,
    pub finished: bool,
}

impl SessionSnapshot {
    /// Whether the player may submit a verse right now.
    pub fn accepts_verse(&self) -> bool {
        self.active && !self.finished && !self.pending
    }

    /// Whether a new game may be started right now.
    pub fn can_start(&self) -> bool {
        !self.pending
    }
}

/// The authoritative game state.
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    active: bool,
    required_letter: Option<char>,
    score: u32,
    pending: bool,
    history: Vec<TurnMessage>,
    finished: bool,
    generation: u64,
    turn: u64,
}

impl GameSession {
    /// A fresh, inactive session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn required_letter(&self) -> Option<char> {
        self.required_letter
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn history(&self) -> &[TurnMessage] {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active: self.active,
            required_letter: self.required_letter,
            score: self.score,
            pending: self.pending,
            history: self.history.clone(),
            finished: self.finished,
        }
    }

    /// Reset everything and open a new game. Refused only while a request
    /// is outstanding.
    pub fn begin(&mut self) -> Result<TurnToken, CommandError> {
        if self.pending {
            return Err(CommandError::Pending);
        }

        self.generation += 1;
        self.turn = 0;
        self.active = true;
        self.required_letter = None;
        self.score = 0;
        self.history.clear();
        self.finished = false;

        Ok(self.issue())
    }

    /// Record the player's verse and issue its judgment request.
    ///
    /// Returns the token and the trimmed text to send.
    pub fn begin_turn(&mut self, text: &str) -> Result<(TurnToken, String), CommandError> {
        if !self.active {
            return Err(CommandError::NotActive);
        }
        if self.finished {
            return Err(CommandError::Finished);
        }
        if self.pending {
            return Err(CommandError::Pending);
        }
        let verse = text.trim();
        if verse.is_empty() {
            return Err(CommandError::EmptyVerse);
        }

        self.history.push(TurnMessage::player(verse));
        Ok((self.issue(), verse.to_string()))
    }

    fn issue(&mut self) -> TurnToken {
        self.turn += 1;
        self.pending = true;
        self.current_token()
    }

    fn current_token(&self) -> TurnToken {
        TurnToken {
            generation: self.generation,
            turn: self.turn,
        }
    }

    fn is_current(&self, token: TurnToken) -> bool {
        self.pending && token == self.current_token()
    }

    /// Apply the verdict that opens a game.
    pub fn apply_opening_verdict(
        &mut self,
        token: TurnToken,
        verdict: JudgmentVerdict,
    ) -> Option<DeferredAppend> {
        if !self.is_current(token) {
            warn!(?token, "Dropping stale opening verdict");
            return None;
        }

        self.history.push(TurnMessage::opponent(verdict.feedback_message));
        self.required_letter = verdict.next_required_letter;

        match verdict.opponent_verse {
            Some(verse) => Some(DeferredAppend {
                token,
                message: TurnMessage::verse(verse),
                required_letter: verdict.next_required_letter,
            }),
            None => {
                self.pending = false;
                None
            }
        }
    }

    /// Apply the verdict on a player's verse.
    pub fn apply_turn_verdict(
        &mut self,
        token: TurnToken,
        verdict: JudgmentVerdict,
    ) -> Option<DeferredAppend> {
        if !self.is_current(token) {
            warn!(?token, "Dropping stale turn verdict");
            return None;
        }

        if !verdict.is_valid {
            self.history.push(TurnMessage::error(verdict.feedback_message));
            self.pending = false;
            return None;
        }

        self.score += 1;

        // A verse takes precedence; any accompanying message is not shown.
        if let Some(verse) = verdict.opponent_verse {
            return Some(DeferredAppend {
                token,
                message: TurnMessage::verse(verse),
                required_letter: verdict.next_required_letter,
            });
        }

        if verdict.is_winner {
            self.history.push(TurnMessage::opponent(verdict.feedback_message));
            self.finished = true;
            self.required_letter = None;
        } else {
            warn!("Accepted verse got neither a reply verse nor a concession");
            self.history.push(TurnMessage::error(INCOMPLETE_REPLY_MESSAGE));
        }
        self.pending = false;
        None
    }

    /// Apply a failed judgment request.
    ///
    /// A failed opening discards the session; a failed turn leaves a
    /// visible error and lets the player try again.
    pub fn apply_failure(&mut self, token: TurnToken, error: &JudgmentError) {
        if !self.is_current(token) {
            warn!(?token, %error, "Dropping stale failure");
            return;
        }

        if token.turn == 1 {
            self.active = false;
            self.required_letter = None;
            self.history.clear();
        } else {
            self.history.push(TurnMessage::error(CONNECTION_FAILURE_MESSAGE));
        }
        self.pending = false;
    }

    /// Give up on the outstanding request without a verdict.
    ///
    /// Used when whoever was waiting on the oracle went away. An abandoned
    /// opening discards the session like a failed one; an abandoned turn
    /// keeps the player's verse so it can be resubmitted. Returns whether
    /// anything was pending.
    pub fn abandon(&mut self) -> bool {
        if !self.pending {
            return false;
        }

        warn!(token = ?self.current_token(), "Abandoning unanswered request");
        if self.turn == 1 {
            self.active = false;
            self.required_letter = None;
            self.history.clear();
        }
        // A later turn number makes any verdict still in transit stale.
        self.turn += 1;
        self.pending = false;
        true
    }

    /// Run a deferred append if its turn is still the current one.
    pub fn apply_deferred(&mut self, deferred: DeferredAppend) -> bool {
        if !self.is_current(deferred.token) {
            warn!(token = ?deferred.token, "Dropping stale deferred verse");
            return false;
        }

        self.history.push(deferred.message);
        self.required_letter = if self.finished {
            None
        } else {
            deferred.required_letter
        };
        self.pending = false;
        true
    }
}

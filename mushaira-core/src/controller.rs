//! GameController - drives the turn protocol against an oracle.
//!
//! The controller owns the [`GameSession`] and is the only thing that
//! mutates it. It sequences the session's transitions around oracle calls
//! and the pacing delays, and publishes a snapshot after every change.

use crate::letters;
use crate::oracle::Oracle;
use crate::session::{CommandError, DeferredAppend, GameSession, SessionSnapshot};
use crate::verdict::JudgmentVerdict;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Pacing configuration for a game.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between the opening greeting and the opening verse.
    pub opening_reveal_delay: Duration,

    /// Delay before the opponent's reply verse appears.
    pub reply_reveal_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            opening_reveal_delay: Duration::from_millis(600),
            reply_reveal_delay: Duration::from_millis(500),
        }
    }
}

impl SessionConfig {
    /// No pacing delays at all.
    pub fn instant() -> Self {
        Self {
            opening_reveal_delay: Duration::ZERO,
            reply_reveal_delay: Duration::ZERO,
        }
    }

    pub fn with_opening_reveal_delay(mut self, delay: Duration) -> Self {
        self.opening_reveal_delay = delay;
        self
    }

    pub fn with_reply_reveal_delay(mut self, delay: Duration) -> Self {
        self.reply_reveal_delay = delay;
        self
    }
}

/// How a submitted verse ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Accepted and answered with a verse.
    Answered,
    /// The oracle judged the verse invalid.
    Rejected,
    /// Accepted and the opponent conceded.
    Won,
    /// Accepted, but the reply had neither verse nor concession.
    Incomplete,
    /// No usable verdict; the player may resubmit.
    Failed,
}

/// A game session wired to an oracle.
pub struct GameController<O> {
    oracle: O,
    config: SessionConfig,
    session: GameSession,
    updates: watch::Sender<SessionSnapshot>,
    /// The verse waiting out its pacing delay. Outlives the command future
    /// so a dropped command can still be settled.
    held: Option<DeferredAppend>,
}

impl<O: Oracle> GameController<O> {
    pub fn new(oracle: O, config: SessionConfig) -> Self {
        let session = GameSession::new();
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            oracle,
            config,
            session,
            updates,
            held: None,
        }
    }

    /// Current state, read-only.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Receive a snapshot after every state change, including the
    /// intermediate ones inside a turn.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    fn publish(&self) {
        self.updates.send_replace(self.session.snapshot());
    }

    /// Settle a turn whose command future was dropped before it finished.
    ///
    /// A verse that was only waiting for its delay is shown now; a request
    /// that never got a verdict is abandoned. Every command calls this
    /// first. Returns whether there was anything to settle.
    pub fn recover(&mut self) -> bool {
        let settled = match self.held.take() {
            Some(deferred) => {
                warn!("Showing verse from an interrupted turn");
                self.session.apply_deferred(deferred)
            }
            None => self.session.abandon(),
        };
        if settled {
            self.publish();
        }
        settled
    }

    /// Start a new game, discarding whatever came before.
    ///
    /// On a connection failure the session is left inactive and the error
    /// is returned.
    #[instrument(skip(self))]
    pub async fn start_game(&mut self) -> Result<(), CommandError> {
        self.recover();
        let token = self.session.begin()?;
        self.publish();
        info!("Opening new game");

        match self.oracle.request_opening_verdict().await {
            Ok(verdict) => {
                log_reply_letter(&verdict);
                let deferred = self.session.apply_opening_verdict(token, verdict);
                self.finish_turn(deferred, self.config.opening_reveal_delay)
                    .await;
                info!(required_letter = ?self.session.required_letter(), "Game opened");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Could not open game");
                self.session.apply_failure(token, &e);
                self.publish();
                Err(CommandError::Connection(e))
            }
        }
    }

    /// Submit the player's verse and wait for the opponent's answer.
    ///
    /// Refused commands return an error and leave the session untouched.
    /// Oracle failures do not: they are recorded as chat messages and
    /// reported as [`TurnOutcome::Failed`].
    #[instrument(skip(self, text))]
    pub async fn submit_verse(&mut self, text: &str) -> Result<TurnOutcome, CommandError> {
        self.recover();
        let required_letter = self.session.required_letter();
        let (token, verse) = self.session.begin_turn(text)?;
        self.publish();
        debug!(
            ?required_letter,
            first_letter = ?letters::first_letter(&verse),
            links = letters::starts_with_letter(&verse, required_letter),
            "Submitting verse"
        );

        let verdict = match self.oracle.request_verdict(&verse, required_letter).await {
            Ok(verdict) => verdict,
            Err(e) => {
                if e.is_protocol() {
                    warn!(error = %e, "Unusable verdict");
                } else {
                    error!(error = %e, "Oracle call failed");
                }
                self.session.apply_failure(token, &e);
                self.publish();
                return Ok(TurnOutcome::Failed);
            }
        };

        let outcome = match (verdict.is_valid, &verdict.opponent_verse, verdict.is_winner) {
            (false, _, _) => TurnOutcome::Rejected,
            (true, Some(_), _) => TurnOutcome::Answered,
            (true, None, true) => TurnOutcome::Won,
            (true, None, false) => TurnOutcome::Incomplete,
        };

        log_reply_letter(&verdict);
        let deferred = self.session.apply_turn_verdict(token, verdict);
        self.finish_turn(deferred, self.config.reply_reveal_delay)
            .await;

        info!(
            ?outcome,
            score = self.session.score(),
            required_letter = ?self.session.required_letter(),
            "Turn complete"
        );
        Ok(outcome)
    }

    /// Publish, then run the held-back verse after `delay`. The session
    /// stays pending until it has run.
    async fn finish_turn(&mut self, deferred: Option<DeferredAppend>, delay: Duration) {
        self.publish();
        if deferred.is_none() {
            return;
        }
        self.held = deferred;

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(deferred) = self.held.take() {
            self.session.apply_deferred(deferred);
            self.publish();
        }
    }
}

/// Record how the judge's next letter relates to the verse it chose.
fn log_reply_letter(verdict: &JudgmentVerdict) {
    if let Some(verse) = &verdict.opponent_verse {
        let last = letters::last_letter(&verse.text);
        debug!(
            last_letter = ?last,
            next_letter = ?verdict.next_required_letter,
            agrees = matches!(
                (last, verdict.next_required_letter),
                (Some(a), Some(b)) if letters::letters_match(a, b)
            ),
            "Opponent verse"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockOracle, MockReply};
    use crate::verdict::{JudgmentVerdict, Verse};

    fn opening() -> JudgmentVerdict {
        JudgmentVerdict::accepted("سلام")
            .with_verse(Verse::new("بیت۱").by("حافظ"))
            .with_next_letter('ز')
    }

    #[tokio::test]
    async fn test_required_letter_is_forwarded() {
        let oracle = MockOracle::new(vec![
            MockReply::Verdict(opening()),
            MockReply::Verdict(JudgmentVerdict::rejected("نه")),
        ]);
        let mut controller = GameController::new(oracle.clone(), SessionConfig::instant());

        controller.start_game().await.unwrap();
        controller.submit_verse("  زبان فارسی زیباست ").await.unwrap();

        let calls = oracle.verdict_calls();
        assert_eq!(calls, vec![("زبان فارسی زیباست".to_string(), Some('ز'))]);
    }

    #[tokio::test]
    async fn test_refused_command_does_not_call_oracle() {
        let oracle = MockOracle::new(vec![]);
        let mut controller = GameController::new(oracle.clone(), SessionConfig::instant());

        let err = controller.submit_verse("بیت").await.unwrap_err();
        assert!(matches!(err, CommandError::NotActive));
        assert!(oracle.verdict_calls().is_empty());
        assert!(controller.snapshot().history.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_final_state() {
        let oracle = MockOracle::new(vec![MockReply::Verdict(opening())]);
        let mut controller = GameController::new(oracle, SessionConfig::instant());
        let rx = controller.subscribe();

        controller.start_game().await.unwrap();

        let seen = rx.borrow().clone();
        assert_eq!(seen, controller.snapshot());
        assert_eq!(seen.history.len(), 2);
        assert!(!seen.pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_opening_can_be_restarted() {
        let oracle = MockOracle::new(vec![
            MockReply::Verdict(opening()),
            MockReply::Verdict(opening()),
        ]);
        let mut controller = GameController::new(oracle, SessionConfig::default());

        let timed_out =
            tokio::time::timeout(Duration::from_millis(100), controller.start_game()).await;
        assert!(timed_out.is_err());
        assert!(controller.snapshot().pending);
        assert_eq!(controller.snapshot().history.len(), 1);

        controller.start_game().await.unwrap();
        let snapshot = controller.snapshot();
        assert!(!snapshot.pending);
        assert!(snapshot.active);
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.required_letter, Some('ز'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_reply_is_shown_on_next_command() {
        let oracle = MockOracle::new(vec![
            MockReply::Verdict(opening()),
            MockReply::Verdict(
                JudgmentVerdict::accepted("آفرین")
                    .with_verse(Verse::new("روز وصل").by("حافظ"))
                    .with_next_letter('ل'),
            ),
        ]);
        let mut controller = GameController::new(oracle, SessionConfig::default());
        controller.start_game().await.unwrap();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(100),
            controller.submit_verse("زبان فارسی زیباست"),
        )
        .await;
        assert!(timed_out.is_err());

        assert!(controller.recover());
        let snapshot = controller.snapshot();
        assert!(!snapshot.pending);
        assert_eq!(snapshot.score, 1);
        assert_eq!(snapshot.required_letter, Some('ل'));
        assert_eq!(snapshot.history.last().unwrap().text, "روز وصل");
        assert!(!controller.recover());
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.opening_reveal_delay, Duration::from_millis(600));
        assert_eq!(config.reply_reveal_delay, Duration::from_millis(500));
        assert!(SessionConfig::instant().reply_reveal_delay.is_zero());
    }
}

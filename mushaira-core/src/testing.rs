//! Testing utilities for the game.
//!
//! This module provides tools for integration testing:
//! - `MockOracle` for deterministic testing without API calls
//! - `TestHarness` for scripted game scenarios
//! - Assertion helpers for verifying session state

use crate::controller::{GameController, SessionConfig, TurnOutcome};
use crate::oracle::{JudgmentError, Oracle, OracleError, ProtocolError};
use crate::session::{CommandError, Origin, SessionSnapshot, TurnMessage};
use crate::verdict::{JudgmentVerdict, Verse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// A scripted reply from the mock oracle.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this verdict.
    Verdict(JudgmentVerdict),
    /// Fail as if the transport were down.
    OracleFailure,
    /// Fail as if the reply could not be parsed.
    ProtocolFailure,
}

impl MockReply {
    fn into_result(self) -> Result<JudgmentVerdict, JudgmentError> {
        match self {
            MockReply::Verdict(verdict) => Ok(verdict),
            MockReply::OracleFailure => {
                Err(OracleError::Unavailable("scripted transport failure".into()).into())
            }
            MockReply::ProtocolFailure => {
                Err(ProtocolError::Malformed("scripted bad reply".into()).into())
            }
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    opening_calls: usize,
    verdict_calls: Vec<(String, Option<char>)>,
}

/// An oracle that returns scripted replies in order.
///
/// Clones share the same script, so a test can keep a handle after giving
/// one to a controller. When the script runs out every call fails with an
/// oracle error.
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    state: Arc<Mutex<MockState>>,
}

impl MockOracle {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                replies: replies.into(),
                ..MockState::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a reply to the end of the script.
    pub fn queue(&self, reply: MockReply) {
        self.state().replies.push_back(reply);
    }

    /// Number of opening requests made so far.
    pub fn opening_calls(&self) -> usize {
        self.state().opening_calls
    }

    /// Verse and letter of every turn request made so far.
    pub fn verdict_calls(&self) -> Vec<(String, Option<char>)> {
        self.state().verdict_calls.clone()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.state().replies.len()
    }

    fn next_reply(state: &mut MockState) -> Result<JudgmentVerdict, JudgmentError> {
        state
            .replies
            .pop_front()
            .unwrap_or(MockReply::OracleFailure)
            .into_result()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn request_opening_verdict(&self) -> Result<JudgmentVerdict, JudgmentError> {
        let mut state = self.state();
        state.opening_calls += 1;
        Self::next_reply(&mut state)
    }

    async fn request_verdict(
        &self,
        verse_text: &str,
        required_letter: Option<char>,
    ) -> Result<JudgmentVerdict, JudgmentError> {
        let mut state = self.state();
        state
            .verdict_calls
            .push((verse_text.to_string(), required_letter));
        Self::next_reply(&mut state)
    }
}

/// Test harness for running game scenarios.
pub struct TestHarness {
    /// Handle on the oracle's script.
    pub oracle: MockOracle,
    /// The controller under test.
    pub controller: GameController<MockOracle>,
}

impl TestHarness {
    /// A harness with no pacing delays.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::instant())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let oracle = MockOracle::default();
        let controller = GameController::new(oracle.clone(), config);
        Self { oracle, controller }
    }

    /// Queue a verdict.
    pub fn expect_verdict(&mut self, verdict: JudgmentVerdict) -> &mut Self {
        self.oracle.queue(MockReply::Verdict(verdict));
        self
    }

    /// Queue a reply verse with the letter it ends on.
    pub fn expect_reply(&mut self, verse: &str, poet: &str, next_letter: char) -> &mut Self {
        self.expect_verdict(
            JudgmentVerdict::accepted("")
                .with_verse(Verse::new(verse).by(poet))
                .with_next_letter(next_letter),
        )
    }

    /// Queue a rejection.
    pub fn expect_rejection(&mut self, message: &str) -> &mut Self {
        self.expect_verdict(JudgmentVerdict::rejected(message))
    }

    /// Queue a transport failure.
    pub fn expect_oracle_failure(&mut self) -> &mut Self {
        self.oracle.queue(MockReply::OracleFailure);
        self
    }

    /// Queue an unparseable reply.
    pub fn expect_protocol_failure(&mut self) -> &mut Self {
        self.oracle.queue(MockReply::ProtocolFailure);
        self
    }

    /// Start a game whose opening verse ends on `letter`.
    pub async fn open(&mut self, letter: char) -> &mut Self {
        self.expect_verdict(
            JudgmentVerdict::accepted("سلام! بیایید مشاعره کنیم.")
                .with_verse(Verse::new("الا یا ایها الساقی ادر کاسا و ناولها").by("حافظ"))
                .with_next_letter(letter),
        );
        let started = self.controller.start_game().await;
        assert!(started.is_ok(), "opening failed: {started:?}");
        self
    }

    pub async fn start(&mut self) -> Result<(), CommandError> {
        self.controller.start_game().await
    }

    pub async fn submit(&mut self, verse: &str) -> Result<TurnOutcome, CommandError> {
        self.controller.submit_verse(verse).await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    pub fn score(&self) -> u32 {
        self.controller.session().score()
    }

    pub fn required_letter(&self) -> Option<char> {
        self.controller.session().required_letter()
    }

    pub fn history(&self) -> &[TurnMessage] {
        self.controller.session().history()
    }

    pub fn last_message(&self) -> Option<&TurnMessage> {
        self.history().last()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the score.
#[track_caller]
pub fn assert_score(harness: &TestHarness, expected: u32) {
    let actual = harness.score();
    assert_eq!(actual, expected, "Expected score {expected}, got {actual}");
}

/// Assert the required letter.
#[track_caller]
pub fn assert_required_letter(harness: &TestHarness, expected: Option<char>) {
    let actual = harness.required_letter();
    assert_eq!(
        actual, expected,
        "Expected required letter {expected:?}, got {actual:?}"
    );
}

/// Assert the last message came from the opponent and is flagged as an error.
#[track_caller]
pub fn assert_last_is_error(harness: &TestHarness, text: &str) {
    let last = harness.last_message().expect("Expected a message in history");
    assert_eq!(last.origin, Origin::Opponent, "Expected an opponent message");
    assert!(last.is_error, "Expected '{}' to be flagged as an error", last.text);
    assert_eq!(last.text, text);
}

/// Assert the last message is an opponent verse by `poet`.
#[track_caller]
pub fn assert_last_is_verse(harness: &TestHarness, text: &str, poet: &str) {
    let last = harness.last_message().expect("Expected a message in history");
    assert_eq!(last.origin, Origin::Opponent, "Expected an opponent message");
    assert!(!last.is_error, "Expected a verse, got an error message");
    assert_eq!(last.text, text);
    assert_eq!(last.poet.as_deref(), Some(poet));
}

/// Assert the session is idle and accepts a verse.
#[track_caller]
pub fn assert_accepts_verse(harness: &TestHarness) {
    let snapshot = harness.snapshot();
    assert!(
        snapshot.accepts_verse(),
        "Expected session to accept a verse: active={}, pending={}, finished={}",
        snapshot.active,
        snapshot.pending,
        snapshot.finished
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_oracle_replays_in_order() {
        let oracle = MockOracle::new(vec![
            MockReply::Verdict(JudgmentVerdict::rejected("یک")),
            MockReply::ProtocolFailure,
        ]);

        let first = oracle.request_verdict("الف", None).await.unwrap();
        assert_eq!(first.feedback_message, "یک");

        let second = oracle.request_verdict("ب", Some('ب')).await.unwrap_err();
        assert!(second.is_protocol());

        // Exhausted script fails like a dead transport.
        let third = oracle.request_opening_verdict().await.unwrap_err();
        assert!(!third.is_protocol());

        assert_eq!(oracle.opening_calls(), 1);
        assert_eq!(oracle.verdict_calls().len(), 2);
        assert_eq!(oracle.remaining(), 0);
    }

    #[tokio::test]
    async fn test_harness_open_and_reply() {
        let mut harness = TestHarness::new();
        harness.open('ا').await;
        assert_required_letter(&harness, Some('ا'));
        assert_accepts_verse(&harness);

        harness.expect_reply("رسید مژده که ایام غم نخواهد ماند", "حافظ", 'د');
        let outcome = harness.submit("آسمان بار امانت نتوانست کشید").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Answered);
        assert_score(&harness, 1);
        assert_required_letter(&harness, Some('د'));
        assert_last_is_verse(&harness, "رسید مژده که ایام غم نخواهد ماند", "حافظ");
    }
}

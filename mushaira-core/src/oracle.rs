//! The contract the game needs from its verse-judging oracle.

use crate::verdict::JudgmentVerdict;
use async_trait::async_trait;
use thiserror::Error;

/// The judgment transport itself failed: network, auth, quota, timeout.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Claude API error: {0}")]
    Claude(#[from] claude::Error),

    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

/// The oracle answered, but not in the agreed shape.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Oracle returned an empty reply")]
    Empty,

    #[error("Oracle reply is not a verdict: {0}")]
    Malformed(String),

    #[error("Oracle reply is missing `{0}`")]
    MissingField(&'static str),
}

/// Any failure to obtain a usable verdict.
#[derive(Debug, Error)]
pub enum JudgmentError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl JudgmentError {
    pub fn is_protocol(&self) -> bool {
        matches!(self, JudgmentError::Protocol(_))
    }
}

impl From<claude::Error> for JudgmentError {
    fn from(err: claude::Error) -> Self {
        JudgmentError::Oracle(OracleError::Claude(err))
    }
}

/// A stateless request/response judge.
///
/// Implementations perform exactly one outbound call per method and never
/// retry; retry policy belongs to whoever drives the game.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Ask for an opening verse from a well-known poet.
    async fn request_opening_verdict(&self) -> Result<JudgmentVerdict, JudgmentError>;

    /// Judge the player's verse against the required letter and, if it
    /// passes, reply with a verse of the oracle's own.
    async fn request_verdict(
        &self,
        verse_text: &str,
        required_letter: Option<char>,
    ) -> Result<JudgmentVerdict, JudgmentError>;
}

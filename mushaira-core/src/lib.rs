//! Turn engine for mushaira, the Persian linked-verse game.
//!
//! This crate provides:
//! - The game session state machine (turns, score, required letter)
//! - An AI opponent and judge using Claude
//! - A background worker for front ends
//! - A scripted oracle and harness for tests
//!
//! # Quick Start
//!
//! ```ignore
//! use mushaira_core::{ClaudeJudge, GameController, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let judge = ClaudeJudge::from_env()?;
//!     let mut game = GameController::new(judge, SessionConfig::default());
//!
//!     game.start_game().await?;
//!     println!("Start with: {:?}", game.session().required_letter());
//!
//!     let outcome = game.submit_verse("الا یا ایها الساقی ادر کاسا و ناولها").await?;
//!     println!("{outcome:?}, score {}", game.session().score());
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod judge;
pub mod letters;
pub mod oracle;
pub mod prompts;
pub mod session;
pub mod testing;
pub mod verdict;
pub mod worker;

// Re-export for convenience
pub use mushaira_macros::Tool;

// Primary public API
pub use controller::{GameController, SessionConfig, TurnOutcome};
pub use judge::{ClaudeJudge, JudgeConfig};
pub use oracle::{JudgmentError, Oracle, OracleError, ProtocolError};
pub use session::{CommandError, GameSession, Origin, SessionSnapshot, TurnMessage};
pub use testing::{MockOracle, MockReply, TestHarness};
pub use verdict::{JudgmentVerdict, Verse};
pub use worker::{spawn_worker, WorkerHandle, WorkerRequest, WorkerResponse};

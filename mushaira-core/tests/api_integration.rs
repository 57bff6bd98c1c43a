//! Integration tests that call the real Claude API.
//!
//! These tests require ANTHROPIC_API_KEY to be set (via .env file or environment).
//! Run with: `cargo test -p mushaira-core --test api_integration -- --ignored`
//!
//! These are marked #[ignore] by default since they cost money and take
//! seconds per call.

use mushaira_core::letters::starts_with_letter;
use mushaira_core::{
    ClaudeJudge, GameController, JudgeConfig, Oracle, SessionConfig, TurnOutcome,
};

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

/// Check if API key is available
fn has_api_key() -> bool {
    std::env::var("ANTHROPIC_API_KEY").is_ok()
}

fn judge() -> ClaudeJudge {
    ClaudeJudge::from_env()
        .expect("Failed to create judge")
        .with_config(JudgeConfig::from_env().with_temperature(0.3))
}

#[tokio::test]
#[ignore] // Run with: cargo test -p mushaira-core --test api_integration -- --ignored
async fn test_opening_verdict_has_verse_and_letter() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let verdict = judge()
        .request_opening_verdict()
        .await
        .expect("Opening should succeed");

    println!("Opening: {:?}", verdict);
    assert!(verdict.is_valid);
    assert!(!verdict.feedback_message.is_empty());
    let verse = verdict.opponent_verse.expect("Opening should recite a verse");
    assert!(!verse.text.is_empty());
    assert!(verdict.next_required_letter.is_some());
}

#[tokio::test]
#[ignore]
async fn test_famous_verse_is_accepted() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let verdict = judge()
        .request_verdict("الا یا ایها الساقی ادر کاسا و ناولها", Some('آ'))
        .await
        .expect("Verdict should succeed");

    println!("Verdict: {:?}", verdict);
    assert!(verdict.is_valid, "Hafez's opening line should be accepted");
    if let Some(verse) = &verdict.opponent_verse {
        // The reply must continue from the last letter of "ناولها".
        assert!(starts_with_letter(&verse.text, Some('ا')), "{}", verse.text);
    }
}

#[tokio::test]
#[ignore]
async fn test_wrong_letter_is_rejected() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let verdict = judge()
        .request_verdict("بنی آدم اعضای یکدیگرند", Some('ز'))
        .await
        .expect("Verdict should succeed");

    println!("Verdict: {:?}", verdict);
    assert!(!verdict.is_valid);
    assert!(verdict.opponent_verse.is_none());
}

#[tokio::test]
#[ignore]
async fn test_full_turn_against_claude() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let mut game = GameController::new(judge(), SessionConfig::instant());
    game.start_game().await.expect("Game should open");

    let letter = game.session().required_letter();
    println!("Required letter: {:?}", letter);
    for message in game.session().history() {
        println!("  {:?}: {}", message.origin, message.text);
    }

    let outcome = game
        .submit_verse("الا یا ایها الساقی ادر کاسا و ناولها")
        .await
        .expect("Turn should run");

    println!("Outcome: {:?}, score {}", outcome, game.session().score());
    assert!(!game.session().is_pending());
    assert_ne!(outcome, TurnOutcome::Failed);
}

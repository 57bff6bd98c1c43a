//! Headless mode for the game.
//!
//! This module provides a simple text-based interface for running the game
//! without a TUI. It's designed for automated testing and AI agents.

use mushaira_core::session::START_FAILURE_MESSAGE;
use mushaira_core::{
    spawn_worker, Oracle, Origin, SessionConfig, SessionSnapshot, TurnMessage, TurnOutcome,
    WorkerHandle, WorkerRequest, WorkerResponse,
};
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

/// One line of headless input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessInput {
    Start,
    Status,
    Transcript,
    Help,
    Quit,
    Verse(String),
    Unknown(String),
    Blank,
}

impl HeadlessInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return HeadlessInput::Blank;
        }

        let Some(command) = line.strip_prefix('#') else {
            return HeadlessInput::Verse(line.to_string());
        };

        match command.trim().to_lowercase().as_str() {
            "start" | "new" => HeadlessInput::Start,
            "status" => HeadlessInput::Status,
            "transcript" => HeadlessInput::Transcript,
            "help" => HeadlessInput::Help,
            "quit" | "exit" => HeadlessInput::Quit,
            other => HeadlessInput::Unknown(other.to_string()),
        }
    }
}

/// Format a transcript message as a tagged output line.
///
/// Error messages are tagged `[REJECTED]` when they carry the judge's
/// verdict and `[ERROR]` when they report a failure.
pub fn format_message(message: &TurnMessage, outcome: Option<TurnOutcome>) -> String {
    match message.origin {
        Origin::Player => format!("[YOU] {}", message.text),
        Origin::Opponent if message.is_error => {
            if outcome == Some(TurnOutcome::Rejected) {
                format!("[REJECTED] {}", message.text)
            } else {
                format!("[ERROR] {}", message.text)
            }
        }
        Origin::Opponent => match &message.poet {
            Some(poet) => format!("[BOT] {} ({poet})", message.text),
            None => format!("[BOT] {}", message.text),
        },
    }
}

/// Format the `#status` line.
pub fn format_status(snapshot: &SessionSnapshot) -> String {
    let letter = snapshot
        .required_letter
        .map(String::from)
        .unwrap_or_else(|| "?".to_string());
    let state = if snapshot.finished {
        "finished"
    } else if snapshot.active {
        "playing"
    } else {
        "idle"
    };
    format!(
        "[STATUS] {state}, score: {}, letter: {letter}, messages: {}",
        snapshot.score,
        snapshot.history.len()
    )
}

fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  #start       - Start a new game")?;
    writeln!(out, "  #status      - Show score and required letter")?;
    writeln!(out, "  #transcript  - Print the game as JSON")?;
    writeln!(out, "  #help        - Show this help")?;
    writeln!(out, "  #quit        - Exit the game")?;
    writeln!(out, "Any other line is submitted as your verse.")
}

/// Drives the worker from line input and prints what changed.
struct HeadlessSession {
    handle: WorkerHandle,
    printed: usize,
}

impl HeadlessSession {
    /// Send a request and wait for its answer.
    async fn request(&mut self, request: WorkerRequest) -> io::Result<WorkerResponse> {
        self.handle
            .requests
            .send(request)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "game worker stopped"))?;
        self.handle
            .responses
            .recv()
            .await
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "game worker stopped"))
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.handle.updates.borrow().clone()
    }

    /// Print every message not printed yet.
    fn flush_messages(&mut self, out: &mut impl Write, outcome: Option<TurnOutcome>) -> io::Result<()> {
        let snapshot = self.snapshot();
        for message in snapshot.history.iter().skip(self.printed) {
            writeln!(out, "{}", format_message(message, outcome))?;
        }
        self.printed = snapshot.history.len();
        Ok(())
    }

    async fn start(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.printed = 0;
        match self.request(WorkerRequest::StartGame).await? {
            WorkerResponse::Started => {
                self.flush_messages(out, None)?;
                let status = format_status(&self.snapshot());
                writeln!(out, "{status}")
            }
            WorkerResponse::StartFailed(e) => {
                info!(error = %e, "Headless start failed");
                writeln!(out, "[ERROR] {START_FAILURE_MESSAGE}")
            }
            other => report_unexpected(out, other),
        }
    }

    async fn submit(&mut self, verse: String, out: &mut impl Write) -> io::Result<()> {
        match self.request(WorkerRequest::SubmitVerse(verse)).await? {
            WorkerResponse::TurnComplete(outcome) => {
                self.flush_messages(out, Some(outcome))?;
                let snapshot = self.snapshot();
                if outcome == TurnOutcome::Won {
                    writeln!(
                        out,
                        "[GAME OVER] You won with a score of {}. Type #start to play again.",
                        snapshot.score
                    )
                } else {
                    writeln!(out, "{}", format_status(&snapshot))
                }
            }
            other => report_unexpected(out, other),
        }
    }
}

fn report_unexpected(out: &mut impl Write, response: WorkerResponse) -> io::Result<()> {
    match response {
        WorkerResponse::Rejected(e) => writeln!(out, "[ERROR] {e}"),
        other => writeln!(out, "[ERROR] Unexpected response: {other:?}"),
    }
}

/// Run the game in headless mode on stdin/stdout.
pub async fn run_headless<O: Oracle + 'static>(oracle: O, config: SessionConfig) -> io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    run_headless_io(oracle, config, stdin, &mut stdout).await
}

/// Run the line protocol over any input and output.
///
/// - Lines starting with `#` are commands (start, status, transcript, help, quit)
/// - All other lines are verses
/// - Output lines are tagged: `[BOT]`, `[YOU]`, `[REJECTED]`, `[ERROR]`,
///   `[STATUS]`, `[GAME OVER]`
pub async fn run_headless_io<O, R, W>(
    oracle: O,
    config: SessionConfig,
    input: R,
    out: &mut W,
) -> io::Result<()>
where
    O: Oracle + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = HeadlessSession {
        handle: spawn_worker(oracle, config),
        printed: 0,
    };

    writeln!(out, "=== Mushaira Headless Mode ===")?;
    print_help(out)?;
    writeln!(out)?;
    out.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match HeadlessInput::parse(&line) {
            HeadlessInput::Blank => continue,
            HeadlessInput::Quit => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            HeadlessInput::Help => print_help(out)?,
            HeadlessInput::Status => writeln!(out, "{}", format_status(&session.snapshot()))?,
            HeadlessInput::Transcript => {
                let json = serde_json::to_string_pretty(&session.snapshot())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                writeln!(out, "{json}")?;
            }
            HeadlessInput::Start => session.start(out).await?,
            HeadlessInput::Verse(verse) => {
                if session.snapshot().active {
                    session.submit(verse, out).await?;
                } else {
                    writeln!(out, "[ERROR] No game in progress. Type #start to begin.")?;
                }
            }
            HeadlessInput::Unknown(command) => {
                writeln!(out, "[ERROR] Unknown command: #{command}. Type #help for commands.")?;
            }
        }
        out.flush()?;
    }

    let _ = session.handle.requests.send(WorkerRequest::Shutdown).await;
    let _ = session.handle.task.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mushaira_core::{JudgmentVerdict, MockOracle, MockReply, Verse};

    #[test]
    fn test_parse_input() {
        assert_eq!(HeadlessInput::parse("  #start "), HeadlessInput::Start);
        assert_eq!(HeadlessInput::parse("#QUIT"), HeadlessInput::Quit);
        assert_eq!(HeadlessInput::parse("   "), HeadlessInput::Blank);
        assert_eq!(
            HeadlessInput::parse("زبان فارسی"),
            HeadlessInput::Verse("زبان فارسی".into())
        );
        assert_eq!(
            HeadlessInput::parse("#save"),
            HeadlessInput::Unknown("save".into())
        );
    }

    #[test]
    fn test_format_message_tags() {
        let verse = TurnMessage::verse(Verse::new("بیت۱").by("حافظ"));
        assert_eq!(format_message(&verse, None), "[BOT] بیت۱ (حافظ)");

        let player = TurnMessage::player("زبان");
        assert_eq!(format_message(&player, None), "[YOU] زبان");

        let error = TurnMessage::error("نه");
        assert_eq!(
            format_message(&error, Some(TurnOutcome::Rejected)),
            "[REJECTED] نه"
        );
        assert_eq!(format_message(&error, Some(TurnOutcome::Failed)), "[ERROR] نه");
    }

    async fn run_script(replies: Vec<MockReply>, script: &str) -> String {
        let oracle = MockOracle::new(replies);
        let mut out = Vec::new();
        run_headless_io(oracle, SessionConfig::instant(), script.as_bytes(), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_headless_game() {
        let output = run_script(
            vec![
                MockReply::Verdict(
                    JudgmentVerdict::accepted("سلام")
                        .with_verse(Verse::new("بیت۱").by("حافظ"))
                        .with_next_letter('ز'),
                ),
                MockReply::Verdict(JudgmentVerdict::rejected("این بیت معروف نیست")),
                MockReply::Verdict(JudgmentVerdict::accepted("آفرین").winner()),
            ],
            "#start\nزبان فارسی زیباست\nزلف آشفته\n#quit\n",
        )
        .await;

        let tagged: Vec<&str> = output.lines().filter(|l| l.starts_with('[')).collect();
        assert_eq!(
            tagged,
            vec![
                "[BOT] سلام",
                "[BOT] بیت۱ (حافظ)",
                "[STATUS] playing, score: 0, letter: ز, messages: 2",
                "[YOU] زبان فارسی زیباست",
                "[REJECTED] این بیت معروف نیست",
                "[STATUS] playing, score: 0, letter: ز, messages: 4",
                "[YOU] زلف آشفته",
                "[BOT] آفرین",
                "[GAME OVER] You won with a score of 1. Type #start to play again.",
            ]
        );
        assert!(output.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_verse_before_start_is_refused() {
        let output = run_script(vec![], "سلام\n").await;
        assert!(output.contains("[ERROR] No game in progress"));
    }

    #[tokio::test]
    async fn test_failed_start_reports_error() {
        let output = run_script(vec![MockReply::OracleFailure], "#start\n#status\n").await;
        assert!(output.contains(&format!("[ERROR] {START_FAILURE_MESSAGE}")));
        assert!(output.contains("[STATUS] idle, score: 0, letter: ?, messages: 0"));
    }

    #[tokio::test]
    async fn test_transcript_is_json() {
        let output = run_script(
            vec![MockReply::Verdict(JudgmentVerdict::accepted("سلام"))],
            "#start\n#transcript\n",
        )
        .await;
        assert!(output.contains("\"origin\": \"opponent\""));
        assert!(output.contains("\"active\": true"));
    }
}

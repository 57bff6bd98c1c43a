//! Mushaira TUI application.
//!
//! A terminal chat for playing the Persian linked-verse game against Claude.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a text-based interface suitable for automated testing:
//!
//! ```bash
//! cargo run -p mushaira -- --headless
//! ```

mod app;
mod events;
mod headless;
mod ui;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mushaira_core::{spawn_worker, ClaudeJudge, JudgeConfig, SessionConfig};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

/// Recite Persian poetry against an AI opponent.
#[derive(Parser, Debug)]
#[command(name = "mushaira")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Run with a line-oriented text interface instead of the TUI
    #[arg(long)]
    headless: bool,

    /// Claude model to use (overrides MUSHAIRA_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Where to write logs
    #[arg(long, default_value = "mushaira.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    // Check for API key
    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Error: ANTHROPIC_API_KEY environment variable not set.");
        eprintln!("Please set it in .env file or with: export ANTHROPIC_API_KEY=your_key_here");
        std::process::exit(1);
    }

    let mut judge_config = JudgeConfig::from_env();
    if let Some(model) = cli.model {
        judge_config = judge_config.with_model(model);
    }
    let judge = ClaudeJudge::from_env()?.with_config(judge_config);
    info!(headless = cli.headless, model = ?judge.config().model, "Starting mushaira");

    if cli.headless {
        return headless::run_headless(judge, SessionConfig::default())
            .await
            .map_err(|e| e.into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (app, worker) = App::from_handle(spawn_worker(judge, SessionConfig::default()));

    // Run app
    let result = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    worker.abort();

    if let Err(e) = result {
        error!(error = %e, "TUI exited with an error");
        eprintln!("Error: {e}");
    }

    info!("Goodbye");
    Ok(())
}

/// Send logs to a file so they don't interfere with the TUI.
fn init_logging(path: &Path) -> io::Result<()> {
    let log_file = std::fs::File::create(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init(); // Don't fail if already initialized
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    let mut needs_redraw = true;

    loop {
        if app.sync() {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|f| render(f, &app))?;
            needs_redraw = false;
        }

        // Poll for events with timeout for animations
        if event::poll(Duration::from_millis(50))? {
            let ev = event::read()?;
            match handle_event(&mut app, ev) {
                EventResult::Quit => {
                    app.shutdown();
                    return Ok(());
                }
                EventResult::NeedsRedraw => needs_redraw = true,
                EventResult::Continue => {}
            }
        } else {
            app.tick();
            if app.is_thinking() {
                needs_redraw = true;
            }
        }

        // Let the worker make progress between polls
        tokio::task::yield_now().await;
    }
}

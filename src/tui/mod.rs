//! Terminal User Interface module for evsearch.
//!
//! Provides the question/answer screen with a map of locations, keyword chart
//! and session history, using ratatui for rendering and crossterm for
//! terminal management.

use std::io;
use std::panic;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::answerer::RetrievalQa;
use crate::config::Config;
use crate::index::VectorIndex;
use crate::service::AskService;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus, Notice, Status};
use event::Action;

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
/// Returns a configured Terminal instance.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// Disables raw mode and leaves the alternate screen.
/// This should always be called before exiting the TUI,
/// even in error cases, to prevent terminal corruption.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for panic handler.
///
/// Does not require a Terminal reference, making it safe to call
/// from a panic hook. Ignores errors since we're likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Initializes a panic hook that restores the terminal before panicking.
///
/// The original panic hook is preserved and called after terminal restoration.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the main event loop for the TUI.
///
/// Polls for keyboard events, updates app state, and re-renders.
/// Exits when the user quits or an error occurs.
///
/// # Errors
///
/// Returns an error if event polling, rendering, or terminal operations fail.
/// Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, service: &AskService) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, service, &mut terminal);

    // Always restore terminal state
    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

/// Internal event loop implementation.
///
/// Separated from `run_event_loop` to ensure terminal restoration happens
/// in the outer function.
fn run_event_loop_internal(
    app: &mut App,
    service: &AskService,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
        {
            match event::handle_key_event(app, key) {
                Action::Quit => break,
                Action::Submit => {
                    // Show the indicator before blocking on the model
                    app.begin_thinking();
                    terminal.draw(|frame| ui::draw(frame, app))?;
                    app.submit(service);
                }
                Action::None => {}
            }
        }
    }

    Ok(())
}

/// Builds the answering service from `config`.
///
/// The index is opened read-only and must already exist.
pub fn build_service(config: &Config) -> Result<AskService> {
    let index =
        VectorIndex::open_read_only(&config.index_path).context("Failed to open vector index")?;
    let client = config
        .ollama_client()
        .context("Failed to create Ollama client")?;

    let qa = RetrievalQa::new(Arc::new(client), index, config.retrieval_settings());
    Ok(AskService::new(Box::new(qa)))
}

/// Entry point for the TUI application.
///
/// # Errors
///
/// Returns an error if:
/// - The vector index is missing or unreadable
/// - The Ollama client cannot be built
/// - Terminal initialization or event loop fails
pub fn run(config: &Config) -> Result<()> {
    // Install panic hook to restore terminal on panic
    init_panic_hook();

    let service = build_service(config)?;

    let mut app = App::new();
    info!(session = %app.session_id(), "tui started");

    run_event_loop(&mut app, &service).context("TUI event loop failed")?;

    if let Some(session) = app.end_session() {
        info!(session = %session.id(), answered = session.len(), "session ended");
    }
    Ok(())
}

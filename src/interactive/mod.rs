//! Interactive terminal UI
//!
//! A single-session calculator: pick segment, code and sub-category, set a
//! count, add the result to the activity log and export it when done. Each
//! key press is one state transition followed by a full redraw.

pub mod app;
pub mod events;
pub mod form;
pub mod form_ui;
pub mod log_view;
pub mod messages;
pub mod summary_chart;
pub mod ui;
pub mod utils;

pub use app::App;
pub use events::EventHandler;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::rules::RuleTable;
use events::terminal_error;

/// Run the interactive calculator until the user quits
pub fn run_interactive(
    table: Arc<RuleTable>,
    rules_path: PathBuf,
    export_dir: PathBuf,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode().map_err(terminal_error)?;
    let mut terminal = setup_or_restore(enter_alternate_screen, || {
        if let Err(e) = restore_terminal() {
            tracing::warn!(error = %e, "Failed to restore terminal after setup error");
        }
    })?;

    let mut app = App::new(table, rules_path, export_dir);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    restore_terminal().map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)?;

    let log = app.session.log();
    tracing::info!(
        entries = log.len(),
        total = log.total(),
        "Interactive session ended"
    );

    res
}

fn enter_alternate_screen() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Leave raw mode and the alternate screen
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

/// Run the rest of the terminal setup once raw mode is on; on failure undo
/// it with `restore` before reporting the error.
fn setup_or_restore<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce(),
) -> Result<T> {
    setup().map_err(|e| {
        restore();
        terminal_error(e)
    })
}

/// Main application loop
fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let event_handler = EventHandler::new();

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(terminal_error)?;

        if let Some(event) = event_handler.next()? {
            if !app.handle_event(event) {
                break;
            }
        }
    }

    Ok(())
}

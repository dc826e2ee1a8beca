//! convlens-view - interactive conversation store viewer
//!
//! Directory ranking on the left, the selected directory's history on the
//! right, database overview on demand.

mod app;
mod cli;
mod ui;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use convlens_core::Config;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;
use crate::cli::StoreArgs;

#[derive(Parser)]
#[command(name = "convlens-view")]
#[command(about = "Browse the AI assistant conversation store")]
#[command(version)]
struct Args {
    #[command(flatten)]
    store: StoreArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load().context("failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            cli::report_failure(&e, None);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "convlens-view failed");
            cli::report_failure(&e, Some(&config));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &Config) -> Result<()> {
    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        convlens_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("convlens-view starting up");

    // Store errors surface before the terminal is taken over.
    let directory = args.store.directory_key()?;
    let db = args.store.open_store(config)?;
    let mut app = App::new(db, config.display.clone(), &directory);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    app.into_database()
        .close()
        .context("failed to close conversation store")?;

    tracing::info!("convlens-view shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

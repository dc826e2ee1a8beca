//! convlens - conversation store analyzer
//!
//! Prints the database overview, the directory ranking and the conversation
//! history of one directory, in that order.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use convlens_core::analytics::{self, DatabaseStats, DirectoryHistory};
use convlens_core::report;
use convlens_core::{Config, Database, DirectoryStats};
use serde::Serialize;

use crate::cli::StoreArgs;

#[derive(Parser)]
#[command(name = "convlens")]
#[command(about = "Statistics and transcripts from the AI assistant conversation store")]
#[command(version)]
struct Args {
    #[command(flatten)]
    store: StoreArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Show the working directory and OS recorded with each prompt
    #[arg(long)]
    show_context: bool,

    /// Hide the command line of tool invocations
    #[arg(long)]
    no_tool_detail: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Everything one run found, for `--format json`.
#[derive(Serialize)]
struct JsonOutput<'a> {
    store: String,
    database: &'a DatabaseStats,
    directories: Option<&'a [DirectoryStats]>,
    history: Option<&'a DirectoryHistory>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match Config::load().context("failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            cli::report_failure(&e, None);
            return ExitCode::FAILURE;
        }
    };
    if args.show_context {
        config.display.show_context = true;
    }
    if args.no_tool_detail {
        config.display.show_tool_detail = false;
    }

    // Logs go to a file under the state directory.
    let _log_guard = match convlens_core::logging::init(&config.logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            None
        }
    };

    let db = match args.store.open_store(&config) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Cannot use conversation store");
            cli::report_failure(&e, Some(&config));
            return ExitCode::FAILURE;
        }
    };

    let printed = print_reports(&args, &config, &db);
    let closed = db.close().context("failed to close conversation store");

    match printed.and(closed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "convlens failed");
            cli::report_failure(&e, Some(&config));
            ExitCode::FAILURE
        }
    }
}

fn print_reports(args: &Args, config: &Config, db: &Database) -> Result<()> {
    let directory = args.store.directory_key()?;
    tracing::info!(directory = %directory, "Building reports");

    let stats = analytics::database_stats(db);

    // Sections degrade on their own; only store access is fatal.
    let directories = analytics::directory_stats(db)
        .map_err(|e| tracing::warn!(error = %e, "Directory overview unavailable"))
        .ok();
    let history = analytics::conversation_history(db, &directory, config.display.suggestion_limit)
        .map_err(|e| tracing::warn!(error = %e, "Conversation history unavailable"))
        .ok();

    if let Some(history) = &history {
        if history.skipped > 0 {
            tracing::warn!(
                skipped = history.skipped,
                "Some conversations could not be decoded"
            );
        }
    }

    match args.format {
        OutputFormat::Json => {
            let output = JsonOutput {
                store: db.path().display().to_string(),
                database: &stats,
                directories: directories.as_deref(),
                history: history.as_ref(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("failed to serialize report")?
            );
        }
        OutputFormat::Text => {
            print!("{}", report::database_overview(&stats, &config.display));
            match &directories {
                Some(dirs) => print!("{}", report::directory_overview(dirs, &config.display)),
                None => print_unavailable("Directory overview"),
            }
            match &history {
                Some(history) => print!(
                    "{}",
                    report::conversation_history(history, &config.display)
                ),
                None => print_unavailable("Conversation history"),
            }
        }
    }

    Ok(())
}

fn print_unavailable(section: &str) {
    println!(
        "{} unavailable, see {}",
        section,
        convlens_core::logging::log_file_path().display()
    );
    println!();
}

//! Argument and store handling shared by `convlens` and `convlens-view`.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use convlens_core::{Config, Database, Error};

/// Options every binary accepts for choosing the store and directory.
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Directory whose conversations to show (default: current directory)
    pub directory: Option<PathBuf>,

    /// Path to the conversation store (default: search well-known locations)
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

impl StoreArgs {
    /// The requested directory as an absolute path string.
    ///
    /// Relative paths are joined onto the current directory, then `.` and `..`
    /// are resolved lexically. Symlinks are left alone.
    pub fn directory_key(&self) -> Result<String> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let path = match &self.directory {
            Some(dir) => cwd.join(dir),
            None => cwd,
        };
        Ok(normalize(&path).to_string_lossy().into_owned())
    }

    /// Locate and open the store read-only.
    pub fn open_store(&self, config: &Config) -> Result<Database> {
        let path = config
            .resolve_store(self.db.as_deref())
            .context("failed to locate conversation store")?;
        tracing::info!(path = %path.display(), "Using conversation store");
        let db = Database::open(&path).context("failed to open conversation store")?;
        if let Err(e) = db.verify_schema() {
            tracing::warn!(error = %e, "Conversation store has an unexpected schema");
        }
        Ok(db)
    }
}

/// Drop `.` components and pop on `..`, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Print a fatal error to stderr, with a hint about store locations when the
/// failure was about finding or opening the store.
pub fn report_failure(err: &anyhow::Error, config: Option<&Config>) {
    eprintln!("error: {:#}", err);

    let searched = match err.downcast_ref::<Error>() {
        Some(Error::StoreNotFound { searched }) => searched.clone(),
        Some(Error::StoreUnavailable { .. }) => config
            .map(|c| c.store.candidates())
            .unwrap_or_else(convlens_core::config::default_store_candidates),
        _ => return,
    };

    print_locations(&searched);
}

fn print_locations(searched: &[PathBuf]) {
    eprintln!();
    eprintln!("The conversation store is looked for in:");
    for path in searched {
        eprintln!("  {}", path.display());
    }
    eprintln!(
        "Pass --db PATH or set [store] path in {}",
        Config::config_path().display()
    );
}

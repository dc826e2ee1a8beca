//! Application state for the viewer.

use convlens_core::analytics::{self, DatabaseStats};
use convlens_core::config::DisplayConfig;
use convlens_core::report::{self, Report};
use convlens_core::{Database, DirectoryStats};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;

/// Lines moved by PgUp/PgDn.
const PAGE: usize = 10;

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Directories,
    History,
}

/// Main application state.
pub struct App {
    /// Store handle, held for the whole session
    db: Database,
    display: DisplayConfig,
    /// Row counts for the overview popup
    pub stats: DatabaseStats,
    /// Ranked directories, left pane
    pub directories: Vec<DirectoryStats>,
    /// Directory selection state
    pub table_state: TableState,
    /// History report of the selected directory, right pane
    pub history: Report,
    /// Scroll offset into `history`
    pub scroll_offset: usize,
    pub focus: Focus,
    /// Whether the database overview popup is open
    pub show_overview: bool,
    /// Set when a section could not be loaded
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    /// Load the overview and ranking, selecting `initial` when it is ranked.
    pub fn new(db: Database, display: DisplayConfig, initial: &str) -> Self {
        let stats = analytics::database_stats(&db);
        let (directories, status) = match analytics::directory_stats(&db) {
            Ok(dirs) => (dirs, None),
            Err(e) => {
                tracing::warn!(error = %e, "Directory overview unavailable");
                (Vec::new(), Some(format!("Directory overview unavailable: {}", e)))
            }
        };

        let mut table_state = TableState::default();
        if !directories.is_empty() {
            let selected = directories
                .iter()
                .position(|d| d.directory == initial)
                .unwrap_or(0);
            table_state.select(Some(selected));
        }

        let mut app = Self {
            db,
            display,
            stats,
            directories,
            table_state,
            history: Report::default(),
            scroll_offset: 0,
            focus: Focus::default(),
            show_overview: false,
            status,
            should_quit: false,
        };
        app.load_history();
        app
    }

    /// Give the store handle back so it can be closed explicitly.
    pub fn into_database(self) -> Database {
        self.db
    }

    /// Directory currently selected in the left pane.
    pub fn selected_directory(&self) -> Option<&DirectoryStats> {
        self.table_state
            .selected()
            .and_then(|i| self.directories.get(i))
    }

    /// Overview report for the popup.
    pub fn overview(&self) -> Report {
        report::database_overview(&self.stats, &self.display)
    }

    /// Rebuild the history pane for the selected directory.
    fn load_history(&mut self) {
        self.scroll_offset = 0;

        let Some(directory) = self.selected_directory().map(|d| d.directory.clone()) else {
            self.history = report::directory_overview(&self.directories, &self.display);
            return;
        };

        match analytics::conversation_history(&self.db, &directory, self.display.suggestion_limit)
        {
            Ok(history) => {
                self.history = report::conversation_history(&history, &self.display);
            }
            Err(e) => {
                tracing::warn!(directory = %directory, error = %e, "Conversation history unavailable");
                self.history = Report::default();
                self.status = Some(format!("History unavailable for {}: {}", directory, e));
            }
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.show_overview {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('d') | KeyCode::Char('q')
            ) {
                self.show_overview = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('d') => {
                self.show_overview = true;
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Directories => Focus::History,
                    Focus::History => Focus::Directories,
                };
            }
            _ => match self.focus {
                Focus::Directories => self.handle_directory_key(key),
                Focus::History => self.handle_history_key(key),
            },
        }
    }

    fn handle_directory_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Home | KeyCode::Char('g') => self.select(0),
            KeyCode::End | KeyCode::Char('G') => {
                self.select(self.directories.len().saturating_sub(1))
            }
            KeyCode::Enter => self.focus = Focus::History,
            KeyCode::PageDown => self.scroll_down(PAGE),
            KeyCode::PageUp => self.scroll_up(PAGE),
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Home | KeyCode::Char('g') => self.scroll_offset = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll_to_bottom(),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_down(PAGE),
            KeyCode::PageUp => self.scroll_up(PAGE),
            KeyCode::Esc => self.focus = Focus::Directories,
            _ => {}
        }
    }

    /// Select the next directory, wrapping at the end.
    fn select_next(&mut self) {
        if self.directories.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.directories.len() => i + 1,
            _ => 0,
        };
        self.select(i);
    }

    /// Select the previous directory, wrapping at the start.
    fn select_previous(&mut self) {
        if self.directories.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => self.directories.len() - 1,
            Some(i) => i - 1,
        };
        self.select(i);
    }

    fn select(&mut self, index: usize) {
        if self.directories.is_empty() || self.table_state.selected() == Some(index) {
            return;
        }
        self.table_state.select(Some(index));
        self.load_history();
    }

    fn scroll_down(&mut self, lines: usize) {
        let max = self.history.lines.len().saturating_sub(1);
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max);
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Scroll to the bottom. Clamped to the visible height during rendering.
    fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.history.lines.len().saturating_sub(1);
    }
}

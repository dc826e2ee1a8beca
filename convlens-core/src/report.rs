//! Report presentation
//!
//! Builds the three reports (database overview, directory overview,
//! conversation history) as a list of typed lines. The analyzer prints the
//! text as-is; the viewer styles each line by its [`LineKind`].

use std::fmt;

use serde::Serialize;

use crate::analytics::{DatabaseStats, DirectoryHistory};
use crate::config::DisplayConfig;
use crate::format::{format_epoch_millis, group_thousands};
use crate::render::{render_transcript, TranscriptKind, TranscriptOptions};
use crate::types::DirectoryStats;

/// Width of the table-name column in the database overview.
const TABLE_COLUMN: usize = 20;
/// Width of the right-aligned count column in the database overview.
const COUNT_COLUMN: usize = 12;

/// What a report line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Title,
    Rule,
    Heading,
    Text,
    Muted,
    Notice,
    Transcript(TranscriptKind),
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub kind: LineKind,
    pub text: String,
}

/// One finished report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub lines: Vec<ReportLine>,
}

impl Report {
    fn push(&mut self, kind: LineKind, text: impl Into<String>) {
        self.lines.push(ReportLine {
            kind,
            text: text.into(),
        });
    }

    fn blank(&mut self) {
        self.push(LineKind::Blank, "");
    }

    fn header(&mut self, title: impl Into<String>, box_width: usize) {
        self.push(LineKind::Title, title);
        self.push(LineKind::Rule, "─".repeat(box_width));
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }

    pub fn lines_of(&self, kind: LineKind) -> impl Iterator<Item = &ReportLine> {
        self.lines.iter().filter(move |l| l.kind == kind)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

/// Table name → row count, counts right-aligned and grouped.
pub fn database_overview(stats: &DatabaseStats, display: &DisplayConfig) -> Report {
    let mut report = Report::default();
    report.header("📊 Database Overview", display.box_width);

    for table in &stats.tables {
        let count = match table.rows {
            Some(rows) => group_thousands(rows),
            None => "n/a".to_string(),
        };
        report.push(
            LineKind::Text,
            format!(
                "  {:<name$}{:>count_w$}",
                table.table,
                count,
                name = TABLE_COLUMN,
                count_w = COUNT_COLUMN
            ),
        );
    }

    if let Some(directories) = stats.directory_count {
        report.push(
            LineKind::Muted,
            format!(
                "  {:<name$}{:>count_w$}",
                "directories",
                group_thousands(directories),
                name = TABLE_COLUMN,
                count_w = COUNT_COLUMN
            ),
        );
    }

    report.blank();
    report
}

/// Ranked list of directories by conversation count.
pub fn directory_overview(directories: &[DirectoryStats], display: &DisplayConfig) -> Report {
    let mut report = Report::default();
    report.header(
        format!("📁 Directories ({})", directories.len()),
        display.box_width,
    );

    if directories.is_empty() {
        report.push(LineKind::Notice, "  No conversations found in the store.");
        report.blank();
        return report;
    }

    for (rank, stats) in directories.iter().enumerate() {
        report.push(LineKind::Heading, format!("  {}. {}", rank + 1, stats.directory));
        report.push(
            LineKind::Text,
            format!(
                "     Conversations: {}",
                group_thousands(stats.total_conversations)
            ),
        );
        report.push(
            LineKind::Muted,
            format!(
                "     First: {}  Last: {}",
                format_epoch_millis(stats.first_activity),
                format_epoch_millis(stats.last_activity)
            ),
        );
    }

    report.blank();
    report
}

/// Per-conversation headers followed by their transcripts.
pub fn conversation_history(history: &DirectoryHistory, display: &DisplayConfig) -> Report {
    let options = TranscriptOptions::from(display);
    let mut report = Report::default();
    report.header(
        format!("💬 Conversation History: {}", history.directory),
        display.box_width,
    );

    if history.is_empty() {
        report.push(
            LineKind::Notice,
            format!("  No conversations found for {}", history.directory),
        );
        if !history.suggestions.is_empty() {
            report.blank();
            report.push(LineKind::Muted, "  Directories with conversations:");
            for directory in history.suggestions.iter().take(display.suggestion_limit) {
                report.push(LineKind::Text, format!("    • {}", directory));
            }
        }
        report.blank();
        return report;
    }

    let total = history.conversations.len();
    for (position, entry) in history.conversations.iter().enumerate() {
        let record = &entry.record;
        report.push(
            LineKind::Heading,
            format!(
                "Conversation {}/{}  [{}]",
                position + 1,
                total,
                record.short_id()
            ),
        );
        report.push(
            LineKind::Muted,
            format!("  Created:  {}", format_epoch_millis(record.created_at)),
        );
        if record.was_updated() {
            report.push(
                LineKind::Muted,
                format!("  Updated:  {}", format_epoch_millis(record.updated_at)),
            );
        }
        report.push(
            LineKind::Muted,
            format!("  Messages: {}", entry.data.message_count()),
        );
        report.blank();

        for block in render_transcript(&entry.data, &options) {
            report.push(
                LineKind::Muted,
                format!("  [{}] {}", block.index + 1, block.time),
            );
            for line in block.lines {
                report.push(
                    LineKind::Transcript(line.kind),
                    format!("    {}", line.text),
                );
            }
        }
        report.blank();
    }

    report.push(
        LineKind::Muted,
        format!(
            "  {} conversation(s), {} message(s)",
            total,
            history.total_messages()
        ),
    );
    report.blank();
    report
}

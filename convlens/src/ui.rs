//! UI rendering for the viewer.

use convlens_core::format::{format_epoch_millis, group_thousands, truncate};
use convlens_core::render::TranscriptKind;
use convlens_core::report::{LineKind, Report};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, Focus};

/// Separator line color
const SEPARATOR_COLOR: Color = Color::Rgb(60, 60, 60);
/// Border color for the focused pane
const BORDER_FOCUS: Color = Color::Rgb(0, 150, 150);
/// Border color for the unfocused pane
const BORDER_IDLE: Color = Color::Rgb(80, 80, 80);
/// Border color for the overview popup
const BORDER_POPUP: Color = Color::Rgb(180, 100, 180);
/// User turn color
const USER_COLOR: Color = Color::Rgb(80, 200, 120);
/// Assistant turn color
const ASSISTANT_COLOR: Color = Color::Rgb(100, 160, 255);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Layout: header, panes, status, footer
    let chunks = Layout::vertical([
        Constraint::Length(2), // Header
        Constraint::Min(5),    // Panes
        Constraint::Length(1), // Status
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_header(frame, app, chunks[0]);

    let panes = Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);
    render_directories(frame, app, panes[0]);
    render_history(frame, app, panes[1]);

    render_status(frame, app, chunks[2]);
    render_footer(frame, chunks[3]);

    if app.show_overview {
        render_overview_popup(frame, app, area);
    }
}

/// Render the header with the store totals.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let conversations = app
        .stats
        .total_conversations()
        .map(group_thousands)
        .unwrap_or_else(|| "n/a".to_string());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" convlens ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(
                " {} conversations in {} directories",
                conversations,
                group_thousands(app.directories.len() as i64)
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let color = if focused { BORDER_FOCUS } else { BORDER_IDLE };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_style(Style::default().fg(color).bold())
}

/// Render the ranked directory table.
fn render_directories(frame: &mut Frame, app: &mut App, area: Rect) {
    let header = Row::new(
        ["#", "Directory", "Convs", "Last"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).bold())),
    )
    .height(1);

    // Leave room for the fixed columns, borders and highlight symbol.
    let dir_width = area.width.saturating_sub(4 + 7 + 20 + 8) as usize;

    let rows = app.directories.iter().enumerate().map(|(rank, dir)| {
        Row::new([
            Cell::from(format!("{}", rank + 1)).style(Style::default().fg(Color::DarkGray)),
            Cell::from(truncate_left(&dir.directory, dir_width.max(8))),
            Cell::from(group_thousands(dir.total_conversations)),
            Cell::from(format_epoch_millis(dir.last_activity))
                .style(Style::default().fg(Color::DarkGray)),
        ])
    });

    let widths = [
        Constraint::Length(4),  // Rank
        Constraint::Fill(1),    // Directory (flexible)
        Constraint::Length(7),  // Conversations
        Constraint::Length(19), // Last activity
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(pane_block(
            format!(" Directories ({}) ", app.directories.len()),
            app.focus == Focus::Directories,
        ))
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Cyan),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

/// Keep the tail of a long path, where the distinguishing part usually is.
fn truncate_left(path: &str, width: usize) -> String {
    let len = path.chars().count();
    if len <= width {
        return path.to_string();
    }
    let tail: String = path.chars().skip(len - width.saturating_sub(1)).collect();
    format!("…{}", tail)
}

/// Render the history report of the selected directory.
fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.selected_directory() {
        Some(dir) => format!(" {} ", truncate(&dir.directory, 60)),
        None => " History ".to_string(),
    };

    let lines = report_lines(&app.history);

    // Calculate scrolling
    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(visible_height);
    let scroll_offset = app.scroll_offset.min(max_scroll);

    let paragraph = Paragraph::new(lines)
        .scroll((scroll_offset as u16, 0))
        .block(pane_block(title, app.focus == Focus::History));
    frame.render_widget(paragraph, area);
}

/// Style each report line by what it represents.
fn report_lines(report: &Report) -> Vec<Line<'_>> {
    report
        .lines
        .iter()
        .map(|line| Line::from(Span::styled(line.text.as_str(), line_style(line.kind))))
        .collect()
}

fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Title => Style::default().fg(Color::Cyan).bold(),
        LineKind::Rule => Style::default().fg(SEPARATOR_COLOR),
        LineKind::Heading => Style::default().fg(Color::Yellow).bold(),
        LineKind::Text => Style::default().fg(Color::White),
        LineKind::Muted => Style::default().fg(Color::DarkGray),
        LineKind::Notice => Style::default().fg(Color::Magenta),
        LineKind::Blank => Style::default(),
        LineKind::Transcript(kind) => match kind {
            TranscriptKind::User => Style::default().fg(USER_COLOR),
            TranscriptKind::Assistant => Style::default().fg(ASSISTANT_COLOR),
            TranscriptKind::ToolDetail => Style::default().fg(Color::Magenta),
            TranscriptKind::Performance => Style::default().fg(Color::DarkGray).italic(),
            TranscriptKind::Context => Style::default().fg(Color::Cyan),
        },
    }
}

/// Render the status line, if a section failed to load.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(status) = &app.status {
        let line = Paragraph::new(format!(" {}", status)).style(Style::default().fg(Color::Red));
        frame.render_widget(line, area);
    }
}

/// Render the footer with key hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(" move  "),
        Span::styled("g/G", Style::default().fg(Color::Yellow)),
        Span::raw(" top/bottom  "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" scroll  "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" switch pane  "),
        Span::styled("d", Style::default().fg(Color::Yellow)),
        Span::raw(" database  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}

/// Render the database overview as a centered popup.
fn render_overview_popup(frame: &mut Frame, app: &App, area: Rect) {
    let report = app.overview();
    let height = (report.lines.len() as u16 + 2).min(area.height);
    let width = 50.min(area.width);
    let popup = centered(area, width, height);

    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(report_lines(&report)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_POPUP))
            .title(" Database ")
            .title_style(Style::default().fg(BORDER_POPUP).bold()),
    );
    frame.render_widget(paragraph, popup);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [_, row, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, cell, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .areas(row);
    cell
}

//! UI layout and rendering logic for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::app::{App, Focus};
use crate::editor::highlight::split_library_words;
use crate::output::ArtifactView;
use crate::utils::unicode::prefix_width;
use crate::view::ViewMode;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Width of the variable list in the output pane.
const VARIABLE_LIST_WIDTH: u16 = 24;

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &mut App) {
    app.tick = app.tick.wrapping_add(1);

    let output_rows = if app.shows_output() { app.output_height } else { 0 };
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),           // Tabs
            Constraint::Min(3),              // Editor or file preview
            Constraint::Length(output_rows), // Output pane
            Constraint::Length(1),           // Status bar
        ])
        .split(frame.area());

    render_tabs(frame, app, main_layout[0]);

    match app.view {
        ViewMode::Editor => render_editor(frame, app, main_layout[1]),
        ViewMode::FilePreview(index) => render_file_preview(frame, app, index, main_layout[1]),
    }

    if output_rows > 0 {
        render_output_pane(frame, app, main_layout[2]);
    }

    render_status_bar(frame, app, main_layout[3]);

    if app.show_help {
        render_help_overlay(frame);
    }
}

/// One tab for the source plus one per data file.
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.view.tab_index();
    let titles = std::iter::once("script.py")
        .chain(app.notebook.data_files().iter().map(|f| f.title.as_str()));

    let mut spans = Vec::new();
    for (i, title) in titles.enumerate() {
        let style = if i == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", title), style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the source editor with a line-number gutter
fn render_editor(frame: &mut Frame, app: &mut App, area: Rect) {
    let border_style = if app.focus == Focus::Editor {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title("script.py")
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let height = inner.height as usize;
    app.editor.scroll_into_view(height);

    let line_count = app.editor.lines().len();
    let gutter = line_count.to_string().len() as u16 + 1;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(gutter), Constraint::Min(1)])
        .split(inner);

    let (row, col) = app.editor.cursor();
    let cursor_x = prefix_width(&app.editor.lines()[row], col);
    let text_width = columns[1].width as usize;
    let hscroll = if text_width > 0 && cursor_x >= text_width {
        cursor_x + 1 - text_width
    } else {
        0
    };

    let visible = app
        .editor
        .lines()
        .iter()
        .enumerate()
        .skip(app.editor.scroll)
        .take(height);

    let mut numbers = Vec::new();
    let mut lines = Vec::new();
    let library_style = Style::default()
        .fg(Color::LightBlue)
        .add_modifier(Modifier::BOLD);
    for (i, line) in visible {
        numbers.push(Line::from(Span::styled(
            format!("{:>width$}", i + 1, width = gutter as usize - 1),
            Style::default().fg(Color::DarkGray),
        )));
        let spans: Vec<Span> = split_library_words(line)
            .into_iter()
            .map(|(part, is_lib)| {
                if is_lib {
                    Span::styled(part.to_string(), library_style)
                } else {
                    Span::raw(part.to_string())
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(Text::from(numbers)), columns[0]);
    frame.render_widget(
        Paragraph::new(Text::from(lines)).scroll((0, hscroll as u16)),
        columns[1],
    );

    if app.focus == Focus::Editor && !app.show_help {
        let x = columns[1].x + (cursor_x - hscroll) as u16;
        let y = columns[1].y + row.saturating_sub(app.editor.scroll) as u16;
        frame.set_cursor_position((x, y));
    }
}

/// Render a data file as a table
fn render_file_preview(frame: &mut Frame, app: &mut App, index: usize, area: Rect) {
    let Some(file) = app.notebook.data_files().get(index) else {
        return;
    };
    let title = file.title.clone();
    let Some(view) = app.file_views.get(index) else {
        return;
    };

    let header_rows = match view {
        ArtifactView::Table(tables) if tables.first().is_some_and(|t| !t.headers.is_empty()) => 2,
        _ => 0,
    };
    let lines: Vec<Line> = view
        .to_lines()
        .into_iter()
        .enumerate()
        .map(|(i, l)| {
            if i < header_rows {
                Line::from(Span::styled(l, Style::default().add_modifier(Modifier::BOLD)))
            } else {
                Line::from(l)
            }
        })
        .collect();

    let available = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(available);
    app.preview_scroll = app.preview_scroll.min(max_scroll);

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((app.preview_scroll as u16, app.preview_hscroll as u16));
    frame.render_widget(paragraph, area);
}

/// Render variable buttons beside console output and selected entries
fn render_output_pane(frame: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(VARIABLE_LIST_WIDTH), Constraint::Min(10)])
        .split(area);

    render_variable_list(frame, app, columns[0]);
    render_entries(frame, app, columns[1]);
}

fn render_variable_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .output
        .variables()
        .iter()
        .map(|(name, artifact)| {
            let marker = if app.output.is_selected(name) { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::raw(name.clone()),
                Span::styled(
                    format!(" {}", artifact.kind()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let border_style = if app.focus == Focus::Output {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Variables")
                .border_style(border_style),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    if app.focus == Focus::Output && app.variable_count() > 0 {
        state.select(Some(app.variable_cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Console output followed by one block per selected variable.
fn render_entries(frame: &mut Frame, app: &mut App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    let mut entry_starts = Vec::new();

    if !app.output.output().is_empty() {
        lines.push(Line::from(Span::styled(
            "Console Output:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        lines.extend(app.output.output().lines().map(|l| Line::from(l.to_string())));
    }

    let selected: Vec<(String, String)> = app
        .output
        .entries()
        .map(|(name, artifact)| (name.to_string(), artifact.kind().to_string()))
        .collect();
    for (name, kind) in selected {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        entry_starts.push(lines.len());
        lines.push(Line::from(vec![
            Span::styled(
                format!("▌ {} ", name),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("({})", kind), Style::default().fg(Color::DarkGray)),
        ]));
        if let Some(view) = app.artifact_view(&name) {
            let hint = matches!(view, ArtifactView::Image(_));
            lines.extend(view.to_lines().into_iter().map(Line::from));
            if hint {
                lines.push(Line::from(Span::styled(
                    "press s on this variable to save it",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    if let Some(anchor) = app.scroll_anchor.take() {
        if let Some(&start) = app
            .output
            .anchor_index(&anchor)
            .and_then(|i| entry_starts.get(i))
        {
            app.output_scroll = start;
        }
    }
    app.output_scroll = app.output_scroll.min(lines.len().saturating_sub(1));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Output"))
        .scroll((app.output_scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let run_label = if app.is_running() {
        format!(" {} Running... ", SPINNER[(app.tick / 4) % SPINNER.len()])
    } else {
        " ▶ Run Code (Ctrl+R) ".to_string()
    };
    let session = app
        .notebook
        .session_id()
        .map(|id| format!(" | Lesson {}", id))
        .unwrap_or_default();
    let status_text = format!(
        "{}| {}{} | F1 help",
        run_label, app.status_message, session
    );

    let status_paragraph =
        Paragraph::new(status_text).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_paragraph, area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Create centered popup area
    let popup_area = centered_rect(70, 70, area);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("Code Editor Help"),
        Line::from(""),
        Line::from("Global:"),
        Line::from("  Ctrl+R / F5      - Run code"),
        Line::from("  Ctrl+N / Ctrl+P  - Next / previous tab"),
        Line::from("  Ctrl+E           - Back to script.py"),
        Line::from("  Ctrl+↑ / Ctrl+↓  - Grow / shrink output pane"),
        Line::from("  Esc              - Switch editor / output focus"),
        Line::from("  Ctrl+C / Ctrl+Q  - Quit"),
        Line::from("  F1               - Toggle this help"),
        Line::from(""),
        Line::from("Output pane:"),
        Line::from("  ↑/↓              - Choose variable"),
        Line::from("  Enter            - Show variable"),
        Line::from("  d / Delete       - Close variable"),
        Line::from("  s                - Save image variable"),
        Line::from("  PgUp/PgDn        - Scroll output"),
        Line::from(""),
        Line::from("File preview:"),
        Line::from("  Arrows           - Scroll table"),
    ];

    let help_text = Text::from(help_lines);
    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help_paragraph, popup_area);
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

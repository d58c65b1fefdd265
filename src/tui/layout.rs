//! Screen layout.
//!
//! ```text
//! ┌─ nav-tree ────────┐┌─ Buy milk [Remaining actions] ─────┐
//! │>> Inbox (3)       ││[ ] Go to the store                  │
//! │   Buy milk (2)    ││[ ] Put milk away                    │
//! │   Write paper (1) │├─ Activity ─────────────────────────┤
//! │                   ││12:00:01  [ActionAdded] action added │
//! └───────────────────┘└─────────────────────────────────────┘
//! ┌─ Capture thought ───────────────────────────────────────┐
//! │ > call plumber                                          │
//! └─────────────────────────────────────────────────────────┘
//!  [ready]  [Remaining actions]  j/k move  Enter open  ...
//! ```

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::model::Perspective;

use super::app::{InputMode, Status, TuiApp};

const KEY_HINTS: &str =
    "j/k move  Enter open  c thought  p project  a action  m move  x archive  M/X whole inbox  d done  f filter  q quit";

/// Draw the full TUI layout.
pub fn draw(f: &mut Frame, app: &mut TuiApp) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // tree + panes
            Constraint::Length(3), // input bar
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(outer[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(columns[1]);

    draw_tree(f, app, columns[0]);
    draw_detail(f, app, right[0]);
    draw_activity(f, app, right[1]);
    draw_input(f, app, outer[1]);
    draw_status(f, app, outer[2]);
}

fn draw_tree(f: &mut Frame, app: &mut TuiApp, area: Rect) {
    let title = app.nav.active_dock().unwrap_or_else(|| "navigation".into());
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let items = app.nav.with_surface(|tree| tree.to_tree_items());
    if items.is_empty() {
        let para = Paragraph::new(Span::styled(
            "Loading...",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(para, area);
        return;
    }

    if let Ok(tree) = tui_tree_widget::Tree::new(&items) {
        let tree = tree
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");
        f.render_stateful_widget(tree, area, &mut app.tree_state);
    } else {
        let para = Paragraph::new("Error building navigation tree").block(block);
        f.render_widget(para, area);
    }
}

fn draw_detail(f: &mut Frame, app: &TuiApp, area: Rect) {
    let (title, lines) = app.detail.render_lines(app.model.as_ref());
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let lines: Vec<Line> = lines.into_iter().map(Line::from).collect();
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn draw_activity(f: &mut Frame, app: &TuiApp, area: Rect) {
    let block = Block::default()
        .title(" Activity ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let entries = app.activity.entries();
    // Newest at the bottom; keep the tail visible.
    let visible = area.height.saturating_sub(2) as usize;
    let skip = entries.len().saturating_sub(visible);
    let lines: Vec<Line> = if entries.is_empty() {
        vec![Line::from(Span::styled(
            "No activity yet.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        entries
            .iter()
            .skip(skip)
            .map(|entry| {
                Line::from(vec![
                    Span::styled(
                        format!("{}  ", format_timestamp(entry.timestamp)),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        format!("[{}]", entry.kind),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(format!(" {}", entry.summary)),
                ])
            })
            .collect()
    };
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_input(f: &mut Frame, app: &TuiApp, area: Rect) {
    let (title, text, style) = match &app.input_mode {
        InputMode::Normal => (
            " Keys ".to_string(),
            KEY_HINTS.to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        InputMode::Entry { kind, buffer } => (
            format!(" {} (Enter submit, Esc cancel) ", kind.prompt()),
            format!("> {buffer}"),
            Style::default().fg(Color::White),
        ),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(Span::styled(text, style)).block(block), area);
}

fn draw_status(f: &mut Frame, app: &TuiApp, area: Rect) {
    let status = match &app.status {
        Status::Ready => Span::styled("ready", Style::default().fg(Color::Green)),
        Status::Info(msg) => Span::styled(msg.clone(), Style::default().fg(Color::Yellow)),
        Status::Error(msg) => {
            Span::styled(format!("error: {msg}"), Style::default().fg(Color::Red))
        }
    };
    let spans = vec![
        Span::styled(" [", Style::default().fg(Color::DarkGray)),
        status,
        Span::styled("]", Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(
            format!("[{}]", app.model.current_filter()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[Nodes: {}]", app.nav.with_surface(|tree| tree.len())),
            Style::default().fg(Color::Green),
        ),
    ];
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn format_timestamp(secs: u64) -> String {
    // Seconds since midnight UTC.
    let total_secs = secs % 86400;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

//! Slot diagnostics table.

use std::time::SystemTime;

use barline_types::format_duration;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;

fn age(at: Option<SystemTime>) -> String {
    match at.and_then(|t| t.elapsed().ok()) {
        Some(elapsed) => format!("{} ago", format_duration(elapsed)),
        None => "-".to_string(),
    }
}

/// Render one row per slot, in bar order.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Slot"),
        Cell::from("Severity"),
        Cell::from("Text"),
        Cell::from("Updated"),
        Cell::from("Fails"),
        Cell::from("Last error"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = app
        .slots
        .iter()
        .map(|status| {
            let severity = match (status.stopped, status.severity) {
                (true, _) => Cell::from("stopped").style(Style::default().add_modifier(Modifier::DIM)),
                (false, Some(severity)) => {
                    Cell::from(severity.as_str()).style(app.theme.severity_style(severity))
                }
                (false, None) => Cell::from("-"),
            };
            let text = app
                .segment(&status.name)
                .map(|s| s.text.clone())
                .unwrap_or_default();
            let fails = if status.consecutive_failures > 0 {
                Cell::from(status.consecutive_failures.to_string())
                    .style(app.theme.severity_style(barline_types::Severity::Bad))
            } else {
                Cell::from("0")
            };

            Row::new(vec![
                Cell::from(status.name.clone()),
                severity,
                Cell::from(text),
                Cell::from(age(status.last_update)),
                fails,
                Cell::from(status.last_error.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Min(9),
        Constraint::Fill(2),
        Constraint::Min(9),
        Constraint::Min(5),
        Constraint::Fill(2),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Slots ({}) ", app.slots.len()))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !app.slots.is_empty() {
        state.select(Some(app.selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

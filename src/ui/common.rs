//! The bar line, status bar and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the current bar line, each segment in its severity color.
pub fn render_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    for segment in app.snapshot.iter() {
        if !spans.is_empty() {
            spans.push(Span::raw(app.separator.clone()));
        }
        spans.push(Span::styled(
            segment.text.clone(),
            app.theme.severity_style(segment.severity),
        ));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "waiting for first update...",
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    let block = Block::default()
        .title(format!(" Bar #{} ", app.snapshot.sequence))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Render the status bar at the bottom.
///
/// Shows: slot health counts, time since the last snapshot, controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let failing = app
        .slots
        .iter()
        .filter(|s| s.consecutive_failures > 0)
        .count();
    let stopped = app.slots.iter().filter(|s| s.stopped).count();

    let updated = match app.last_update {
        Some(at) => format!("Updated {:.1}s ago", at.elapsed().as_secs_f64()),
        None => "Waiting".to_string(),
    };

    let status = format!(
        " {} slots, {} failing, {} stopped | {} | ↑↓:select ?:help q:quit",
        app.slots.len(),
        failing,
        stopped,
        updated,
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from("  ↑/↓ j/k     Select slot"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  r           Refresh now"),
        Line::from("  q Esc       Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 36u16.min(area.width.saturating_sub(4));
    let help_height = 10u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

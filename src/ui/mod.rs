//! Terminal preview rendering.
//!
//! The preview shows the bar line exactly as it would be emitted, with the
//! per-slot diagnostics from the aggregator underneath.

pub mod common;
pub mod slots;

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;

/// Minimum terminal size for usable display.
pub const MIN_WIDTH: u16 = 50;
pub const MIN_HEIGHT: u16 = 8;

/// Draw one frame of the preview.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5);
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(3), // Bar line
        Constraint::Min(4),    // Slot table
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_bar(frame, app, chunks[0]);
    slots::render(frame, app, chunks[1]);
    common::render_status_bar(frame, app, chunks[2]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use barline_sdk::{Aggregator, Segment, Severity};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::theme::{Palette, Theme};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn draws_bar_and_slot_table() {
        let aggregator = Arc::new(Aggregator::with_slots(["disk", "clock"]).unwrap());
        aggregator
            .update("disk", Segment::new("disk", "D: 10.0GiB", Severity::Good))
            .unwrap();
        aggregator
            .update("clock", Segment::new("clock", "12:00", Severity::Neutral))
            .unwrap();
        aggregator.record_failure("disk", "permission denied").unwrap();

        let mut app = App::new(aggregator, " | ", Theme::dark(Palette::default()));
        app.refresh();

        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();
        let text = screen(&terminal);

        assert!(text.contains("D: 10.0GiB | 12:00"));
        assert!(text.contains("disk"));
        assert!(text.contains("permission denied"));
    }

    #[test]
    fn small_terminal_shows_notice() {
        let aggregator = Arc::new(Aggregator::with_slots(["disk"]).unwrap());
        let app = App::new(aggregator, " ", Theme::dark(Palette::default()));
        let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();
        assert!(screen(&terminal).contains("Terminal too small"));
    }
}

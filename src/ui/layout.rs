//! Top-level layout and status bar

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Split the terminal into the form area and a one-line status bar.
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Draw the status bar: error beats status beats idle hint.
pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(message) = &app.error_message {
        Line::from(Span::styled(
            format!(" {message}"),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(message) = &app.status_message {
        Line::from(Span::styled(
            format!(" {message}"),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            " Ready",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

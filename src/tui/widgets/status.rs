// ABOUTME: Status bar widget: status text, server, visible session, and in-flight count.
// ABOUTME: Displayed at the bottom of the TUI as a single-line summary.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::chat::controls::STATUS_FAILED;

pub struct StatusBarParams<'a> {
    pub status: &'a str,
    pub server: &'a str,
    pub session: Option<&'a str>,
    pub language: &'a str,
    pub in_flight: usize,
}

/// Render the status bar line.
pub fn status_line(params: &StatusBarParams) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let status_style = if params.status == STATUS_FAILED {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", params.status), status_style),
        Span::styled("| ", dim),
        Span::styled(format!("{} ", params.server), Style::default().fg(Color::Cyan)),
        Span::styled("| ", dim),
        Span::styled(
            format!("chat {} ", params.session.unwrap_or("-")),
            Style::default().fg(Color::White),
        ),
        Span::styled("| ", dim),
        Span::styled(format!("{} ", params.language), Style::default().fg(Color::White)),
    ];

    if params.in_flight > 0 {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(
            format!("{} waiting ", params.in_flight),
            Style::default().fg(Color::Yellow),
        ));
    }

    Line::from(spans)
}

// ABOUTME: History sidebar widget: one line per session, the active one highlighted.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::chat::session::HistoryEntry;

pub fn history_lines(entries: &[HistoryEntry]) -> Vec<Line<'static>> {
    entries
        .iter()
        .map(|entry| {
            if entry.active {
                Line::from(vec![
                    Span::styled("▶ ", Style::default().fg(Color::Cyan)),
                    Span::styled(
                        entry.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(entry.title.clone(), Style::default().fg(Color::Gray)),
                ])
            }
        })
        .collect()
}

// ABOUTME: Chat widget: renders message log entries into styled ratatui Lines.
// ABOUTME: User and assistant turns get distinct prefixes; pending replies show the thinking marker.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::chat::log::{LogEntry, THINKING_MARKER};
use crate::chat::types::Role;

/// Render log entries into styled Lines for display.
///
/// The terminal shows each turn's raw text; the HTML form is what gets
/// exported.
pub fn render_chat_lines(entries: &[LogEntry]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }

        match entry {
            LogEntry::Pending(pending) if !pending.partial.is_empty() => {
                push_prefixed(&mut lines, assistant_prefix(), &pending.partial);
            }
            LogEntry::Pending(_) => {
                lines.push(Line::from(vec![
                    assistant_prefix(),
                    Span::styled(
                        THINKING_MARKER,
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    ),
                ]));
            }
            LogEntry::Turn(rendered) => {
                let turn = &rendered.turn;
                let prefix = match turn.role {
                    Role::User => Span::styled(
                        "❯ ",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Role::Assistant => assistant_prefix(),
                };
                push_prefixed(&mut lines, prefix, &turn.raw_text);
                if let Some(name) = &turn.attachment {
                    lines.push(Line::from(Span::styled(
                        format!("  📎 {name}"),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
        }
    }

    lines
}

/// First line gets the prefix, subsequent lines are plain.
fn push_prefixed(lines: &mut Vec<Line<'static>>, prefix: Span<'static>, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i == 0 {
            lines.push(Line::from(vec![prefix.clone(), Span::raw(line.to_string())]));
        } else {
            lines.push(Line::from(Span::raw(line.to_string())));
        }
    }
}

fn assistant_prefix() -> Span<'static> {
    Span::styled(
        "⏺ ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

// ABOUTME: Main TUI rendering function: assembles header, sidebar, chat, input, and status bar.
// ABOUTME: Splits the terminal frame into layout chunks and delegates to widgets.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::chat::dispatch::ChatController;
use crate::tui::state::TuiState;
use crate::tui::widgets::chat::render_chat_lines;
use crate::tui::widgets::history::history_lines;
use crate::tui::widgets::status::{StatusBarParams, status_line};

const SIDEBAR_WIDTH: u16 = 24;

/// Render the full TUI screen layout to the given frame.
pub fn render(frame: &mut Frame, state: &mut TuiState, controller: &mut ChatController) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Sidebar + chat
            Constraint::Length(3), // Input area
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    // Header
    let header = Line::from(vec![
        Span::styled(
            format!(" {}", state.assistant_name),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            controller
                .visible_session()
                .map(|s| format!("  {}", s.title))
                .unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let chat_chunk = if state.sidebar_open {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
            .split(chunks[1]);
        let history = history_lines(&controller.switcher().history(controller.sessions()));
        let sidebar = Paragraph::new(history).block(
            Block::default()
                .borders(Borders::RIGHT)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(sidebar, body[0]);
        body[1]
    } else {
        chunks[1]
    };

    // Chat area
    if let Some(log) = controller.visible_log_mut() {
        let chat_paragraph =
            Paragraph::new(render_chat_lines(log.entries())).wrap(Wrap { trim: false });

        // ratatui's own line_count() matches its wrapping exactly, so the
        // bottom of the log is never hidden.
        let total_lines = chat_paragraph.line_count(chat_chunk.width) as u16;
        let max_scroll = total_lines.saturating_sub(chat_chunk.height);
        log.clamp_scroll(max_scroll);

        // scroll_offset is lines scrolled up from the bottom (0 = at bottom)
        let scroll = max_scroll.saturating_sub(log.scroll_offset());
        frame.render_widget(chat_paragraph.scroll((scroll, 0)), chat_chunk);
    } else {
        let empty = Paragraph::new(Span::styled(
            "No chat selected. Type /new to start one.",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(empty, chat_chunk);
    }

    // Input area
    let (input_chunk, status_chunk) = (chunks[2], chunks[3]);
    let mut input_block = Block::default().borders(Borders::TOP | Borders::BOTTOM);
    if let Some(attachment) = &state.attachment {
        input_block = input_block.title(Span::styled(
            format!(" 📎 {} ", attachment.file_name),
            Style::default().fg(Color::Yellow),
        ));
    }
    let input = Paragraph::new(state.input.clone()).block(input_block);
    frame.render_widget(input, input_chunk);

    if input_chunk.width > 0 && input_chunk.height > 1 {
        state.clamp_cursor();
        let prefix: String = state.input.chars().take(state.cursor_pos).collect();
        let visual_col = UnicodeWidthStr::width(prefix.as_str());
        let max_visual_col = input_chunk.width.saturating_sub(1) as usize;
        let cursor_x = input_chunk
            .x
            .saturating_add(visual_col.min(max_visual_col) as u16);
        // +1 for the top border.
        let cursor_y = input_chunk.y.saturating_add(1);
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }

    // Status bar
    let status = status_line(&StatusBarParams {
        status: &state.status,
        server: &state.server,
        session: controller.switcher().visible(),
        language: &state.language,
        in_flight: controller.in_flight(),
    });
    frame.render_widget(Paragraph::new(status), status_chunk);
}

// ABOUTME: Message log: ordered, append-only view model of rendered conversation turns.
// ABOUTME: Holds one pending placeholder per in-flight request, keyed by correlation token.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::chat::types::{ConversationTurn, CorrelationToken, Role, Speakers};
use crate::render::label::split_label;
use crate::render::{Renderer, escape_html};

/// Literal marker shown while a reply is outstanding.
pub const THINKING_MARKER: &str = "Thinking...";

/// A finished turn and its HTML markup.
#[derive(Debug, Clone)]
pub struct RenderedTurn {
    pub turn: ConversationTurn,
    pub html: String,
}

/// Placeholder for an assistant reply that has not finished arriving.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub token: CorrelationToken,
    /// Reply text streamed in so far; empty until the first chunk.
    pub partial: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub enum LogEntry {
    Turn(RenderedTurn),
    Pending(PendingTurn),
}

impl LogEntry {
    pub fn html(&self) -> &str {
        match self {
            LogEntry::Turn(t) => &t.html,
            LogEntry::Pending(p) => &p.html,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LogEntry::Pending(_))
    }

    pub fn as_turn(&self) -> Option<&RenderedTurn> {
        match self {
            LogEntry::Turn(t) => Some(t),
            LogEntry::Pending(_) => None,
        }
    }
}

/// Element id of the pending placeholder for a token.
pub fn pending_element_id(token: CorrelationToken) -> String {
    format!("pending-{}", token)
}

/// The rendered turns of one session.
///
/// Every mutation moves the view back to the newest entry
/// (`scroll_offset` counts lines scrolled up from the bottom).
pub struct MessageLog {
    entries: Vec<LogEntry>,
    renderer: Arc<Renderer>,
    speakers: Arc<Speakers>,
    scroll_offset: u16,
}

impl MessageLog {
    pub fn new(renderer: Arc<Renderer>, speakers: Arc<Speakers>) -> Self {
        Self {
            entries: Vec::new(),
            renderer,
            speakers,
            scroll_offset: 0,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finished turns, in order.
    pub fn turns(&self) -> impl Iterator<Item = &RenderedTurn> {
        self.entries.iter().filter_map(LogEntry::as_turn)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pending()).count()
    }

    pub fn has_pending(&self, token: CorrelationToken) -> bool {
        self.pending_index(token).is_some()
    }

    /// Render and append a user turn.
    pub fn append_user(&mut self, text: &str, attachment: Option<&str>) {
        let turn = ConversationTurn::new(Role::User, text, attachment.map(str::to_string));
        let html = self.turn_html(&turn);
        self.push(LogEntry::Turn(RenderedTurn { turn, html }));
    }

    /// Render and append an assistant turn.
    pub fn append_assistant(&mut self, text: &str) {
        let entry = self.assistant_entry(text);
        self.push(entry);
    }

    /// Render and append a turn built elsewhere, such as one imported with
    /// its original timestamp.
    pub fn append_turn(&mut self, turn: ConversationTurn) {
        let html = self.turn_html(&turn);
        self.push(LogEntry::Turn(RenderedTurn { turn, html }));
    }

    /// Append the "Thinking..." placeholder for a request.
    pub fn append_pending(&mut self, token: CorrelationToken) {
        let html = self.pending_html(token, "");
        self.push(LogEntry::Pending(PendingTurn {
            token,
            partial: String::new(),
            html,
        }));
    }

    /// Re-render the placeholder for `token` with the reply received so far.
    ///
    /// Returns false when no placeholder exists.
    pub fn update_pending(&mut self, token: CorrelationToken, partial: &str) -> bool {
        let Some(idx) = self.pending_index(token) else {
            return false;
        };
        let html = self.pending_html(token, partial);
        if let LogEntry::Pending(pending) = &mut self.entries[idx] {
            pending.partial = partial.to_string();
            pending.html = html;
        }
        self.scroll_to_end();
        true
    }

    /// Replace the placeholder for `token` with the rendered reply.
    ///
    /// Returns false when no placeholder existed; the reply is appended anyway.
    pub fn resolve_pending(&mut self, token: CorrelationToken, text: &str) -> bool {
        let entry = self.assistant_entry(text);
        match self.pending_index(token) {
            Some(idx) => {
                self.entries[idx] = entry;
                self.scroll_to_end();
                true
            }
            None => {
                self.push(entry);
                false
            }
        }
    }

    /// Remove the placeholder for `token` without a replacement.
    pub fn clear_pending(&mut self, token: CorrelationToken) -> bool {
        let Some(idx) = self.pending_index(token) else {
            return false;
        };
        self.entries.remove(idx);
        self.scroll_to_end();
        true
    }

    /// Append a turn from a history fragment that was already rendered,
    /// such as `<strong>Vinnie AI:</strong> some **markdown**`. Without `at`
    /// the turn is stamped now.
    pub fn restore(&mut self, role: Role, fragment: &str, at: Option<DateTime<Utc>>) {
        let parts = split_label(fragment);
        let html = format!(
            "<div class=\"message {}\">{}</div>",
            role_class(role),
            self.renderer.render_split(&parts)
        );
        let mut turn = ConversationTurn::new(role, parts.body_text, None);
        if let Some(at) = at {
            turn = turn.with_time(at);
        }
        self.push(LogEntry::Turn(RenderedTurn { turn, html }));
    }

    pub fn scroll_offset(&self) -> u16 {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Cap the scroll position so it cannot pass the top of the content.
    pub fn clamp_scroll(&mut self, max: u16) {
        self.scroll_offset = self.scroll_offset.min(max);
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll_offset = 0;
    }

    fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
        self.scroll_to_end();
    }

    fn pending_index(&self, token: CorrelationToken) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|e| matches!(e, LogEntry::Pending(p) if p.token == token))
    }

    fn pending_html(&self, token: CorrelationToken, partial: &str) -> String {
        let body = if partial.is_empty() {
            format!("<em>{THINKING_MARKER}</em>")
        } else {
            self.renderer.render(partial)
        };
        format!(
            "<div class=\"message bot-message pending\" id=\"{}\"><strong>{}:</strong> {}</div>",
            pending_element_id(token),
            escape_html(&self.speakers.assistant),
            body,
        )
    }

    fn assistant_entry(&self, text: &str) -> LogEntry {
        let turn = ConversationTurn::new(Role::Assistant, text, None);
        let html = self.turn_html(&turn);
        LogEntry::Turn(RenderedTurn { turn, html })
    }

    fn turn_html(&self, turn: &ConversationTurn) -> String {
        let mut html = format!(
            "<div class=\"message {}\"><strong>{}:</strong> {}",
            role_class(turn.role),
            escape_html(self.speakers.label(turn.role)),
            self.renderer.render(&turn.raw_text),
        );
        if let Some(name) = &turn.attachment {
            html.push_str(&format!(
                "<p class=\"attachment\">\u{1f4ce} {}</p>",
                escape_html(name)
            ));
        }
        html.push_str("</div>");
        html
    }
}

fn role_class(role: Role) -> &'static str {
    match role {
        Role::User => "user-message",
        Role::Assistant => "bot-message",
    }
}

// ABOUTME: Page export: writes every session and the history list as one standalone HTML page.
// ABOUTME: Only the visible session's container is shown; its history entry carries the active class.

use std::fmt::Write as _;
use std::path::Path;

use chrono::SecondsFormat;

use crate::chat::log::LogEntry;
use crate::chat::session::{SessionStore, SessionSwitcher};
use crate::render::escape_html;

const PAGE_STYLE: &str = "body{font-family:sans-serif;display:flex;margin:0}\
nav{width:14rem;border-right:1px solid #ccc;padding:1rem}\
main{flex:1;padding:1rem}\
.history-item.active{font-weight:bold}\
.user-message{background:#eef}\
.bot-message{background:#f6f6f6}\
.message{padding:.5rem;margin:.5rem 0;border-radius:4px}\
time{display:block;color:#888;font-size:.75rem}";

/// Element id of a session's container.
pub fn container_id(session_id: &str) -> String {
    format!("chat-{session_id}")
}

/// Render the whole chat page as an HTML document.
pub fn render_page(store: &SessionStore, switcher: &SessionSwitcher, title: &str) -> String {
    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n",
        escape_html(title),
        PAGE_STYLE
    );

    page.push_str("<nav>\n<ul id=\"history\">\n");
    for entry in switcher.history(store) {
        let class = if entry.active {
            "history-item active"
        } else {
            "history-item"
        };
        let _ = writeln!(
            page,
            "<li class=\"{}\" data-chat-id=\"{}\">{}</li>",
            class,
            escape_html(&entry.id),
            escape_html(&entry.title)
        );
    }
    page.push_str("</ul>\n</nav>\n<main>\n");

    for session in store.iter() {
        let hidden = if switcher.is_visible(&session.id) {
            ""
        } else {
            " hidden"
        };
        let _ = writeln!(
            page,
            "<section id=\"{}\" class=\"chat-session\"{}>",
            escape_html(&container_id(&session.id)),
            hidden
        );
        for entry in session.log.entries() {
            if let LogEntry::Turn(rendered) = entry {
                let at = rendered.turn.at;
                let _ = writeln!(
                    page,
                    "<time datetime=\"{}\">{}</time>",
                    at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    at.format("%Y-%m-%d %H:%M")
                );
            }
            page.push_str(entry.html());
            page.push('\n');
        }
        page.push_str("</section>\n");
    }

    page.push_str("</main>\n</body>\n</html>\n");
    page
}

/// Write the page to disk (atomic write via tmp + rename).
pub fn write_page(
    path: &Path,
    store: &SessionStore,
    switcher: &SessionSwitcher,
    title: &str,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("html.tmp");
    std::fs::write(&tmp_path, render_page(store, switcher, title))?;
    std::fs::rename(&tmp_path, path)?;
    tracing::info!(path = %path.display(), sessions = store.len(), "exported chat page");
    Ok(())
}

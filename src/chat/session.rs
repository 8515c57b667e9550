// ABOUTME: Sessions: the store owning every conversation and the switcher owning visibility.
// ABOUTME: Also imports sessions from a JSON history file exported by the backend.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::chat::log::MessageLog;
use crate::chat::types::{ConversationTurn, Role, Speakers};
use crate::render::Renderer;

/// Prefix the backend puts on user messages that carried a file.
const FILE_UPLOADED_PREFIX: &str = "[FILE UPLOADED: ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown session: {0}")]
    Unknown(String),
    #[error("session already exists: {0}")]
    Duplicate(String),
}

/// One independently viewable conversation.
pub struct Session {
    pub id: String,
    pub title: String,
    pub log: MessageLog,
}

/// Owns the content of every session, in history-list order.
pub struct SessionStore {
    sessions: Vec<Session>,
    renderer: Arc<Renderer>,
    speakers: Arc<Speakers>,
}

impl SessionStore {
    pub fn new(renderer: Arc<Renderer>, speakers: Speakers) -> Self {
        Self {
            sessions: Vec::new(),
            renderer,
            speakers: Arc::new(speakers),
        }
    }

    /// Add an empty session.
    pub fn create(&mut self, id: &str, title: &str) -> Result<&mut Session, SessionError> {
        if self.contains(id) {
            return Err(SessionError::Duplicate(id.to_string()));
        }
        self.sessions.push(Session {
            id: id.to_string(),
            title: title.to_string(),
            log: MessageLog::new(Arc::clone(&self.renderer), Arc::clone(&self.speakers)),
        });
        let last = self.sessions.len() - 1;
        Ok(&mut self.sessions[last])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    /// Add sessions from history seeds. Returns how many were imported.
    pub fn import(&mut self, seeds: Vec<SessionSeed>) -> Result<usize, SessionError> {
        let mut imported = 0;
        for seed in seeds {
            let title = seed.title.clone().unwrap_or_else(|| seed.id.clone());
            let session = self.create(&seed.id, &title)?;
            for turn in &seed.turns {
                turn.apply(&mut session.log);
            }
            imported += 1;
        }
        tracing::debug!(imported, "imported history sessions");
        Ok(imported)
    }
}

/// One entry of the history list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub active: bool,
}

/// Decides which session is visible and which history entry is active.
#[derive(Debug, Default)]
pub struct SessionSwitcher {
    visible: Option<String>,
}

impl SessionSwitcher {
    pub fn visible(&self) -> Option<&str> {
        self.visible.as_deref()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.as_deref() == Some(id)
    }

    /// Show exactly the session `id` and mark its history entry active.
    /// An unknown id leaves the current selection untouched.
    pub fn select(&mut self, store: &SessionStore, id: &str) -> Result<(), SessionError> {
        if !store.contains(id) {
            tracing::warn!(session = id, "cannot select unknown session");
            return Err(SessionError::Unknown(id.to_string()));
        }
        self.visible = Some(id.to_string());
        Ok(())
    }

    /// History entries in store order; only the visible one is active.
    pub fn history(&self, store: &SessionStore) -> Vec<HistoryEntry> {
        store
            .iter()
            .map(|s| HistoryEntry {
                id: s.id.clone(),
                title: s.title.clone(),
                active: self.is_visible(&s.id),
            })
            .collect()
    }

    /// Select the next (or previous) session, wrapping around.
    pub fn cycle(&mut self, store: &SessionStore, forward: bool) -> Option<&str> {
        if store.is_empty() {
            return None;
        }
        let count = store.len();
        let current = self.visible.as_deref().and_then(|id| store.position(id));
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        self.visible = Some(store.sessions[next].id.clone());
        self.visible.as_deref()
    }
}

/// A session in a history file.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSeed {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub turns: Vec<TurnSeed>,
}

/// A turn in a history file: raw `text`, or an already-rendered `html` fragment.
/// `timestamp` (RFC 3339) keeps the time the server recorded.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnSeed {
    pub role: Role,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TurnSeed {
    fn apply(&self, log: &mut MessageLog) {
        if let Some(fragment) = &self.html {
            log.restore(self.role, fragment, self.timestamp);
            return;
        }
        let text = self.text.as_deref().unwrap_or_default();
        let mut turn = match self.role {
            Role::User => {
                let (attachment, prompt) = split_upload_prefix(text);
                ConversationTurn::new(Role::User, prompt, attachment.map(str::to_string))
            }
            Role::Assistant => ConversationTurn::new(Role::Assistant, text, None),
        };
        if let Some(at) = self.timestamp {
            turn = turn.with_time(at);
        }
        log.append_turn(turn);
    }
}

/// Split `[FILE UPLOADED: name] prompt` into the file name and the prompt.
pub fn split_upload_prefix(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix(FILE_UPLOADED_PREFIX) else {
        return (None, text);
    };
    match rest.split_once(']') {
        Some((name, prompt)) => (Some(name), prompt.strip_prefix(' ').unwrap_or(prompt)),
        None => (None, text),
    }
}

/// Read session seeds from a JSON history file.
pub fn load_seeds(path: &Path) -> anyhow::Result<Vec<SessionSeed>> {
    let content = std::fs::read_to_string(path)?;
    let seeds: Vec<SessionSeed> = serde_json::from_str(&content)?;
    Ok(seeds)
}

// ABOUTME: Core chat types: roles, conversation turns, speaker labels, correlation tokens.
// ABOUTME: Shared by the message log, session store, dispatcher, and front end.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a turn is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// The backend stores assistant turns with role `model`.
    #[serde(alias = "model")]
    Assistant,
}

/// One unit of conversation. Immutable once rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub raw_text: String,
    /// File name of the attachment sent with this turn, if any.
    pub attachment: Option<String>,
    /// When the turn was sent or received.
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, raw_text: impl Into<String>, attachment: Option<String>) -> Self {
        Self {
            role,
            raw_text: raw_text.into(),
            attachment,
            at: Utc::now(),
        }
    }

    /// Replace the creation time, e.g. with the time the server recorded.
    pub fn with_time(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    pub fn attachment_present(&self) -> bool {
        self.attachment.is_some()
    }
}

/// Labels shown in front of each turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speakers {
    pub user: String,
    pub assistant: String,
}

impl Default for Speakers {
    fn default() -> Self {
        Self {
            user: "You".to_string(),
            assistant: "Vinnie AI".to_string(),
        }
    }
}

impl Speakers {
    pub fn label(&self, role: Role) -> &str {
        match role {
            Role::User => &self.user,
            Role::Assistant => &self.assistant,
        }
    }
}

/// Ties a dispatched request to its pending turn and its eventual reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_accepts_backend_model_alias() {
        let role: Role = serde_json::from_str("\"model\"").unwrap();
        assert_eq!(role, Role::Assistant);
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn tokens_are_unique() {
        let a = CorrelationToken::new();
        let b = CorrelationToken::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 32);
    }

    #[test]
    fn turn_reports_attachment() {
        let turn = ConversationTurn::new(Role::User, "see file", Some("notes.txt".to_string()));
        assert!(turn.attachment_present());
        assert!(!ConversationTurn::new(Role::User, "hi", None).attachment_present());
    }

    #[test]
    fn speakers_label_by_role() {
        let speakers = Speakers::default();
        assert_eq!(speakers.label(Role::User), "You");
        assert_eq!(speakers.label(Role::Assistant), "Vinnie AI");
    }
}

// ABOUTME: Chat module: turns, message log, sessions, dispatcher, and page export.
// ABOUTME: Everything here is front-end agnostic; the TUI and the one-shot CLI both drive it.

pub mod attachment;
pub mod controls;
pub mod dispatch;
pub mod export;
pub mod log;
pub mod session;
pub mod types;

pub use attachment::{Attachment, AttachmentError};
pub use controls::{FormControls, InputControls, STATUS_FAILED, STATUS_READY, STATUS_SENDING};
pub use dispatch::{
    ChatController, Completion, DispatchError, DispatchState, Outcome, Submission,
};
pub use log::{LogEntry, MessageLog, THINKING_MARKER};
pub use session::{HistoryEntry, Session, SessionError, SessionSeed, SessionStore, SessionSwitcher};
pub use types::{ConversationTurn, CorrelationToken, Role, Speakers};

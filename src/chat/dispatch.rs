// ABOUTME: Chat dispatcher: one request/response cycle per submission as an explicit state machine.
// ABOUTME: Network calls run in spawned tasks and report back on a completion channel.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::chat::controls::{InputControls, STATUS_FAILED, STATUS_READY, STATUS_SENDING};
use crate::chat::log::MessageLog;
use crate::chat::session::{Session, SessionError, SessionStore, SessionSwitcher};
use crate::chat::types::CorrelationToken;
use crate::remote::transport::{PromptRequest, PromptTransport, TransportError};

const COMPLETION_CHANNEL_CAPACITY: usize = 64;

/// Where a submission is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Capturing,
    AwaitingReply,
    Resolved,
    Failed,
}

impl DispatchState {
    pub fn can_transition_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Idle, Capturing)
                | (Capturing, AwaitingReply)
                | (AwaitingReply, Resolved)
                | (AwaitingReply, Failed)
                | (Resolved, Idle)
                | (Failed, Idle)
        )
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Idle => "idle",
            DispatchState::Capturing => "capturing",
            DispatchState::AwaitingReply => "awaiting-reply",
            DispatchState::Resolved => "resolved",
            DispatchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid dispatch transition {from} -> {to}")]
    InvalidTransition {
        from: DispatchState,
        to: DispatchState,
    },
    #[error("no submission in flight for token {0}")]
    UnknownSubmission(CorrelationToken),
    #[error("no session is visible")]
    NoVisibleSession,
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One prompt on its way through the state machine.
#[derive(Debug, Clone)]
pub struct Submission {
    pub token: CorrelationToken,
    /// Session the prompt was typed into; the reply lands there.
    pub session_id: String,
    state: DispatchState,
}

impl Submission {
    pub fn new(token: CorrelationToken, session_id: impl Into<String>) -> Self {
        Self {
            token,
            session_id: session_id.into(),
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn advance(&mut self, next: DispatchState) -> Result<(), DispatchError> {
        if !self.state.can_transition_to(next) {
            return Err(DispatchError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!(token = %self.token, from = %self.state, to = %next, "dispatch transition");
        self.state = next;
        Ok(())
    }
}

/// What a request task reports about its reply.
#[derive(Debug)]
pub enum Outcome {
    /// Reply text received so far; more is coming.
    Partial(String),
    /// The whole reply.
    Reply(String),
    Failed(TransportError),
}

impl From<Result<String, TransportError>> for Outcome {
    fn from(result: Result<String, TransportError>) -> Self {
        match result {
            Ok(body) => Outcome::Reply(body),
            Err(e) => Outcome::Failed(e),
        }
    }
}

/// Signal sent by a request task while its reply streams in and once it ends.
#[derive(Debug)]
pub struct Completion {
    pub token: CorrelationToken,
    pub outcome: Outcome,
}

/// Owns the sessions and drives submissions from capture to resolution.
///
/// All view-model mutation happens through `&mut self` on the caller's task;
/// spawned request tasks only ever send a `Completion`.
pub struct ChatController {
    sessions: SessionStore,
    switcher: SessionSwitcher,
    transport: Arc<dyn PromptTransport>,
    in_flight: HashMap<CorrelationToken, Submission>,
    completion_tx: mpsc::Sender<Completion>,
}

impl ChatController {
    /// Create a controller; the first stored session (if any) becomes visible.
    /// Completions must be fed back through [`ChatController::complete`].
    pub fn new(
        sessions: SessionStore,
        transport: Arc<dyn PromptTransport>,
    ) -> (Self, mpsc::Receiver<Completion>) {
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        let mut switcher = SessionSwitcher::default();
        if let Some(first) = sessions.iter().next().map(|s| s.id.clone()) {
            let _ = switcher.select(&sessions, &first);
        }
        let controller = Self {
            sessions,
            switcher,
            transport,
            in_flight: HashMap::new(),
            completion_tx,
        };
        (controller, completion_rx)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn switcher(&self) -> &SessionSwitcher {
        &self.switcher
    }

    pub fn visible_session(&self) -> Option<&Session> {
        self.switcher.visible().and_then(|id| self.sessions.get(id))
    }

    pub fn visible_log_mut(&mut self) -> Option<&mut MessageLog> {
        let id = self.switcher.visible()?.to_string();
        self.sessions.get_mut(&id).map(|s| &mut s.log)
    }

    pub fn select_session(&mut self, id: &str) -> Result<(), SessionError> {
        self.switcher.select(&self.sessions, id)
    }

    pub fn cycle_session(&mut self, forward: bool) -> Option<String> {
        self.switcher
            .cycle(&self.sessions, forward)
            .map(str::to_string)
    }

    /// Add a new empty session and show it.
    pub fn open_session(&mut self, id: &str, title: &str) -> Result<(), SessionError> {
        self.sessions.create(id, title)?;
        self.switcher.select(&self.sessions, id)
    }

    /// Number of submissions still waiting for a reply.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn submission(&self, token: CorrelationToken) -> Option<&Submission> {
        self.in_flight.get(&token)
    }

    /// Capture the controls, insert the user and pending turns, and send the
    /// request in a background task.
    ///
    /// Empty prompts are sent as-is. Overlapping submissions are allowed;
    /// each gets its own correlation token.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, since the request task is
    /// spawned with `tokio::spawn`.
    pub fn submit(
        &mut self,
        controls: &mut dyn InputControls,
    ) -> Result<CorrelationToken, DispatchError> {
        let session_id = self
            .switcher
            .visible()
            .map(str::to_string)
            .ok_or(DispatchError::NoVisibleSession)?;
        let token = CorrelationToken::new();
        let mut submission = Submission::new(token, session_id.clone());

        submission.advance(DispatchState::Capturing)?;
        let prompt = controls.take_prompt();
        let attachment = controls.take_attachment();
        controls.set_status(STATUS_SENDING);

        let log = &mut self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| SessionError::Unknown(session_id.clone()))?
            .log;
        log.append_user(&prompt, attachment.as_ref().map(|a| a.file_name.as_str()));
        log.append_pending(token);

        submission.advance(DispatchState::AwaitingReply)?;
        tracing::info!(
            %token,
            session = %session_id,
            prompt_len = prompt.len(),
            attachment = attachment.is_some(),
            "dispatching prompt"
        );
        self.in_flight.insert(token, submission);

        let request = PromptRequest { prompt, attachment };
        let transport = Arc::clone(&self.transport);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let progress_tx = completion_tx.clone();
            // A dropped partial is harmless: the next one carries the text so far.
            let progress = move |partial: &str| {
                let _ = progress_tx.try_send(Completion {
                    token,
                    outcome: Outcome::Partial(partial.to_string()),
                });
            };
            let outcome = transport.stream_prompt(request, &progress).await.into();
            if completion_tx.send(Completion { token, outcome }).await.is_err() {
                tracing::debug!(%token, "completion receiver dropped");
            }
        });

        Ok(token)
    }

    /// Apply a request task's report.
    ///
    /// A partial reply re-renders the pending turn in place and leaves the
    /// submission awaiting its reply. A finished request replaces the pending
    /// turn with the reply, or clears it and reports the failure; the return
    /// value is the state it resolved to before going back to idle.
    pub fn complete(
        &mut self,
        completion: Completion,
        controls: &mut dyn InputControls,
    ) -> Result<DispatchState, DispatchError> {
        let Completion { token, outcome } = completion;

        let finished = match outcome {
            Outcome::Partial(partial) => {
                let submission = self
                    .in_flight
                    .get(&token)
                    .ok_or(DispatchError::UnknownSubmission(token))?;
                if let Some(session) = self.sessions.get_mut(&submission.session_id) {
                    session.log.update_pending(token, &partial);
                }
                return Ok(DispatchState::AwaitingReply);
            }
            Outcome::Reply(body) => Ok(body),
            Outcome::Failed(e) => Err(e),
        };

        let mut submission = self
            .in_flight
            .remove(&token)
            .ok_or(DispatchError::UnknownSubmission(token))?;

        let log = self
            .sessions
            .get_mut(&submission.session_id)
            .map(|s| &mut s.log);
        if log.is_none() {
            tracing::warn!(%token, session = %submission.session_id, "reply for a session that no longer exists");
        }

        let resolved_to = match finished {
            Ok(body) => {
                submission.advance(DispatchState::Resolved)?;
                controls.set_status(STATUS_READY);
                if let Some(log) = log {
                    if !log.resolve_pending(token, &body) {
                        tracing::debug!(%token, "no pending turn for reply; appended instead");
                    }
                }
                tracing::info!(%token, reply_len = body.len(), "reply received");
                DispatchState::Resolved
            }
            Err(e) => {
                submission.advance(DispatchState::Failed)?;
                controls.set_status(STATUS_FAILED);
                if let Some(log) = log {
                    log.clear_pending(token);
                }
                tracing::error!(%token, error = %e, "prompt dispatch failed");
                DispatchState::Failed
            }
        };

        submission.advance(DispatchState::Idle)?;
        Ok(resolved_to)
    }
}

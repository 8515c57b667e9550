// ABOUTME: Integration tests for the submit → reply cycle through ChatController.
// ABOUTME: Uses in-process transports whose replies are released by the test to control ordering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use vinnie_chat::chat::attachment::Attachment;
use vinnie_chat::chat::controls::{FormControls, STATUS_FAILED, STATUS_READY, STATUS_SENDING};
use vinnie_chat::chat::dispatch::{ChatController, Completion, DispatchState, Outcome};
use vinnie_chat::chat::log::{LogEntry, THINKING_MARKER};
use vinnie_chat::chat::session::SessionStore;
use vinnie_chat::chat::types::{Role, Speakers};
use vinnie_chat::remote::transport::{PromptRequest, PromptTransport, TransportError};
use vinnie_chat::render::Renderer;

type Reply = Result<String, TransportError>;

/// Holds each request until the test releases a reply for its prompt.
#[derive(Default)]
struct GatedTransport {
    gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    seen: Mutex<Vec<PromptRequest>>,
}

impl GatedTransport {
    fn gate(&self, prompt: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(prompt.to_string(), rx);
        tx
    }

    fn seen(&self) -> Vec<PromptRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromptTransport for GatedTransport {
    async fn send_prompt(&self, request: PromptRequest) -> Reply {
        let gate = self.gates.lock().unwrap().remove(&request.prompt);
        self.seen.lock().unwrap().push(request);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Other("gate dropped".to_string()))),
            None => Err(TransportError::Other("no gate for prompt".to_string())),
        }
    }
}

fn setup(
    sessions: &[&str],
) -> (
    ChatController,
    mpsc::Receiver<Completion>,
    Arc<GatedTransport>,
) {
    let mut store = SessionStore::new(Arc::new(Renderer::standard()), Speakers::default());
    for id in sessions {
        store.create(id, id).unwrap();
    }
    let transport = Arc::new(GatedTransport::default());
    let (controller, rx) = ChatController::new(store, transport.clone());
    (controller, rx, transport)
}

fn entries(controller: &ChatController, id: &str) -> Vec<LogEntry> {
    controller.sessions().get(id).unwrap().log.entries().to_vec()
}

#[tokio::test]
async fn submit_shows_user_turn_then_pending_before_reply() {
    let (mut controller, _rx, transport) = setup(&["1"]);
    let _gate = transport.gate("Hello");
    let mut controls = FormControls::with_prompt("Hello");

    let token = controller.submit(&mut controls).unwrap();

    let log = entries(&controller, "1");
    assert_eq!(log.len(), 2);
    let user = log[0].as_turn().unwrap();
    assert_eq!(user.turn.role, Role::User);
    assert!(user.html.contains("<p>Hello</p>"), "got {}", user.html);
    assert!(!user.turn.attachment_present());
    assert!(log[1].is_pending());
    assert!(log[1].html().contains(THINKING_MARKER));

    assert_eq!(controls.prompt, "");
    assert_eq!(controls.status, STATUS_SENDING);
    assert_eq!(
        controller.submission(token).unwrap().state(),
        DispatchState::AwaitingReply
    );
}

#[tokio::test]
async fn reply_replaces_pending_with_rendered_markdown() {
    let (mut controller, mut rx, transport) = setup(&["1"]);
    let gate = transport.gate("Hello");
    let mut controls = FormControls::with_prompt("Hello");
    controller.submit(&mut controls).unwrap();

    gate.send(Ok("**Hi**".to_string())).unwrap();
    let completion = rx.recv().await.unwrap();
    let outcome = controller.complete(completion, &mut controls).unwrap();

    assert_eq!(outcome, DispatchState::Resolved);
    let log = entries(&controller, "1");
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|e| !e.is_pending()));
    let reply = log[1].as_turn().unwrap();
    assert_eq!(reply.turn.role, Role::Assistant);
    assert!(reply.html.contains("<strong>Hi</strong>"), "got {}", reply.html);
    assert_eq!(controls.status, STATUS_READY);
    assert_eq!(controller.in_flight(), 0);
}

#[tokio::test]
async fn transport_failure_clears_pending_and_reports() {
    let (mut controller, mut rx, transport) = setup(&["1"]);
    let gate = transport.gate("Hello");
    let mut controls = FormControls::with_prompt("Hello");
    controller.submit(&mut controls).unwrap();

    gate.send(Err(TransportError::Other("connection refused".to_string())))
        .unwrap();
    let completion = rx.recv().await.unwrap();
    let outcome = controller.complete(completion, &mut controls).unwrap();

    assert_eq!(outcome, DispatchState::Failed);
    let log = entries(&controller, "1");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].as_turn().unwrap().turn.role, Role::User);
    assert_eq!(controls.status, STATUS_FAILED);
    assert_eq!(controller.in_flight(), 0);
}

#[tokio::test]
async fn overlapping_replies_land_in_their_own_slots() {
    let (mut controller, mut rx, transport) = setup(&["1"]);
    let first_gate = transport.gate("first");
    let second_gate = transport.gate("second");
    let mut controls = FormControls::with_prompt("first");
    let first = controller.submit(&mut controls).unwrap();
    controls.prompt = "second".to_string();
    let second = controller.submit(&mut controls).unwrap();
    assert_ne!(first, second);
    assert_eq!(controller.in_flight(), 2);

    // Second reply arrives first.
    second_gate.send(Ok("answer two".to_string())).unwrap();
    let completion = rx.recv().await.unwrap();
    assert_eq!(completion.token, second);
    controller.complete(completion, &mut controls).unwrap();

    first_gate.send(Ok("answer one".to_string())).unwrap();
    let completion = rx.recv().await.unwrap();
    assert_eq!(completion.token, first);
    controller.complete(completion, &mut controls).unwrap();

    let log = entries(&controller, "1");
    let texts: Vec<(Role, String)> = log
        .iter()
        .map(|e| {
            let t = e.as_turn().expect("no pending turn should remain");
            (t.turn.role, t.turn.raw_text.clone())
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            (Role::User, "first".to_string()),
            (Role::Assistant, "answer one".to_string()),
            (Role::User, "second".to_string()),
            (Role::Assistant, "answer two".to_string()),
        ]
    );
    assert_eq!(controller.in_flight(), 0);
}

#[tokio::test]
async fn reply_goes_to_the_session_it_was_sent_from() {
    let (mut controller, mut rx, transport) = setup(&["a", "b"]);
    let gate = transport.gate("in a");
    let mut controls = FormControls::with_prompt("in a");
    controller.submit(&mut controls).unwrap();

    controller.select_session("b").unwrap();
    gate.send(Ok("for a".to_string())).unwrap();
    let completion = rx.recv().await.unwrap();
    controller.complete(completion, &mut controls).unwrap();

    assert_eq!(entries(&controller, "a").len(), 2);
    assert!(entries(&controller, "b").is_empty());
    assert_eq!(controller.switcher().visible(), Some("b"));
}

#[tokio::test]
async fn empty_prompt_is_still_sent() {
    let (mut controller, mut rx, transport) = setup(&["1"]);
    let gate = transport.gate("");
    let mut controls = FormControls::default();
    controller.submit(&mut controls).unwrap();

    gate.send(Ok("Please enter a question.".to_string())).unwrap();
    let completion = rx.recv().await.unwrap();
    controller.complete(completion, &mut controls).unwrap();

    assert_eq!(transport.seen().len(), 1);
    assert_eq!(transport.seen()[0].prompt, "");
    assert_eq!(entries(&controller, "1").len(), 2);
}

#[tokio::test]
async fn attachment_is_sent_and_noted_on_the_user_turn() {
    let (mut controller, mut rx, transport) = setup(&["1"]);
    let gate = transport.gate("what is this?");
    let mut controls = FormControls::with_prompt("what is this?");
    controls.attachment = Some(Attachment::new("cat.png", vec![0x89, 0x50]));

    controller.submit(&mut controls).unwrap();
    assert!(controls.attachment.is_none());

    gate.send(Ok("A cat.".to_string())).unwrap();
    let completion = rx.recv().await.unwrap();
    controller.complete(completion, &mut controls).unwrap();

    let seen = transport.seen();
    let sent = seen[0].attachment.as_ref().unwrap();
    assert_eq!(sent.file_name, "cat.png");
    assert_eq!(sent.mime, "image/png");

    let log = entries(&controller, "1");
    let user = log[0].as_turn().unwrap();
    assert_eq!(user.turn.attachment.as_deref(), Some("cat.png"));
    assert!(user.html.contains("cat.png"));
}

#[tokio::test]
async fn unknown_completion_is_rejected() {
    let (mut controller, _rx, _transport) = setup(&["1"]);
    let mut controls = FormControls::default();
    let stray = Completion {
        token: Default::default(),
        outcome: Outcome::Reply("late".to_string()),
    };
    assert!(controller.complete(stray, &mut controls).is_err());
    assert!(entries(&controller, "1").is_empty());
}

#[tokio::test]
async fn submit_without_sessions_fails() {
    let store = SessionStore::new(Arc::new(Renderer::standard()), Speakers::default());
    let (mut controller, _rx) = ChatController::new(store, Arc::new(GatedTransport::default()));
    let mut controls = FormControls::with_prompt("hi");
    assert!(controller.submit(&mut controls).is_err());
    // Nothing was captured.
    assert_eq!(controls.prompt, "hi");
}

#[tokio::test]
async fn partial_reply_for_unknown_submission_is_rejected() {
    let (mut controller, _rx, _transport) = setup(&["1"]);
    let mut controls = FormControls::default();
    let stray = Completion {
        token: Default::default(),
        outcome: Outcome::Partial("half".to_string()),
    };
    assert!(controller.complete(stray, &mut controls).is_err());
    assert!(entries(&controller, "1").is_empty());
}

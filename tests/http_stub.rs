// ABOUTME: HTTP behaviour tests against a loopback stub server built on tokio's TcpListener.
// ABOUTME: Covers the multipart prompt request, streamed and error-status replies, redirects, new chats, and cookies.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use vinnie_chat::chat::attachment::Attachment;
use vinnie_chat::chat::controls::{FormControls, STATUS_FAILED, STATUS_READY};
use vinnie_chat::chat::dispatch::{ChatController, Completion, DispatchState, Outcome};
use vinnie_chat::chat::session::SessionStore;
use vinnie_chat::chat::types::Speakers;
use vinnie_chat::config::ServerConfig;
use vinnie_chat::remote::{
    AccountClient, HttpTransport, Navigation, NewChat, PromptRequest, PromptTransport,
    build_client,
};
use vinnie_chat::render::Renderer;

/// Serve one canned response per connection, in order, and hand back the raw requests.
async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut socket).await);
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
        requests
    });
    (base, handle)
}

fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = find(&buf, b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let complete = match content_length {
            Some(len) => buf.len() >= end + 4 + len,
            None if head.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Serve one chunked reply: `first` goes out with the headers, the rest only
/// once the returned sender fires. Without `rest` the connection closes
/// mid-body.
async fn serve_in_two_writes(
    first: &str,
    rest: Option<&str>,
) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let first = first.to_string();
    let rest = rest.map(str::to_string);
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
        socket
            .write_all(format!("{head}{:x}\r\n{first}\r\n", first.len()).as_bytes())
            .await
            .unwrap();
        socket.flush().await.unwrap();
        let _ = release_rx.await;
        if let Some(rest) = rest {
            socket
                .write_all(format!("{:x}\r\n{rest}\r\n0\r\n\r\n", rest.len()).as_bytes())
                .await
                .unwrap();
        }
        let _ = socket.shutdown().await;
    });
    (base, release_tx)
}

fn controller_for(base: &str) -> (ChatController, mpsc::Receiver<Completion>) {
    let mut store = SessionStore::new(Arc::new(Renderer::standard()), Speakers::default());
    store.create("1", "One").unwrap();
    let transport = HttpTransport::new(build_client().unwrap(), server(base).prompt_url());
    ChatController::new(store, Arc::new(transport))
}

fn pending_html(controller: &ChatController) -> String {
    controller
        .visible_session()
        .unwrap()
        .log
        .entries()
        .iter()
        .find(|e| e.is_pending())
        .map(|e| e.html().to_string())
        .unwrap_or_default()
}

/// Apply partial replies until the pending turn shows `text`.
async fn apply_partials_until(
    controller: &mut ChatController,
    rx: &mut mpsc::Receiver<Completion>,
    controls: &mut FormControls,
    text: &str,
) {
    while !pending_html(controller).contains(text) {
        let completion = rx.recv().await.unwrap();
        assert!(
            matches!(completion.outcome, Outcome::Partial(_)),
            "reply finished before the rest was sent: {:?}",
            completion.outcome
        );
        assert_eq!(
            controller.complete(completion, &mut *controls).unwrap(),
            DispatchState::AwaitingReply
        );
    }
}

/// Apply reports until the submission finishes.
async fn apply_until_finished(
    controller: &mut ChatController,
    rx: &mut mpsc::Receiver<Completion>,
    controls: &mut FormControls,
) -> DispatchState {
    loop {
        let completion = rx.recv().await.unwrap();
        match controller.complete(completion, &mut *controls).unwrap() {
            DispatchState::AwaitingReply => continue,
            finished => return finished,
        }
    }
}

fn server(base: &str) -> ServerConfig {
    ServerConfig {
        base_url: base.to_string(),
        assistant: "gemini".to_string(),
    }
}

#[tokio::test]
async fn prompt_is_posted_as_multipart() {
    let (base, handle) = serve(vec![response("200 OK", &[], "Hello back")]).await;
    let transport = HttpTransport::new(build_client().unwrap(), server(&base).prompt_url());

    let reply = transport
        .send_prompt(PromptRequest::text("hi there"))
        .await
        .unwrap();
    assert_eq!(reply, "Hello back");

    let requests = handle.await.unwrap();
    let request = &requests[0];
    assert!(request.starts_with("POST /api/gemini-prompt HTTP/1.1"), "got {request}");
    assert!(request.to_ascii_lowercase().contains("multipart/form-data"));
    assert!(request.contains("name=\"prompt\""));
    assert!(request.contains("hi there"));
    assert!(!request.contains("name=\"file\""));
}

#[tokio::test]
async fn attachment_travels_as_file_part() {
    let (base, handle) = serve(vec![response("200 OK", &[], "ok")]).await;
    let transport = HttpTransport::new(build_client().unwrap(), server(&base).prompt_url());

    let request = PromptRequest {
        prompt: "summarise".to_string(),
        attachment: Some(Attachment::new("notes.txt", b"buy milk".to_vec())),
    };
    transport.send_prompt(request).await.unwrap();

    let requests = handle.await.unwrap();
    let request = &requests[0];
    assert!(request.contains("name=\"file\"; filename=\"notes.txt\""), "got {request}");
    assert!(request.to_ascii_lowercase().contains("content-type: text/plain"));
    assert!(request.contains("buy milk"));
}

#[tokio::test]
async fn error_status_body_is_still_a_reply() {
    let (base, _handle) = serve(vec![response(
        "500 Internal Server Error",
        &[("Content-Type", "application/json")],
        r#"{"success": false, "error": "Gemini client not initialized. Cannot chat."}"#,
    )])
    .await;
    let transport = HttpTransport::new(build_client().unwrap(), server(&base).prompt_url());

    let reply = transport.send_prompt(PromptRequest::text("hi")).await.unwrap();
    assert!(reply.contains("Gemini client not initialized"));
}

#[tokio::test]
async fn login_redirect_is_reported() {
    let (base, handle) = serve(vec![response("302 FOUND", &[("Location", "/")], "")]).await;
    let account = AccountClient::new(build_client().unwrap(), base);

    let navigation = account.login("amina", "s3cret").await.unwrap();
    assert_eq!(navigation, Navigation::Redirect("/".to_string()));

    let requests = handle.await.unwrap();
    assert!(requests[0].starts_with("POST /login HTTP/1.1"));
    assert!(requests[0].contains("username=amina&password=s3cret"));
}

#[tokio::test]
async fn failed_login_page_means_reload() {
    let (base, _handle) = serve(vec![response(
        "200 OK",
        &[("Content-Type", "text/html")],
        "<p>Invalid username or password</p>",
    )])
    .await;
    let account = AccountClient::new(build_client().unwrap(), base);

    let navigation = account.login("amina", "wrong").await.unwrap();
    assert_eq!(navigation, Navigation::Reload);
}

#[tokio::test]
async fn new_chat_returns_created_id() {
    let (base, handle) = serve(vec![response(
        "200 OK",
        &[("Content-Type", "application/json")],
        r#"{"success": true, "chat_id": "9f1c"}"#,
    )])
    .await;
    let account = AccountClient::new(build_client().unwrap(), base);

    assert_eq!(
        account.new_chat().await.unwrap(),
        NewChat::Created("9f1c".to_string())
    );
    let requests = handle.await.unwrap();
    assert!(requests[0].starts_with("POST /new_chat HTTP/1.1"));
}

#[tokio::test]
async fn new_chat_when_logged_out_redirects() {
    let (base, _handle) = serve(vec![response(
        "302 FOUND",
        &[("Location", "/login?next=%2Fnew_chat")],
        "",
    )])
    .await;
    let account = AccountClient::new(build_client().unwrap(), base);

    assert_eq!(
        account.new_chat().await.unwrap(),
        NewChat::Navigate(Navigation::Redirect("/login?next=%2Fnew_chat".to_string()))
    );
}

#[tokio::test]
async fn session_cookie_is_shared_between_clients() {
    let (base, handle) = serve(vec![
        response(
            "302 FOUND",
            &[("Location", "/"), ("Set-Cookie", "session=abc123; Path=/")],
            "",
        ),
        response("200 OK", &[], "hi"),
    ])
    .await;
    let http = build_client().unwrap();
    let account = AccountClient::new(http.clone(), base.clone());
    let transport = HttpTransport::new(http, server(&base).prompt_url());

    account.login("amina", "s3cret").await.unwrap();
    transport.send_prompt(PromptRequest::text("hello")).await.unwrap();

    let requests = handle.await.unwrap();
    assert!(
        requests[1].to_ascii_lowercase().contains("cookie: session=abc123"),
        "got {}",
        requests[1]
    );
}

#[tokio::test]
async fn language_switch_hits_language_route() {
    let (base, handle) = serve(vec![response("302 FOUND", &[("Location", "/")], "")]).await;
    let account = AccountClient::new(build_client().unwrap(), base);

    assert_eq!(
        account.set_language("sw").await.unwrap(),
        Navigation::Redirect("/".to_string())
    );
    let requests = handle.await.unwrap();
    assert!(requests[0].starts_with("GET /set_language/sw HTTP/1.1"));
}

#[tokio::test]
async fn streamed_reply_shows_in_pending_turn_before_it_finishes() {
    let (base, release) = serve_in_two_writes("Hello", Some(" **world**")).await;
    let (mut controller, mut rx) = controller_for(&base);
    let mut controls = FormControls::with_prompt("hi");
    let token = controller.submit(&mut controls).unwrap();

    apply_partials_until(&mut controller, &mut rx, &mut controls, "Hello").await;
    let log = &controller.visible_session().unwrap().log;
    assert!(log.has_pending(token));
    assert_eq!(log.len(), 2);
    assert_eq!(controller.in_flight(), 1);

    release.send(()).unwrap();
    let outcome = apply_until_finished(&mut controller, &mut rx, &mut controls).await;

    assert_eq!(outcome, DispatchState::Resolved);
    let log = &controller.visible_session().unwrap().log;
    assert_eq!(log.pending_count(), 0);
    let reply = log.turns().last().unwrap();
    assert_eq!(reply.turn.raw_text, "Hello **world**");
    assert!(reply.html.contains("<strong>world</strong>"), "got {}", reply.html);
    assert_eq!(controls.status, STATUS_READY);
}

#[tokio::test]
async fn stream_cut_off_after_first_chunk_fails_and_clears_pending() {
    let (base, release) = serve_in_two_writes("Hel", None).await;
    let (mut controller, mut rx) = controller_for(&base);
    let mut controls = FormControls::with_prompt("hi");
    controller.submit(&mut controls).unwrap();

    apply_partials_until(&mut controller, &mut rx, &mut controls, "Hel").await;
    release.send(()).unwrap();
    let outcome = apply_until_finished(&mut controller, &mut rx, &mut controls).await;

    assert_eq!(outcome, DispatchState::Failed);
    let log = &controller.visible_session().unwrap().log;
    assert_eq!(log.len(), 1);
    assert_eq!(log.pending_count(), 0);
    assert_eq!(controls.status, STATUS_FAILED);
    assert_eq!(controller.in_flight(), 0);
}

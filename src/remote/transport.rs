// ABOUTME: Prompt transport: sends one prompt (and optional file) to the assistant endpoint.
// ABOUTME: The trait is the seam the dispatcher depends on; HttpTransport is the multipart implementation.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use crate::chat::attachment::Attachment;

/// What the dispatcher hands to the transport for one submission.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub prompt: String,
    pub attachment: Option<Attachment>,
}

impl PromptRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attachment: None,
        }
    }
}

/// The request never produced a reply body.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// Sends a prompt and returns the reply text.
///
/// Any response with a body counts as a reply, whatever its status code;
/// server-side errors come back as text and are shown like any other reply.
#[async_trait]
pub trait PromptTransport: Send + Sync {
    async fn send_prompt(&self, request: PromptRequest) -> Result<String, TransportError>;

    /// Send a prompt, calling `progress` with the reply received so far
    /// after each chunk.
    ///
    /// Transports that cannot stream report nothing and return the whole reply.
    async fn stream_prompt(
        &self,
        request: PromptRequest,
        _progress: &(dyn for<'p> Fn(&'p str) + Send + Sync),
    ) -> Result<String, TransportError> {
        self.send_prompt(request).await
    }
}

/// Multipart POST to `<base>/api/<assistant>-prompt`.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

fn build_form(request: PromptRequest) -> Result<Form, TransportError> {
    let form = Form::new().text("prompt", request.prompt);
    let Some(attachment) = request.attachment else {
        return Ok(form);
    };
    let part = Part::bytes(attachment.bytes)
        .file_name(attachment.file_name)
        .mime_str(&attachment.mime)?;
    Ok(form.part("file", part))
}

/// Text decoded so far; a multi-byte character split across chunks waits
/// for the next one.
fn decoded_prefix(buf: &[u8]) -> String {
    match std::str::from_utf8(buf) {
        Ok(text) => text.to_string(),
        Err(e) => String::from_utf8_lossy(&buf[..e.valid_up_to()]).into_owned(),
    }
}

#[async_trait]
impl PromptTransport for HttpTransport {
    async fn send_prompt(&self, request: PromptRequest) -> Result<String, TransportError> {
        self.stream_prompt(request, &|_: &str| {}).await
    }

    async fn stream_prompt(
        &self,
        request: PromptRequest,
        progress: &(dyn for<'p> Fn(&'p str) + Send + Sync),
    ) -> Result<String, TransportError> {
        let form = build_form(request)?;
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, endpoint = %self.endpoint, "prompt endpoint returned an error status");
        }

        let mut body = Vec::new();
        let mut byte_stream = response.bytes_stream();
        while let Some(chunk) = byte_stream.next().await {
            body.extend_from_slice(&chunk?);
            progress(&decoded_prefix(&body));
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

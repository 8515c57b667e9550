// ABOUTME: Account and session endpoints: login, signup, logout, language, new chat.
// ABOUTME: Each call reports whether the backend asked the client to go elsewhere or just reload.

use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde::Deserialize;
use thiserror::Error;

use crate::config::is_supported_language;
use crate::remote::http::join_url;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("unexpected response: {0}")]
    BadResponse(String),
}

/// What the page should do after an account call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The backend answered with a redirect to this location.
    Redirect(String),
    /// Stay put and refresh.
    Reload,
}

/// Outcome of asking the backend for a new chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewChat {
    Created(String),
    /// Not created; typically a redirect to the login page.
    Navigate(Navigation),
}

#[derive(Debug, Deserialize)]
struct NewChatReply {
    #[serde(default)]
    success: bool,
    chat_id: Option<String>,
}

pub struct AccountClient {
    http: reqwest::Client,
    base_url: String,
}

impl AccountClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Navigation, AccountError> {
        self.post_credentials("/login", username, password).await
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<Navigation, AccountError> {
        self.post_credentials("/signup", username, password).await
    }

    pub async fn logout(&self) -> Result<Navigation, AccountError> {
        let response = self.http.get(self.url("/logout")).send().await?;
        Ok(navigation_for(&response))
    }

    /// Switch the backend's reply language. Codes outside `en`/`sw` are refused locally.
    pub async fn set_language(&self, code: &str) -> Result<Navigation, AccountError> {
        if !is_supported_language(code) {
            return Err(AccountError::UnsupportedLanguage(code.to_string()));
        }
        let response = self
            .http
            .get(self.url(&format!("/set_language/{code}")))
            .send()
            .await?;
        Ok(navigation_for(&response))
    }

    pub async fn new_chat(&self) -> Result<NewChat, AccountError> {
        let response = self.http.post(self.url("/new_chat")).send().await?;
        if response.status().is_redirection() {
            return Ok(NewChat::Navigate(navigation_for(&response)));
        }

        let status = response.status();
        let body = response.text().await?;
        let reply: NewChatReply = serde_json::from_str(&body)
            .map_err(|e| AccountError::BadResponse(format!("{status}: {e}")))?;
        match reply.chat_id {
            Some(id) if reply.success => Ok(NewChat::Created(id)),
            _ => Ok(NewChat::Navigate(Navigation::Reload)),
        }
    }

    async fn post_credentials(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<Navigation, AccountError> {
        let response = self
            .http
            .post(self.url(path))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let navigation = navigation_for(&response);
        tracing::info!(path, status = %response.status(), ?navigation, "account request");
        Ok(navigation)
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// A 3xx with a `Location` header is a redirect; everything else reloads.
fn navigation_for(response: &reqwest::Response) -> Navigation {
    navigation_from_parts(
        response.status(),
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok()),
    )
}

fn navigation_from_parts(status: StatusCode, location: Option<&str>) -> Navigation {
    match location {
        Some(location) if status.is_redirection() => Navigation::Redirect(location.to_string()),
        _ => Navigation::Reload,
    }
}

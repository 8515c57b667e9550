// ABOUTME: Shared reqwest client construction.
// ABOUTME: Keeps cookies and leaves redirects for callers to interpret.

use reqwest::redirect::Policy;

const USER_AGENT: &str = concat!("vinnie-chat/", env!("CARGO_PKG_VERSION"));

/// Build the client every remote call goes through.
///
/// The cookie store carries the backend's session cookie between the
/// prompt endpoint and the account endpoints. Redirects are not followed
/// so a 3xx can be surfaced as a navigation.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .user_agent(USER_AGENT)
        .build()
}

/// Join a base URL and an absolute path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

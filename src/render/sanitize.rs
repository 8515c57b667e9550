// ABOUTME: HTML sanitizing capability: ammonia with an allowlist policy.
// ABOUTME: Removes scripts, event handlers, and non-http(s)/mailto URLs.

/// Filters HTML down to markup that cannot execute script.
pub trait HtmlSanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// ammonia's default allowlist, with `rel="noopener noreferrer"` on links.
#[derive(Debug, Clone, Default)]
pub struct AmmoniaSanitizer;

impl HtmlSanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str) -> String {
        ammonia::Builder::default()
            .link_rel(Some("noopener noreferrer"))
            .clean(html)
            .to_string()
    }
}

// ABOUTME: Sanitizing renderer: turns raw markdown into HTML that is safe to display.
// ABOUTME: Markdown parsing and sanitizing are injected capabilities; either may be absent.

pub mod label;
pub mod markdown;
pub mod sanitize;

pub use markdown::{CommonMark, MarkdownParser};
pub use sanitize::{AmmoniaSanitizer, HtmlSanitizer};

use crate::config::RenderConfig;

/// Converts raw text into HTML for the message log.
///
/// With a sanitizer present the output is free of script-executing markup.
/// Without one the parsed HTML is returned as-is; that degradation is logged
/// when the renderer is built, not hidden.
pub struct Renderer {
    parser: Option<Box<dyn MarkdownParser>>,
    sanitizer: Option<Box<dyn HtmlSanitizer>>,
}

impl Renderer {
    /// Build a renderer from explicit capabilities.
    pub fn new(
        parser: Option<Box<dyn MarkdownParser>>,
        sanitizer: Option<Box<dyn HtmlSanitizer>>,
    ) -> Self {
        if sanitizer.is_none() {
            tracing::warn!("renderer built without a sanitizer; output is not guaranteed safe");
        }
        if parser.is_none() {
            tracing::info!("renderer built without markdown support; text is shown escaped");
        }
        Self { parser, sanitizer }
    }

    /// CommonMark parsing plus ammonia sanitizing.
    pub fn standard() -> Self {
        Self::new(
            Some(Box::new(CommonMark::default())),
            Some(Box::new(AmmoniaSanitizer::default())),
        )
    }

    /// Build a renderer with the capabilities switched on in config.
    pub fn from_config(config: &RenderConfig) -> Self {
        let parser: Option<Box<dyn MarkdownParser>> = if config.markdown {
            Some(Box::new(CommonMark::default()))
        } else {
            None
        };
        let sanitizer: Option<Box<dyn HtmlSanitizer>> = if config.sanitize {
            Some(Box::new(AmmoniaSanitizer::default()))
        } else {
            None
        };
        Self::new(parser, sanitizer)
    }

    /// Whether output is passed through a sanitizer.
    pub fn is_sanitizing(&self) -> bool {
        self.sanitizer.is_some()
    }

    /// Render raw (markdown) text to HTML. Never fails.
    pub fn render(&self, raw: &str) -> String {
        let html = match &self.parser {
            Some(parser) => parser.to_html(raw),
            None => plain_paragraph(raw),
        };
        match &self.sanitizer {
            Some(sanitizer) => sanitizer.sanitize(&html),
            None => html,
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::standard()
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn plain_paragraph(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let body = escape_html(raw).replace('\n', "<br>\n");
    format!("<p>{}</p>\n", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_bold_markdown() {
        let renderer = Renderer::standard();
        let html = renderer.render("**Hi**");
        assert!(html.contains("<strong>Hi</strong>"), "got {html}");
    }

    #[test]
    fn strips_script_when_sanitizing() {
        let renderer = Renderer::standard();
        let html = renderer.render("hello <script>alert(1)</script>");
        assert!(!html.contains("<script"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn unsanitized_fallback_keeps_raw_markup() {
        let renderer = Renderer::new(Some(Box::new(CommonMark::default())), None);
        assert!(!renderer.is_sanitizing());
        let html = renderer.render("<b onclick=\"x()\">hi</b>");
        assert!(html.contains("onclick"));
    }

    #[test]
    fn without_parser_text_is_escaped() {
        let renderer = Renderer::new(None, None);
        let html = renderer.render("**a** <i>b</i>\nc");
        assert_eq!(html, "<p>**a** &lt;i&gt;b&lt;/i&gt;<br>\nc</p>\n");
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(Renderer::standard().render(""), "");
        assert_eq!(Renderer::new(None, None).render(""), "");
    }

    #[test]
    fn from_config_honours_switches() {
        let renderer = Renderer::from_config(&RenderConfig {
            markdown: false,
            sanitize: true,
        });
        assert!(renderer.is_sanitizing());
        assert_eq!(renderer.render("*x*"), "<p>*x*</p>\n");
    }

    #[test]
    fn escape_html_escapes_quotes() {
        assert_eq!(escape_html(r#"<a href="x">'"#), "&lt;a href=&quot;x&quot;&gt;&#39;");
    }
}

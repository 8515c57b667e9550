// ABOUTME: Markdown parsing capability: CommonMark via pulldown-cmark.
// ABOUTME: The parser is total: any input produces some HTML.

use pulldown_cmark::{Options, Parser, html};

/// Turns markdown into (unsanitized) HTML.
pub trait MarkdownParser: Send + Sync {
    fn to_html(&self, text: &str) -> String;
}

/// pulldown-cmark with the extensions chat replies commonly use.
#[derive(Debug, Clone)]
pub struct CommonMark {
    options: Options,
}

impl Default for CommonMark {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }
}

impl MarkdownParser for CommonMark {
    fn to_html(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options);
        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

// ABOUTME: Re-rendering of history fragments that start with a speaker label.
// ABOUTME: The first emphasis node is kept as markup; the text after it is rendered as markdown.

use scraper::{ElementRef, Html, Node};

use super::Renderer;

/// Elements that can carry a speaker label such as `<strong>You:</strong>`.
const LABEL_TAGS: &[&str] = &["strong", "b", "em", "i"];

/// A history fragment split into its speaker label and the text after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFragment {
    /// Serialized label element, when the fragment begins with one.
    pub label: Option<String>,
    /// Concatenated text content following the label.
    pub body_text: String,
}

/// Split an already-rendered fragment into label markup and following text.
///
/// The label is the first emphasis element in document order, provided no
/// non-whitespace text precedes it. Without a label the whole text content
/// of the fragment becomes the body.
pub fn split_label(fragment: &str) -> LabeledFragment {
    let doc = Html::parse_fragment(fragment);
    let root = doc.root_element();

    let mut leading = String::new();
    let mut label_node = None;
    for node in root.descendants() {
        match node.value() {
            Node::Element(el) if LABEL_TAGS.contains(&el.name()) => {
                label_node = Some(node);
                break;
            }
            Node::Text(text) => leading.push_str(text),
            _ => {}
        }
    }

    let label_node = match label_node {
        Some(node) if leading.trim().is_empty() => node,
        _ => {
            return LabeledFragment {
                label: None,
                body_text: trim_separator(&root.text().collect::<String>()).to_string(),
            };
        }
    };

    let label = ElementRef::wrap(label_node).map(|el| el.html());

    let mut body = String::new();
    let mut past_label = false;
    for node in root.descendants() {
        if node.id() == label_node.id() {
            past_label = true;
            continue;
        }
        if !past_label || node.ancestors().any(|a| a.id() == label_node.id()) {
            continue;
        }
        if let Node::Text(text) = node.value() {
            body.push_str(text);
        }
    }

    LabeledFragment {
        label,
        body_text: trim_separator(&body).to_string(),
    }
}

/// Drop the whitespace between label and body. Blank leading lines go
/// whole so the indentation of the first real line survives (an indented
/// code block stays a code block); otherwise leading spaces go.
fn trim_separator(body: &str) -> &str {
    let body = body.trim_end();
    let mut rest = body;
    while let Some((line, tail)) = rest.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        rest = tail;
    }
    if rest.len() == body.len() {
        rest.trim_start()
    } else {
        rest
    }
}

impl Renderer {
    /// Re-render a fragment whose content may begin with a speaker label.
    ///
    /// The label skips the markdown parser; it still passes through the
    /// sanitizer when one is present.
    pub fn render_labeled(&self, fragment: &str) -> String {
        self.render_split(&split_label(fragment))
    }

    /// Render a fragment that was already split by [`split_label`].
    pub fn render_split(&self, parts: &LabeledFragment) -> String {
        let body = self.render(&parts.body_text);
        match &parts.label {
            Some(label) => {
                let label = match &self.sanitizer {
                    Some(sanitizer) => sanitizer.sanitize(label),
                    None => label.clone(),
                };
                format!("{} {}", label, body)
            }
            None => body,
        }
    }
}

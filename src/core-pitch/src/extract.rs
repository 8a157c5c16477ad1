//! Regex-based text extraction from the landing-page template.
//!
//! This is deliberately not a DOM parser: each rule is a pattern for one kind of text-bearing
//! element, all rules run over the whole document, and their matches are merged in document
//! order. Elements whose content contains other tags are not extracted.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The kind of element a piece of text was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextKind {
    H1,
    H2,
    H3,
    P,
    Li,
    CircuitStepTitle,
    CircuitStepDescription,
}

impl TextKind {
    /// Every kind, in rule order.
    pub const ALL: [TextKind; 7] = [
        TextKind::H1,
        TextKind::H2,
        TextKind::H3,
        TextKind::P,
        TextKind::Li,
        TextKind::CircuitStepTitle,
        TextKind::CircuitStepDescription,
    ];

    /// The token written between brackets in the numbered text list.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextKind::H1 => "h1",
            TextKind::H2 => "h2",
            TextKind::H3 => "h3",
            TextKind::P => "p",
            TextKind::Li => "li",
            TextKind::CircuitStepTitle => "circuit-step-title",
            TextKind::CircuitStepDescription => "circuit-step-description",
        }
    }

    /// Inverse of `as_str`, ignoring ASCII case and surrounding whitespace.
    pub fn from_token(token: &str) -> Option<TextKind> {
        let token = token.trim();
        TextKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(token))
    }
}

impl std::fmt::Display for TextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of visible text found in the template.
///
/// `offset` and `len` are the byte span of `original_text` inside the HTML it was extracted from:
/// the splicer writes back into exactly that span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    pub original_text: String,
    pub kind: TextKind,
    pub offset: usize,
    pub len: usize,
}

impl TextNode {
    /// One past the last byte of the span.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

struct Rule {
    kind: TextKind,
    pattern: Regex,
}

impl Rule {
    /// `open` and `close` are regex fragments; the text between them may not contain a tag.
    fn new(kind: TextKind, open: &str, close: &str) -> Rule {
        let pattern = Regex::new(&format!(r"(?is){open}(?P<text>[^<]*){close}"))
            .expect("text extraction rules are valid regular expressions");
        Rule { kind, pattern }
    }
}

/// Element with a CSS class, e.g. `<div class="circuit-step-title big">`.
fn class_open(class: &str) -> String {
    format!(r#"<(?:div|span|p|h[1-6])\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?{class}(?:\s[^"']*)?["'][^>]*>"#)
}

const CLASS_CLOSE: &str = r"</(?:div|span|p|h[1-6])\s*>";

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(TextKind::H1, r"<h1\b[^>]*>", r"</h1\s*>"),
        Rule::new(TextKind::H2, r"<h2\b[^>]*>", r"</h2\s*>"),
        Rule::new(TextKind::H3, r"<h3\b[^>]*>", r"</h3\s*>"),
        Rule::new(TextKind::P, r"<p\b[^>]*>", r"</p\s*>"),
        Rule::new(TextKind::Li, r"<li\b[^>]*>", r"</li\s*>"),
        Rule::new(TextKind::CircuitStepTitle, &class_open("circuit-step-title"), CLASS_CLOSE),
        Rule::new(
            TextKind::CircuitStepDescription,
            &class_open("circuit-step-description"),
            CLASS_CLOSE,
        ),
    ]
});

/// Script and style bodies never hold visible text.
static CODE_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<!--.*?-->")
        .expect("code block pattern is a valid regular expression")
});

/// `{{...}}` template placeholders, which are copy even though they hold braces.
static PLACEHOLDERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{[^{}]*\}\}").expect("placeholder pattern is a valid regular expression")
});

/// True for text that is probably source code rather than copy.
pub fn is_code_like(text: &str) -> bool {
    let text = text.trim_start();
    if text.contains('<') || text.starts_with("function") || text.starts_with("const ") {
        return true;
    }
    let without_placeholders = PLACEHOLDERS.replace_all(text, "");
    without_placeholders.contains('{') && without_placeholders.contains('}')
}

/// Finds every personalizable text in the HTML, ordered by first appearance.
///
/// Rules are applied independently and their matches are unioned: an element matching two rules
/// (an `<h3 class="circuit-step-title">` for instance) is returned twice, once per kind, with the
/// same span. Ties on offset keep rule order.
pub fn extract_text_nodes(html: &str) -> Vec<TextNode> {
    let code_spans: Vec<(usize, usize)> = CODE_BLOCKS.find_iter(html).map(|m| (m.start(), m.end())).collect();
    let inside_code = |offset: usize| code_spans.iter().any(|&(start, end)| start <= offset && offset < end);

    let mut nodes: Vec<(usize, TextNode)> = Vec::new();
    for (rule_index, rule) in RULES.iter().enumerate() {
        for caps in rule.pattern.captures_iter(html) {
            let Some(inner) = caps.name("text") else {
                continue;
            };
            let raw = inner.as_str();
            let text = raw.trim();
            if text.is_empty() || is_code_like(text) || inside_code(inner.start()) {
                continue;
            }
            let leading = raw.len() - raw.trim_start().len();
            nodes.push((
                rule_index,
                TextNode {
                    original_text: text.to_string(),
                    kind: rule.kind,
                    offset: inner.start() + leading,
                    len: text.len(),
                },
            ));
        }
    }

    nodes.sort_by_key(|(rule_index, node)| (node.offset, *rule_index));
    let nodes: Vec<TextNode> = nodes.into_iter().map(|(_, node)| node).collect();
    tracing::debug!("Extracted {} text nodes from {} bytes of HTML", nodes.len(), html.len());
    nodes
}

//! Reads the model's numbered-line answer back into per-text results.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extract::{TextKind, TextNode};

/// A text node together with the text that should replace it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizedNode {
    pub node: TextNode,
    pub personalized_text: String,
}

impl PersonalizedNode {
    /// The node with its own text as the replacement.
    pub fn unchanged(node: TextNode) -> Self {
        let personalized_text = node.original_text.clone();
        Self { node, personalized_text }
    }

    pub fn is_changed(&self) -> bool {
        self.personalized_text != self.node.original_text
    }
}

/// `N. [kind] text`. Anything else (code fences, chatter) is ignored.
static RESPONSE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\.\s*\[([A-Za-z0-9-]+)\]\s*(.*?)\s*$")
        .expect("response line pattern is a valid regular expression")
});

/// Pairs every node with its personalized text.
///
/// The number on each line addresses the node at that (1-based) position of the request. A line
/// is only accepted if its kind token matches that node's kind and it carries some text. Nodes
/// without an acceptable line keep their original text. The output has exactly one entry per
/// input node, in input order.
pub fn parse_response(raw: &str, nodes: &[TextNode]) -> Vec<PersonalizedNode> {
    let mut answers: HashMap<usize, (TextKind, String)> = HashMap::new();
    for line in raw.lines() {
        let Some(caps) = RESPONSE_LINE.captures(line) else {
            continue;
        };
        let Ok(number) = caps[1].parse::<usize>() else {
            continue;
        };
        let Some(kind) = TextKind::from_token(&caps[2]) else {
            tracing::warn!("Ignoring response line {} with unknown kind '{}'", number, &caps[2]);
            continue;
        };
        answers
            .entry(number)
            .or_insert_with(|| (kind, caps[3].to_string()));
    }

    let mut fallbacks = 0;
    let personalized: Vec<PersonalizedNode> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| match answers.remove(&(i + 1)) {
            Some((kind, text)) if kind == node.kind && !text.is_empty() => PersonalizedNode {
                node: node.clone(),
                personalized_text: text,
            },
            Some((kind, _)) if kind != node.kind => {
                fallbacks += 1;
                tracing::warn!(
                    "Response line {} is [{}] but text {} is [{}]: keeping original text",
                    i + 1,
                    kind,
                    i + 1,
                    node.kind
                );
                PersonalizedNode::unchanged(node.clone())
            }
            Some(_) => {
                fallbacks += 1;
                tracing::warn!("Response line {} is empty: keeping original text", i + 1);
                PersonalizedNode::unchanged(node.clone())
            }
            None => {
                fallbacks += 1;
                tracing::warn!("No usable response line for text {} [{}]: keeping original text", i + 1, node.kind);
                PersonalizedNode::unchanged(node.clone())
            }
        })
        .collect();

    if !answers.is_empty() {
        tracing::warn!("Ignoring {} response lines numbered beyond the request", answers.len());
    }
    tracing::debug!(
        "Parsed completion: {} texts, {} kept their original text",
        nodes.len(),
        fallbacks
    );
    personalized
}

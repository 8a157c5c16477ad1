//! Writes personalized text back into the template.

use crate::parse::PersonalizedNode;

/// Replaces each node's span in `html` with its personalized text.
///
/// Nodes are applied from the end of the document backwards, so the byte offsets recorded at
/// extraction time stay valid for everything not yet written. A node is skipped, leaving its
/// original text in place, when:
/// - its span no longer holds exactly its original text (the HTML is not the one it came from), or
/// - its span overlaps a span already written in this pass (the same element extracted twice).
///
/// `<` in personalized text is escaped so a rewrite can never open a tag.
pub fn splice(html: &str, personalized: &[PersonalizedNode]) -> String {
    splice_counting(html, personalized).0
}

/// `splice`, also returning how many rewrites actually landed in the output.
pub fn splice_counting(html: &str, personalized: &[PersonalizedNode]) -> (String, usize) {
    let mut ordered: Vec<&PersonalizedNode> = personalized.iter().collect();
    ordered.sort_by_key(|p| p.node.offset);

    let mut output = html.to_string();
    // Start of the leftmost span written so far; every written span begins at or after it.
    let mut written_from: Option<usize> = None;
    let mut skipped = 0;
    let mut applied = 0;

    for p in ordered.into_iter().rev() {
        let (start, end) = (p.node.offset, p.node.end());

        if let Some(from) = written_from
            && end > from
        {
            tracing::debug!(
                "Skipping [{}] '{}' at {}: overlaps text already written",
                p.node.kind,
                p.node.original_text,
                start
            );
            skipped += 1;
            continue;
        }

        if output.get(start..end) != Some(p.node.original_text.as_str()) {
            tracing::warn!(
                "Skipping [{}] '{}' at {}: original text not found at its position",
                p.node.kind,
                p.node.original_text,
                start
            );
            skipped += 1;
            continue;
        }

        if p.is_changed() {
            output.replace_range(start..end, &escape_text(&p.personalized_text));
            applied += 1;
        }
        written_from = Some(start);
    }

    if skipped > 0 {
        tracing::debug!("Spliced {} texts, skipped {}", personalized.len() - skipped, skipped);
    }
    (output, applied)
}

fn escape_text(text: &str) -> String {
    text.replace('<', "&lt;")
}

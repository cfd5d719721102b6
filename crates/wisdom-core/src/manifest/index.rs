//! Human-readable catalogue index (`index.md`).

use std::fmt::Write as _;

use super::entry::ManifestEntry;

/// Heading used when none is configured.
pub const DEFAULT_INDEX_TITLE: &str = "Wisdom Library Catalogue Index";

/// Label of the bullet that replaces an entry missing required fields.
pub const INVALID_ENTRY_MARKER: &str = "INVALID MANIFEST ENTRY";

const EMPTY_NOTICE: &str = "No artifacts have been generated yet.";

/// Render the index: a heading, then one bullet per entry in the given order.
///
/// Complete entries link their artifact; incomplete ones are shown as an
/// [`INVALID_ENTRY_MARKER`] bullet carrying the raw entry.
pub fn render_index(title: &str, entries: &[ManifestEntry]) -> String {
    let mut out = format!("# {title}\n\n");

    if entries.is_empty() {
        out.push_str(EMPTY_NOTICE);
        out.push('\n');
        return out;
    }

    for entry in entries {
        match entry.summary() {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "- [{artifact}]({artifact}) — Issue #{issue}, Target: {target}, Intent: {intent}, Date: {created}",
                    artifact = single_line(&s.artifact),
                    issue = s.issue,
                    target = single_line(&s.target),
                    intent = single_line(&s.intent),
                    created = single_line(&s.created),
                );
            }
            None => {
                let _ = writeln!(out, "- [{INVALID_ENTRY_MARKER}: {entry}]");
            }
        }
    }
    out
}

/// Keep one bullet on one line.
fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

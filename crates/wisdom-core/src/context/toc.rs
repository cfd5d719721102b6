//! Leveled table of contents.

use std::fmt::Write as _;

use super::inventory::FileInventoryEntry;

/// Render a table of contents grouped by level.
///
/// A `## Level N: <Label>` heading is emitted whenever the level changes,
/// followed by one `- <filename> (<category>)` bullet per file. The input
/// must already be sorted by level then filename (as [`scan_files`] returns
/// it); this function does not reorder. An empty inventory renders as an
/// empty string.
///
/// [`scan_files`]: super::inventory::scan_files
pub fn generate_toc(files: &[FileInventoryEntry]) -> String {
    let mut out = String::new();
    let mut current = None;

    for file in files {
        if current != Some(file.level) {
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(
                out,
                "## Level {}: {}",
                file.level.number(),
                file.level.label()
            );
            current = Some(file.level);
        }
        let _ = writeln!(out, "- {} ({})", file.filename, file.category());
    }
    out
}

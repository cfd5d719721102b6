//! Context document: the table of contents plus the artifacts themselves.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{info, warn};

use super::inventory::{FileInventoryEntry, scan_files};
use super::toc::generate_toc;

/// What a file contributes to the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Text(String),
    /// Not valid UTF-8; listed but not inlined.
    Binary,
    Unreadable(String),
}

/// Everything catalogued for one target, in level order.
#[derive(Debug, Clone)]
pub struct ContextDocument {
    pub target: String,
    pub files: Vec<FileInventoryEntry>,
    /// One body per file when contents were requested, otherwise empty.
    pub bodies: Vec<SectionBody>,
}

impl ContextDocument {
    pub fn toc(&self) -> String {
        generate_toc(&self.files)
    }

    /// Render as markdown.
    pub fn render(&self) -> String {
        let mut out = format!("# Context: {}\n\n", self.target);

        if self.files.is_empty() {
            out.push_str("No artifacts found for this target.\n");
            return out;
        }
        out.push_str(&self.toc());

        for (file, body) in self.files.iter().zip(&self.bodies) {
            let _ = write!(
                out,
                "\n---\n\n### {}/{}\n\n",
                file.category(),
                file.filename
            );
            match body {
                SectionBody::Text(text) => {
                    out.push_str(text);
                    if !text.ends_with('\n') {
                        out.push('\n');
                    }
                }
                SectionBody::Binary => out.push_str("_(binary file, not inlined)_\n"),
                SectionBody::Unreadable(e) => {
                    let _ = writeln!(out, "_(could not read file: {e})_");
                }
            }
        }
        out
    }
}

/// Scan `root` for `target` and build its context document.
pub fn assemble_context(root: &Path, target: &str, include_contents: bool) -> ContextDocument {
    let files = scan_files(root, target);
    let bodies = if include_contents {
        files.iter().map(read_body).collect()
    } else {
        Vec::new()
    };

    info!(target_slug = target, files = files.len(), "Context assembled");
    ContextDocument {
        target: target.to_string(),
        files,
        bodies,
    }
}

fn read_body(file: &FileInventoryEntry) -> SectionBody {
    match std::fs::read(&file.path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => SectionBody::Text(text),
            Err(_) => SectionBody::Binary,
        },
        Err(e) => {
            warn!(path = %file.path.display(), error = %e, "Could not read artifact");
            SectionBody::Unreadable(e.to_string())
        }
    }
}

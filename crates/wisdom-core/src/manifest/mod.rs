//! Catalogue manifest: entries, fragments, consolidation, and merge.
//!
//! Contributors never edit the canonical manifest. Each one drops a fragment
//! (a JSON array of entries) into the fragments directory, and the
//! [`Consolidator`] rebuilds `manifest.json` and `index.md` from the full
//! fragment set. Recovery flows that must add a single entry to an existing
//! manifest go through [`merge_entry`] / [`integrate_entry`], which validate
//! before anything is written.
//!
//! ```text
//! fragments/*.json ──► parse ──► concat ──► sort (issue, artifact) ──┬─► manifest.json
//!                        │                                           └─► index.md
//!                        └─ malformed / unreadable ─► Diagnostic
//! ```

pub mod consolidate;
pub mod entry;
pub mod fragment;
pub mod index;
pub mod merge;

use std::path::PathBuf;

pub use consolidate::{ConsolidationReport, Consolidator, Diagnostic, DiagnosticKind, consolidate};
pub use entry::{EntrySummary, IssueId, ManifestEntry, RequiredField, sort_canonical};
pub use fragment::{FragmentProblem, FragmentReport, validate_fragment, write_fragment};
pub use index::{DEFAULT_INDEX_TITLE, INVALID_ENTRY_MARKER, render_index};
pub use merge::{
    IndexTarget, IntegrationOutcome, MergeOutcome, integrate_entry, merge_entry, read_manifest,
};

/// Errors from catalogue operations that cannot be recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} is not a JSON array of entry objects", path.display())]
    NotASequence { path: PathBuf },

    #[error("{} does not hold a single entry object", path.display())]
    NotAnEntry { path: PathBuf },

    #[error("destination directory for {} does not exist", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("entry is missing required fields: {}", join_fields(missing))]
    InvalidEntry { missing: Vec<RequiredField> },

    #[error("entry has mistyped required fields: {}", join_fields(fields))]
    MistypedEntry { fields: Vec<RequiredField> },

    #[error("merged manifest does not survive a serialization round trip")]
    RoundTrip,

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("fragment already exists: {}", path.display())]
    FragmentExists { path: PathBuf },

    #[error("invalid fragment name {name:?}: must be a plain file stem")]
    InvalidFragmentName { name: String },
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render entries as the canonical manifest text: pretty-printed JSON array,
/// two-space indent, trailing newline.
pub fn render_manifest(entries: &[ManifestEntry]) -> Result<String, CatalogueError> {
    let mut text = serde_json::to_string_pretty(entries)?;
    text.push('\n');
    Ok(text)
}

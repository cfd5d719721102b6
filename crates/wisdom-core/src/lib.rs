#![deny(unsafe_code)]

//! Wisdom Library core.
//!
//! Two independent pieces of machinery over a research-artifact library:
//!
//! - [`manifest`] consolidates per-contributor fragment files into the
//!   canonical `manifest.json` and `index.md`, and merges single entries into
//!   an existing manifest.
//! - [`context`] scans the five leveled category directories for one target
//!   and renders a grouped table of contents (optionally with file contents).
//!
//! Both are synchronous and single-pass. Recoverable problems are reported
//! through `tracing` and the returned reports rather than as errors.

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Leveled inventory, table of contents, and context documents.
pub mod context;
/// Atomic file replacement helpers.
pub mod fsutil;
/// Agent-prompt extraction from issue bodies.
pub mod intake;
/// Logging setup and an in-memory log collector.
pub mod logging;
/// Manifest entries, fragments, consolidation, and merge.
pub mod manifest;

pub use context::{FileInventoryEntry, Level, assemble_context, generate_toc, scan_files};
pub use intake::IssueVars;
pub use logging::{LogCollector, LogReader};
pub use manifest::{
    CatalogueError, ConsolidationReport, Consolidator, ManifestEntry, consolidate, merge_entry,
};

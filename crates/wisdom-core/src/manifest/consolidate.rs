//! Fragment consolidation: rebuilds the canonical manifest and index.
//!
//! Every fragment file in the fragments directory is read in file-name order,
//! parsed, and its entries concatenated. The combined list is stable-sorted by
//! `(issue, artifact)` and written out as `manifest.json` plus `index.md`.
//!
//! Problems with individual fragments never abort the run: an unreadable or
//! malformed fragment is skipped and recorded as a [`Diagnostic`]. Only a
//! failure to write the outputs is an error.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use wisdom_config::CatalogueConfig;

use super::entry::{ManifestEntry, sort_canonical};
use super::fragment::parse_fragment;
use super::index::{DEFAULT_INDEX_TITLE, render_index};
use super::{CatalogueError, render_manifest};
use crate::fsutil;

/// Why a fragment (or part of one) was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The fragments directory itself is missing or unreadable.
    FragmentsDirUnavailable(String),
    /// The fragment could not be opened or read.
    Unreadable(String),
    /// The fragment is not valid JSON.
    Malformed(String),
    /// An array element that is not an object.
    NotAnObject { position: usize },
}

/// A recoverable problem found while consolidating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.kind {
            DiagnosticKind::FragmentsDirUnavailable(e) => {
                write!(f, "{path}: fragments directory unavailable: {e}")
            }
            DiagnosticKind::Unreadable(e) => write!(f, "{path}: could not read fragment: {e}"),
            DiagnosticKind::Malformed(e) => write!(f, "{path}: could not decode JSON: {e}"),
            DiagnosticKind::NotAnObject { position } => {
                write!(f, "{path}: element {position} is not an object, skipped")
            }
        }
    }
}

/// Summary of one consolidation run.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationReport {
    /// Fragment files that contributed (including ones with zero entries).
    pub fragments_read: usize,
    /// Fragment files skipped entirely.
    pub fragments_skipped: usize,
    /// Entries in the written manifest.
    pub entries: usize,
    /// Entries rendered as invalid-entry markers in the index.
    pub invalid_entries: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Merges a fragments directory into the canonical manifest and index.
#[derive(Debug, Clone)]
pub struct Consolidator {
    fragments_dir: PathBuf,
    manifest_path: PathBuf,
    index_path: PathBuf,
    extension: String,
    index_title: String,
}

impl Consolidator {
    pub fn new(
        fragments_dir: impl Into<PathBuf>,
        manifest_path: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fragments_dir: fragments_dir.into(),
            manifest_path: manifest_path.into(),
            index_path: index_path.into(),
            extension: "json".to_string(),
            index_title: DEFAULT_INDEX_TITLE.to_string(),
        }
    }

    /// Build from the `[catalogue]` config section.
    pub fn from_config(config: &CatalogueConfig) -> Self {
        Self::new(
            &config.fragments_dir,
            &config.manifest_path,
            &config.index_path,
        )
        .with_extension(&config.fragment_extension)
        .with_index_title(&config.index_title)
    }

    /// Only files with this extension are treated as fragments.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_index_title(mut self, title: impl Into<String>) -> Self {
        self.index_title = title.into();
        self
    }

    /// Read and merge all fragments without writing anything.
    ///
    /// Returns the canonically sorted entries and the run report (with
    /// `entries`/`invalid_entries` filled in).
    pub fn collect(&self) -> (Vec<ManifestEntry>, ConsolidationReport) {
        let mut report = ConsolidationReport::default();
        let mut entries = Vec::new();

        for path in self.fragment_paths(&mut report) {
            let text = match std::fs::read_to_string(&path) {
                Ok(t) => t,
                Err(e) => {
                    skip(&mut report, path, DiagnosticKind::Unreadable(e.to_string()));
                    continue;
                }
            };

            match parse_fragment(&text) {
                Err(e) => {
                    skip(&mut report, path, DiagnosticKind::Malformed(e.to_string()));
                }
                Ok(None) => {
                    debug!(path = %path.display(), "Fragment is not an array, contributes no entries");
                    report.fragments_read += 1;
                }
                Ok(Some(parsed)) => {
                    debug!(path = %path.display(), entries = parsed.entries.len(), "Read fragment");
                    for position in parsed.rejected {
                        let diagnostic = Diagnostic {
                            path: path.clone(),
                            kind: DiagnosticKind::NotAnObject { position },
                        };
                        warn!("{diagnostic}");
                        report.diagnostics.push(diagnostic);
                    }
                    entries.extend(parsed.entries);
                    report.fragments_read += 1;
                }
            }
        }

        sort_canonical(&mut entries);
        report.entries = entries.len();
        report.invalid_entries = entries.iter().filter(|e| !e.is_complete()).count();
        (entries, report)
    }

    /// Consolidate and overwrite the manifest and index.
    ///
    /// Both destination directories are checked before either file is
    /// written. Re-running on an unchanged fragment set produces identical
    /// bytes.
    pub fn run(&self) -> Result<ConsolidationReport, CatalogueError> {
        for path in [&self.manifest_path, &self.index_path] {
            if !fsutil::parent_exists(path) {
                return Err(CatalogueError::MissingDirectory { path: path.clone() });
            }
        }

        let (entries, report) = self.collect();
        let manifest = render_manifest(&entries)?;
        let index = render_index(&self.index_title, &entries);

        write_output(&self.manifest_path, &manifest)?;
        write_output(&self.index_path, &index)?;

        info!(
            fragments = report.fragments_read,
            skipped = report.fragments_skipped,
            entries = report.entries,
            invalid = report.invalid_entries,
            manifest = %self.manifest_path.display(),
            "Catalogue consolidated"
        );
        Ok(report)
    }

    /// Fragment files, sorted by path so the concatenation order is fixed.
    fn fragment_paths(&self, report: &mut ConsolidationReport) -> Vec<PathBuf> {
        let dir = match std::fs::read_dir(&self.fragments_dir) {
            Ok(dir) => dir,
            Err(e) => {
                let diagnostic = Diagnostic {
                    path: self.fragments_dir.clone(),
                    kind: DiagnosticKind::FragmentsDirUnavailable(e.to_string()),
                };
                warn!("{diagnostic}");
                report.diagnostics.push(diagnostic);
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && self.has_fragment_extension(path))
            .collect();
        paths.sort();
        paths
    }

    fn has_fragment_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension)
    }
}

fn skip(report: &mut ConsolidationReport, path: PathBuf, kind: DiagnosticKind) {
    let diagnostic = Diagnostic { path, kind };
    warn!("{diagnostic}");
    report.fragments_skipped += 1;
    report.diagnostics.push(diagnostic);
}

fn write_output(path: &Path, contents: &str) -> Result<(), CatalogueError> {
    fsutil::write_atomic(path, contents.as_bytes()).map_err(|source| CatalogueError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Consolidate `fragments_dir` into `manifest_path` and `index_path` with
/// default settings.
pub fn consolidate(
    fragments_dir: &Path,
    manifest_path: &Path,
    index_path: &Path,
) -> Result<ConsolidationReport, CatalogueError> {
    Consolidator::new(fragments_dir, manifest_path, index_path).run()
}

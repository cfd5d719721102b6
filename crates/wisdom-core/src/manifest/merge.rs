//! Adding a single entry to an existing canonical manifest.
//!
//! Used by recovery and integration flows. The merge is refused unless the
//! new entry is complete, is skipped when its issue is already catalogued,
//! and is only written once the merged manifest has been serialized, parsed
//! back, and found identical. The manifest file is replaced atomically, so a
//! refused or failed merge leaves the previous manifest untouched.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use super::entry::{IssueId, ManifestEntry, entries_from_array, sort_canonical};
use super::index::render_index;
use super::{CatalogueError, render_manifest};
use crate::fsutil;

/// Result of [`merge_entry`].
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The merged, canonically sorted manifest.
    Appended {
        entries: Vec<ManifestEntry>,
        issue: IssueId,
    },
    /// An entry with this issue already exists; nothing changed.
    DuplicateSkipped { issue: IssueId },
}

/// Merge `new_entry` into an already canonical manifest.
pub fn merge_entry(
    existing: &[ManifestEntry],
    new_entry: ManifestEntry,
) -> Result<MergeOutcome, CatalogueError> {
    let missing = new_entry.missing_fields();
    let Some(issue) = new_entry.issue_id().filter(|_| missing.is_empty()) else {
        return Err(CatalogueError::InvalidEntry { missing });
    };

    let duplicate = existing
        .iter()
        .filter_map(ManifestEntry::issue_id)
        .any(|i| i.same_issue(&issue));
    if duplicate {
        warn!(issue = %issue, "Issue already catalogued, skipping merge");
        return Ok(MergeOutcome::DuplicateSkipped { issue });
    }

    let mut merged = existing.to_vec();
    merged.push(new_entry);
    sort_canonical(&mut merged);
    verify_round_trip(&merged)?;

    Ok(MergeOutcome::Appended {
        entries: merged,
        issue,
    })
}

/// Serialize `entries`, parse them back, and require an identical result.
fn verify_round_trip(entries: &[ManifestEntry]) -> Result<(), CatalogueError> {
    let text = render_manifest(entries)?;
    let reparsed = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(entries_from_array);
    match reparsed {
        Some(back) if back == entries => Ok(()),
        _ => Err(CatalogueError::RoundTrip),
    }
}

/// Where to re-render the index after a successful integration.
#[derive(Debug, Clone, Copy)]
pub struct IndexTarget<'a> {
    pub path: &'a Path,
    pub title: &'a str,
}

/// Result of [`integrate_entry`].
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationOutcome {
    Appended { issue: IssueId, total: usize },
    DuplicateSkipped { issue: IssueId },
}

/// Read the entry at `entry_path` and merge it into the manifest file.
///
/// The manifest must already exist and be a JSON array of objects; anything
/// else is an error and nothing is written.
pub fn integrate_entry(
    manifest_path: &Path,
    entry_path: &Path,
    index: Option<IndexTarget<'_>>,
) -> Result<IntegrationOutcome, CatalogueError> {
    let existing = read_manifest(manifest_path)?;
    let new_entry = read_entry(entry_path)?;

    if let Some(target) = index
        && !fsutil::parent_exists(target.path)
    {
        return Err(CatalogueError::MissingDirectory {
            path: target.path.to_path_buf(),
        });
    }

    let (merged, issue) = match merge_entry(&existing, new_entry)? {
        MergeOutcome::DuplicateSkipped { issue } => {
            return Ok(IntegrationOutcome::DuplicateSkipped { issue });
        }
        MergeOutcome::Appended { entries, issue } => (entries, issue),
    };

    write(manifest_path, &render_manifest(&merged)?)?;
    if let Some(target) = index {
        write(target.path, &render_index(target.title, &merged))?;
    }

    info!(
        issue = %issue,
        total = merged.len(),
        manifest = %manifest_path.display(),
        "Entry integrated"
    );
    Ok(IntegrationOutcome::Appended {
        issue,
        total: merged.len(),
    })
}

/// Load a canonical manifest file.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>, CatalogueError> {
    let value = read_json(path)?;
    entries_from_array(value).ok_or_else(|| CatalogueError::NotASequence {
        path: path.to_path_buf(),
    })
}

fn read_entry(path: &Path) -> Result<ManifestEntry, CatalogueError> {
    let value = read_json(path)?;
    ManifestEntry::from_json(value).map_err(|_| CatalogueError::NotAnEntry {
        path: path.to_path_buf(),
    })
}

fn read_json(path: &Path) -> Result<Value, CatalogueError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CatalogueError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, text: &str) -> Result<(), CatalogueError> {
    fsutil::write_atomic(path, text.as_bytes()).map_err(|source| CatalogueError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::RequiredField;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(issue: &str, artifact: &str) -> ManifestEntry {
        ManifestEntry::new(issue, artifact, "x", "y", "2025-01-01")
    }

    #[test]
    fn test_merge_appends_in_canonical_position() {
        let existing = vec![entry("1", "a.md"), entry("3", "c.md")];
        let outcome = merge_entry(&existing, entry("2", "b.md")).unwrap();

        let MergeOutcome::Appended { entries: merged, issue } = outcome else {
            panic!("expected append");
        };
        assert_eq!(issue, IssueId::from("2"));
        let issues: Vec<_> = merged.iter().map(|e| e.sort_key().0).collect();
        assert_eq!(issues, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_duplicate_issue_is_skipped() {
        let existing = vec![ManifestEntry::new(38_i64, "a.md", "x", "y", "d")];
        let outcome = merge_entry(&existing, entry("38", "other.md")).unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::DuplicateSkipped {
                issue: IssueId::from("38")
            }
        );
    }

    #[test]
    fn test_merge_rejects_incomplete_entry() {
        let mut incomplete = entry("4", "d.md");
        incomplete.target = None;
        let err = merge_entry(&[], incomplete).unwrap_err();
        assert!(matches!(err, CatalogueError::InvalidEntry { .. }));
    }

    #[test]
    fn test_merge_rejects_null_issue() {
        let entry = entry("4", "d.md").with_field("issue", json!(null));
        let err = merge_entry(&[], entry).unwrap_err();
        assert!(matches!(
            err,
            CatalogueError::InvalidEntry { ref missing } if missing == &[RequiredField::Issue]
        ));
    }

    #[test]
    fn test_merge_orders_untyped_issue_numerically() {
        let existing = vec![entry("1", "a.md"), entry("3", "c.md")];
        let float_issue = entry("0", "b.md").with_field("issue", json!(2.0));
        let MergeOutcome::Appended { entries, issue } = merge_entry(&existing, float_issue).unwrap()
        else {
            panic!("expected append");
        };
        assert_eq!(issue, IssueId::from("2.0"));
        let artifacts: Vec<_> = entries.iter().map(|e| e.sort_key().1.into_owned()).collect();
        assert_eq!(artifacts, vec!["a.md", "b.md", "c.md"]);
    }

    #[test]
    fn test_merge_keeps_existing_invalid_entries() {
        let broken = ManifestEntry::from_json(json!({"artifact": 12})).unwrap();
        let outcome = merge_entry(&[broken.clone()], entry("1", "a.md")).unwrap();
        let MergeOutcome::Appended { entries: merged, .. } = outcome else {
            panic!("expected append");
        };
        assert!(merged.contains(&broken));
    }

    #[test]
    fn test_integrate_writes_manifest_and_index() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("manifest.json");
        let index = tmp.path().join("index.md");
        let entry_path = tmp.path().join("entry.json");
        std::fs::write(&manifest, render_manifest(&[entry("1", "a.md")]).unwrap()).unwrap();
        std::fs::write(
            &entry_path,
            r#"{"issue": "38", "artifact": "b.md", "target": "skills", "intent": "y", "created": "2025-11-20", "analyses": []}"#,
        )
        .unwrap();

        let outcome = integrate_entry(
            &manifest,
            &entry_path,
            Some(IndexTarget {
                path: &index,
                title: "Index",
            }),
        )
        .unwrap();

        assert_eq!(
            outcome,
            IntegrationOutcome::Appended {
                issue: IssueId::from("38"),
                total: 2
            }
        );
        let written = read_manifest(&manifest).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[1].extra.contains_key("analyses"));
        assert!(std::fs::read_to_string(&index).unwrap().contains("Issue #38"));
    }

    #[test]
    fn test_integrate_duplicate_leaves_manifest_untouched() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("manifest.json");
        let entry_path = tmp.path().join("entry.json");
        let original = render_manifest(&[entry("38", "a.md")]).unwrap();
        std::fs::write(&manifest, &original).unwrap();
        std::fs::write(&entry_path, serde_json::to_string(&entry("38", "z.md")).unwrap()).unwrap();

        let outcome = integrate_entry(&manifest, &entry_path, None).unwrap();
        assert!(matches!(outcome, IntegrationOutcome::DuplicateSkipped { .. }));
        assert_eq!(std::fs::read_to_string(&manifest).unwrap(), original);
    }

    #[test]
    fn test_integrate_corrupt_manifest_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("manifest.json");
        let entry_path = tmp.path().join("entry.json");
        let corrupt = "[\n  {\n    \"tags\": [\n      \"wisdom-ladder\"\n    \"atomic\": [";
        std::fs::write(&manifest, corrupt).unwrap();
        std::fs::write(&entry_path, serde_json::to_string(&entry("1", "a.md")).unwrap()).unwrap();

        let err = integrate_entry(&manifest, &entry_path, None).unwrap_err();
        assert!(matches!(err, CatalogueError::Json { .. }));
        assert_eq!(std::fs::read_to_string(&manifest).unwrap(), corrupt);
    }

    #[test]
    fn test_integrate_incomplete_entry_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("manifest.json");
        let entry_path = tmp.path().join("entry.json");
        std::fs::write(&manifest, "[]\n").unwrap();
        std::fs::write(&entry_path, r#"{"issue": 3, "artifact": "a.md"}"#).unwrap();

        let err = integrate_entry(&manifest, &entry_path, None).unwrap_err();
        assert!(matches!(err, CatalogueError::InvalidEntry { .. }));
        assert_eq!(std::fs::read_to_string(&manifest).unwrap(), "[]\n");
    }

    #[test]
    fn test_integrate_entry_file_must_be_object() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("manifest.json");
        let entry_path = tmp.path().join("entry.json");
        std::fs::write(&manifest, "[]\n").unwrap();
        std::fs::write(&entry_path, "[]").unwrap();

        let err = integrate_entry(&manifest, &entry_path, None).unwrap_err();
        assert!(matches!(err, CatalogueError::NotAnEntry { .. }));
    }
}

//! Fragment parsing, validation, and submission.
//!
//! A fragment is one contributor's JSON array of entries. Consolidation is
//! lenient about what it finds in the fragments directory; [`write_fragment`]
//! and [`validate_fragment`] are the strict side that producers use so broken
//! fragments never get there in the first place.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use super::entry::{ManifestEntry, RequiredField};
use super::{CatalogueError, render_manifest};
use crate::fsutil;

/// Entries recovered from one fragment.
#[derive(Debug, Default)]
pub struct ParsedFragment {
    pub entries: Vec<ManifestEntry>,
    /// Array positions holding something other than an object.
    pub rejected: Vec<usize>,
}

/// Parse fragment text.
///
/// `Err` means the text is not JSON at all. `Ok(None)` means it is JSON but
/// not an array, which contributes no entries.
pub fn parse_fragment(text: &str) -> Result<Option<ParsedFragment>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Ok(None);
    };

    let mut parsed = ParsedFragment::default();
    for (position, item) in items.into_iter().enumerate() {
        match ManifestEntry::from_json(item) {
            Ok(entry) => parsed.entries.push(entry),
            Err(_) => parsed.rejected.push(position),
        }
    }
    Ok(Some(parsed))
}

/// Something that keeps a fragment from being submittable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentProblem {
    Malformed(String),
    NotASequence,
    NotAnObject {
        position: usize,
    },
    MissingFields {
        position: usize,
        fields: Vec<RequiredField>,
    },
    /// Present, but not a string (or, for `issue`, an integer or string).
    MistypedFields {
        position: usize,
        fields: Vec<RequiredField>,
    },
}

impl fmt::Display for FragmentProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentProblem::Malformed(msg) => write!(f, "not valid JSON: {msg}"),
            FragmentProblem::NotASequence => write!(f, "top level is not an array"),
            FragmentProblem::NotAnObject { position } => {
                write!(f, "element {position} is not an object")
            }
            FragmentProblem::MissingFields { position, fields } => {
                let keys: Vec<_> = fields.iter().map(|k| k.key()).collect();
                write!(f, "element {position} is missing {}", keys.join(", "))
            }
            FragmentProblem::MistypedFields { position, fields } => {
                let keys: Vec<_> = fields.iter().map(|k| k.key()).collect();
                write!(f, "element {position} has the wrong type for {}", keys.join(", "))
            }
        }
    }
}

/// Result of checking one fragment file.
#[derive(Debug, Clone)]
pub struct FragmentReport {
    pub path: PathBuf,
    pub entries: usize,
    pub problems: Vec<FragmentProblem>,
}

impl FragmentReport {
    pub fn is_submittable(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check a fragment file against the entry schema.
///
/// Only an unreadable file is an `Err`; everything wrong with the content is
/// reported in [`FragmentReport::problems`].
pub fn validate_fragment(path: &Path) -> Result<FragmentReport, CatalogueError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut report = FragmentReport {
        path: path.to_path_buf(),
        entries: 0,
        problems: Vec::new(),
    };

    let value: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            report.problems.push(FragmentProblem::Malformed(e.to_string()));
            return Ok(report);
        }
    };
    let Value::Array(items) = value else {
        report.problems.push(FragmentProblem::NotASequence);
        return Ok(report);
    };

    report.entries = items.len();
    for (position, item) in items.into_iter().enumerate() {
        match ManifestEntry::from_json(item) {
            Ok(entry) => {
                let fields = entry.missing_fields();
                if !fields.is_empty() {
                    report
                        .problems
                        .push(FragmentProblem::MissingFields { position, fields });
                }
                let fields = entry.mistyped_fields();
                if !fields.is_empty() {
                    report
                        .problems
                        .push(FragmentProblem::MistypedFields { position, fields });
                }
            }
            Err(_) => report
                .problems
                .push(FragmentProblem::NotAnObject { position }),
        }
    }

    debug!(
        path = %path.display(),
        entries = report.entries,
        problems = report.problems.len(),
        "Validated fragment"
    );
    Ok(report)
}

/// Write a new fragment `<dir>/<name>.json` holding `entries`.
///
/// Every entry must be complete. Existing fragments are never overwritten.
pub fn write_fragment(
    dir: &Path,
    name: &str,
    entries: &[ManifestEntry],
) -> Result<PathBuf, CatalogueError> {
    let stem = name.strip_suffix(".json").unwrap_or(name);
    if stem.is_empty()
        || stem.starts_with('.')
        || stem.contains(['/', '\\', '\0'])
    {
        return Err(CatalogueError::InvalidFragmentName {
            name: name.to_string(),
        });
    }

    for entry in entries {
        let missing = entry.missing_fields();
        if !missing.is_empty() {
            return Err(CatalogueError::InvalidEntry { missing });
        }
        let mistyped = entry.mistyped_fields();
        if !mistyped.is_empty() {
            return Err(CatalogueError::MistypedEntry { fields: mistyped });
        }
    }

    let path = dir.join(format!("{stem}.json"));
    if !dir.is_dir() {
        return Err(CatalogueError::MissingDirectory { path });
    }

    let text = render_manifest(entries)?;
    match parse_fragment(&text) {
        Ok(Some(parsed)) if parsed.entries == entries && parsed.rejected.is_empty() => {}
        _ => return Err(CatalogueError::RoundTrip),
    }

    fsutil::write_atomic_new(&path, text.as_bytes()).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            CatalogueError::FragmentExists { path: path.clone() }
        } else {
            CatalogueError::Io {
                path: path.clone(),
                source,
            }
        }
    })?;

    info!(path = %path.display(), entries = entries.len(), "Fragment written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entry(issue: &str, artifact: &str) -> ManifestEntry {
        ManifestEntry::new(issue, artifact, "x", "y", "2025-01-01")
    }

    #[test]
    fn test_parse_fragment_array() {
        let parsed = parse_fragment(r#"[{"issue": 1, "artifact": "a.md"}, 7, {"issue": 2}]"#)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.rejected, vec![1]);
    }

    #[test]
    fn test_parse_fragment_non_array_is_none() {
        assert!(parse_fragment(r#"{"issue": 1}"#).unwrap().is_none());
        assert!(parse_fragment("42").unwrap().is_none());
    }

    #[test]
    fn test_parse_fragment_malformed_is_err() {
        assert!(parse_fragment(r#"[{"issue": 1,"#).is_err());
    }

    #[test]
    fn test_validate_fragment_reports_each_problem() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f.json");
        std::fs::write(
            &path,
            r#"[
                {"issue": 1, "artifact": "a.md", "target": "x", "intent": "y", "created": "2025-01-01"},
                {"issue": 2, "artifact": "b.md", "target": "x", "intent": "y"},
                "stray"
            ]"#,
        )
        .unwrap();

        let report = validate_fragment(&path).unwrap();
        assert_eq!(report.entries, 3);
        assert!(!report.is_submittable());
        assert_eq!(
            report.problems,
            vec![
                FragmentProblem::MissingFields {
                    position: 1,
                    fields: vec![RequiredField::Created],
                },
                FragmentProblem::NotAnObject { position: 2 },
            ]
        );
    }

    #[test]
    fn test_validate_fragment_malformed_and_shape() {
        let tmp = TempDir::new().unwrap();
        let broken = tmp.path().join("broken.json");
        std::fs::write(&broken, "[{").unwrap();
        let report = validate_fragment(&broken).unwrap();
        assert!(matches!(report.problems[0], FragmentProblem::Malformed(_)));

        let object = tmp.path().join("object.json");
        std::fs::write(&object, "{}").unwrap();
        let report = validate_fragment(&object).unwrap();
        assert_eq!(report.problems, vec![FragmentProblem::NotASequence]);
    }

    #[test]
    fn test_validate_fragment_unreadable_is_err() {
        let tmp = TempDir::new().unwrap();
        assert!(validate_fragment(&tmp.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_write_fragment_roundtrips() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![entry("3", "a.md"), entry("4", "b.md")];

        let path = write_fragment(tmp.path(), "agent-3", &entries).unwrap();
        assert_eq!(path, tmp.path().join("agent-3.json"));

        let report = validate_fragment(&path).unwrap();
        assert!(report.is_submittable());
        assert_eq!(report.entries, 2);
    }

    #[test]
    fn test_write_fragment_rejects_incomplete_entry() {
        let tmp = TempDir::new().unwrap();
        let mut incomplete = entry("3", "a.md");
        incomplete.created = None;

        let err = write_fragment(tmp.path(), "agent-3", &[incomplete]).unwrap_err();
        assert!(matches!(err, CatalogueError::InvalidEntry { .. }));
        assert!(!tmp.path().join("agent-3.json").exists());
    }

    #[test]
    fn test_validate_fragment_reports_mistyped_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f.json");
        std::fs::write(
            &path,
            r#"[{"issue": 2.0, "artifact": "a.md", "target": "x", "intent": "y", "created": 20250101}]"#,
        )
        .unwrap();

        let report = validate_fragment(&path).unwrap();
        assert_eq!(
            report.problems,
            vec![FragmentProblem::MistypedFields {
                position: 0,
                fields: vec![RequiredField::Issue, RequiredField::Created],
            }]
        );
        assert_eq!(
            report.problems[0].to_string(),
            "element 0 has the wrong type for issue, created"
        );
    }

    #[test]
    fn test_write_fragment_rejects_mistyped_entry() {
        let tmp = TempDir::new().unwrap();
        let mistyped = entry("3", "a.md").with_field("created", serde_json::json!(20250101));

        let err = write_fragment(tmp.path(), "agent-3", &[mistyped]).unwrap_err();
        assert!(matches!(err, CatalogueError::MistypedEntry { .. }));
        assert!(!tmp.path().join("agent-3.json").exists());
    }

    #[test]
    fn test_write_fragment_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        write_fragment(tmp.path(), "agent-3.json", &[entry("3", "a.md")]).unwrap();
        let err = write_fragment(tmp.path(), "agent-3", &[entry("9", "z.md")]).unwrap_err();
        assert!(matches!(err, CatalogueError::FragmentExists { .. }));
    }

    #[test]
    fn test_write_fragment_rejects_path_names() {
        let tmp = TempDir::new().unwrap();
        for name in ["", "../escape", "a/b", ".hidden"] {
            let err = write_fragment(tmp.path(), name, &[]).unwrap_err();
            assert!(matches!(err, CatalogueError::InvalidFragmentName { .. }));
        }
    }
}

//! Which artifacts exist for a target at each level.
//!
//! For target `slug`, level directories are `<root>/<category>/<slug>/`.
//! Each is listed non-recursively; a target need not have every level.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::level::Level;

/// One artifact file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInventoryEntry {
    pub filename: String,
    pub level: Level,
    pub path: PathBuf,
}

impl FileInventoryEntry {
    /// Category directory name of this file's level.
    pub fn category(&self) -> &'static str {
        self.level.category()
    }
}

/// Whether `slug` is usable as a single directory name.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug != "." && slug != ".." && !slug.contains(['/', '\\', '\0'])
}

/// List every artifact for `target` under `root`, sorted by level then file
/// name.
///
/// Missing level directories contribute nothing. Unreadable directories and
/// invalid slugs are logged and treated the same way, so the result is always
/// a (possibly empty) inventory.
pub fn scan_files(root: &Path, target: &str) -> Vec<FileInventoryEntry> {
    if !is_valid_slug(target) {
        warn!(slug = target, "Target slug is not a plain directory name, nothing to scan");
        return Vec::new();
    }

    let mut files = Vec::new();
    for level in Level::ALL {
        let dir = root.join(level.category()).join(target);
        if !dir.is_dir() {
            continue;
        }
        match list_level_dir(&dir, level) {
            Ok(found) => {
                debug!(dir = %dir.display(), count = found.len(), "Scanned level directory");
                files.extend(found);
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "Could not read level directory"),
        }
    }

    files.sort_by(|a, b| (a.level, &a.filename).cmp(&(b.level, &b.filename)));
    files
}

fn list_level_dir(dir: &Path, level: Level) -> std::io::Result<Vec<FileInventoryEntry>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let filename = entry.file_name().to_string_lossy().into_owned();

        // Skip dotfiles (.gitkeep and friends) and nested directories
        if filename.starts_with('.') || !path.is_file() {
            continue;
        }
        found.push(FileInventoryEntry {
            filename,
            level,
            path,
        });
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(root: &Path, category: &str, target: &str, name: &str) {
        let dir = root.join(category).join(target);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), format!("# {name}")).unwrap();
    }

    #[test]
    fn test_scan_sorts_by_level_then_name() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "backlog", "t", "todo.md");
        touch(tmp.path(), "atomic", "t", "b.md");
        touch(tmp.path(), "atomic", "t", "a.md");
        touch(tmp.path(), "analyses", "t", "z.md");

        let files = scan_files(tmp.path(), "t");
        let got: Vec<_> = files
            .iter()
            .map(|f| (f.level.number(), f.filename.as_str()))
            .collect();
        assert_eq!(got, vec![(1, "z.md"), (2, "a.md"), (2, "b.md"), (5, "todo.md")]);
    }

    #[test]
    fn test_scan_only_matching_target() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "analyses", "t", "mine.md");
        touch(tmp.path(), "analyses", "other", "theirs.md");

        let files = scan_files(tmp.path(), "t");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, tmp.path().join("analyses/t/mine.md"));
    }

    #[test]
    fn test_scan_is_not_recursive_and_skips_dotfiles() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "distillations", "t", "d.md");
        touch(tmp.path(), "distillations", "t", ".gitkeep");
        std::fs::create_dir_all(tmp.path().join("distillations/t/nested")).unwrap();
        std::fs::write(tmp.path().join("distillations/t/nested/deep.md"), "x").unwrap();

        let files = scan_files(tmp.path(), "t");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "d.md");
        assert_eq!(files[0].category(), "distillations");
    }

    #[test]
    fn test_scan_missing_target_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_files(tmp.path(), "nothing-here").is_empty());
        assert!(scan_files(&tmp.path().join("no-root"), "t").is_empty());
    }

    #[test]
    fn test_scan_rejects_traversal_slugs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "analyses", "t", "a.md");
        assert!(scan_files(&tmp.path().join("atomic"), "../analyses/t").is_empty());
        assert!(scan_files(tmp.path(), "..").is_empty());
        assert!(scan_files(tmp.path(), "").is_empty());
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("claude-agent-mcp-skills"));
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug("."));
    }
}

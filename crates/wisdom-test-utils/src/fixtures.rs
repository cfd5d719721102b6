//! On-disk fixtures backed by temporary directories.
//!
//! Both fixtures own their [`TempDir`], so everything they create is removed
//! when the fixture is dropped, even on panic.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

/// A temporary catalogue: `fragments/` plus manifest and index paths.
///
/// The fragments directory exists; the manifest and index do not until
/// something writes them.
pub struct CatalogueFixture {
    dir: TempDir,
}

impl CatalogueFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir(dir.path().join("fragments")).expect("failed to create fragments dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn fragments_dir(&self) -> PathBuf {
        self.dir.path().join("fragments")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("manifest.json")
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.path().join("index.md")
    }

    /// Write `value` as the fragment `fragments/<name>`.
    pub fn write_fragment_json(&self, name: &str, value: &Value) -> PathBuf {
        let text = serde_json::to_string_pretty(value).expect("failed to serialize fragment");
        self.write_fragment_raw(name, &text)
    }

    /// Write arbitrary text as `fragments/<name>` (for malformed fragments).
    pub fn write_fragment_raw(&self, name: &str, text: &str) -> PathBuf {
        let path = self.fragments_dir().join(name);
        std::fs::write(&path, text).expect("failed to write fragment");
        path
    }

    /// Write any file under the fixture root.
    pub fn write_file(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        std::fs::write(&path, text).expect("failed to write file");
        path
    }

    pub fn read_manifest(&self) -> String {
        std::fs::read_to_string(self.manifest_path()).expect("failed to read manifest")
    }

    pub fn read_index(&self) -> String {
        std::fs::read_to_string(self.index_path()).expect("failed to read index")
    }
}

impl Default for CatalogueFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete entry object with the given issue and artifact.
pub fn entry_json(issue: Value, artifact: &str) -> Value {
    json!({
        "issue": issue,
        "artifact": artifact,
        "target": "claude-agent-mcp-skills",
        "intent": "Extract skills patterns",
        "created": "2025-11-20",
    })
}

/// A temporary leveled library tree.
pub struct LibraryFixture {
    dir: TempDir,
}

impl LibraryFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create `<category>/<target>/<filename>` with `contents`.
    pub fn add(&self, category: &str, target: &str, filename: &str, contents: &str) -> PathBuf {
        let dir = self.dir.path().join(category).join(target);
        std::fs::create_dir_all(&dir).expect("failed to create category dir");
        let path = dir.join(filename);
        std::fs::write(&path, contents).expect("failed to write artifact");
        path
    }

    /// Create an empty `<category>/<target>/<filename>`.
    pub fn touch(&self, category: &str, target: &str, filename: &str) -> PathBuf {
        self.add(category, target, filename, "")
    }
}

impl Default for LibraryFixture {
    fn default() -> Self {
        Self::new()
    }
}

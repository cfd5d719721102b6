//! Whole-file replacement that never leaves a half-written target behind.
//!
//! Contents go to a temp file created next to the target (same filesystem),
//! are synced, and only then renamed over the target. Readers see either the
//! old file or the new one.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn stage(path: &Path, contents: &[u8]) -> io::Result<NamedTempFile> {
    // Missing destination directories are an error, not something to create.
    let mut temp = NamedTempFile::new_in(parent_dir(path))?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// Atomically replace `path` with `contents`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp = stage(path, contents)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Atomically create `path` with `contents`, failing with
/// [`io::ErrorKind::AlreadyExists`] if something is already there.
pub fn write_atomic_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp = stage(path, contents)?;
    temp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

/// Whether the directory `path` would be written into exists.
pub fn parent_exists(path: &Path) -> bool {
    parent_dir(path).is_dir()
}

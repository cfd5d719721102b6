//! Leveled context assembly for one target.
//!
//! Artifacts live in five category directories, one per knowledge level, each
//! with a subdirectory per investigation target:
//!
//! ```text
//! <root>/
//! ├── analyses/<target>/        Level 1
//! ├── atomic/<target>/          Level 2
//! ├── process_memory/<target>/  Level 3
//! ├── distillations/<target>/   Level 4
//! └── backlog/<target>/         Level 5
//! ```
//!
//! [`scan_files`] lists them as a sorted inventory, [`generate_toc`] renders
//! the grouped table of contents, and [`assemble_context`] combines both with
//! the file contents into a single document.

pub mod document;
pub mod inventory;
pub mod level;
pub mod toc;

pub use document::{ContextDocument, SectionBody, assemble_context};
pub use inventory::{FileInventoryEntry, is_valid_slug, scan_files};
pub use level::{Level, UnknownCategory};
pub use toc::generate_toc;

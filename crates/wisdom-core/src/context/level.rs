//! The five knowledge levels and their category directories.
//!
//! The level ↔ category pairing is fixed: every call site goes through
//! [`Level`] instead of matching on directory names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A position in the knowledge hierarchy. Ordering follows the level number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Analyses = 1,
    Atomic = 2,
    ProcessMemory = 3,
    Distillations = 4,
    Backlog = 5,
}

impl Level {
    /// All levels, in level order.
    pub const ALL: [Level; 5] = [
        Level::Analyses,
        Level::Atomic,
        Level::ProcessMemory,
        Level::Distillations,
        Level::Backlog,
    ];

    /// Level number, 1 through 5.
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.number() == n)
    }

    /// Category directory name, e.g. `process_memory`.
    pub fn category(self) -> &'static str {
        match self {
            Level::Analyses => "analyses",
            Level::Atomic => "atomic",
            Level::ProcessMemory => "process_memory",
            Level::Distillations => "distillations",
            Level::Backlog => "backlog",
        }
    }

    pub fn from_category(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.category() == name)
    }

    /// Title-cased label, e.g. `Process Memory`.
    pub fn label(self) -> &'static str {
        match self {
            Level::Analyses => "Analyses",
            Level::Atomic => "Atomic",
            Level::ProcessMemory => "Process Memory",
            Level::Distillations => "Distillations",
            Level::Backlog => "Backlog",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

/// Error returned when a string names no category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Level {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_category(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_level_category_bijection() {
        let pairs: Vec<_> = Level::ALL
            .iter()
            .map(|l| (l.number(), l.category()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (1, "analyses"),
                (2, "atomic"),
                (3, "process_memory"),
                (4, "distillations"),
                (5, "backlog"),
            ]
        );
        for level in Level::ALL {
            assert_eq!(Level::from_number(level.number()), Some(level));
            assert_eq!(Level::from_category(level.category()), Some(level));
        }
    }

    #[test]
    fn test_level_out_of_range() {
        assert_eq!(Level::from_number(0), None);
        assert_eq!(Level::from_number(6), None);
        assert!("summaries".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_ordering_matches_numbers() {
        assert!(Level::Analyses < Level::Atomic);
        assert!(Level::Distillations < Level::Backlog);
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(Level::ProcessMemory.label(), "Process Memory");
        assert_eq!(Level::Atomic.label(), "Atomic");
        assert_eq!("process_memory".parse::<Level>(), Ok(Level::ProcessMemory));
    }

    #[test]
    fn test_level_serde_uses_category() {
        assert_eq!(
            serde_json::to_string(&Level::ProcessMemory).unwrap(),
            "\"process_memory\""
        );
    }
}

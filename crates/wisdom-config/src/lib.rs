#![deny(unsafe_code)]

//! Configuration loading and validation for the Wisdom Library tooling.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`WisdomConfig`] type as the central configuration structure.
//! Every section is optional; a missing file or an empty one yields the
//! conventional repository layout (`catalogue/fragments`, `catalogue/manifest.json`,
//! `catalogue/index.md`, level directories under the repository root).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WisdomConfig {
    /// Fragment, manifest and index locations.
    #[serde(default)]
    pub catalogue: CatalogueConfig,

    /// Leveled artifact tree.
    #[serde(default)]
    pub library: LibraryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the catalogue lives and how its outputs are rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// Directory scanned for fragment files.
    #[serde(default = "default_fragments_dir")]
    pub fragments_dir: PathBuf,

    /// Canonical manifest written by consolidation.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// Rendered human-readable index.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// File extension (without the dot) that marks a file as a fragment.
    #[serde(default = "default_fragment_extension")]
    pub fragment_extension: String,

    /// Heading written at the top of the index.
    #[serde(default = "default_index_title")]
    pub index_title: String,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            fragments_dir: default_fragments_dir(),
            manifest_path: default_manifest_path(),
            index_path: default_index_path(),
            fragment_extension: default_fragment_extension(),
            index_title: default_index_title(),
        }
    }
}

fn default_fragments_dir() -> PathBuf {
    PathBuf::from("catalogue/fragments")
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("catalogue/manifest.json")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("catalogue/index.md")
}

fn default_fragment_extension() -> String {
    "json".to_string()
}

fn default_index_title() -> String {
    "Wisdom Library Catalogue Index".to_string()
}

/// The five-level artifact tree scanned by context assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory holding `analyses/`, `atomic/`, `process_memory/`,
    /// `distillations/` and `backlog/`.
    #[serde(default = "default_library_root")]
    pub root: PathBuf,

    /// Whether the generated context document embeds file contents, or
    /// only the table of contents.
    #[serde(default = "default_include_contents")]
    pub include_contents: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_library_root(),
            include_contents: default_include_contents(),
        }
    }
}

fn default_library_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_include_contents() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl WisdomConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: WisdomConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("catalogue.fragments_dir", &self.catalogue.fragments_dir),
            ("catalogue.manifest_path", &self.catalogue.manifest_path),
            ("catalogue.index_path", &self.catalogue.index_path),
            ("library.root", &self.library.root),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        if self.catalogue.manifest_path == self.catalogue.index_path {
            return Err(ConfigError::Validation(
                "catalogue.manifest_path and catalogue.index_path must differ".to_string(),
            ));
        }

        let ext = &self.catalogue.fragment_extension;
        if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "catalogue.fragment_extension must be a bare extension like \"json\", got {ext:?}"
            )));
        }
        if self.catalogue.index_title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalogue.index_title must not be empty".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}

//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`WisdomConfig`] values
//! without repeating boilerplate across crate boundaries.

use std::path::Path;

use wisdom_config::WisdomConfig;

/// Fluent builder for [`WisdomConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let fixture = CatalogueFixture::new();
/// let config = TestConfigBuilder::new()
///     .catalogue_in(fixture.root())
///     .index_title("Research Index")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: WisdomConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: WisdomConfig::default(),
        }
    }

    /// Point all catalogue paths at the conventional names under `dir`.
    pub fn catalogue_in(mut self, dir: &Path) -> Self {
        self.config.catalogue.fragments_dir = dir.join("fragments");
        self.config.catalogue.manifest_path = dir.join("manifest.json");
        self.config.catalogue.index_path = dir.join("index.md");
        self
    }

    pub fn fragment_extension(mut self, extension: &str) -> Self {
        self.config.catalogue.fragment_extension = extension.to_string();
        self
    }

    pub fn index_title(mut self, title: &str) -> Self {
        self.config.catalogue.index_title = title.to_string();
        self
    }

    pub fn library_root(mut self, root: &Path) -> Self {
        self.config.library.root = root.to_path_buf();
        self
    }

    pub fn include_contents(mut self, include: bool) -> Self {
        self.config.library.include_contents = include;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> WisdomConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

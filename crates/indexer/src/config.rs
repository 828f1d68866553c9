//! Indexer configuration.
//!
//! Loaded from `scaffold.toml` at the project root when present. Every key is
//! optional:
//!
//! ```toml
//! language = "python"
//! ignore_file = ".scaffoldignore"
//! state_dir = ".scaffold"
//! store_file = "graph.json"
//! debounce_ms = 2000
//! poll_interval_ms = 2000
//! backup_suffix = "~"
//! ```

use crate::error::{IndexerError, Result};
use scaffold_parser::SourceLanguage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the project-level configuration file
pub const CONFIG_FILE_NAME: &str = "scaffold.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Source language analyzed in a run
    pub language: String,
    /// Per-directory ignore-rule file name
    pub ignore_file: String,
    /// Directory under the root that holds the store; never indexed or watched
    pub state_dir: String,
    /// Store file name inside `state_dir`
    pub store_file: String,
    pub debounce_ms: u64,
    /// Poll interval of the fallback notify backend
    pub poll_interval_ms: u64,
    /// Paths ending with this suffix are editor backups and never trigger a run
    pub backup_suffix: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
            ignore_file: ".scaffoldignore".to_string(),
            state_dir: ".scaffold".to_string(),
            store_file: "graph.json".to_string(),
            debounce_ms: 2000,
            poll_interval_ms: 2000,
            backup_suffix: "~".to_string(),
        }
    }
}

impl IndexerConfig {
    /// Read a TOML file; missing keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// `<root>/scaffold.toml` when it exists, defaults otherwise
    pub fn discover(root: impl AsRef<Path>) -> Result<Self> {
        let candidate = root.as_ref().join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.source_language()?;
        for (key, value) in [
            ("ignore_file", &self.ignore_file),
            ("state_dir", &self.state_dir),
            ("store_file", &self.store_file),
        ] {
            if value.trim().is_empty() {
                return Err(IndexerError::ConfigError(format!("{key} must not be empty")));
            }
        }
        if self.debounce_ms == 0 {
            return Err(IndexerError::ConfigError(
                "debounce_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn source_language(&self) -> Result<SourceLanguage> {
        SourceLanguage::from_name(&self.language)
            .map_err(|e| IndexerError::ConfigError(e.to_string()))
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    #[must_use]
    pub fn state_path(&self, root: &Path) -> PathBuf {
        root.join(&self.state_dir)
    }

    /// Location of the JSON store file for `root`
    #[must_use]
    pub fn store_path(&self, root: &Path) -> PathBuf {
        self.state_path(root).join(&self.store_file)
    }
}

//! Engine settings
//!
//! Defines the serde schema for `config/carbon-desk.yaml`.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::error::{ConfigResult, ConfigurationError};
use crate::status::{StatusClassifier, StatusVocabularies};

/// Environment variable naming the settings file
pub const CONFIG_ENV_VAR: &str = "CARBON_DESK_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rows per table page when a screen doesn't ask for one (default: 10)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound on requested page sizes (default: 200)
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Fail on status tokens outside every vocabulary instead of showing `info`
    #[serde(default)]
    pub strict_status: bool,

    /// External vocabulary tables; the built-in tables when absent
    #[serde(default)]
    pub vocabularies: Option<PathBuf>,
}

fn default_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    200
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            strict_status: false,
            vocabularies: None,
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::load_from_str(&content)
    }

    /// Load from a YAML string
    pub fn load_from_str(yaml: &str) -> ConfigResult<Self> {
        let config: EngineConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `CARBON_DESK_CONFIG`, or defaults when unset
    pub fn from_env() -> ConfigResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                tracing::debug!(path = ?path, "loading engine config");
                Self::load_from_file(Path::new(&path))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(ConfigurationError::InvalidPageSize);
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigurationError::Parse(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }

    pub fn page_size(&self) -> ConfigResult<NonZeroUsize> {
        NonZeroUsize::new(self.default_page_size).ok_or(ConfigurationError::InvalidPageSize)
    }

    /// Resolve a requested page size: default when absent, capped at the maximum
    pub fn resolve_page_size(&self, requested: Option<usize>) -> ConfigResult<NonZeroUsize> {
        let size = requested.unwrap_or(self.default_page_size).min(self.max_page_size);
        NonZeroUsize::new(size).ok_or(ConfigurationError::InvalidPageSize)
    }

    /// Vocabulary tables this config points at
    pub fn load_vocabularies(&self) -> ConfigResult<StatusVocabularies> {
        match &self.vocabularies {
            Some(path) => StatusVocabularies::load_from_file(path),
            None => StatusVocabularies::builtin(),
        }
    }

    pub fn build_classifier(&self) -> ConfigResult<StatusClassifier> {
        StatusClassifier::from_vocabularies(&self.load_vocabularies()?)
    }
}

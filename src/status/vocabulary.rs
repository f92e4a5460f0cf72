//! Status vocabulary tables
//!
//! Loads the code -> tier and label -> tier tables from YAML. Adding a screen
//! with a new status vocabulary means adding a block to
//! `config/status-vocabularies.yaml`, not touching classification code.

use ledger_types::StatusTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigResult, ConfigurationError};

const BUILTIN_VOCABULARIES: &str = include_str!("../../config/status-vocabularies.yaml");

/// Root configuration for status vocabularies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusVocabularies {
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub vocabularies: BTreeMap<String, Vocabulary>,
}

/// One screen's status vocabulary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub description: String,
    /// Internal enum codes, matched case-insensitively
    #[serde(default)]
    pub codes: BTreeMap<String, StatusTier>,
    /// Localized display labels, matched exactly
    #[serde(default)]
    pub labels: BTreeMap<String, StatusTier>,
}

impl StatusVocabularies {
    /// The tables shipped with the crate
    pub fn builtin() -> ConfigResult<Self> {
        Self::load_from_str(BUILTIN_VOCABULARIES)
    }

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
        serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Add or replace a vocabulary
    pub fn with_vocabulary(mut self, name: impl Into<String>, vocabulary: Vocabulary) -> Self {
        self.vocabularies.insert(name.into(), vocabulary);
        self
    }
}

impl Vocabulary {
    pub fn code(mut self, code: impl Into<String>, tier: StatusTier) -> Self {
        self.codes.insert(code.into(), tier);
        self
    }

    pub fn label(mut self, label: impl Into<String>, tier: StatusTier) -> Self {
        self.labels.insert(label.into(), tier);
        self
    }
}

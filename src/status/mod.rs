//! Status Classifier
//!
//! Maps a raw status token (enum code or localized display label, from any
//! screen's vocabulary) to one canonical [`StatusTier`]. Used both for badge
//! display and for tier-compared filter criteria.
//!
//! - Codes match case-insensitively, ignoring surrounding whitespace
//! - Labels match exactly
//! - Unknown tokens classify as [`StatusTier::Info`]; [`StatusClassifier::classify`]
//!   never fails. [`StatusClassifier::classify_strict`] is the only path that
//!   reports an unknown token.

mod vocabulary;

pub use vocabulary::{StatusVocabularies, Vocabulary};

use ledger_types::StatusTier;
use std::collections::HashMap;

use crate::error::{ConfigResult, ConfigurationError};

#[derive(Debug, Clone)]
struct TableEntry {
    tier: StatusTier,
    vocabulary: String,
}

/// Immutable lookup tables built from [`StatusVocabularies`]
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    /// Uppercased code -> entry
    codes: HashMap<String, TableEntry>,
    labels: HashMap<String, TableEntry>,
    /// Documented tokens in their original spelling
    tokens: Vec<(String, StatusTier)>,
    vocabulary_names: Vec<String>,
}

impl StatusClassifier {
    /// Classifier over the built-in vocabulary tables
    pub fn builtin() -> ConfigResult<Self> {
        Self::from_vocabularies(&StatusVocabularies::builtin()?)
    }

    /// Build lookup tables, rejecting tokens that map to two different tiers
    pub fn from_vocabularies(vocabularies: &StatusVocabularies) -> ConfigResult<Self> {
        let mut classifier = Self {
            codes: HashMap::new(),
            labels: HashMap::new(),
            tokens: Vec::new(),
            vocabulary_names: vocabularies.vocabularies.keys().cloned().collect(),
        };

        for (name, vocabulary) in &vocabularies.vocabularies {
            for (code, tier) in &vocabulary.codes {
                insert_entry(&mut classifier.codes, normalize_code(code), code, *tier, name)?;
                classifier.tokens.push((code.clone(), *tier));
            }
            for (label, tier) in &vocabulary.labels {
                insert_entry(&mut classifier.labels, label.clone(), label, *tier, name)?;
                classifier.tokens.push((label.clone(), *tier));
            }
        }

        tracing::debug!(
            vocabularies = classifier.vocabulary_names.len(),
            codes = classifier.codes.len(),
            labels = classifier.labels.len(),
            "status classifier built"
        );

        Ok(classifier)
    }

    /// Classify a raw token, defaulting to [`StatusTier::Info`]
    pub fn classify(&self, raw: &str) -> StatusTier {
        match self.lookup(raw) {
            Some(tier) => tier,
            None => {
                tracing::trace!(token = raw, "unrecognized status token, using info tier");
                StatusTier::Info
            }
        }
    }

    /// Classify a raw token, failing on tokens outside every vocabulary
    pub fn classify_strict(&self, raw: &str) -> ConfigResult<StatusTier> {
        self.lookup(raw)
            .ok_or_else(|| ConfigurationError::UnknownStatus {
                token: raw.to_string(),
            })
    }

    pub fn is_known(&self, raw: &str) -> bool {
        self.lookup(raw).is_some()
    }

    /// Every documented token with its tier, in vocabulary order
    pub fn tokens(&self) -> &[(String, StatusTier)] {
        &self.tokens
    }

    pub fn vocabulary_names(&self) -> &[String] {
        &self.vocabulary_names
    }

    /// Which vocabulary first documented this token
    pub fn vocabulary_of(&self, raw: &str) -> Option<&str> {
        self.labels
            .get(raw)
            .or_else(|| self.codes.get(&normalize_code(raw)))
            .map(|entry| entry.vocabulary.as_str())
    }

    fn lookup(&self, raw: &str) -> Option<StatusTier> {
        if let Some(entry) = self.labels.get(raw) {
            return Some(entry.tier);
        }
        self.codes.get(&normalize_code(raw)).map(|entry| entry.tier)
    }
}

fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn insert_entry(
    table: &mut HashMap<String, TableEntry>,
    key: String,
    token: &str,
    tier: StatusTier,
    vocabulary: &str,
) -> ConfigResult<()> {
    if let Some(existing) = table.get(&key) {
        if existing.tier != tier {
            return Err(ConfigurationError::ConflictingToken {
                token: token.to_string(),
                first: existing.tier.to_string(),
                first_vocabulary: existing.vocabulary.clone(),
                second: tier.to_string(),
                second_vocabulary: vocabulary.to_string(),
            });
        }
        return Ok(());
    }

    table.insert(
        key,
        TableEntry {
            tier,
            vocabulary: vocabulary.to_string(),
        },
    );
    Ok(())
}

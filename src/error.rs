//! Error handling for the carbon-desk engine
//!
//! Two families, matching how callers recover:
//! - [`ConfigurationError`]: a programming or data-table defect (unknown field,
//!   conflicting vocabulary). Surfaced to the developer, not recoverable locally.
//! - [`ValidationError`]: a ledger draft the form must not save. Carries the
//!   offending field and reason so the form can highlight it.

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

use ledger_types::RecordKind;

/// Umbrella error for callers that drive several engine components
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Schema, vocabulary and settings defects
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Unknown field '{field}' for {kind} records")]
    UnknownField { field: String, kind: RecordKind },

    #[error("Unknown sort field '{field}' for {kind} records")]
    UnknownSortField { field: String, kind: RecordKind },

    #[error("Criterion '{criterion}' compares tiers on '{field}', which is not a status field")]
    TierComparisonOnNonStatusField { criterion: String, field: String },

    #[error("Criterion '{criterion}' names unknown status tier '{tier}'")]
    UnknownTier { criterion: String, tier: String },

    #[error("Criterion '{criterion}' has non-numeric range bound '{bound}' on amount field '{field}'")]
    InvalidRangeBound {
        criterion: String,
        field: String,
        bound: String,
    },

    #[error("Criterion '{criterion}' has non-numeric operand '{operand}' on amount field '{field}'")]
    InvalidAmountOperand {
        criterion: String,
        field: String,
        operand: String,
    },

    #[error("Status token '{token}' is not in any vocabulary")]
    UnknownStatus { token: String },

    #[error("Status token '{token}' maps to {first} in '{first_vocabulary}' but {second} in '{second_vocabulary}'")]
    ConflictingToken {
        token: String,
        first: String,
        first_vocabulary: String,
        second: String,
        second_vocabulary: String,
    },

    #[error("Page size must be a positive integer")]
    InvalidPageSize,

    #[error("Failed to read file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Parse(String),
}

/// Why a ledger draft was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    Missing,
    NotANumber { input: String },
    Negative,
    InvalidDate { input: String },
    /// Beyond the representable decimal range
    OutOfRange,
    /// `available + locked + frozen` exceeds `total` by `excess`
    OverAllocated { excess: Decimal },
}

impl ValidationReason {
    /// Stable machine-readable code for the form layer
    pub fn code(&self) -> &'static str {
        match self {
            ValidationReason::Missing => "missing",
            ValidationReason::NotANumber { .. } => "not-a-number",
            ValidationReason::Negative => "negative",
            ValidationReason::InvalidDate { .. } => "invalid-date",
            ValidationReason::OutOfRange => "out-of-range",
            ValidationReason::OverAllocated { .. } => "over-allocated",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::NotANumber { input } => write!(f, "not-a-number ('{}')", input),
            ValidationReason::InvalidDate { input } => write!(f, "invalid-date ('{}')", input),
            ValidationReason::OverAllocated { excess } => {
                write!(f, "over-allocated (excess {})", excess.normalize())
            }
            other => write!(f, "{}", other.code()),
        }
    }
}

/// A ledger draft that must not be persisted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;

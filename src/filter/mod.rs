//! Predicate Filter Pipeline
//!
//! Composes the active criteria of a [`CriteriaSet`] into one pass over a
//! record collection. Output preserves input order and never mutates the input.
//!
//! # Pipeline
//!
//! ```text
//! CriteriaSet ──► compile (schema check, skip inert) ──► Vec<CompiledCriterion>
//!                                                              │
//! &[Record] ───────────────────────────────────────────────────┴──► matching indices
//! ```
//!
//! Criteria run in declared order. Compilation fails with a
//! [`ConfigurationError`] on unknown fields, so a typo never silently hides rows.

mod criteria;
mod sort;

pub use criteria::{CompareOn, CriteriaSet, Criterion, NamedCriterion, Predicate, ALL_SENTINEL};
pub use sort::{SortDirection, SortSpec};

use ledger_types::{FieldValue, Record, RecordKind, StatusTier};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ConfigResult, ConfigurationError};
use crate::schema::{FieldType, RecordSchema};
use crate::status::StatusClassifier;
use criteria::is_unbounded;

/// Criterion checked against the schema, ready to evaluate
#[derive(Debug, Clone)]
enum Matcher {
    EqualsToken(String),
    EqualsTier(StatusTier),
    InSetToken(HashSet<String>),
    InSetTier(HashSet<StatusTier>),
    /// Numeric equality on amount columns, so `5` matches `5.0`
    EqualsAmount(Decimal),
    InSetAmount(Vec<Decimal>),
    /// Inclusive lexicographic bounds on the rendered value (ISO dates, text)
    RangeText {
        from: Option<String>,
        to: Option<String>,
    },
    RangeAmount {
        from: Option<Decimal>,
        to: Option<Decimal>,
    },
    /// Lowercased needle
    Contains(String),
}

#[derive(Debug, Clone)]
struct CompiledCriterion {
    field: String,
    matcher: Matcher,
}

/// Filters records of one variant
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    schema: RecordSchema,
    classifier: Arc<StatusClassifier>,
}

impl FilterPipeline {
    pub fn new(kind: RecordKind, classifier: Arc<StatusClassifier>) -> Self {
        Self {
            schema: RecordSchema::for_kind(kind),
            classifier,
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn classifier(&self) -> &StatusClassifier {
        &self.classifier
    }

    /// Records matching every active criterion, in input order
    pub fn apply(&self, records: &[Record], criteria: &CriteriaSet) -> ConfigResult<Vec<Record>> {
        let indices = self.matching_indices(records, criteria)?;
        Ok(indices.into_iter().map(|i| records[i].clone()).collect())
    }

    /// Indices of the records matching every active criterion, ascending
    pub fn matching_indices(
        &self,
        records: &[Record],
        criteria: &CriteriaSet,
    ) -> ConfigResult<Vec<usize>> {
        let compiled = self.compile(criteria)?;

        let indices: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| compiled.iter().all(|c| self.matches(c, record)))
            .map(|(i, _)| i)
            .collect();

        tracing::debug!(
            kind = %self.schema.kind,
            criteria = criteria.len(),
            active = compiled.len(),
            input = records.len(),
            matched = indices.len(),
            "filter pass"
        );

        Ok(indices)
    }

    /// Check criteria against the schema without running them
    pub fn validate(&self, criteria: &CriteriaSet) -> ConfigResult<()> {
        self.compile(criteria).map(|_| ())
    }

    /// Validate a sort spec against the schema
    pub fn validate_sort(&self, sort: &SortSpec) -> ConfigResult<()> {
        match self.schema.field(&sort.field) {
            Some(_) => Ok(()),
            None => Err(ConfigurationError::UnknownSortField {
                field: sort.field.clone(),
                kind: self.schema.kind,
            }),
        }
    }

    /// Stable-sort matched indices by a column
    pub fn sort_indices(
        &self,
        indices: &mut [usize],
        records: &[Record],
        sort: &SortSpec,
    ) -> ConfigResult<()> {
        self.validate_sort(sort)?;
        sort::sort_indices(indices, records, sort);
        Ok(())
    }

    fn compile(&self, criteria: &CriteriaSet) -> ConfigResult<Vec<CompiledCriterion>> {
        let mut compiled = Vec::new();
        for entry in criteria.iter() {
            // Unknown fields fail even when the operand is the sentinel
            let spec = self.schema.require_field(&entry.criterion.field)?;
            if entry.criterion.is_inert() {
                continue;
            }
            let matcher = compile_matcher(&entry.name, spec.field_type, &entry.criterion)?;
            compiled.push(CompiledCriterion {
                field: entry.criterion.field.clone(),
                matcher,
            });
        }
        Ok(compiled)
    }

    fn matches(&self, criterion: &CompiledCriterion, record: &Record) -> bool {
        let Some(value) = record.get(&criterion.field) else {
            return false;
        };

        match &criterion.matcher {
            Matcher::EqualsToken(expected) => value.render() == *expected,
            Matcher::EqualsTier(tier) => self.classifier.classify(&value.render()) == *tier,
            Matcher::InSetToken(options) => options.contains(&value.render()),
            Matcher::InSetTier(tiers) => tiers.contains(&self.classifier.classify(&value.render())),
            Matcher::EqualsAmount(expected) => value.as_amount() == Some(*expected),
            Matcher::InSetAmount(options) => value
                .as_amount()
                .is_some_and(|amount| options.contains(&amount)),
            Matcher::RangeText { from, to } => {
                let rendered = value.render();
                from.as_ref().is_none_or(|f| rendered.as_str() >= f.as_str())
                    && to.as_ref().is_none_or(|t| rendered.as_str() <= t.as_str())
            }
            Matcher::RangeAmount { from, to } => match value {
                FieldValue::Amount(amount) => {
                    from.is_none_or(|f| amount >= f) && to.is_none_or(|t| amount <= t)
                }
                _ => false,
            },
            Matcher::Contains(needle) => value.render().to_lowercase().contains(needle.as_str()),
        }
    }
}

fn compile_matcher(
    name: &str,
    field_type: FieldType,
    criterion: &Criterion,
) -> ConfigResult<Matcher> {
    let on_tier = criterion.compare_on == CompareOn::Tier;
    if on_tier && field_type != FieldType::Status {
        return Err(ConfigurationError::TierComparisonOnNonStatusField {
            criterion: name.to_string(),
            field: criterion.field.clone(),
        });
    }

    let parse_tier = |raw: &str| {
        StatusTier::from_str(raw).map_err(|_| ConfigurationError::UnknownTier {
            criterion: name.to_string(),
            tier: raw.to_string(),
        })
    };

    let parse_amount = |raw: &str| {
        Decimal::from_str(raw.trim()).map_err(|_| ConfigurationError::InvalidAmountOperand {
            criterion: name.to_string(),
            field: criterion.field.clone(),
            operand: raw.to_string(),
        })
    };
    let is_amount = field_type == FieldType::Amount;

    let matcher = match &criterion.predicate {
        Predicate::Equals { value } if on_tier => Matcher::EqualsTier(parse_tier(value.as_str())?),
        Predicate::Equals { value } if is_amount => {
            Matcher::EqualsAmount(parse_amount(value.as_str())?)
        }
        Predicate::Equals { value } => Matcher::EqualsToken(value.clone()),
        Predicate::InSet { options } if on_tier => Matcher::InSetTier(
            options
                .iter()
                .map(|o| parse_tier(o.as_str()))
                .collect::<ConfigResult<_>>()?,
        ),
        Predicate::InSet { options } if is_amount => Matcher::InSetAmount(
            options
                .iter()
                .map(|o| parse_amount(o.as_str()))
                .collect::<ConfigResult<_>>()?,
        ),
        Predicate::InSet { options } => Matcher::InSetToken(options.iter().cloned().collect()),
        Predicate::Range { from, to } if is_amount => {
            let parse_bound = |bound: &Option<String>| -> ConfigResult<Option<Decimal>> {
                if is_unbounded(bound) {
                    return Ok(None);
                }
                let raw = bound.as_deref().unwrap_or_default();
                Decimal::from_str(raw.trim()).map(Some).map_err(|_| {
                    ConfigurationError::InvalidRangeBound {
                        criterion: name.to_string(),
                        field: criterion.field.clone(),
                        bound: raw.to_string(),
                    }
                })
            };
            Matcher::RangeAmount {
                from: parse_bound(from)?,
                to: parse_bound(to)?,
            }
        }
        Predicate::Range { from, to } => Matcher::RangeText {
            from: if is_unbounded(from) { None } else { from.clone() },
            to: if is_unbounded(to) { None } else { to.clone() },
        },
        Predicate::Contains { value } => Matcher::Contains(value.to_lowercase()),
    };

    Ok(matcher)
}

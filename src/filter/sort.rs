//! Column sorting applied after filtering

use ledger_types::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Stable-sort record indices by one field. Records missing the field sort last
/// in either direction.
pub(crate) fn sort_indices(indices: &mut [usize], records: &[Record], spec: &SortSpec) {
    indices.sort_by(|&a, &b| {
        let left = records[a].get(&spec.field);
        let right = records[b].get(&spec.field);
        match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(l), Some(r)) => {
                let ordering = compare_values(&l, &r);
                match spec.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
        }
    });
}

fn compare_values(left: &FieldValue, right: &FieldValue) -> Ordering {
    match (left, right) {
        (FieldValue::Amount(l), FieldValue::Amount(r)) => l.cmp(r),
        (FieldValue::Date(l), FieldValue::Date(r)) => l.cmp(r),
        _ => left.render().cmp(&right.render()),
    }
}

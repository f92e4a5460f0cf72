//! Filter criteria descriptors
//!
//! A criterion is `{field, operator, operand}` plus which vocabulary a status
//! comparison targets. Criteria sets are ordered and deserialize from YAML
//! lists, e.g.
//!
//! ```yaml
//! - name: status
//!   field: status
//!   operator: equals
//!   value: NORMAL
//! - name: expiry
//!   field: expiry_date
//!   operator: range
//!   from: "2025-01-01"
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Operand value that disables a criterion
pub const ALL_SENTINEL: &str = "all";

/// Operator and operand of a criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "snake_case")]
pub enum Predicate {
    /// Field value strictly equals the operand
    Equals { value: String },
    /// Inclusive bounds; a missing bound is unbounded on that side
    Range {
        #[serde(default)]
        from: Option<String>,
        #[serde(default)]
        to: Option<String>,
    },
    /// Case-insensitive substring match
    Contains { value: String },
    /// Membership in a finite option list
    InSet { options: Vec<String> },
}

/// Which vocabulary a status comparison targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOn {
    /// Compare raw tokens as stored
    #[default]
    Token,
    /// Classify the field and compare canonical tiers
    Tier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub field: String,
    #[serde(flatten)]
    pub predicate: Predicate,
    #[serde(default)]
    pub compare_on: CompareOn,
}

impl Criterion {
    pub fn new(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            field: field.into(),
            predicate,
            compare_on: CompareOn::Token,
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            field,
            Predicate::Equals {
                value: value.into(),
            },
        )
    }

    pub fn range(field: impl Into<String>, from: Option<&str>, to: Option<&str>) -> Self {
        Self::new(
            field,
            Predicate::Range {
                from: from.map(str::to_string),
                to: to.map(str::to_string),
            },
        )
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            field,
            Predicate::Contains {
                value: value.into(),
            },
        )
    }

    pub fn in_set<I, S>(field: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            field,
            Predicate::InSet {
                options: options.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Compare canonical tiers instead of raw tokens
    pub fn on_tier(mut self) -> Self {
        self.compare_on = CompareOn::Tier;
        self
    }

    /// True when the criterion matches every record and can be skipped
    pub fn is_inert(&self) -> bool {
        match &self.predicate {
            Predicate::Equals { value } => value == ALL_SENTINEL,
            Predicate::Contains { value } => value.is_empty() || value == ALL_SENTINEL,
            Predicate::Range { from, to } => is_unbounded(from) && is_unbounded(to),
            Predicate::InSet { options } => {
                options.is_empty() || options.iter().any(|o| o == ALL_SENTINEL)
            }
        }
    }
}

/// Missing, empty and `"all"` bounds are all unbounded
pub(crate) fn is_unbounded(bound: &Option<String>) -> bool {
    match bound {
        None => true,
        Some(b) => b.is_empty() || b == ALL_SENTINEL,
    }
}

/// Criterion with the name the screen registered it under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCriterion {
    pub name: String,
    #[serde(flatten)]
    pub criterion: Criterion,
}

/// Ordered mapping from criterion name to descriptor
///
/// Names are unique. A list that repeats a name keeps the first position and
/// the last descriptor, the same as calling [`CriteriaSet::set`] per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CriteriaSet {
    entries: Vec<NamedCriterion>,
}

impl<'de> Deserialize<'de> for CriteriaSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<NamedCriterion>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .fold(Self::new(), |set, entry| set.with(entry.name, entry.criterion)))
    }
}

impl CriteriaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`CriteriaSet::set`]
    pub fn with(mut self, name: impl Into<String>, criterion: Criterion) -> Self {
        self.set(name, criterion);
        self
    }

    /// Replace an existing criterion in place, or append a new one
    pub fn set(&mut self, name: impl Into<String>, criterion: Criterion) {
        let name = name.into();
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.criterion = criterion,
            None => self.entries.push(NamedCriterion { name, criterion }),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Criterion> {
        let index = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(index).criterion)
    }

    pub fn get(&self, name: &str) -> Option<&Criterion> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.criterion)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedCriterion> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Criteria that actually narrow the result
    pub fn active(&self) -> impl Iterator<Item = &NamedCriterion> {
        self.entries.iter().filter(|entry| !entry.criterion.is_inert())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_operands_are_inert() {
        assert!(Criterion::equals("status", "all").is_inert());
        assert!(Criterion::contains("name", "").is_inert());
        assert!(Criterion::range("expiry_date", None, Some("all")).is_inert());
        assert!(Criterion::in_set("region", ["Hubei", "all"]).is_inert());
        assert!(!Criterion::equals("status", "ALL_ACTIVE").is_inert());
        assert!(!Criterion::range("expiry_date", Some("2025-01-01"), None).is_inert());
    }

    #[test]
    fn set_replaces_in_place() {
        let mut criteria = CriteriaSet::new()
            .with("status", Criterion::equals("status", "NORMAL"))
            .with("name", Criterion::contains("project_name", "wind"));
        criteria.set("status", Criterion::equals("status", "FROZEN"));

        let names: Vec<_> = criteria.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["status", "name"]);
        assert_eq!(
            criteria.get("status"),
            Some(&Criterion::equals("status", "FROZEN"))
        );

        assert!(criteria.remove("status").is_some());
        assert_eq!(criteria.len(), 1);
    }

    #[test]
    fn deserializes_from_yaml_list() {
        let yaml = r#"
- name: status
  field: status
  operator: equals
  value: success
  compare_on: tier
- name: expiry
  field: expiry_date
  operator: range
  from: "2025-01-01"
- name: types
  field: quota_type
  operator: in_set
  options: [CEA, CCER]
"#;
        let criteria: CriteriaSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(criteria.len(), 3);
        assert_eq!(
            criteria.get("status"),
            Some(&Criterion::equals("status", "success").on_tier())
        );
        assert_eq!(
            criteria.get("expiry"),
            Some(&Criterion::range("expiry_date", Some("2025-01-01"), None))
        );
        assert_eq!(
            criteria.get("types"),
            Some(&Criterion::in_set("quota_type", ["CEA", "CCER"]))
        );
    }

    #[test]
    fn repeated_names_collapse_to_last_entry() {
        let yaml = r#"
- name: status
  field: status
  operator: equals
  value: NORMAL
- name: search
  field: holder
  operator: contains
  value: hubei
- name: status
  field: status
  operator: equals
  value: FROZEN
"#;
        let mut criteria: CriteriaSet = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = criteria.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["status", "search"]);
        assert_eq!(criteria.get("status"), Some(&Criterion::equals("status", "FROZEN")));

        criteria.set("status", Criterion::equals("status", ALL_SENTINEL));
        assert_eq!(criteria.active().count(), 1);
    }
}

//! Ledger Types - Level 1 Foundation Types
//!
//! Pure data structures shared by every carbon-desk screen: the polymorphic
//! [`Record`], its typed [`FieldValue`]s, the five canonical [`StatusTier`]s and
//! the ephemeral [`Page`] view.
//!
//! ## Critical Rules
//!
//! 1. **NO BUSINESS LOGIC** - classification, filtering and reconciliation live
//!    in `carbon_desk`
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - all types support serde

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// ISO calendar date format used for every date-like field.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// RECORD VARIANTS
// ============================================================================

/// The record variants shown by the dashboard screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Carbon reduction project in the registry
    Project,
    /// Carbon quota holding (ledger entry)
    QuotaHolding,
    /// Back-office system account
    SystemAccount,
    /// Quota listed on the trading market
    MarketListing,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Project,
        RecordKind::QuotaHolding,
        RecordKind::SystemAccount,
        RecordKind::MarketListing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Project => "project",
            RecordKind::QuotaHolding => "quota_holding",
            RecordKind::SystemAccount => "system_account",
            RecordKind::MarketListing => "market_listing",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown record kind '{}'", s))
    }
}

// ============================================================================
// FIELD VALUES
// ============================================================================

/// A typed attribute value carried by a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    /// Calendar date, rendered as `YYYY-MM-DD`
    Date(NaiveDate),
    /// Exact decimal quantity or price
    Amount(Decimal),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Render the value the way comparisons and substring search see it.
    ///
    /// Dates render in ISO order so lexicographic and chronological ordering agree.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.format(ISO_DATE_FORMAT).to_string(),
            FieldValue::Amount(a) => a.normalize().to_string(),
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Amount(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// A row in one of the dashboard collections
///
/// `id` and `status` are addressable through [`Record::get`] under the field
/// names `"id"` and `"status"`; every other attribute lives in `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier, immutable after creation
    pub id: String,
    pub kind: RecordKind,
    /// Raw status token from the variant's vocabulary (code or display label)
    pub status: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: impl Into<String>, kind: RecordKind, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            status: status.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Look up a field by name, including the built-in `id` and `status`
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::Text(self.id.clone())),
            "status" => Some(FieldValue::Text(self.status.clone())),
            other => self.fields.get(other).cloned(),
        }
    }

    /// Borrowing lookup for attributes stored in `fields`
    pub fn attribute(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn amount(&self, field: &str) -> Option<Decimal> {
        self.fields.get(field).and_then(FieldValue::as_amount)
    }

    /// Flat object in the dashboard's export shape, every value rendered as text
    pub fn to_flat_json(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut object = serde_json::Map::new();
        object.insert("id".to_string(), self.id.clone().into());
        object.insert("status".to_string(), self.status.clone().into());
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.render().into());
        }
        object
    }
}

// ============================================================================
// CANONICAL STATUS TIER
// ============================================================================

/// Canonical severity tier every raw status token collapses into
///
/// Derived, never stored: always recomputed from the raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTier {
    Success,
    Pending,
    Disabled,
    Error,
    /// Safe default for unrecognized tokens
    Info,
}

impl StatusTier {
    pub const ALL: [StatusTier; 5] = [
        StatusTier::Success,
        StatusTier::Pending,
        StatusTier::Disabled,
        StatusTier::Error,
        StatusTier::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTier::Success => "success",
            StatusTier::Pending => "pending",
            StatusTier::Disabled => "disabled",
            StatusTier::Error => "error",
            StatusTier::Info => "info",
        }
    }
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string names no tier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status tier '{0}'")]
pub struct TierParseError(pub String);

impl FromStr for StatusTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        StatusTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == lowered)
            .ok_or_else(|| TierParseError(s.to_string()))
    }
}

// ============================================================================
// PAGE
// ============================================================================

/// One visible window over a filtered collection
///
/// Ephemeral: recomputed on every filter or page change, never a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually shown (after clamping)
    pub page_number: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    /// Map items while keeping the window metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("Success".parse::<StatusTier>(), Ok(StatusTier::Success));
        assert_eq!(" DISABLED ".parse::<StatusTier>(), Ok(StatusTier::Disabled));
        assert!("green".parse::<StatusTier>().is_err());
    }

    #[test]
    fn flat_json_renders_typed_values() {
        let record = Record::new("H-001", RecordKind::QuotaHolding, "NORMAL")
            .with("total", Decimal::new(1000, 1))
            .with("expiry_date", NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        let object = record.to_flat_json();
        assert_eq!(object["id"], "H-001");
        assert_eq!(object["status"], "NORMAL");
        assert_eq!(object["total"], "100");
        assert_eq!(object["expiry_date"], "2026-12-31");
        assert!(!object.contains_key("kind"));
    }

    #[test]
    fn page_map_keeps_window() {
        let page = Page {
            items: vec![1, 2],
            page_number: 2,
            page_size: 2,
            total_count: 5,
            total_pages: 3,
        };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, [10, 20]);
        assert_eq!((mapped.page_number, mapped.total_pages), (2, 3));
        assert!(mapped.has_next() && mapped.has_previous());
    }

    #[test]
    fn record_exposes_builtin_fields() {
        let record = Record::new("P-001", RecordKind::Project, "已签发").with("region", "Hubei");
        assert_eq!(record.get("id"), Some(FieldValue::text("P-001")));
        assert_eq!(record.get("status"), Some(FieldValue::text("已签发")));
        assert_eq!(record.get("region"), Some(FieldValue::text("Hubei")));
        assert_eq!(record.get("owner"), None);
    }

    #[test]
    fn dates_render_in_iso_order() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(FieldValue::Date(date).render(), "2024-03-07");
    }

    #[test]
    fn amounts_render_normalized() {
        let amount = Decimal::new(125000, 2);
        assert_eq!(FieldValue::Amount(amount).render(), "1250");
    }

    #[test]
    fn record_kind_round_trips_through_str() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>(), Ok(kind));
        }
        assert_eq!("market-listing".parse::<RecordKind>(), Ok(RecordKind::MarketListing));
    }
}

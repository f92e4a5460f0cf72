//! Ledger Reconciler
//!
//! Turns a quota-holding form draft into a validated [`LedgerEntry`]:
//!
//! 1. Coerce numeric fields, rejecting blanks on required fields, non-numbers
//!    and negatives
//! 2. Enforce conservation: `available + locked + frozen <= total`
//! 3. Derive `valuation = total * unit_price` when a unit price is present
//!
//! Pure: the caller decides whether to persist the result. An invalid draft is
//! never partially applied.

use chrono::NaiveDate;
use ledger_types::{FieldValue, Record, RecordKind, ISO_DATE_FORMAT};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::error::{ValidationError, ValidationReason};

const DEFAULT_HOLDING_STATUS: &str = "NORMAL";

fn default_status() -> String {
    DEFAULT_HOLDING_STATUS.to_string()
}

/// Raw quota-holding form input
///
/// Numeric inputs arrive as form text; JSON numbers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDraft {
    pub id: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub quota_type: Option<String>,
    #[serde(default)]
    pub holder: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub total: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub available: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub locked_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub frozen_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub unit_price: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

impl LedgerDraft {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: default_status(),
            ..Default::default()
        }
    }

    /// Set the four balance inputs at once
    pub fn balances(mut self, total: &str, available: &str, locked: &str, frozen: &str) -> Self {
        self.total = Some(total.to_string());
        self.available = Some(available.to_string());
        self.locked_amount = Some(locked.to_string());
        self.frozen_amount = Some(frozen.to_string());
        self
    }

    pub fn unit_price(mut self, price: &str) -> Self {
        self.unit_price = Some(price.to_string());
        self
    }

    pub fn expiry_date(mut self, date: &str) -> Self {
        self.expiry_date = Some(date.to_string());
        self
    }
}

impl From<&LedgerEntry> for LedgerDraft {
    /// Prefill an edit form from a saved entry
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.clone(),
            project_name: entry.project_name.clone(),
            quota_type: entry.quota_type.clone(),
            holder: entry.holder.clone(),
            status: entry.status.clone(),
            total: Some(entry.total.to_string()),
            available: Some(entry.available.to_string()),
            locked_amount: Some(entry.locked_amount.to_string()),
            frozen_amount: Some(entry.frozen_amount.to_string()),
            unit_price: entry.unit_price.map(|p| p.to_string()),
            expiry_date: entry
                .expiry_date
                .map(|d| d.format(ISO_DATE_FORMAT).to_string()),
        }
    }
}

/// Validated quota holding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub project_name: Option<String>,
    pub quota_type: Option<String>,
    pub holder: Option<String>,
    pub status: String,
    pub total: Decimal,
    pub available: Decimal,
    pub locked_amount: Decimal,
    pub frozen_amount: Decimal,
    pub unit_price: Option<Decimal>,
    /// `total * unit_price`; unset (not zero) without a unit price
    pub valuation: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
}

impl LedgerEntry {
    /// Quantity not assigned to available, locked or frozen
    pub fn unallocated(&self) -> Decimal {
        self.total - self.available - self.locked_amount - self.frozen_amount
    }

    /// Expired once `as_of` is past the expiry date
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| as_of > expiry)
    }

    /// Render as a quota-holding record for the filter pipeline
    pub fn to_record(&self) -> Record {
        let mut record = Record::new(self.id.clone(), RecordKind::QuotaHolding, self.status.clone())
            .with("total", self.total)
            .with("available", self.available)
            .with("locked_amount", self.locked_amount)
            .with("frozen_amount", self.frozen_amount);

        let text_fields = [
            ("project_name", &self.project_name),
            ("quota_type", &self.quota_type),
            ("holder", &self.holder),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                record.set(name, value.clone());
            }
        }
        if let Some(price) = self.unit_price {
            record.set("unit_price", price);
        }
        if let Some(valuation) = self.valuation {
            record.set("valuation", valuation);
        }
        if let Some(expiry) = self.expiry_date {
            record.set("expiry_date", FieldValue::Date(expiry));
        }
        record
    }
}

/// Validate a draft and derive its valuation
pub fn reconcile(draft: &LedgerDraft) -> Result<LedgerEntry, ValidationError> {
    let result = reconcile_inner(draft);
    if let Err(err) = &result {
        tracing::debug!(
            id = %draft.id,
            field = %err.field,
            reason = err.reason.code(),
            "ledger draft rejected"
        );
    }
    result
}

fn reconcile_inner(draft: &LedgerDraft) -> Result<LedgerEntry, ValidationError> {
    let total = required_quantity("total", &draft.total)?;
    let available = required_quantity("available", &draft.available)?;
    let locked_amount = optional_quantity("locked_amount", &draft.locked_amount)?.unwrap_or_default();
    let frozen_amount = optional_quantity("frozen_amount", &draft.frozen_amount)?.unwrap_or_default();
    let unit_price = optional_quantity("unit_price", &draft.unit_price)?;
    let expiry_date = parse_date("expiry_date", &draft.expiry_date)?;

    let allocated = available
        .checked_add(locked_amount)
        .and_then(|sum| sum.checked_add(frozen_amount))
        .ok_or_else(|| ValidationError::new("total", ValidationReason::OutOfRange))?;

    if allocated > total {
        return Err(ValidationError::new(
            "total",
            ValidationReason::OverAllocated {
                excess: allocated - total,
            },
        ));
    }

    let valuation = match unit_price {
        Some(price) => Some(
            total
                .checked_mul(price)
                .ok_or_else(|| ValidationError::new("unit_price", ValidationReason::OutOfRange))?,
        ),
        None => None,
    };

    Ok(LedgerEntry {
        id: draft.id.clone(),
        project_name: draft.project_name.clone(),
        quota_type: draft.quota_type.clone(),
        holder: draft.holder.clone(),
        status: draft.status.clone(),
        total,
        available,
        locked_amount,
        frozen_amount,
        unit_price,
        valuation,
        expiry_date,
    })
}

fn required_quantity(field: &str, input: &Option<String>) -> Result<Decimal, ValidationError> {
    optional_quantity(field, input)?
        .ok_or_else(|| ValidationError::new(field, ValidationReason::Missing))
}

/// Blank input is `None`; anything else must be a non-negative decimal
fn optional_quantity(field: &str, input: &Option<String>) -> Result<Option<Decimal>, ValidationError> {
    let Some(raw) = input.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| {
            ValidationError::new(
                field,
                ValidationReason::NotANumber {
                    input: raw.to_string(),
                },
            )
        })?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new(field, ValidationReason::Negative));
    }
    Ok(Some(value))
}

fn parse_date(field: &str, input: &Option<String>) -> Result<Option<NaiveDate>, ValidationError> {
    let Some(raw) = input.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT)
        .map(Some)
        .map_err(|_| {
            ValidationError::new(
                field,
                ValidationReason::InvalidDate {
                    input: raw.to_string(),
                },
            )
        })
}

/// Accept strings, numbers or null for a numeric form input
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn accepts_exactly_balanced_holding() {
        let draft = LedgerDraft::new("H-1").balances("100", "60", "30", "10");
        let entry = reconcile(&draft).unwrap();
        assert_eq!(entry.total, dec("100"));
        assert_eq!(entry.unallocated(), Decimal::ZERO);
        assert_eq!(entry.valuation, None);
    }

    #[test]
    fn rejects_over_allocation_with_excess() {
        let draft = LedgerDraft::new("H-1").balances("100", "60", "30", "20");
        let err = reconcile(&draft).unwrap_err();
        assert_eq!(err.field, "total");
        assert_eq!(
            err.reason,
            ValidationReason::OverAllocated { excess: dec("10") }
        );
    }

    #[test]
    fn zero_total_with_positive_sub_amount_is_over_allocated() {
        let draft = LedgerDraft::new("H-1").balances("0", "0", "0.5", "0");
        let err = reconcile(&draft).unwrap_err();
        assert_eq!(
            err.reason,
            ValidationReason::OverAllocated { excess: dec("0.5") }
        );

        let empty = LedgerDraft::new("H-2").balances("0", "0", "0", "0");
        assert!(reconcile(&empty).is_ok());
    }

    #[test]
    fn rejects_negative_quantities() {
        let draft = LedgerDraft::new("H-1").balances("100", "10", "-1", "0");
        let err = reconcile(&draft).unwrap_err();
        assert_eq!(err, ValidationError::new("locked_amount", ValidationReason::Negative));

        let draft = LedgerDraft::new("H-1").balances("100", "10", "0", "0").unit_price("-3");
        assert_eq!(reconcile(&draft).unwrap_err().field, "unit_price");
    }

    #[test]
    fn negative_zero_is_accepted() {
        let draft = LedgerDraft::new("H-1").balances("10", "-0", "0", "0");
        assert!(reconcile(&draft).is_ok());
    }

    #[test]
    fn rejects_non_numbers_and_missing_required() {
        let draft = LedgerDraft::new("H-1").balances("100", "lots", "0", "0");
        assert!(matches!(
            reconcile(&draft).unwrap_err().reason,
            ValidationReason::NotANumber { .. }
        ));

        let mut draft = LedgerDraft::new("H-1").balances("", "1", "0", "0");
        assert_eq!(
            reconcile(&draft).unwrap_err(),
            ValidationError::new("total", ValidationReason::Missing)
        );
        draft.total = Some("5".into());
        draft.locked_amount = None;
        draft.frozen_amount = Some("  ".into());
        let entry = reconcile(&draft).unwrap();
        assert_eq!(entry.locked_amount, Decimal::ZERO);
        assert_eq!(entry.frozen_amount, Decimal::ZERO);
    }

    #[test]
    fn valuation_set_only_with_unit_price() {
        let draft = LedgerDraft::new("H-1")
            .balances("250", "200", "50", "0")
            .unit_price("62.5");
        let entry = reconcile(&draft).unwrap();
        assert_eq!(entry.valuation, Some(dec("15625")));

        let free = LedgerDraft::new("H-1").balances("250", "200", "50", "0").unit_price("0");
        assert_eq!(reconcile(&free).unwrap().valuation, Some(Decimal::ZERO));
    }

    #[test]
    fn expiry_date_must_be_iso() {
        let draft = LedgerDraft::new("H-1")
            .balances("1", "1", "0", "0")
            .expiry_date("31/12/2026");
        assert!(matches!(
            reconcile(&draft).unwrap_err().reason,
            ValidationReason::InvalidDate { .. }
        ));

        let draft = LedgerDraft::new("H-1")
            .balances("1", "1", "0", "0")
            .expiry_date("2026-12-31");
        let entry = reconcile(&draft).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert!(!entry.is_expired(expiry));
        assert!(entry.is_expired(expiry.succ_opt().unwrap()));
    }

    #[test]
    fn to_record_carries_balances_and_valuation() {
        let mut draft = LedgerDraft::new("H-9")
            .balances("100", "40", "40", "20")
            .unit_price("10");
        draft.project_name = Some("Hubei Wind".into());
        let record = reconcile(&draft).unwrap().to_record();
        assert_eq!(record.kind, RecordKind::QuotaHolding);
        assert_eq!(record.status, "NORMAL");
        assert_eq!(record.amount("valuation"), Some(dec("1000")));
        assert_eq!(record.get("project_name"), Some(FieldValue::text("Hubei Wind")));
        assert!(record.attribute("holder").is_none());
    }

    #[test]
    fn draft_accepts_json_numbers() {
        let draft: LedgerDraft = serde_json::from_str(
            r#"{"id":"H-1","total":100,"available":"60","locked_amount":30,"frozen_amount":null}"#,
        )
        .unwrap();
        assert_eq!(draft.status, "NORMAL");
        assert_eq!(draft.total.as_deref(), Some("100"));
        assert!(draft.frozen_amount.is_none());
        assert!(reconcile(&draft).is_ok());
    }

    #[test]
    fn edit_round_trip_reconciles_to_same_entry() {
        let entry = reconcile(
            &LedgerDraft::new("H-1")
                .balances("100", "60", "30", "10")
                .unit_price("12.5")
                .expiry_date("2027-06-30"),
        )
        .unwrap();
        assert_eq!(reconcile(&LedgerDraft::from(&entry)).unwrap(), entry);
    }
}

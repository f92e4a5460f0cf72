//! Record schemas
//!
//! The fixed field catalogue of each record variant. Filter criteria and sort
//! specs are checked against it so a typo in a screen's column definition
//! surfaces as a [`ConfigurationError`] instead of silently hiding rows.

use chrono::NaiveDate;
use ledger_types::{FieldValue, Record, RecordKind, ISO_DATE_FORMAT};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{ConfigResult, ConfigurationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Date,
    Amount,
    /// Raw token classified through the status vocabularies
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Text,
    }
}

const fn date(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Date,
    }
}

const fn amount(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Amount,
    }
}

const STATUS: FieldSpec = FieldSpec {
    name: "status",
    field_type: FieldType::Status,
};

const PROJECT_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("name"),
    text("project_type"),
    text("region"),
    text("owner"),
    STATUS,
    date("registered_on"),
    amount("issued_quantity"),
];

const QUOTA_HOLDING_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("project_name"),
    text("quota_type"),
    text("holder"),
    STATUS,
    amount("total"),
    amount("available"),
    amount("locked_amount"),
    amount("frozen_amount"),
    amount("unit_price"),
    amount("valuation"),
    date("expiry_date"),
];

const SYSTEM_ACCOUNT_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("username"),
    text("display_name"),
    text("role"),
    STATUS,
    date("created_on"),
];

const MARKET_LISTING_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("project_name"),
    text("quota_type"),
    text("seller"),
    STATUS,
    amount("quantity"),
    amount("unit_price"),
    date("listed_on"),
];

/// Field catalogue for one record variant
#[derive(Debug, Clone, Copy)]
pub struct RecordSchema {
    pub kind: RecordKind,
    pub fields: &'static [FieldSpec],
    /// Field summed into the summary's total quantity
    pub quantity_field: Option<&'static str>,
    /// Field summed into the summary's valuation
    pub valuation_field: Option<&'static str>,
}

impl RecordSchema {
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Project => Self {
                kind,
                fields: PROJECT_FIELDS,
                quantity_field: Some("issued_quantity"),
                valuation_field: None,
            },
            RecordKind::QuotaHolding => Self {
                kind,
                fields: QUOTA_HOLDING_FIELDS,
                quantity_field: Some("total"),
                valuation_field: Some("valuation"),
            },
            RecordKind::SystemAccount => Self {
                kind,
                fields: SYSTEM_ACCOUNT_FIELDS,
                quantity_field: None,
                valuation_field: None,
            },
            RecordKind::MarketListing => Self {
                kind,
                fields: MARKET_LISTING_FIELDS,
                quantity_field: Some("quantity"),
                valuation_field: None,
            },
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Look up a field, failing on names outside the catalogue
    pub fn require_field(&self, name: &str) -> ConfigResult<&FieldSpec> {
        self.field(name).ok_or_else(|| ConfigurationError::UnknownField {
            field: name.to_string(),
            kind: self.kind,
        })
    }

    pub fn is_status_field(&self, name: &str) -> bool {
        matches!(self.field(name), Some(spec) if spec.field_type == FieldType::Status)
    }

    /// Decode a flat JSON object (as exported by the data-access layer) into a record
    ///
    /// Amounts may be JSON numbers or numeric strings; dates are ISO strings.
    /// Keys outside the catalogue are rejected.
    pub fn record_from_json(&self, object: &Map<String, Value>) -> Result<Record, DecodeError> {
        let id = string_value(object, "id")?;
        let status = string_value(object, "status")?;
        let mut record = Record::new(id, self.kind, status);

        for (key, value) in object {
            if key == "id" || key == "status" || value.is_null() {
                continue;
            }
            let spec = self.field(key).ok_or_else(|| DecodeError::UnknownField {
                field: key.clone(),
                kind: self.kind,
            })?;
            record.set(key.clone(), decode_value(spec, value)?);
        }

        Ok(record)
    }
}

/// Failure to turn exported JSON into a typed record
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Record is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Unknown field '{field}' for {kind} records")]
    UnknownField { field: String, kind: RecordKind },

    #[error("Field '{field}' has invalid value {value}: expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },
}

fn string_value(object: &Map<String, Value>, field: &'static str) -> Result<String, DecodeError> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(DecodeError::InvalidValue {
            field: field.to_string(),
            value: other.to_string(),
            expected: "string",
        }),
        None => Err(DecodeError::MissingField(field)),
    }
}

fn decode_value(spec: &FieldSpec, value: &Value) -> Result<FieldValue, DecodeError> {
    let invalid = |expected: &'static str| DecodeError::InvalidValue {
        field: spec.name.to_string(),
        value: value.to_string(),
        expected,
    };

    match spec.field_type {
        FieldType::Text | FieldType::Status => match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            _ => Err(invalid("string")),
        },
        FieldType::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, ISO_DATE_FORMAT).ok())
            .map(FieldValue::Date)
            .ok_or_else(|| invalid("ISO date")),
        FieldType::Amount => {
            let parsed = match value {
                Value::String(s) => Decimal::from_str(s.trim()).ok(),
                Value::Number(n) => Decimal::from_str(&n.to_string())
                    .or_else(|_| Decimal::from_scientific(&n.to_string()))
                    .ok(),
                _ => None,
            };
            parsed.map(FieldValue::Amount).ok_or_else(|| invalid("decimal"))
        }
    }
}

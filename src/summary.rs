//! Summary statistics over a filtered collection
//!
//! Feeds the stat cards shown next to each table. Always computed over the
//! filtered set, never over the current page.

use ledger_types::{Record, StatusTier};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::RecordSchema;
use crate::status::StatusClassifier;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    /// Sum of the variant's quantity field; zero when the variant has none
    pub total_quantity: Decimal,
    /// Sum of valuations; unset when no record carries one
    pub valuation: Option<Decimal>,
    pub by_tier: BTreeMap<StatusTier, usize>,
}

/// Aggregate any iterator of records belonging to `schema`'s variant
pub fn summarize<'a, I>(records: I, schema: &RecordSchema, classifier: &StatusClassifier) -> Summary
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut summary = Summary::default();

    for record in records {
        summary.count += 1;

        if let Some(quantity) = schema.quantity_field.and_then(|f| record.amount(f)) {
            summary.total_quantity = saturating_sum(summary.total_quantity, quantity, "quantity");
        }

        if let Some(valuation) = schema.valuation_field.and_then(|f| record.amount(f)) {
            let running = summary.valuation.unwrap_or(Decimal::ZERO);
            summary.valuation = Some(saturating_sum(running, valuation, "valuation"));
        }

        *summary
            .by_tier
            .entry(classifier.classify(&record.status))
            .or_insert(0) += 1;
    }

    summary
}

/// Add two amounts, pinning to the representable bound on overflow
fn saturating_sum(total: Decimal, amount: Decimal, column: &str) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        tracing::warn!(column, %total, %amount, "summary total overflowed; saturating");
        if amount.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_types::RecordKind;

    fn holding(id: &str, status: &str, total: i64, valuation: Option<i64>) -> Record {
        let record =
            Record::new(id, RecordKind::QuotaHolding, status).with("total", Decimal::from(total));
        match valuation {
            Some(v) => record.with("valuation", Decimal::from(v)),
            None => record,
        }
    }

    #[test]
    fn sums_quantity_valuation_and_tiers() {
        let classifier = StatusClassifier::builtin().unwrap();
        let schema = RecordSchema::for_kind(RecordKind::QuotaHolding);
        let records = [
            holding("a", "NORMAL", 100, Some(5000)),
            holding("b", "FROZEN", 40, None),
            holding("c", "正常", 60, Some(1200)),
        ];

        let summary = summarize(&records, &schema, &classifier);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_quantity, Decimal::from(200));
        assert_eq!(summary.valuation, Some(Decimal::from(6200)));
        assert_eq!(summary.by_tier.get(&StatusTier::Success), Some(&2));
        assert_eq!(summary.by_tier.get(&StatusTier::Disabled), Some(&1));
    }

    #[test]
    fn overflowing_totals_saturate() {
        let classifier = StatusClassifier::builtin().unwrap();
        let schema = RecordSchema::for_kind(RecordKind::QuotaHolding);
        let huge = |id: &str| {
            Record::new(id, RecordKind::QuotaHolding, "NORMAL")
                .with("total", Decimal::MAX)
                .with("valuation", Decimal::MAX)
        };
        let records = [huge("a"), huge("b")];

        let summary = summarize(&records, &schema, &classifier);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_quantity, Decimal::MAX);
        assert_eq!(summary.valuation, Some(Decimal::MAX));

        let negative = [
            Record::new("c", RecordKind::QuotaHolding, "NORMAL").with("total", Decimal::MIN),
            Record::new("d", RecordKind::QuotaHolding, "NORMAL").with("total", Decimal::MIN),
        ];
        assert_eq!(summarize(&negative, &schema, &classifier).total_quantity, Decimal::MIN);
    }

    #[test]
    fn valuation_unset_when_nothing_priced() {
        let classifier = StatusClassifier::builtin().unwrap();
        let schema = RecordSchema::for_kind(RecordKind::QuotaHolding);
        let records = [holding("a", "NORMAL", 100, None)];
        assert_eq!(summarize(&records, &schema, &classifier).valuation, None);

        let accounts = RecordSchema::for_kind(RecordKind::SystemAccount);
        let summary = summarize(std::iter::empty(), &accounts, &classifier);
        assert_eq!(summary, Summary::default());
    }
}

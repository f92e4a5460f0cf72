//! Shared record fixtures for the dashboard scenario and property tests

#![allow(dead_code)]

use std::num::NonZeroUsize;
use std::sync::Arc;

use carbon_desk::{
    reconcile, LedgerDraft, QueryController, Record, RecordKind, StatusClassifier,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn classifier() -> Arc<StatusClassifier> {
    Arc::new(StatusClassifier::builtin().expect("built-in vocabularies load"))
}

pub fn page_size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).expect("non-zero page size")
}

pub fn controller(kind: RecordKind, records: Vec<Record>, size: usize) -> QueryController {
    QueryController::new(kind, classifier(), page_size(size), records.into())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Holding record with just a status and quantity
pub fn quantity_holding(id: &str, status: &str, qty: i64) -> Record {
    Record::new(id, RecordKind::QuotaHolding, status).with("total", Decimal::from(qty))
}

/// Registry projects using the localized label vocabulary
pub fn projects() -> Vec<Record> {
    let rows = [
        ("P-001", "湖北风电一期", "wind", "Hubei", "已签发", date(2023, 3, 1), 12000),
        ("P-002", "广东光伏电站", "solar", "Guangdong", "待审核", date(2023, 7, 15), 8000),
        ("P-003", "福建林业碳汇", "forestry", "Fujian", "已签发", date(2024, 1, 20), 30000),
        ("P-004", "湖北光伏二期", "solar", "Hubei", "已驳回", date(2024, 5, 2), 0),
        ("P-005", "内蒙古风电", "wind", "Inner Mongolia", "审核中", date(2024, 9, 9), 15000),
    ];
    rows.into_iter()
        .map(|(id, name, project_type, region, status, registered_on, issued)| {
            Record::new(id, RecordKind::Project, status)
                .with("name", name)
                .with("project_type", project_type)
                .with("region", region)
                .with("registered_on", registered_on)
                .with("issued_quantity", Decimal::from(issued))
        })
        .collect()
}

/// Holdings built through the reconciler, as the edit form would
pub fn reconciled_holdings() -> Vec<Record> {
    let drafts = [
        ("H-001", "NORMAL", "1000", "600", "300", "100", Some("58.5"), "2026-12-31"),
        ("H-002", "FROZEN", "500", "0", "0", "500", None, "2025-06-30"),
        ("H-003", "正常", "250", "250", "0", "0", Some("60"), "2027-03-31"),
        ("H-004", "LOCKED", "800", "200", "600", "0", Some("55"), "2026-01-15"),
    ];
    drafts
        .into_iter()
        .map(|(id, status, total, available, locked, frozen, price, expiry)| {
            let mut draft = LedgerDraft::new(id)
                .balances(total, available, locked, frozen)
                .expiry_date(expiry);
            draft.status = status.to_string();
            draft.project_name = Some(format!("Project {}", id));
            if let Some(price) = price {
                draft = draft.unit_price(price);
            }
            reconcile(&draft).expect("fixture drafts balance").to_record()
        })
        .collect()
}

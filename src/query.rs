//! Query State Controller
//!
//! Holds one screen's criteria and current page over a record collection owned
//! by an external store. State is exactly `criteria x sort x page`; every
//! transition recomputes the filtered index set and/or the page.
//!
//! | Event                     | Filter  | Page                              |
//! |---------------------------|---------|-----------------------------------|
//! | criterion changed/cleared | re-run  | reset to 1                        |
//! | sort changed              | re-sort | reset to 1                        |
//! | page requested            | -       | requested, clamped to 1           |
//! | records mutated           | re-run  | kept if still valid, else 1       |
//!
//! A transition that fails validation leaves the state untouched.

use ledger_types::{Page, Record, RecordKind};
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::ConfigResult;
use crate::filter::{CriteriaSet, Criterion, FilterPipeline, SortSpec};
use crate::pagination::{clamp_page, total_pages, window};
use crate::status::StatusClassifier;
use crate::summary::{summarize, Summary};

#[derive(Debug, Clone)]
pub struct QueryController {
    pipeline: FilterPipeline,
    page_size: NonZeroUsize,
    /// Shared view of the store's collection; never mutated here
    base: Arc<[Record]>,
    criteria: CriteriaSet,
    sort: Option<SortSpec>,
    /// Indices into `base`, in display order
    filtered: Vec<usize>,
    page_number: usize,
}

impl QueryController {
    /// Controller with no criteria, showing page 1 of `base`
    pub fn new(
        kind: RecordKind,
        classifier: Arc<StatusClassifier>,
        page_size: NonZeroUsize,
        base: Arc<[Record]>,
    ) -> Self {
        let filtered = (0..base.len()).collect();
        Self {
            pipeline: FilterPipeline::new(kind, classifier),
            page_size,
            base,
            criteria: CriteriaSet::new(),
            sort: None,
            filtered,
            page_number: 1,
        }
    }

    /// Start from an initial criteria set (e.g. restored from the URL)
    pub fn with_criteria(mut self, criteria: CriteriaSet) -> ConfigResult<Self> {
        self.filtered = self.recompute(&self.base, &criteria, self.sort.as_ref())?;
        self.criteria = criteria;
        Ok(self)
    }

    pub fn on_criterion_changed(
        &mut self,
        name: &str,
        criterion: Criterion,
    ) -> ConfigResult<Page<Record>> {
        let mut criteria = self.criteria.clone();
        criteria.set(name, criterion);
        self.filtered = self.recompute(&self.base, &criteria, self.sort.as_ref())?;
        self.criteria = criteria;
        self.page_number = 1;

        tracing::debug!(criterion = name, matched = self.filtered.len(), "criterion changed");
        Ok(self.current_page())
    }

    /// Remove a criterion; a no-op (page kept) when the name isn't set
    pub fn on_criterion_cleared(&mut self, name: &str) -> ConfigResult<Page<Record>> {
        let mut criteria = self.criteria.clone();
        if criteria.remove(name).is_none() {
            return Ok(self.current_page());
        }
        self.filtered = self.recompute(&self.base, &criteria, self.sort.as_ref())?;
        self.criteria = criteria;
        self.page_number = 1;

        tracing::debug!(criterion = name, matched = self.filtered.len(), "criterion cleared");
        Ok(self.current_page())
    }

    /// Change or drop the column sort
    pub fn on_sort_changed(&mut self, sort: Option<SortSpec>) -> ConfigResult<Page<Record>> {
        self.filtered = self.recompute(&self.base, &self.criteria, sort.as_ref())?;
        self.sort = sort;
        self.page_number = 1;
        Ok(self.current_page())
    }

    pub fn on_page_requested(&mut self, page_number: usize) -> Page<Record> {
        self.page_number = clamp_page(page_number, self.total_pages());
        self.current_page()
    }

    /// Change rows per page; returns to page 1
    pub fn on_page_size_changed(&mut self, page_size: NonZeroUsize) -> Page<Record> {
        self.page_size = page_size;
        self.page_number = 1;
        self.current_page()
    }

    /// The store created, edited or deleted records and hands over the new collection
    pub fn on_records_mutated(&mut self, base: Arc<[Record]>) -> ConfigResult<Page<Record>> {
        self.filtered = self.recompute(&base, &self.criteria, self.sort.as_ref())?;
        self.base = base;
        self.page_number = clamp_page(self.page_number, self.total_pages());

        tracing::debug!(
            records = self.base.len(),
            matched = self.filtered.len(),
            page = self.page_number,
            "records mutated"
        );
        Ok(self.current_page())
    }

    pub fn current_page(&self) -> Page<Record> {
        window(
            self.filtered.len(),
            self.page_number,
            self.page_size,
            |range| {
                self.filtered[range]
                    .iter()
                    .map(|&i| self.base[i].clone())
                    .collect()
            },
        )
    }

    /// Aggregates over the whole filtered set, not just the page
    pub fn summary(&self) -> Summary {
        summarize(
            self.filtered_records(),
            self.pipeline.schema(),
            self.pipeline.classifier(),
        )
    }

    pub fn filtered_records(&self) -> impl Iterator<Item = &Record> {
        self.filtered.iter().map(|&i| &self.base[i])
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered.len(), self.page_size)
    }

    pub fn criteria(&self) -> &CriteriaSet {
        &self.criteria
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    fn recompute(
        &self,
        base: &[Record],
        criteria: &CriteriaSet,
        sort: Option<&SortSpec>,
    ) -> ConfigResult<Vec<usize>> {
        let mut indices = self.pipeline.matching_indices(base, criteria)?;
        if let Some(sort) = sort {
            self.pipeline.sort_indices(&mut indices, base, sort)?;
        }
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use ledger_types::StatusTier;
    use rust_decimal::Decimal;

    fn accounts(n: usize) -> Arc<[Record]> {
        (0..n)
            .map(|i| {
                let status = if i % 2 == 0 { "NORMAL" } else { "DISABLED" };
                Record::new(format!("U-{:03}", i), RecordKind::SystemAccount, status)
                    .with("username", format!("user{}", i))
            })
            .collect()
    }

    fn controller(n: usize, page_size: usize) -> QueryController {
        QueryController::new(
            RecordKind::SystemAccount,
            Arc::new(StatusClassifier::builtin().unwrap()),
            NonZeroUsize::new(page_size).unwrap(),
            accounts(n),
        )
    }

    #[test]
    fn criterion_change_resets_to_first_page() {
        let mut c = controller(30, 5);
        assert_eq!(c.on_page_requested(3).page_number, 3);

        let page = c
            .on_criterion_changed("status", Criterion::equals("status", "NORMAL"))
            .unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_count, 15);
        assert_eq!(c.page_number(), 1);
    }

    #[test]
    fn invalid_criterion_leaves_state_untouched() {
        let mut c = controller(30, 5);
        c.on_page_requested(2);
        let err = c
            .on_criterion_changed("bad", Criterion::equals("nickname", "x"))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownField { .. }));
        assert_eq!(c.page_number(), 2);
        assert!(c.criteria().is_empty());
        assert_eq!(c.filtered_count(), 30);
    }

    #[test]
    fn out_of_range_page_request_clamps() {
        let mut c = controller(12, 5);
        assert_eq!(c.on_page_requested(3).items.len(), 2);
        assert_eq!(c.on_page_requested(4).page_number, 1);
        assert_eq!(c.on_page_requested(0).page_number, 1);
    }

    #[test]
    fn mutation_preserves_valid_page() {
        let mut c = controller(30, 5);
        c.on_page_requested(4);

        let page = c.on_records_mutated(accounts(31)).unwrap();
        assert_eq!(page.page_number, 4);
        assert_eq!(page.total_count, 31);

        let page = c.on_records_mutated(accounts(12)).unwrap();
        assert_eq!(page.page_number, 1);
    }

    #[test]
    fn clearing_unknown_criterion_keeps_page() {
        let mut c = controller(30, 5);
        c.on_page_requested(2);
        assert_eq!(c.on_criterion_cleared("missing").unwrap().page_number, 2);

        c.on_criterion_changed("status", Criterion::equals("status", "disabled").on_tier())
            .unwrap();
        assert_eq!(c.filtered_count(), 15);
        c.on_page_requested(2);
        let page = c.on_criterion_cleared("status").unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_count, 30);
    }

    #[test]
    fn sort_orders_filtered_records() {
        let mut c = controller(4, 10);
        let page = c.on_sort_changed(Some(SortSpec::desc("id"))).unwrap();
        let ids: Vec<_> = page.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["U-003", "U-002", "U-001", "U-000"]);

        assert!(c.on_sort_changed(Some(SortSpec::asc("nickname"))).is_err());
        assert_eq!(c.sort(), Some(&SortSpec::desc("id")));
    }

    #[test]
    fn summary_covers_filtered_not_paged() {
        let holdings: Arc<[Record]> = (1..=6)
            .map(|i| {
                Record::new(format!("H-{}", i), RecordKind::QuotaHolding, "NORMAL")
                    .with("total", Decimal::from(i * 10))
            })
            .collect();
        let mut c = QueryController::new(
            RecordKind::QuotaHolding,
            Arc::new(StatusClassifier::builtin().unwrap()),
            NonZeroUsize::new(2).unwrap(),
            holdings,
        );
        c.on_criterion_changed("total", Criterion::range("total", Some("30"), None))
            .unwrap();

        let summary = c.summary();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.total_quantity, Decimal::from(30 + 40 + 50 + 60));
        assert_eq!(summary.valuation, None);
        assert_eq!(summary.by_tier.get(&StatusTier::Success), Some(&4));
        assert_eq!(c.current_page().items.len(), 2);
    }
}

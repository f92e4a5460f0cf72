//! Carbon Desk
//!
//! List-processing and ledger-consistency engine behind the carbon-asset admin
//! dashboard (project registry, quota holdings, system accounts, market).
//! Screens hand a materialized record collection and their filter criteria to
//! this crate and render what comes back.
//!
//! # Architecture
//!
//! ```text
//!                 criterion / page / mutation events
//!                                │
//!                                ▼
//!                       ┌─────────────────┐
//!                       │ QueryController │──► Page<Record> + Summary
//!                       └────────┬────────┘
//!                  ┌─────────────┼──────────────┐
//!                  ▼             ▼              ▼
//!           FilterPipeline   pagination     summarize
//!                  │
//!                  ▼
//!          StatusClassifier ◄── config/status-vocabularies.yaml
//!
//!   form draft ──► ledger::reconcile ──► LedgerEntry ──► Record
//! ```
//!
//! Everything here is synchronous and pure over in-memory collections. Loading
//! records and persisting entries belong to the caller.

pub mod config;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod pagination;
pub mod query;
pub mod schema;
pub mod status;
pub mod summary;

pub use config::EngineConfig;
pub use error::{ConfigurationError, EngineError, ValidationError, ValidationReason};
pub use filter::{CompareOn, CriteriaSet, Criterion, FilterPipeline, Predicate, SortSpec};
pub use ledger::{reconcile, LedgerDraft, LedgerEntry};
pub use pagination::paginate;
pub use query::QueryController;
pub use schema::RecordSchema;
pub use status::{StatusClassifier, StatusVocabularies};
pub use summary::{summarize, Summary};

pub use ledger_types::{FieldValue, Page, Record, RecordKind, StatusTier};

//! Per-record outcomes and the aggregate counts printed at the end of a run.

use super::mapper::SkipReason;
use std::fmt;

/// What happened to one source record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Inserted or updated in the destination
    Written,
    /// Left out by the mapper
    Skipped(SkipReason),
    /// The destination rejected the write
    Failed(String),
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written => write!(f, "written"),
            Self::Skipped(reason) => write!(f, "skipped, {reason}"),
            Self::Failed(message) => write!(f, "failed, {message}"),
        }
    }
}

/// One record's key and outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult {
    /// External id, or the name when the id is missing
    pub key: String,
    /// What happened
    pub outcome: RecordOutcome,
}

/// Outcomes for one entity kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseReport {
    /// Entity name used in logs ("products", "sales")
    pub entity: &'static str,
    /// Number of records pulled from the source
    pub fetched: usize,
    /// Outcome per record, in source order
    pub records: Vec<RecordResult>,
}

impl PhaseReport {
    /// Starts an empty report for `fetched` records.
    #[must_use]
    pub const fn new(entity: &'static str, fetched: usize) -> Self {
        Self {
            entity,
            fetched,
            records: Vec::new(),
        }
    }

    /// Appends one outcome.
    pub fn record(&mut self, key: impl Into<String>, outcome: RecordOutcome) {
        self.records.push(RecordResult {
            key: key.into(),
            outcome,
        });
    }

    /// Records written to the destination.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(|outcome| matches!(outcome, RecordOutcome::Written))
    }

    /// Records the mapper left out.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, RecordOutcome::Skipped(_)))
    }

    /// Records skipped or rejected; this is the "failed" figure of the summary.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    /// Results that were not written, for printing.
    pub fn failures(&self) -> impl Iterator<Item = &RecordResult> {
        self.records
            .iter()
            .filter(|r| !matches!(r.outcome, RecordOutcome::Written))
    }

    fn count(&self, predicate: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} successful, {} failed ({} skipped) of {} fetched",
            self.entity,
            self.succeeded(),
            self.failed(),
            self.skipped(),
            self.fetched
        )
    }
}

/// Sold item counts accumulated over all sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemTally {
    /// Items written
    pub written: usize,
    /// Items the destination rejected
    pub failed: usize,
    /// Written items left without a product reference
    pub unresolved_products: usize,
}

/// Rows removed per table by the clear step; `None` when that delete failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearSummary {
    /// Deleted sold items
    pub sold_items: Option<u64>,
    /// Deleted sales
    pub sales: Option<u64>,
    /// Deleted products
    pub products: Option<u64>,
}

/// Everything a migration run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// Present only for fresh runs
    pub cleared: Option<ClearSummary>,
    /// Product phase
    pub products: PhaseReport,
    /// Sale phase
    pub sales: PhaseReport,
    /// Sold items written during the sale phase
    pub sold_items: ItemTally,
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.products)?;
        writeln!(f, "{}", self.sales)?;
        write!(
            f,
            "sold items: {} written, {} failed, {} without product",
            self.sold_items.written, self.sold_items.failed, self.sold_items.unresolved_products
        )
    }
}

//! Moves the catalog and sales history from the content API into the local database.

/// Source record to destination row mapping
pub mod mapper;
/// Sequencing of the clear, product and sale stages
pub mod orchestrator;
/// Product copy between two content API projects
pub mod replicate;
/// Per-record outcomes and run summaries
pub mod report;
/// Insert and upsert of mapped rows
pub mod writer;

pub use orchestrator::{MigrationMode, Migrator, clear_destination};
pub use replicate::{ProductCopy, ProductSink, replicate_products};
pub use report::{MigrationReport, PhaseReport, RecordOutcome};
pub use writer::WriteMode;

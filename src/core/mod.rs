//! Core business logic - framework-agnostic operations behind the till's HTTP endpoints.

/// Product listing and lookups
pub mod product;
/// Sale registration and sale history
pub mod sale;
/// Sold item queries
pub mod sold_item;
/// Table row counts
pub mod stats;

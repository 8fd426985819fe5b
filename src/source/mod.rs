//! Content API side of the migration: record types, the GraphQL client and pagination.

/// GraphQL client for the hosted content API
pub mod hygraph;
/// Offset pagination until a short page
pub mod pager;
/// Source record shapes
pub mod records;

use crate::errors::Result;
use async_trait::async_trait;
pub use records::{Numeric, SourceProduct, SourceProductRef, SourceSale, SourceSoldItem};
use tracing::{info, instrument};

/// A paginated catalog of products and sales.
///
/// Pages are addressed by `first` (page size) and `skip` (offset). Products come
/// back ordered by name ascending, sales by time descending.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns up to `first` products starting at offset `skip`.
    async fn product_page(&self, first: u32, skip: u32) -> Result<Vec<SourceProduct>>;

    /// Returns up to `first` sales, with nested sold items, starting at offset `skip`.
    async fn sale_page(&self, first: u32, skip: u32) -> Result<Vec<SourceSale>>;
}

/// First few records of each kind, used to verify credentials and schema.
#[derive(Debug, Clone)]
pub struct ProbeSummary {
    /// Sample of products
    pub products: Vec<SourceProduct>,
    /// Sample of sales
    pub sales: Vec<SourceSale>,
}

/// Requests one small page of products and sales.
///
/// # Errors
/// Returns the first query error; nothing is retried.
#[instrument(skip(source))]
pub async fn probe<S: CatalogSource + ?Sized>(source: &S, sample: u32) -> Result<ProbeSummary> {
    let products = source.product_page(sample, 0).await?;
    info!("Products query returned {} records", products.len());
    let sales = source.sale_page(sample, 0).await?;
    info!("Sales query returned {} records", sales.len());
    Ok(ProbeSummary { products, sales })
}

//! Row counts per table, shown by the connectivity check.

use crate::{
    entities::{Product, Sale, SoldItem},
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde::Serialize;
use std::fmt;

/// Number of rows in each destination table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    /// Rows in `products`
    pub products: u64,
    /// Rows in `sales`
    pub sales: u64,
    /// Rows in `sold_items`
    pub sold_items: u64,
}

impl fmt::Display for TableCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "products: {}, sales: {}, sold_items: {}",
            self.products, self.sales, self.sold_items
        )
    }
}

/// Counts rows in the products, sales and sold items tables.
///
/// # Errors
/// Returns an error if any count query fails.
pub async fn table_counts(db: &DatabaseConnection) -> Result<TableCounts> {
    Ok(TableCounts {
        products: Product::find().count(db).await?,
        sales: Sale::find().count(db).await?,
        sold_items: SoldItem::find().count(db).await?,
    })
}

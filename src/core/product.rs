//! Product business logic - lookups behind the product list and product page.
//!
//! This module provides the queries the till uses to show products: a filtered,
//! paginated list ordered by name, a lookup by slug for the product page, and the
//! external id lookup the migration uses to resolve sold item references.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};

/// Filters and paging for [`list_products`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Exact category match
    pub category: Option<String>,
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    /// Maximum number of rows
    pub limit: u64,
    /// Rows to skip
    pub offset: u64,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// Lists products ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products(
    db: &DatabaseConnection,
    query: &ProductQuery,
) -> Result<Vec<product::Model>> {
    let mut select = Product::find().order_by_asc(product::Column::Name);

    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        select = select.filter(product::Column::Category.eq(category));
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(product::Column::Name.contains(search));
    }

    select
        .offset(query.offset)
        .limit(query.limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the product shown on a product page.
///
/// # Errors
/// Returns [`Error::Validation`] for an empty slug, or an error if the query fails.
pub async fn get_product_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<product::Model>> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(Error::Validation {
            message: "Slug parameter required".to_string(),
        });
    }

    Product::find()
        .filter(product::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves a content API product id to the local product id.
///
/// # Errors
/// Returns an error if the database query fails; a miss is `Ok(None)`.
pub async fn find_id_by_external_id(
    db: &DatabaseConnection,
    external_id: &str,
) -> Result<Option<i64>> {
    Product::find()
        .select_only()
        .column(product::Column::Id)
        .filter(product::Column::ExternalId.eq(external_id))
        .into_tuple::<i64>()
        .one(db)
        .await
        .map_err(Into::into)
}

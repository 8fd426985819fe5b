//! Shared test utilities.
//!
//! This module provides helpers for setting up test databases, creating rows with
//! sensible defaults, and an in-memory catalog source that stands in for the
//! content API.
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use crate::{
    entities::{product, sale, sold_item},
    errors::{Error, Result},
    migration::replicate::{ProductCopy, ProductSink},
    source::{CatalogSource, Numeric, SourceProduct, SourceProductRef, SourceSale, SourceSoldItem},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a local product (no external id, no category).
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    slug: &str,
    price: f64,
) -> Result<product::Model> {
    insert_product(db, None, name, slug, price, None).await
}

/// Creates a local product with a category.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    slug: &str,
    price: f64,
    category: Option<&str>,
) -> Result<product::Model> {
    insert_product(db, None, name, slug, price, category).await
}

/// Creates a product as if it had been migrated from the content API.
pub async fn create_imported_product(
    db: &DatabaseConnection,
    external_id: &str,
    name: &str,
    slug: &str,
    price: f64,
) -> Result<product::Model> {
    insert_product(db, Some(external_id), name, slug, price, Some("Unknown")).await
}

async fn insert_product(
    db: &DatabaseConnection,
    external_id: Option<&str>,
    name: &str,
    slug: &str,
    price: f64,
    category: Option<&str>,
) -> Result<product::Model> {
    let now = Utc::now();
    product::ActiveModel {
        external_id: Set(external_id.map(str::to_string)),
        name: Set(name.to_string()),
        price: Set(price),
        slug: Set(slug.to_string()),
        category: Set(category.map(str::to_string)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a card sale at the given RFC 3339 time.
pub async fn create_sale_at(db: &DatabaseConnection, time: &str, sum: f64) -> Result<sale::Model> {
    let time = DateTime::parse_from_rfc3339(time)
        .map_err(|e| Error::Validation {
            message: e.to_string(),
        })?
        .with_timezone(&Utc);
    sale::ActiveModel {
        external_id: Set(None),
        sum: Set(sum),
        payment_method: Set("card".to_string()),
        time: Set(time),
        fulfilled: Set(true),
        text: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Adds a sold item to an existing sale.
pub async fn add_sold_item(
    db: &DatabaseConnection,
    sale_id: i64,
    product_id: Option<i64>,
    price: f64,
) -> Result<sold_item::Model> {
    sold_item::ActiveModel {
        external_id: Set(None),
        sale_id: Set(sale_id),
        product_id: Set(product_id),
        price: Set(price),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Source product with every required field; the slug is derived from the id.
#[must_use]
pub fn source_product(id: &str, name: &str, price: f64) -> SourceProduct {
    SourceProduct {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        price: Some(Numeric::Number(price)),
        slug: Some(format!("slug-{id}")),
        category: None,
    }
}

/// Source sale paid by card; `sum: None` makes it fail mapping.
#[must_use]
pub fn source_sale(id: &str, sum: Option<f64>, items: Vec<SourceSoldItem>) -> SourceSale {
    SourceSale {
        id: Some(id.to_string()),
        sum: sum.map(Numeric::Number),
        payment_method: Some("card".to_string()),
        time: Some("2024-05-01T10:00:00Z".to_string()),
        fulfilled: None,
        text: None,
        sold_items: Some(items),
    }
}

/// Source sold item pointing at a product by its content API id.
#[must_use]
pub fn source_item(id: &str, product_id: Option<&str>, price: f64) -> SourceSoldItem {
    SourceSoldItem {
        id: Some(id.to_string()),
        price: Some(Numeric::Number(price)),
        product: product_id.map(|pid| SourceProductRef {
            id: Some(pid.to_string()),
            name: None,
            category: None,
        }),
    }
}

/// In-memory catalog that serves slices of fixed vectors and records each request.
#[derive(Debug, Default)]
pub struct InMemorySource {
    products: Mutex<Vec<SourceProduct>>,
    sales: Mutex<Vec<SourceSale>>,
    product_requests: Mutex<Vec<(u32, u32)>>,
    sale_requests: Mutex<Vec<(u32, u32)>>,
    fail_sales_at_skip: Option<u32>,
}

impl InMemorySource {
    /// Creates a source with the given records.
    #[must_use]
    pub fn new(products: Vec<SourceProduct>, sales: Vec<SourceSale>) -> Self {
        Self {
            products: Mutex::new(products),
            sales: Mutex::new(sales),
            ..Self::default()
        }
    }

    /// Makes the sales page at `skip` fail.
    #[must_use]
    pub const fn failing_sales_at(mut self, skip: u32) -> Self {
        self.fail_sales_at_skip = Some(skip);
        self
    }

    /// Replaces the product list, e.g. to simulate edits between runs.
    pub fn set_products(&self, products: Vec<SourceProduct>) {
        *self.products.lock().unwrap() = products;
    }

    /// `(first, skip)` of every product request so far.
    pub fn product_requests(&self) -> Vec<(u32, u32)> {
        self.product_requests.lock().unwrap().clone()
    }

    /// `(first, skip)` of every sale request so far.
    pub fn sale_requests(&self) -> Vec<(u32, u32)> {
        self.sale_requests.lock().unwrap().clone()
    }
}

fn page_of<T: Clone>(records: &[T], first: u32, skip: u32) -> Vec<T> {
    records
        .iter()
        .skip(skip as usize)
        .take(first as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl CatalogSource for InMemorySource {
    async fn product_page(&self, first: u32, skip: u32) -> Result<Vec<SourceProduct>> {
        self.product_requests.lock().unwrap().push((first, skip));
        Ok(page_of(&self.products.lock().unwrap(), first, skip))
    }

    async fn sale_page(&self, first: u32, skip: u32) -> Result<Vec<SourceSale>> {
        self.sale_requests.lock().unwrap().push((first, skip));
        if self.fail_sales_at_skip == Some(skip) {
            return Err(Error::Source {
                message: format!("sales page at offset {skip} unavailable"),
            });
        }
        Ok(page_of(&self.sales.lock().unwrap(), first, skip))
    }
}

/// Product sink that remembers what it was given and rejects one slug.
#[derive(Debug, Default)]
pub struct RecordingSink {
    created: Mutex<Vec<ProductCopy>>,
    reject_slug: Option<String>,
}

impl RecordingSink {
    /// A sink that rejects products with this slug.
    #[must_use]
    pub fn rejecting(slug: &str) -> Self {
        Self {
            reject_slug: Some(slug.to_string()),
            ..Self::default()
        }
    }

    /// Products created so far.
    pub fn created(&self) -> Vec<ProductCopy> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductSink for RecordingSink {
    async fn create_product(&self, product: &ProductCopy) -> Result<Option<String>> {
        if self.reject_slug.as_deref() == Some(product.slug.as_str()) {
            return Err(Error::Source {
                message: format!("value is not unique for the field \"slug\": {}", product.slug),
            });
        }
        let mut created = self.created.lock().unwrap();
        created.push(product.clone());
        Ok(Some(format!("target-{}", created.len())))
    }
}

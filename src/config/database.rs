//! Database configuration module.
//!
//! This module handles the destination database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{Product, Sale, SoldItem};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/till_buddy.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns
/// the default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the destination database.
///
/// Uses `DATABASE_URL` when set, otherwise a local `SQLite` file.
#[instrument]
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to destination database");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the products, sales and sold items tables if they do not exist yet.
///
/// Parents are created before children so the foreign keys on `sold_items`
/// resolve on backends that check them at creation time.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut product_table = schema.create_table_from_entity(Product);
    let mut sale_table = schema.create_table_from_entity(Sale);
    let mut sold_item_table = schema.create_table_from_entity(SoldItem);

    product_table.if_not_exists();
    sale_table.if_not_exists();
    sold_item_table.if_not_exists();

    db.execute(builder.build(&product_table)).await?;
    db.execute(builder.build(&sale_table)).await?;
    db.execute(builder.build(&sold_item_table)).await?;

    Ok(())
}

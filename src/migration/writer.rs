//! Writes mapped records to the destination tables.
//!
//! In upsert mode the row with the same `external_id` is updated in place, so a
//! migration can be re-run without creating duplicates. Insert mode is plain
//! INSERT and fails on an existing `external_id`.

use super::mapper::{NewProduct, NewSale, NewSoldItem};
use crate::{
    core::product::find_id_by_external_id,
    entities::{Product, Sale, SoldItem, product, sale, sold_item},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::OnConflict,
};
use tracing::{debug, warn};

/// How rows that already exist in the destination are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Plain insert; an existing external id is an error
    Insert,
    /// Insert or update by external id
    #[default]
    Upsert,
}

/// Result of writing one sale and its items.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleWrite {
    /// The sale row as stored
    pub sale: sale::Model,
    /// Items written
    pub items_written: usize,
    /// Items the destination rejected
    pub items_failed: usize,
    /// Written items whose product could not be found locally
    pub unresolved_products: usize,
}

/// Writes one product and returns the stored row.
///
/// An upsert keeps `created_at` of an existing row and refreshes `updated_at`.
///
/// # Errors
/// Returns a database error, e.g. when the slug belongs to another product or,
/// in insert mode, when the external id already exists.
pub async fn write_product(
    db: &DatabaseConnection,
    product: &NewProduct,
    mode: WriteMode,
) -> Result<product::Model> {
    let now = Utc::now();
    let model = product::ActiveModel {
        external_id: Set(Some(product.external_id.clone())),
        name: Set(product.name.clone()),
        price: Set(product.price),
        slug: Set(product.slug.clone()),
        category: Set(Some(product.category.clone())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match mode {
        WriteMode::Insert => Ok(model.insert(db).await?),
        WriteMode::Upsert => {
            Product::insert(model)
                .on_conflict(
                    OnConflict::column(product::Column::ExternalId)
                        .update_columns([
                            product::Column::Name,
                            product::Column::Price,
                            product::Column::Slug,
                            product::Column::Category,
                            product::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?;

            Product::find()
                .filter(product::Column::ExternalId.eq(product.external_id.as_str()))
                .one(db)
                .await?
                .ok_or_else(|| not_found("product", &product.external_id))
        }
    }
}

/// Writes one sale, then each of its items under the stored sale id.
///
/// Item failures are logged and counted; they do not fail the sale. An item whose
/// product is unknown locally is written with a null product reference. In upsert
/// mode the sale's items without an external id are deleted and written again.
///
/// # Errors
/// Returns a database error if the sale row itself cannot be written or its
/// id-less items cannot be cleared.
pub async fn write_sale(db: &DatabaseConnection, new_sale: &NewSale, mode: WriteMode) -> Result<SaleWrite> {
    let model = sale::ActiveModel {
        external_id: Set(Some(new_sale.external_id.clone())),
        sum: Set(new_sale.sum),
        payment_method: Set(new_sale.payment_method.clone()),
        time: Set(new_sale.time),
        fulfilled: Set(new_sale.fulfilled),
        text: Set(new_sale.text.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let stored = match mode {
        WriteMode::Insert => model.insert(db).await?,
        WriteMode::Upsert => {
            Sale::insert(model)
                .on_conflict(
                    OnConflict::column(sale::Column::ExternalId)
                        .update_columns([
                            sale::Column::Sum,
                            sale::Column::PaymentMethod,
                            sale::Column::Time,
                            sale::Column::Fulfilled,
                            sale::Column::Text,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?;

            Sale::find()
                .filter(sale::Column::ExternalId.eq(new_sale.external_id.as_str()))
                .one(db)
                .await?
                .ok_or_else(|| not_found("sale", &new_sale.external_id))?
        }
    };

    // Items without an external id cannot be matched on a re-run; replace them.
    if mode == WriteMode::Upsert {
        let removed = SoldItem::delete_many()
            .filter(sold_item::Column::SaleId.eq(stored.id))
            .filter(sold_item::Column::ExternalId.is_null())
            .exec(db)
            .await?;
        if removed.rows_affected > 0 {
            debug!(
                sale = %new_sale.external_id,
                removed = removed.rows_affected,
                "Replacing sold items without external id"
            );
        }
    }

    let mut result = SaleWrite {
        sale: stored,
        items_written: 0,
        items_failed: 0,
        unresolved_products: 0,
    };

    for item in &new_sale.items {
        let product_id = match &item.product_external_id {
            Some(external_id) => match find_id_by_external_id(db, external_id).await {
                Ok(id) => id,
                Err(e) => {
                    warn!("Product lookup for {external_id} failed: {e}");
                    result.items_failed += 1;
                    continue;
                }
            },
            None => None,
        };

        match write_sold_item(db, result.sale.id, product_id, item, mode).await {
            Ok(()) => {
                result.items_written += 1;
                if product_id.is_none() {
                    result.unresolved_products += 1;
                    debug!(
                        sale = %new_sale.external_id,
                        product = ?item.product_external_id,
                        "Sold item written without product"
                    );
                }
            }
            Err(e) => {
                warn!(
                    "Failed to write sold item {} of sale {}: {e}",
                    item.external_id.as_deref().unwrap_or("<no id>"),
                    new_sale.external_id
                );
                result.items_failed += 1;
            }
        }
    }

    Ok(result)
}

async fn write_sold_item(
    db: &DatabaseConnection,
    sale_id: i64,
    product_id: Option<i64>,
    item: &NewSoldItem,
    mode: WriteMode,
) -> Result<()> {
    let model = sold_item::ActiveModel {
        external_id: Set(item.external_id.clone()),
        sale_id: Set(sale_id),
        product_id: Set(product_id),
        price: Set(item.price),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    // Items without an external id have no upsert key.
    if mode == WriteMode::Upsert && item.external_id.is_some() {
        SoldItem::insert(model)
            .on_conflict(
                OnConflict::column(sold_item::Column::ExternalId)
                    .update_columns([
                        sold_item::Column::SaleId,
                        sold_item::Column::ProductId,
                        sold_item::Column::Price,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    } else {
        model.insert(db).await?;
    }
    Ok(())
}

fn not_found(entity: &str, external_id: &str) -> crate::errors::Error {
    DbErr::RecordNotFound(format!("{entity} {external_id} missing after upsert")).into()
}

//! Sale business logic - registering sales at the till and listing sale history.
//!
//! Registering a sale writes the sale row and one sold item row per unit sold in a
//! single database transaction. The history listing loads sold items and their
//! products in fixed-size id batches so large histories do not turn into one
//! oversized `IN (...)` query.

use crate::{
    entities::{Product, Sale, SoldItem, product, sale, sold_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, instrument};

/// Ids per `IN (...)` lookup when assembling sale history.
pub const LOOKUP_BATCH_SIZE: usize = 50;

/// Sold item rows per INSERT; keeps the bind count well under SQLite's limit.
pub const INSERT_BATCH_SIZE: usize = 100;

/// Sale as posted by the till.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSale {
    /// Total charged
    pub sum: f64,
    /// Payment method label
    pub payment_method: String,
    /// Lines on the receipt
    pub sold_items: Vec<SaleLine>,
    /// Optional note
    #[serde(default)]
    pub text: Option<String>,
}

/// One receipt line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleLine {
    /// The product sold, with the price charged
    pub product: LineProduct,
    /// Units sold; one when omitted
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Product reference on a receipt line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineProduct {
    /// Local product id
    pub id: i64,
    /// Unit price charged
    pub price: f64,
}

const fn default_quantity() -> u32 {
    1
}

/// A sold item together with the product it refers to, if that still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoldItemWithProduct {
    /// The sold item row
    #[serde(flatten)]
    pub item: sold_item::Model,
    /// The referenced product
    pub product: Option<product::Model>,
}

/// A sale with all of its sold items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleWithItems {
    /// The sale row
    #[serde(flatten)]
    pub sale: sale::Model,
    /// Items on the sale, in insertion order
    pub sold_items: Vec<SoldItemWithProduct>,
}

/// Registers a sale made at the till.
///
/// The sale time is the current time. Each line becomes `quantity` sold item rows at
/// the line's price. Nothing is written if any row fails.
///
/// # Errors
/// Returns an error if:
/// - The sum or a line price is negative or not finite
/// - The payment method is empty
/// - There are no lines, or a line has quantity zero
/// - A referenced product does not exist ([`Error::ProductNotFound`])
/// - The database write fails
#[instrument(skip(db, request), fields(lines = request.sold_items.len()))]
pub async fn register_sale(db: &DatabaseConnection, request: RegisterSale) -> Result<sale::Model> {
    validate_sale(&request)?;

    let now = chrono::Utc::now();
    let txn = db.begin().await?;

    let product_ids: BTreeSet<i64> = request.sold_items.iter().map(|l| l.product.id).collect();
    let known: BTreeSet<i64> = Product::find()
        .select_only()
        .column(product::Column::Id)
        .filter(product::Column::Id.is_in(product_ids.iter().copied()))
        .into_tuple::<i64>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = product_ids.difference(&known).next() {
        return Err(Error::ProductNotFound {
            key: missing.to_string(),
        });
    }

    let sale = sale::ActiveModel {
        external_id: Set(None),
        sum: Set(request.sum),
        payment_method: Set(request.payment_method.trim().to_string()),
        time: Set(now),
        fulfilled: Set(true),
        text: Set(request.text.filter(|t| !t.trim().is_empty())),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let sale_id = sale.id;
    let items: Vec<sold_item::ActiveModel> = request
        .sold_items
        .iter()
        .flat_map(|line| {
            (0..line.quantity).map(move |_| sold_item::ActiveModel {
                external_id: Set(None),
                sale_id: Set(sale_id),
                product_id: Set(Some(line.product.id)),
                price: Set(line.product.price),
                created_at: Set(now),
                ..Default::default()
            })
        })
        .collect();
    let item_count = items.len();

    for chunk in items.chunks(INSERT_BATCH_SIZE) {
        SoldItem::insert_many(chunk.iter().cloned()).exec(&txn).await?;
    }
    txn.commit().await?;

    info!("Registered sale {} with {item_count} sold items", sale.id);
    Ok(sale)
}

fn validate_sale(request: &RegisterSale) -> Result<()> {
    if !request.sum.is_finite() || request.sum < 0.0 {
        return Err(Error::InvalidAmount {
            amount: request.sum,
        });
    }

    if request.payment_method.trim().is_empty() {
        return Err(Error::Validation {
            message: "Payment method cannot be empty".to_string(),
        });
    }

    if request.sold_items.is_empty() {
        return Err(Error::Validation {
            message: "A sale needs at least one sold item".to_string(),
        });
    }

    for line in &request.sold_items {
        if line.quantity == 0 {
            return Err(Error::Validation {
                message: format!("Quantity for product {} must be at least 1", line.product.id),
            });
        }
        if !line.product.price.is_finite() || line.product.price < 0.0 {
            return Err(Error::InvalidAmount {
                amount: line.product.price,
            });
        }
    }

    Ok(())
}

/// Lists every sale, newest first, with its sold items and their products.
///
/// # Errors
/// Returns an error if any of the batched queries fails.
pub async fn list_sales_with_items(db: &DatabaseConnection) -> Result<Vec<SaleWithItems>> {
    let sales = Sale::find()
        .order_by_desc(sale::Column::Time)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await?;

    if sales.is_empty() {
        return Ok(Vec::new());
    }

    let sale_ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
    let mut items = Vec::new();
    for batch in sale_ids.chunks(LOOKUP_BATCH_SIZE) {
        let batch_items = SoldItem::find()
            .filter(sold_item::Column::SaleId.is_in(batch.iter().copied()))
            .order_by_asc(sold_item::Column::Id)
            .all(db)
            .await?;
        items.extend(batch_items);
    }

    let product_ids: Vec<i64> = items
        .iter()
        .filter_map(|item| item.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut products_by_id = HashMap::new();
    for batch in product_ids.chunks(LOOKUP_BATCH_SIZE) {
        let batch_products = Product::find()
            .filter(product::Column::Id.is_in(batch.iter().copied()))
            .all(db)
            .await?;
        products_by_id.extend(batch_products.into_iter().map(|p| (p.id, p)));
    }

    let mut items_by_sale: HashMap<i64, Vec<SoldItemWithProduct>> = HashMap::new();
    for item in items {
        let product = item
            .product_id
            .and_then(|id| products_by_id.get(&id).cloned());
        items_by_sale
            .entry(item.sale_id)
            .or_default()
            .push(SoldItemWithProduct { item, product });
    }

    Ok(sales
        .into_iter()
        .map(|sale| {
            let sold_items = items_by_sale.remove(&sale.id).unwrap_or_default();
            SaleWithItems { sale, sold_items }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    fn line(product_id: i64, price: f64, quantity: u32) -> SaleLine {
        SaleLine {
            product: LineProduct {
                id: product_id,
                price,
            },
            quantity,
        }
    }

    fn request(sum: f64, lines: Vec<SaleLine>) -> RegisterSale {
        RegisterSale {
            sum,
            payment_method: "card".to_string(),
            sold_items: lines,
            text: None,
        }
    }

    #[tokio::test]
    async fn test_register_sale_expands_quantities() -> Result<()> {
        let db = setup_test_db().await?;
        let coffee = create_test_product(&db, "Coffee", "coffee", 35.0).await?;
        let bun = create_test_product(&db, "Bun", "bun", 20.0).await?;

        let sale = register_sale(
            &db,
            request(110.0, vec![line(coffee.id, 35.0, 2), line(bun.id, 40.0, 1)]),
        )
        .await?;

        assert_eq!(sale.sum, 110.0);
        assert_eq!(sale.payment_method, "card");
        assert!(sale.fulfilled);
        assert!(sale.external_id.is_none());

        let items = SoldItem::find()
            .filter(sold_item::Column::SaleId.eq(sale.id))
            .all(&db)
            .await?;
        assert_eq!(items.len(), 3);
        assert_eq!(
            items.iter().filter(|i| i.product_id == Some(coffee.id)).count(),
            2
        );
        // Line price wins over the product's current price
        assert!(
            items
                .iter()
                .any(|i| i.product_id == Some(bun.id) && i.price == 40.0)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_register_sale_large_quantity_spans_insert_batches() -> Result<()> {
        let db = setup_test_db().await?;
        let coffee = create_test_product(&db, "Coffee", "coffee", 35.0).await?;
        let quantity = u32::try_from(INSERT_BATCH_SIZE * 25 + 7).map_err(|e| Error::Validation {
            message: e.to_string(),
        })?;

        let sale = register_sale(
            &db,
            request(35.0 * f64::from(quantity), vec![line(coffee.id, 35.0, quantity)]),
        )
        .await?;

        let stored = SoldItem::find()
            .filter(sold_item::Column::SaleId.eq(sale.id))
            .count(&db)
            .await?;
        assert_eq!(stored, u64::from(quantity));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_sale_deserializes_till_payload() -> Result<()> {
        let payload: RegisterSale = serde_json::from_str(
            r#"{"sum": 50, "paymentMethod": "cash", "soldItems": [{"product": {"id": 1, "price": 25}, "quantity": 2}], "text": "gift"}"#,
        )?;
        assert_eq!(payload.sold_items[0].quantity, 2);
        assert_eq!(payload.text.as_deref(), Some("gift"));

        let without_quantity: RegisterSale = serde_json::from_str(
            r#"{"sum": 25, "paymentMethod": "cash", "soldItems": [{"product": {"id": 1, "price": 25}}]}"#,
        )?;
        assert_eq!(without_quantity.sold_items[0].quantity, 1);
        assert!(without_quantity.text.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_register_sale_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = register_sale(&db, request(-1.0, vec![line(1, 1.0, 1)])).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: _ })));

        let result = register_sale(&db, request(f64::NAN, vec![line(1, 1.0, 1)])).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: _ })));

        let result = register_sale(&db, request(10.0, vec![])).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = register_sale(&db, request(10.0, vec![line(1, 10.0, 0)])).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let mut blank_method = request(10.0, vec![line(1, 10.0, 1)]);
        blank_method.payment_method = " ".to_string();
        let result = register_sale(&db, blank_method).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        assert_eq!(Sale::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_sale_unknown_product_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;

        let coffee = create_test_product(&db, "Coffee", "coffee", 35.0).await?;

        let result = register_sale(
            &db,
            request(45.0, vec![line(coffee.id, 35.0, 1), line(999, 10.0, 1)]),
        )
        .await;

        assert!(matches!(result, Err(Error::ProductNotFound { key }) if key == "999"));
        assert_eq!(Sale::find().count(&db).await?, 0);
        assert_eq!(SoldItem::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_sales_with_items_groups_and_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let coffee = create_test_product(&db, "Coffee", "coffee", 35.0).await?;
        let tea = create_test_product(&db, "Tea", "tea", 30.0).await?;

        let older = create_sale_at(&db, "2024-01-01T09:00:00Z", 35.0).await?;
        add_sold_item(&db, older.id, Some(coffee.id), 35.0).await?;
        let newer = create_sale_at(&db, "2024-01-02T09:00:00Z", 65.0).await?;
        add_sold_item(&db, newer.id, Some(coffee.id), 35.0).await?;
        add_sold_item(&db, newer.id, Some(tea.id), 30.0).await?;
        add_sold_item(&db, newer.id, None, 0.0).await?;
        let empty = create_sale_at(&db, "2023-12-31T09:00:00Z", 0.0).await?;

        let sales = list_sales_with_items(&db).await?;

        let ids: Vec<i64> = sales.iter().map(|s| s.sale.id).collect();
        assert_eq!(ids, vec![newer.id, older.id, empty.id]);

        assert_eq!(sales[0].sold_items.len(), 3);
        assert_eq!(
            sales[0].sold_items[1].product.as_ref().map(|p| p.name.as_str()),
            Some("Tea")
        );
        assert!(sales[0].sold_items[2].product.is_none());
        assert_eq!(sales[1].sold_items.len(), 1);
        assert!(sales[2].sold_items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_sales_spans_lookup_batches() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Coffee", "coffee", 35.0).await?;

        let sale_count = LOOKUP_BATCH_SIZE * 2 + 5;
        for _ in 0..sale_count {
            register_sale(&db, request(35.0, vec![line(product.id, 35.0, 1)])).await?;
        }

        let sales = list_sales_with_items(&db).await?;

        assert_eq!(sales.len(), sale_count);
        assert!(sales.iter().all(|s| s.sold_items.len() == 1));
        assert!(
            sales
                .iter()
                .all(|s| s.sold_items[0].product.as_ref().map(|p| p.id) == Some(product.id))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_list_sales_empty() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(list_sales_with_items(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_with_items_serializes_flat() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Coffee", "coffee", 35.0).await?;
        register_sale(&db, request(35.0, vec![line(product.id, 35.0, 1)])).await?;

        let sales = list_sales_with_items(&db).await?;
        let json = serde_json::to_value(&sales[0])?;

        assert_eq!(json["payment_method"], "card");
        assert_eq!(json["sold_items"][0]["price"], 35.0);
        assert_eq!(json["sold_items"][0]["product"]["slug"], "coffee");
        Ok(())
    }
}

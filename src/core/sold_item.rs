//! Sold item queries for the daily overview at the till.

use crate::{
    entities::{SoldItem, sold_item},
    errors::Result,
};
use chrono::{NaiveDate, NaiveTime, TimeDelta, Utc};
use sea_orm::{QueryOrder, prelude::*};

/// Lists sold items whose `created_at` falls on `date` (UTC).
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn sold_items_on(db: &DatabaseConnection, date: NaiveDate) -> Result<Vec<sold_item::Model>> {
    let day_start = date.and_time(NaiveTime::MIN).and_utc();
    let next_day_start = day_start + TimeDelta::days(1);

    SoldItem::find()
        .filter(sold_item::Column::CreatedAt.gte(day_start))
        .filter(sold_item::Column::CreatedAt.lt(next_day_start))
        .order_by_asc(sold_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists sold items created today (UTC).
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn sold_items_today(db: &DatabaseConnection) -> Result<Vec<sold_item::Model>> {
    sold_items_on(db, Utc::now().date_naive()).await
}

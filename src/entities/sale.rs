//! Sale entity - one checkout at the till.
//!
//! A sale owns zero or more sold items. `sum` is what was charged and is stored
//! independently of the item prices.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Local identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identifier assigned by the content API, if the row was migrated
    #[sea_orm(unique)]
    pub external_id: Option<String>,
    /// Total charged
    pub sum: f64,
    /// Payment method label as entered at the till (e.g., `"card"`, `"cash"`)
    pub payment_method: String,
    /// When the sale happened
    pub time: DateTimeUtc,
    /// Whether the order has been handed over
    pub fulfilled: bool,
    /// Optional free-text note
    pub text: Option<String>,
    /// When the row was first written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One sale has many sold items
    #[sea_orm(has_many = "super::sold_item::Entity")]
    SoldItems,
}

impl Related<super::sold_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SoldItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

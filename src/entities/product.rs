//! Product entity - items that can be sold at the till.
//!
//! Products imported from the content API carry its identifier in `external_id`;
//! that column is the upsert key for repeated migrations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Local identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identifier assigned by the content API, if the row was migrated
    #[sea_orm(unique)]
    pub external_id: Option<String>,
    /// Display name (e.g., "Coffee")
    pub name: String,
    /// Current price
    pub price: f64,
    /// URL-safe unique key used by the product page
    #[sea_orm(unique)]
    pub slug: String,
    /// Free-form category, `"Unknown"` for migrated rows that had none
    pub category: Option<String>,
    /// When the row was first written
    pub created_at: DateTimeUtc,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product appears on many sold items
    #[sea_orm(has_many = "super::sold_item::Entity")]
    SoldItems,
}

impl Related<super::sold_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SoldItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

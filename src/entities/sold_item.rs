//! Sold item entity - one unit of a product on a sale.
//!
//! `price` is the price at the time of sale and does not follow later product
//! price changes. `product_id` is null when the product could not be resolved
//! during migration.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sold item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sold_items")]
pub struct Model {
    /// Local identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identifier assigned by the content API, if the row was migrated
    #[sea_orm(unique)]
    pub external_id: Option<String>,
    /// Owning sale
    pub sale_id: i64,
    /// Product that was sold, if known
    pub product_id: Option<i64>,
    /// Unit price charged
    pub price: f64,
    /// When the row was first written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `SoldItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sold item belongs to one sale
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id",
        on_delete = "Cascade"
    )]
    Sale,
    /// Each sold item optionally points at a product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "SetNull"
    )]
    Product,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

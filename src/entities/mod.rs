//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod product;
pub mod sale;
pub mod sold_item;

// Re-export specific types to avoid conflicts
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
pub use sold_item::{Column as SoldItemColumn, Entity as SoldItem, Model as SoldItemModel};

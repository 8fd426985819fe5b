//! Maps content API records onto the destination's insert shape.
//!
//! A record that lacks a required field is not an error: the mapper hands back a
//! [`SkipReason`] and the orchestrator counts it as a failed record.

use crate::source::{Numeric, SourceProduct, SourceSale, SourceSoldItem};
use chrono::{DateTime, Utc};
use std::fmt;

/// Category given to products that arrive without one.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Product ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    /// Content API identifier, the upsert key
    pub external_id: String,
    /// Display name
    pub name: String,
    /// Current price
    pub price: f64,
    /// URL-safe key
    pub slug: String,
    /// Category, defaulted to [`UNKNOWN_CATEGORY`]
    pub category: String,
}

/// Sale ready to be written, with its items.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    /// Content API identifier, the upsert key
    pub external_id: String,
    /// Total charged
    pub sum: f64,
    /// Payment method label
    pub payment_method: String,
    /// When the sale happened
    pub time: DateTime<Utc>,
    /// Whether the order was handed over
    pub fulfilled: bool,
    /// Free-text note
    pub text: Option<String>,
    /// Items to write after the sale row
    pub items: Vec<NewSoldItem>,
}

/// Sold item ready to be written under its sale.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSoldItem {
    /// Content API identifier of the item, if it had one
    pub external_id: Option<String>,
    /// Content API identifier of the product, resolved to a local id at write time
    pub product_external_id: Option<String>,
    /// Price charged for this unit
    pub price: f64,
}

/// Why a record was left out of the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// One or more required fields were absent, null or blank
    MissingFields(Vec<&'static str>),
    /// The sale time was present but not an RFC 3339 timestamp
    InvalidTime(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
            Self::InvalidTime(time) => write!(f, "invalid sale time: {time}"),
        }
    }
}

/// Maps a source product, requiring id, name, price and slug.
///
/// # Errors
/// Returns a [`SkipReason`] naming every missing field.
pub fn map_product(source: &SourceProduct) -> Result<NewProduct, SkipReason> {
    let id = present(source.id.as_deref());
    let name = present(source.name.as_deref());
    let price = source.price.as_ref().filter(|price| !is_blank(price));
    let slug = present(source.slug.as_deref());

    let mut missing = Vec::new();
    if id.is_none() {
        missing.push("id");
    }
    if name.is_none() {
        missing.push("name");
    }
    if price.is_none() {
        missing.push("price");
    }
    if slug.is_none() {
        missing.push("slug");
    }

    match (id, name, price, slug) {
        (Some(id), Some(name), Some(price), Some(slug)) => Ok(NewProduct {
            external_id: id.to_string(),
            name: name.to_string(),
            price: price.to_f64_or_zero(),
            slug: slug.to_string(),
            category: present(source.category.as_deref())
                .unwrap_or(UNKNOWN_CATEGORY)
                .to_string(),
        }),
        _ => Err(SkipReason::MissingFields(missing)),
    }
}

/// Maps a source sale, requiring id, sum, payment method and time.
///
/// Only an explicit `false` marks a sale as unfulfilled.
///
/// # Errors
/// Returns a [`SkipReason`] for missing fields or an unparseable time.
pub fn map_sale(source: &SourceSale) -> Result<NewSale, SkipReason> {
    let id = present(source.id.as_deref());
    let sum = source.sum.as_ref().filter(|sum| !is_blank(sum));
    let payment_method = present(source.payment_method.as_deref());
    let time = present(source.time.as_deref());

    let mut missing = Vec::new();
    if id.is_none() {
        missing.push("id");
    }
    if sum.is_none() {
        missing.push("sum");
    }
    if payment_method.is_none() {
        missing.push("paymentMethod");
    }
    if time.is_none() {
        missing.push("time");
    }

    let (Some(id), Some(sum), Some(payment_method), Some(time)) = (id, sum, payment_method, time)
    else {
        return Err(SkipReason::MissingFields(missing));
    };

    let time = DateTime::parse_from_rfc3339(time)
        .map_err(|_| SkipReason::InvalidTime(time.to_string()))?
        .with_timezone(&Utc);

    let items = source
        .sold_items
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(map_sold_item)
        .collect();

    Ok(NewSale {
        external_id: id.to_string(),
        sum: sum.to_f64_or_zero(),
        payment_method: payment_method.to_string(),
        time,
        fulfilled: source.fulfilled != Some(false),
        text: present(source.text.as_deref()).map(str::to_string),
        items,
    })
}

fn map_sold_item(source: &SourceSoldItem) -> NewSoldItem {
    NewSoldItem {
        external_id: present(source.id.as_deref()).map(str::to_string),
        product_external_id: source
            .product
            .as_ref()
            .and_then(|product| present(product.id.as_deref()))
            .map(str::to_string),
        price: source.price.as_ref().map_or(0.0, Numeric::to_f64_or_zero),
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_blank(value: &Numeric) -> bool {
    matches!(value, Numeric::Text(text) if text.trim().is_empty())
}

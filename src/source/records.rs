//! Records as the content API returns them.
//!
//! Every field is optional: the API hands back whatever was entered in the CMS,
//! and deciding what is usable is the mapper's job.

use serde::{Deserialize, Serialize};

/// A number that may arrive as a JSON number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// Plain JSON number
    Number(f64),
    /// Number typed into a text field
    Text(String),
}

impl Numeric {
    /// Converts to a finite float, falling back to `0.0` when the value does not parse.
    #[must_use]
    pub fn to_f64_or_zero(&self) -> f64 {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if value.is_finite() { value } else { 0.0 }
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Product as listed by the `products` query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceProduct {
    /// Content API identifier
    pub id: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Current price
    pub price: Option<Numeric>,
    /// URL-safe key
    pub slug: Option<String>,
    /// Category label
    pub category: Option<String>,
}

/// Sale as listed by the `sales` query, with its sold items inlined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSale {
    /// Content API identifier
    pub id: Option<String>,
    /// Total charged
    pub sum: Option<Numeric>,
    /// Payment method label
    pub payment_method: Option<String>,
    /// RFC 3339 timestamp of the sale
    pub time: Option<String>,
    /// Whether the order was handed over; the CMS schema spells it `fullfilled`
    #[serde(rename = "fullfilled", alias = "fulfilled")]
    pub fulfilled: Option<bool>,
    /// Free-text note
    pub text: Option<String>,
    /// Items on the sale
    pub sold_items: Option<Vec<SourceSoldItem>>,
}

/// One sold item nested in a [`SourceSale`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSoldItem {
    /// Content API identifier
    pub id: Option<String>,
    /// Price charged for this unit
    pub price: Option<Numeric>,
    /// Summary of the product that was sold
    pub product: Option<SourceProductRef>,
}

/// Product summary nested in a [`SourceSoldItem`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceProductRef {
    /// Content API identifier of the product
    pub id: Option<String>,
    /// Product name at query time
    pub name: Option<String>,
    /// Product category at query time
    pub category: Option<String>,
}

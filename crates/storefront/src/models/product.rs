//! Catalog read models.

use serde::Serialize;

use kiosk_core::{Money, ProductId};

/// An active catalog product.
///
/// In listings `text` holds a short teaser of the description; on the detail
/// route it holds the full description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub text: String,
    pub price: Money,
    pub image: Option<String>,
}

/// Just the full description, for clients refreshing a cached product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProductText {
    pub id: ProductId,
    pub text: String,
}

/// One page of the active catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Only computed for the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    pub page: u32,
    pub limit: u32,
}

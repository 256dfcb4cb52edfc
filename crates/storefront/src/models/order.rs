//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kiosk_core::{AddressId, Money, OrderId, OrderStatus, ProductId};

/// One cart entry submitted by a client. Client-side prices are never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart entry priced from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLine {
    pub product_id: ProductId,
    /// Catalog price at the moment of reconciliation.
    pub unit_price: Money,
    pub quantity: u32,
}

/// A validated request to place an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub address_id: AddressId,
    pub lines: Vec<CartLine>,
    /// The total the client believes it is paying.
    pub claimed_total: Money,
}

/// Shipping address as captured on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address_name: String,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal: String,
    pub country: String,
}

/// An order line as shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub id: ProductId,
    pub title: String,
    pub price: Money,
    pub quantity: u32,
}

/// A placed order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: OrderId,
    pub sum_price: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub shipping: ShippingAddress,
    /// Ordered by product id.
    pub products: Vec<OrderLine>,
}

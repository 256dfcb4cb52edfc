//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use kiosk_core::{AddressId, Money, OrderId, ProductId};

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::{CartLine, OrderDetail, OrderRequest};
use crate::services::{PgCheckoutStore, get_order, place_order, validate_request};
use crate::state::AppState;

/// Body of `POST /orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub address_id: AddressId,
    pub products: Vec<CartItem>,
    /// The total the client expects to pay; a number or numeric string.
    pub sum_price: Money,
}

/// One cart entry. Any client-side price sent along is ignored.
#[derive(Debug, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl From<OrderBody> for OrderRequest {
    fn from(body: OrderBody) -> Self {
        Self {
            address_id: body.address_id,
            lines: body
                .products
                .into_iter()
                .map(|item| CartLine {
                    product_id: item.id,
                    quantity: item.quantity.unwrap_or(1),
                })
                .collect(),
            claimed_total: body.sum_price,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    order_id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    order: OrderDetail,
}

/// Place an order for the caller.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<OrderBody>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    let request = OrderRequest::from(body);
    validate_request(&request)?;

    let mut conn = state.pool().acquire().await?;
    let mut store = PgCheckoutStore::new(&mut *conn);
    let order_id = place_order(&mut store, user.id, &request).await?;

    Ok((StatusCode::CREATED, Json(OrderCreated { order_id })))
}

/// Show one of the caller's orders.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    order_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<OrderResponse>> {
    let Path(order_id) = order_id.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut conn = state.pool().acquire().await?;
    let order = get_order(&mut *conn, user.id, OrderId::new(order_id))
        .await?
        .ok_or(AppError::NotFound("Bestellung nicht gefunden."))?;

    Ok(Json(OrderResponse { order }))
}

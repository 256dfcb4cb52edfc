//! HTTP route handlers for the checkout API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Catalog (requires auth)
//! GET  /products               - Active products, paginated
//! GET  /products/{id}          - Product detail (?update=true for the description only)
//!
//! # Address book (requires auth)
//! GET  /address                - List the caller's addresses
//! POST /address                - Create an address
//! PUT  /address                - Update an address
//!
//! # Orders (requires auth)
//! POST /orders                 - Place an order
//! GET  /orders/{order_id}      - Order detail
//! ```

pub mod address;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route(
            "/address",
            get(address::list)
                .post(address::create)
                .put(address::update),
        )
        .route("/orders", post(orders::create))
        .route("/orders/{order_id}", get(orders::show))
}

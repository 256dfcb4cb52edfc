//! Checkout error types.

use thiserror::Error;

use kiosk_core::{Money, ProductId};

use crate::db::RepositoryError;

/// A request that is malformed or incomplete. Always detected before any write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent or blank.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but unusable.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// An address update that would change nothing.
    #[error("no fields to update")]
    EmptyPatch,

    /// An order without lines.
    #[error("cart is empty")]
    EmptyCart,

    /// An order with more lines than allowed.
    #[error("cart has {0} lines, at most {max} allowed", max = crate::services::orders::MAX_CART_LINES)]
    TooManyLines(usize),

    /// A quantity outside `1..=MAX_QUANTITY`.
    #[error("invalid quantity for product {0}")]
    InvalidQuantity(ProductId),

    /// The order total is larger than an order can store.
    #[error("order total out of range")]
    TotalOutOfRange,
}

/// Errors that can occur while managing addresses or placing orders.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request is malformed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The address does not exist or belongs to another user.
    #[error("address not found")]
    AddressNotFound,

    /// The product does not exist or is inactive.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The client's total disagrees with the catalog-derived total.
    #[error("price mismatch: resolved {resolved}, claimed {claimed}")]
    PriceMismatch {
        /// Total computed from catalog prices.
        resolved: Money,
        /// Total submitted by the client.
        claimed: Money,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl CheckoutError {
    /// Whether the error was caused by the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repository(_))
    }
}

//! Order price reconciliation.
//!
//! The catalog is the only source of truth for prices. A client submits its
//! cart and the total it expects to pay; the total is recomputed from catalog
//! prices and the order is refused unless the two agree to the cent. The
//! server value is never silently substituted.

use std::future::Future;

use kiosk_core::{Money, ProductId};

use super::error::{CheckoutError, ValidationError};
use crate::db::{ProductRepository, RepositoryError};
use crate::models::{CartLine, ResolvedLine};

/// Largest total an order can store (`NUMERIC(10,2)`).
pub const MAX_ORDER_TOTAL: Money = Money::from_cents(9_999_999_999);

/// Read access to authoritative catalog prices.
pub trait PriceCatalog {
    /// Price of an active product, or `None` if it is unknown or inactive.
    fn active_price(
        &mut self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Option<Money>, RepositoryError>> + Send;
}

impl PriceCatalog for ProductRepository<'_> {
    async fn active_price(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<Money>, RepositoryError> {
        Self::active_price(self, product_id).await
    }
}

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Sum of catalog price times quantity over all lines.
    pub total: Money,
    /// Lines with the catalog price snapshot to store.
    pub lines: Vec<ResolvedLine>,
}

/// Recompute the order total from catalog prices and compare it with the
/// client's claim.
///
/// # Errors
///
/// Returns `CheckoutError::Validation` if the cart is empty or the total
/// exceeds `MAX_ORDER_TOTAL`.
/// Returns `CheckoutError::ProductNotFound` for unknown or inactive products.
/// Returns `CheckoutError::PriceMismatch` if the totals differ.
/// Returns `CheckoutError::Repository` if a price lookup fails.
pub async fn reconcile<C: PriceCatalog>(
    catalog: &mut C,
    cart: &[CartLine],
    claimed_total: Money,
) -> Result<Reconciliation, CheckoutError> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }

    let mut total = Money::ZERO;
    let mut lines = Vec::with_capacity(cart.len());

    for line in cart {
        let unit_price = catalog
            .active_price(line.product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(line.product_id))?;

        total = unit_price
            .checked_mul(line.quantity)
            .and_then(|subtotal| total.checked_add(subtotal))
            .filter(|sum| *sum <= MAX_ORDER_TOTAL)
            .ok_or(ValidationError::TotalOutOfRange)?;

        lines.push(ResolvedLine {
            product_id: line.product_id,
            unit_price,
            quantity: line.quantity,
        });
    }

    if total != claimed_total {
        tracing::info!(
            resolved = %total,
            claimed = %claimed_total,
            "Rejecting order with mismatched total"
        );
        return Err(CheckoutError::PriceMismatch {
            resolved: total,
            claimed: claimed_total,
        });
    }

    Ok(Reconciliation { total, lines })
}

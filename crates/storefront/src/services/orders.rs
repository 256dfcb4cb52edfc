//! Order placement and retrieval.
//!
//! Placing an order runs in three steps, each of which can stop it:
//!
//! 1. The address must belong to the caller.
//! 2. The claimed total must match the catalog (see `pricing`).
//! 3. Header and lines are written in one transaction.
//!
//! Nothing is written unless all three succeed.

use std::future::Future;

use sqlx::PgConnection;

use kiosk_core::{AddressId, Money, OrderId, ProductId, UserId};

use super::error::{CheckoutError, ValidationError};
use super::pricing::{PriceCatalog, Reconciliation, reconcile};
use crate::db::{AddressRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::models::{OrderDetail, OrderRequest};

/// Maximum number of lines in one order.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of one line.
pub const MAX_QUANTITY: u32 = 10_000;

/// Storage needed to place an order.
pub trait OrderStore: PriceCatalog {
    /// Number of the user's addresses with this id.
    fn owns_address(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Write the order header and lines atomically.
    ///
    /// Must return `RepositoryError::NotFound` if the address no longer
    /// belongs to the user at write time.
    fn insert_order(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
        reconciliation: &Reconciliation,
    ) -> impl Future<Output = Result<OrderId, RepositoryError>> + Send;
}

/// `OrderStore` over the request's database connection.
pub struct PgCheckoutStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgCheckoutStore<'c> {
    /// Create a new store on a borrowed connection.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl PriceCatalog for PgCheckoutStore<'_> {
    async fn active_price(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<Money>, RepositoryError> {
        ProductRepository::new(&mut *self.conn)
            .active_price(product_id)
            .await
    }
}

impl OrderStore for PgCheckoutStore<'_> {
    async fn owns_address(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let count = AddressRepository::new(&mut *self.conn)
            .count_owned(user_id, address_id)
            .await?;
        Ok(count > 0)
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
        reconciliation: &Reconciliation,
    ) -> Result<OrderId, RepositoryError> {
        OrderRepository::new(&mut *self.conn)
            .create(
                user_id,
                address_id,
                reconciliation.total,
                &reconciliation.lines,
            )
            .await
    }
}

/// Check the shape of an order request before touching storage.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate_request(request: &OrderRequest) -> Result<(), ValidationError> {
    if !request.address_id.is_valid() {
        return Err(ValidationError::InvalidField("addressId"));
    }
    if request.lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    if request.lines.len() > MAX_CART_LINES {
        return Err(ValidationError::TooManyLines(request.lines.len()));
    }
    for line in &request.lines {
        if !line.product_id.is_valid() {
            return Err(ValidationError::InvalidField("products"));
        }
        if !(1..=MAX_QUANTITY).contains(&line.quantity) {
            return Err(ValidationError::InvalidQuantity(line.product_id));
        }
    }
    if request.claimed_total.is_negative() {
        return Err(ValidationError::InvalidField("sumPrice"));
    }
    Ok(())
}

/// Place an order for the user and return its id.
///
/// The stored line prices are the catalog prices at reconciliation time,
/// never values supplied by the client.
///
/// # Errors
///
/// Returns `CheckoutError::Validation` if the request is malformed.
/// Returns `CheckoutError::AddressNotFound` if the address is not the user's.
/// Returns `CheckoutError::ProductNotFound` or `CheckoutError::PriceMismatch`
/// from reconciliation.
/// Returns `CheckoutError::Repository` if storage fails; nothing is written.
pub async fn place_order<S: OrderStore + Send>(
    store: &mut S,
    user_id: UserId,
    request: &OrderRequest,
) -> Result<OrderId, CheckoutError> {
    validate_request(request)?;

    if !store.owns_address(user_id, request.address_id).await? {
        tracing::info!(%user_id, address_id = %request.address_id, "Order for unknown or foreign address");
        return Err(CheckoutError::AddressNotFound);
    }

    let reconciliation = reconcile(store, &request.lines, request.claimed_total).await?;

    let order_id = store
        .insert_order(user_id, request.address_id, &reconciliation)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CheckoutError::AddressNotFound,
            other => CheckoutError::Repository(other),
        })?;

    tracing::info!(
        %user_id,
        %order_id,
        total = %reconciliation.total,
        lines = reconciliation.lines.len(),
        "Order placed"
    );
    Ok(order_id)
}

/// Load one of the user's orders.
///
/// Returns `None` if the order does not exist or belongs to someone else.
///
/// # Errors
///
/// Returns `CheckoutError::Repository` if the query fails.
pub async fn get_order(
    conn: &mut PgConnection,
    user_id: UserId,
    order_id: OrderId,
) -> Result<Option<OrderDetail>, CheckoutError> {
    Ok(OrderRepository::new(conn).get(user_id, order_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartLine, ResolvedLine};
    use crate::services::pricing::tests::MemoryCatalog;

    /// In-memory store recording written orders.
    #[derive(Default)]
    struct MemoryStore {
        catalog: MemoryCatalog,
        addresses: Vec<(UserId, AddressId)>,
        orders: Vec<(UserId, AddressId, Reconciliation)>,
        fail_insert: bool,
    }

    impl PriceCatalog for MemoryStore {
        async fn active_price(
            &mut self,
            product_id: ProductId,
        ) -> Result<Option<Money>, RepositoryError> {
            self.catalog.active_price(product_id).await
        }
    }

    impl OrderStore for MemoryStore {
        async fn owns_address(
            &mut self,
            user_id: UserId,
            address_id: AddressId,
        ) -> Result<bool, RepositoryError> {
            Ok(self.addresses.contains(&(user_id, address_id)))
        }

        async fn insert_order(
            &mut self,
            user_id: UserId,
            address_id: AddressId,
            reconciliation: &Reconciliation,
        ) -> Result<OrderId, RepositoryError> {
            if self.fail_insert {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            self.orders
                .push((user_id, address_id, reconciliation.clone()));
            let id = i32::try_from(self.orders.len()).unwrap_or(i32::MAX);
            Ok(OrderId::new(id))
        }
    }

    const ALICE: UserId = UserId::new(1);
    const BOB: UserId = UserId::new(2);

    fn store() -> MemoryStore {
        MemoryStore {
            catalog: MemoryCatalog::with(&[(1, 1099), (2, 500)]),
            addresses: vec![(ALICE, AddressId::new(10)), (BOB, AddressId::new(20))],
            ..MemoryStore::default()
        }
    }

    fn request(address_id: i32, lines: &[(i32, u32)], claimed_cents: i64) -> OrderRequest {
        OrderRequest {
            address_id: AddressId::new(address_id),
            lines: lines
                .iter()
                .map(|&(id, quantity)| CartLine {
                    product_id: ProductId::new(id),
                    quantity,
                })
                .collect(),
            claimed_total: Money::from_cents(claimed_cents),
        }
    }

    #[tokio::test]
    async fn test_place_order_stores_catalog_prices() {
        let mut store = store();

        let result = place_order(&mut store, ALICE, &request(10, &[(1, 2)], 2198)).await;

        assert!(matches!(result, Ok(id) if id == OrderId::new(1)));
        assert_eq!(store.orders.len(), 1);
        let Some((user, address, reconciliation)) = store.orders.first() else {
            panic!("expected a stored order");
        };
        assert_eq!(*user, ALICE);
        assert_eq!(*address, AddressId::new(10));
        assert_eq!(reconciliation.total, Money::from_cents(2198));
        assert_eq!(
            reconciliation.lines,
            vec![ResolvedLine {
                product_id: ProductId::new(1),
                unit_price: Money::from_cents(1099),
                quantity: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_foreign_address_is_rejected_before_pricing() {
        let mut store = store();

        let result = place_order(&mut store, ALICE, &request(20, &[(1, 2)], 2198)).await;

        assert!(matches!(result, Err(CheckoutError::AddressNotFound)));
        assert!(store.catalog.lookups.is_empty());
        assert!(store.orders.is_empty());
    }

    #[tokio::test]
    async fn test_price_mismatch_writes_nothing() {
        let mut store = store();

        let result = place_order(&mut store, ALICE, &request(10, &[(1, 2)], 2000)).await;

        assert!(matches!(result, Err(CheckoutError::PriceMismatch { .. })));
        assert!(store.orders.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_writes_nothing() {
        let mut store = store();

        let result = place_order(&mut store, ALICE, &request(10, &[(1, 1), (99, 1)], 1099)).await;

        assert!(matches!(
            result,
            Err(CheckoutError::ProductNotFound(id)) if id == ProductId::new(99)
        ));
        assert!(store.orders.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_a_client_error() {
        let mut store = MemoryStore {
            fail_insert: true,
            ..store()
        };

        let result = place_order(&mut store, ALICE, &request(10, &[(2, 1)], 500)).await;

        let Err(err) = result else {
            panic!("expected failure");
        };
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_invalid_request_skips_storage() {
        let mut store = store();

        let result = place_order(&mut store, ALICE, &request(10, &[], 0)).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Validation(ValidationError::EmptyCart))
        ));
        assert!(store.catalog.lookups.is_empty());
    }

    #[test]
    fn test_validate_request_rules() {
        assert_eq!(validate_request(&request(10, &[(1, 1)], 1099)), Ok(()));
        assert_eq!(
            validate_request(&request(0, &[(1, 1)], 1099)),
            Err(ValidationError::InvalidField("addressId"))
        );
        assert_eq!(
            validate_request(&request(10, &[(1, 0)], 0)),
            Err(ValidationError::InvalidQuantity(ProductId::new(1)))
        );
        assert_eq!(
            validate_request(&request(10, &[(1, MAX_QUANTITY + 1)], 0)),
            Err(ValidationError::InvalidQuantity(ProductId::new(1)))
        );
        assert_eq!(
            validate_request(&request(10, &[(1, 1)], -1)),
            Err(ValidationError::InvalidField("sumPrice"))
        );

        let too_many: Vec<(i32, u32)> = (1..=101).map(|id| (id, 1)).collect();
        assert_eq!(
            validate_request(&request(10, &too_many, 0)),
            Err(ValidationError::TooManyLines(101))
        );
    }
}

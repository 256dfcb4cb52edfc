//! Order repository.
//!
//! An order header and its lines are written in one transaction: either all
//! rows commit or none do.

use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};

use kiosk_core::{AddressId, Money, OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{OrderDetail, OrderLine, ResolvedLine, ShippingAddress};

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    conn: &'a mut PgConnection,
}

/// One row of the order/line join.
#[derive(sqlx::FromRow)]
struct OrderLineRow {
    order_id: OrderId,
    sum_price: Money,
    status: String,
    created_at: DateTime<Utc>,
    ship_name: String,
    ship_street: String,
    ship_city: String,
    ship_state: Option<String>,
    ship_postal_code: String,
    ship_country: String,
    product_id: ProductId,
    title: String,
    price: Money,
    quantity: i32,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository on a borrowed connection.
    #[must_use]
    pub const fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert an order header and all of its lines atomically.
    ///
    /// The header copies the shipping address from the user's address row;
    /// the lines store the given (catalog) unit prices. Any failure rolls the
    /// whole order back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
        total: Money,
        lines: &[ResolvedLine],
    ) -> Result<OrderId, RepositoryError> {
        let mut tx = self.conn.begin().await?;

        let order_id = sqlx::query_scalar::<_, OrderId>(
            r"
            INSERT INTO orders
                (user_id, address_id, sum_price, status,
                 ship_name, ship_street, ship_city, ship_state, ship_postal_code, ship_country)
            SELECT a.user_id, a.id, $3, $4,
                   a.address_name, a.street, a.city, a.state, a.postal_code, a.country
            FROM addresses a
            WHERE a.id = $1 AND a.user_id = $2
            RETURNING id
            ",
        )
        .bind(address_id)
        .bind(user_id)
        .bind(total)
        .bind(OrderStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !lines.is_empty() {
            build_lines_insert(order_id, lines)
                .build()
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(%order_id, lines = lines.len(), "Order committed");
        Ok(order_id)
    }

    /// Load one of the user's orders with its lines.
    ///
    /// Returns `None` if the order does not exist or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get(
        &mut self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT o.id AS order_id, o.sum_price, o.status, o.created_at,
                   o.ship_name, o.ship_street, o.ship_city, o.ship_state,
                   o.ship_postal_code, o.ship_country,
                   i.product_id, p.title, i.price, i.quantity
            FROM orders o
            JOIN order_items i ON i.order_id = o.id
            JOIN products p ON p.id = i.product_id
            WHERE o.user_id = $1 AND o.id = $2
            ORDER BY i.product_id, i.id
            ",
        )
        .bind(user_id)
        .bind(order_id)
        .fetch_all(&mut *self.conn)
        .await?;

        assemble_order(rows)
    }
}

/// Build a multi-row `INSERT INTO order_items`.
fn build_lines_insert(order_id: OrderId, lines: &[ResolvedLine]) -> QueryBuilder<'static, Postgres> {
    let mut query =
        QueryBuilder::new("INSERT INTO order_items (order_id, product_id, price, quantity) ");
    query.push_values(lines.iter().copied(), |mut row, line| {
        row.push_bind(order_id)
            .push_bind(line.product_id)
            .push_bind(line.unit_price)
            .push_bind(i32::try_from(line.quantity).unwrap_or(i32::MAX));
    });
    query
}

/// Fold joined rows into one order; an empty result means no such order.
fn assemble_order(rows: Vec<OrderLineRow>) -> Result<Option<OrderDetail>, RepositoryError> {
    let mut rows = rows.into_iter();
    let Some(first) = rows.next() else {
        return Ok(None);
    };

    let status = first
        .status
        .parse::<OrderStatus>()
        .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

    let mut products = vec![to_line(first.product_id, first.title, first.price, first.quantity)?];
    for row in rows {
        products.push(to_line(row.product_id, row.title, row.price, row.quantity)?);
    }

    Ok(Some(OrderDetail {
        id: first.order_id,
        sum_price: first.sum_price,
        status,
        created_at: first.created_at,
        shipping: ShippingAddress {
            address_name: first.ship_name,
            street: first.ship_street,
            city: first.ship_city,
            state: first.ship_state,
            postal: first.ship_postal_code,
            country: first.ship_country,
        },
        products,
    }))
}

fn to_line(
    product_id: ProductId,
    title: String,
    price: Money,
    quantity: i32,
) -> Result<OrderLine, RepositoryError> {
    let quantity = u32::try_from(quantity).map_err(|_| {
        RepositoryError::DataCorruption(format!("negative quantity for product {product_id}"))
    })?;

    Ok(OrderLine {
        id: product_id,
        title,
        price,
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(product_id: i32, price_cents: i64, quantity: i32) -> OrderLineRow {
        OrderLineRow {
            order_id: OrderId::new(9),
            sum_price: Money::from_cents(3297),
            status: "pending".to_owned(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            ship_name: "Home".to_owned(),
            ship_street: "Main St".to_owned(),
            ship_city: "X".to_owned(),
            ship_state: None,
            ship_postal_code: "12345".to_owned(),
            ship_country: "DE".to_owned(),
            product_id: ProductId::new(product_id),
            title: format!("Product {product_id}"),
            price: Money::from_cents(price_cents),
            quantity,
        }
    }

    #[test]
    fn test_assemble_empty_is_none() {
        assert!(matches!(assemble_order(Vec::new()), Ok(None)));
    }

    #[test]
    fn test_assemble_collects_lines_in_row_order() {
        let detail = assemble_order(vec![row(1, 1099, 2), row(4, 1099, 1)])
            .ok()
            .flatten();

        let Some(detail) = detail else {
            panic!("expected an order");
        };
        assert_eq!(detail.id, OrderId::new(9));
        assert_eq!(detail.status, OrderStatus::Pending);
        assert_eq!(detail.shipping.postal, "12345");
        assert_eq!(
            detail.products,
            vec![
                OrderLine {
                    id: ProductId::new(1),
                    title: "Product 1".to_owned(),
                    price: Money::from_cents(1099),
                    quantity: 2,
                },
                OrderLine {
                    id: ProductId::new(4),
                    title: "Product 4".to_owned(),
                    price: Money::from_cents(1099),
                    quantity: 1,
                },
            ]
        );
    }

    #[test]
    fn test_assemble_rejects_unknown_status() {
        let mut bad = row(1, 1099, 1);
        bad.status = "teleported".to_owned();
        assert!(matches!(
            assemble_order(vec![bad]),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_lines_insert_sql() {
        let lines = [
            ResolvedLine {
                product_id: ProductId::new(1),
                unit_price: Money::from_cents(1099),
                quantity: 2,
            },
            ResolvedLine {
                product_id: ProductId::new(2),
                unit_price: Money::from_cents(500),
                quantity: 1,
            },
        ];

        let query = build_lines_insert(OrderId::new(7), &lines);
        assert_eq!(
            query.sql(),
            "INSERT INTO order_items (order_id, product_id, price, quantity) \
             VALUES ($1, $2, $3, $4), ($5, $6, $7, $8)"
        );
    }
}

//! Product repository.
//!
//! The catalog is read-only for the checkout service. Inactive products are
//! invisible: they cannot be shown, listed, or ordered.

use sqlx::PgConnection;

use kiosk_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::{Product, ProductText};

/// Length of the description teaser in product listings.
const TEASER_LENGTH: i32 = 50;

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository on a borrowed connection.
    #[must_use]
    pub const fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// Current catalog price of an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_price(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<Money>, RepositoryError> {
        let price = sqlx::query_scalar::<_, Money>(
            "SELECT price FROM products WHERE id = $1 AND is_active",
        )
        .bind(product_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(price)
    }

    /// Get an active product with its full description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&mut self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, title, description AS text, price, image
            FROM products
            WHERE id = $1 AND is_active
            ",
        )
        .bind(product_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(product)
    }

    /// Get only the full description of an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_text(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<ProductText>, RepositoryError> {
        let text = sqlx::query_as::<_, ProductText>(
            "SELECT id, description AS text FROM products WHERE id = $1 AND is_active",
        )
        .bind(product_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(text)
    }

    /// List active products with a shortened description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &mut self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, title, SUBSTRING(description, 1, $1) AS text, price, image
            FROM products
            WHERE is_active
            ORDER BY id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(TEASER_LENGTH)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(products)
    }

    /// Count active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&mut self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE is_active")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }
}

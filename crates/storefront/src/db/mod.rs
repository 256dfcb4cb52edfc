//! Database operations for storefront `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Identities provisioned by the auth service (referenced only)
//! - `addresses` - User shipping addresses, at most one `is_default` per user
//! - `products` - Catalog; `price` is the authoritative unit price
//! - `orders` - Order headers
//! - `order_items` - Order lines with the price captured at order time
//!
//! Repositories borrow a single `PgConnection` that the handler acquired from
//! the pool, so one request holds exactly one connection and returns it when
//! the `PoolConnection` guard drops.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p kiosk-cli -- migrate
//! ```

pub mod addresses;
pub mod orders;
pub mod products;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

use crate::config::PoolConfig;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a second default address).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// The pool is deliberately small; every request borrows one connection for
/// its whole duration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &SecretString,
    pool: PoolConfig,
) -> Result<PgPool, sqlx::Error> {
    pool_options(pool)
        .connect(database_url.expose_secret())
        .await
}

/// Create a pool that connects on first use.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string cannot be parsed.
pub fn create_lazy_pool(
    database_url: &SecretString,
    pool: PoolConfig,
) -> Result<PgPool, sqlx::Error> {
    pool_options(pool).connect_lazy(database_url.expose_secret())
}

fn pool_options(pool: PoolConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .acquire_timeout(pool.acquire_timeout)
}

/// Apply all pending migrations from `crates/storefront/migrations/`.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

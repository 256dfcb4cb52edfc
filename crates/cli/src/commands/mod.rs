//! CLI subcommands.

pub mod migrate;
pub mod seed;

use kiosk_storefront::config::{PoolConfig, StorefrontConfig};
use kiosk_storefront::db;
use sqlx::PgPool;

/// Connect to the storefront database named by the environment.
async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let database_url = StorefrontConfig::database_url_from_env()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url, PoolConfig::default()).await?;
    Ok(pool)
}

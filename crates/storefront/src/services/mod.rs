//! Business logic services for storefront.
//!
//! # Services
//!
//! - `addresses` - Address ownership and the one-default-per-user rule
//! - `pricing` - Re-deriving order totals from catalog prices
//! - `orders` - Placing orders atomically and reading them back
//!
//! Request bodies are validated before any service touches the database;
//! services receive validated types and a borrowed connection.

pub mod addresses;
pub mod error;
pub mod orders;
pub mod pricing;

pub use addresses::AddressManager;
pub use error::{CheckoutError, ValidationError};
pub use orders::{OrderStore, PgCheckoutStore, get_order, place_order, validate_request};
pub use pricing::{PriceCatalog, Reconciliation, reconcile};

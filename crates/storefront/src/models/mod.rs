//! Domain models for the storefront.
//!
//! These types represent validated domain objects and read models, separate
//! from request bodies (see `routes`) and SQL statements (see `db`).

pub mod address;
pub mod order;
pub mod product;
pub mod user;

pub use address::{Address, AddressFields, AddressPatch, NewAddress};
pub use order::{CartLine, OrderDetail, OrderLine, OrderRequest, ResolvedLine, ShippingAddress};
pub use product::{Product, ProductPage, ProductText};
pub use user::CurrentUser;

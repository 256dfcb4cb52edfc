//! HTTP middleware and extractors for the checkout API.
//!
//! # Layer Order (outermost first)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request span with method, uri, and status)
//! 3. Request ID (record the id in the span and the response)
//! 4. CORS
//!
//! Authentication is not a layer: handlers that need a user take the
//! `RequireAuth` extractor.

pub mod auth;
pub mod request_id;

pub use auth::RequireAuth;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

//! User domain types.

use serde::{Deserialize, Serialize};

use kiosk_core::UserId;

/// The authenticated caller of a request.
///
/// Users are provisioned and authenticated elsewhere; the checkout service
/// only ever sees the id carried by a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Unique user ID.
    pub id: UserId,
}

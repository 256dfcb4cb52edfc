//! Address book service.
//!
//! Enforces the default-address rules on top of `AddressRepository`:
//!
//! - A user's first address becomes the default even if not requested.
//! - Requesting a new default demotes the previous one in the same transaction.
//! - At no committed point does a user have two default addresses.
//!
//! Every write runs in one transaction that first takes the per-user
//! advisory lock, so concurrent writes for the same user are serialized.

use sqlx::{Connection, PgConnection};

use kiosk_core::{AddressId, UserId};

use super::error::{CheckoutError, ValidationError};
use crate::db::AddressRepository;
use crate::models::{Address, AddressFields, AddressPatch, NewAddress};

/// Address operations for one request, on the request's connection.
pub struct AddressManager<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> AddressManager<'c> {
    /// Create a new address manager on a borrowed connection.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// List the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the query fails.
    pub async fn list(&mut self, user_id: UserId) -> Result<Vec<Address>, CheckoutError> {
        Ok(AddressRepository::new(&mut *self.conn).list(user_id).await?)
    }

    /// Store a new address and return its id.
    ///
    /// The address becomes the default if requested or if the user has no
    /// default yet.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if any statement fails; nothing is
    /// written in that case.
    pub async fn create(
        &mut self,
        user_id: UserId,
        address: &NewAddress,
        requested_default: bool,
    ) -> Result<AddressId, CheckoutError> {
        let mut tx = self.conn.begin().await?;
        let mut repo = AddressRepository::new(&mut *tx);

        repo.lock_user(user_id).await?;

        let has_default = if requested_default {
            repo.clear_default(user_id, None).await?;
            false
        } else {
            repo.has_default(user_id).await?
        };

        let is_default = initial_default(requested_default, has_default);
        let address_id = repo.insert(user_id, address, is_default).await?;

        tx.commit().await?;

        tracing::info!(%user_id, %address_id, is_default, "Address created");
        Ok(address_id)
    }

    /// Apply a sparse update to one of the user's addresses.
    ///
    /// Returns the number of updated rows: 1 on success, 0 if the address
    /// does not exist or belongs to someone else. In the latter case no
    /// other address is touched.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` if the patch is empty.
    /// Returns `CheckoutError::Repository` if any statement fails.
    pub async fn update(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
        patch: &AddressPatch,
    ) -> Result<u64, CheckoutError> {
        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch.into());
        }

        let mut tx = self.conn.begin().await?;
        let mut repo = AddressRepository::new(&mut *tx);

        repo.lock_user(user_id).await?;

        if !repo.lock_owned(user_id, address_id).await? {
            tracing::debug!(%user_id, %address_id, "Address update for unknown or foreign address");
            return Ok(0);
        }

        if patch.is_default == Some(true) {
            repo.clear_default(user_id, Some(address_id)).await?;
        }

        let updated = repo.apply_patch(user_id, address_id, patch).await?;

        tx.commit().await?;

        tracing::info!(%user_id, %address_id, updated, "Address updated");
        Ok(updated)
    }
}

/// Whether a newly created address should be the default.
const fn initial_default(requested: bool, has_default: bool) -> bool {
    requested || !has_default
}

/// Validate the fields of a new address.
///
/// Name, street, city, postal code, and country are required; state is
/// optional. Blank values count as missing.
///
/// # Errors
///
/// Returns `ValidationError::MissingField` naming the first missing field.
pub fn validate_new_address(fields: AddressFields) -> Result<NewAddress, ValidationError> {
    let fields = fields.normalized();

    Ok(NewAddress {
        name: fields.name.ok_or(ValidationError::MissingField("name"))?,
        street: fields.street.ok_or(ValidationError::MissingField("street"))?,
        city: fields.city.ok_or(ValidationError::MissingField("city"))?,
        state: fields.state,
        postal: fields.postal.ok_or(ValidationError::MissingField("postal"))?,
        country: fields.country.ok_or(ValidationError::MissingField("country"))?,
    })
}

/// Build a sparse update from submitted fields.
///
/// # Errors
///
/// Returns `ValidationError::EmptyPatch` if nothing would change.
pub fn build_patch(
    fields: AddressFields,
    is_default: Option<bool>,
) -> Result<AddressPatch, ValidationError> {
    let patch = AddressPatch {
        fields: fields.normalized(),
        is_default,
    };

    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    Ok(patch)
}

//! Address repository.
//!
//! Single-statement primitives over `addresses`. The default-address rules
//! that combine several of them live in `services::addresses`, which runs
//! them inside one transaction.

use sqlx::{PgConnection, Postgres, QueryBuilder};

use kiosk_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressPatch, NewAddress};

/// Namespace for per-user advisory locks taken on address writes.
const ADDRESS_LOCK_NAMESPACE: i32 = 0x4144_4452;

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository on a borrowed connection or transaction.
    #[must_use]
    pub const fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// List a user's addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(
            r"
            SELECT id, address_name AS name, street, city, state,
                   postal_code AS postal, country, is_default
            FROM addresses
            WHERE user_id = $1
            ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(addresses)
    }

    /// Serialize address writes for one user until the surrounding
    /// transaction ends.
    ///
    /// Row locks cannot cover a user who has no addresses yet, so a
    /// transaction-scoped advisory lock keyed on the user is used instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_user(&mut self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(ADDRESS_LOCK_NAMESPACE)
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Whether the user currently has a default address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_default(&mut self, user_id: UserId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM addresses WHERE user_id = $1 AND is_default)",
        )
        .bind(user_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(exists)
    }

    /// Demote the user's default address, optionally sparing one address.
    ///
    /// Returns the number of demoted rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_default(
        &mut self,
        user_id: UserId,
        except: Option<AddressId>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE addresses
            SET is_default = FALSE
            WHERE user_id = $1
              AND is_default
              AND ($2::INTEGER IS NULL OR id <> $2)
            ",
        )
        .bind(user_id)
        .bind(except)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Insert a new address for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the insert would create a second default.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &mut self,
        user_id: UserId,
        address: &NewAddress,
        is_default: bool,
    ) -> Result<AddressId, RepositoryError> {
        sqlx::query_scalar::<_, AddressId>(
            r"
            INSERT INTO addresses
                (user_id, address_name, street, city, state, postal_code, country, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(&address.name)
        .bind(&address.street)
        .bind(&address.city)
        .bind(address.state.as_deref())
        .bind(&address.postal)
        .bind(&address.country)
        .bind(is_default)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, "user already has a default address"))
    }

    /// Lock one of the user's addresses for update.
    ///
    /// Returns `false` if the address does not exist or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_owned(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query_scalar::<_, AddressId>(
            "SELECT id FROM addresses WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.is_some())
    }

    /// Count the user's addresses with the given id (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_owned(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM addresses WHERE id = $1 AND user_id = $2",
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(count)
    }

    /// Write the columns present in `patch`.
    ///
    /// Returns the number of updated rows; 0 if the address is not the user's.
    /// An empty patch writes nothing and returns 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the update would create a second default.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn apply_patch(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
        patch: &AddressPatch,
    ) -> Result<u64, RepositoryError> {
        let Some(mut query) = build_patch_query(user_id, address_id, patch) else {
            return Ok(0);
        };

        let result = query
            .build()
            .execute(&mut *self.conn)
            .await
            .map_err(|e| RepositoryError::from_write(e, "user already has a default address"))?;

        Ok(result.rows_affected())
    }
}

/// Build `UPDATE addresses SET ... WHERE ...` for the present columns.
fn build_patch_query(
    user_id: UserId,
    address_id: AddressId,
    patch: &AddressPatch,
) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let fields = &patch.fields;
    let text_columns = [
        ("address_name", &fields.name),
        ("street", &fields.street),
        ("city", &fields.city),
        ("state", &fields.state),
        ("postal_code", &fields.postal),
        ("country", &fields.country),
    ];

    let mut query = QueryBuilder::new("UPDATE addresses SET ");
    let mut set = query.separated(", ");
    for (column, value) in text_columns {
        if let Some(value) = value {
            set.push(format!("{column} = "));
            set.push_bind_unseparated(value.clone());
        }
    }
    if let Some(is_default) = patch.is_default {
        set.push("is_default = ");
        set.push_bind_unseparated(is_default);
    }

    query.push(" WHERE user_id = ");
    query.push_bind(user_id);
    query.push(" AND id = ");
    query.push_bind(address_id);

    Some(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AddressFields;

    #[test]
    fn test_empty_patch_builds_no_query() {
        let patch = AddressPatch::default();
        assert!(build_patch_query(UserId::new(1), AddressId::new(5), &patch).is_none());
    }

    #[test]
    fn test_patch_query_only_sets_present_columns() {
        let patch = AddressPatch {
            fields: AddressFields {
                city: Some("Berlin".to_owned()),
                postal: Some("10115".to_owned()),
                ..AddressFields::default()
            },
            is_default: Some(true),
        };

        let query = build_patch_query(UserId::new(1), AddressId::new(5), &patch);
        let sql = query.as_ref().map(QueryBuilder::sql).unwrap_or_default();

        assert_eq!(
            sql,
            "UPDATE addresses SET city = $1, postal_code = $2, is_default = $3 \
             WHERE user_id = $4 AND id = $5"
        );
    }

    #[test]
    fn test_patch_query_flag_only() {
        let patch = AddressPatch {
            fields: AddressFields::default(),
            is_default: Some(false),
        };

        let query = build_patch_query(UserId::new(1), AddressId::new(5), &patch);
        let sql = query.as_ref().map(QueryBuilder::sql).unwrap_or_default();

        assert_eq!(
            sql,
            "UPDATE addresses SET is_default = $1 WHERE user_id = $2 AND id = $3"
        );
    }
}

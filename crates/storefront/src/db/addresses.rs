//! Address repository.
//!
//! Exactly one default address per user at any time: setting a default
//! unsets its siblings in the same transaction, and a user's first address
//! becomes the default automatically.

use sqlx::PgPool;

use winniecho_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::address::Address;

const SELECT: &str = "SELECT id, user_id, label, line, city, state, postal_code, country,
                      is_default, created_at FROM addresses";

/// Fields for creating or updating an address.
#[derive(Debug, Clone)]
pub struct AddressInput {
    pub label: String,
    pub line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first, newest first after that.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "{SELECT} WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Get an address only if it belongs to the given user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let address =
            sqlx::query_as::<_, Address>(&format!("{SELECT} WHERE id = $1 AND user_id = $2"))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(address)
    }

    /// Create an address. The user's first address becomes the default
    /// regardless of the flag; an explicit default unsets siblings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let has_addresses = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM addresses WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let is_default = input.is_default || !has_addresses;

        if is_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let address = sqlx::query_as::<_, Address>(
            "INSERT INTO addresses (user_id, label, line, city, state, postal_code, country, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, user_id, label, line, city, state, postal_code, country,
                       is_default, created_at",
        )
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.line)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(address)
    }

    /// Update an owned address's fields. Returns `None` if not owned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: AddressId,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND id <> $2")
                .bind(user_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let address = sqlx::query_as::<_, Address>(
            "UPDATE addresses
             SET label = $3, line = $4, city = $5, state = $6, postal_code = $7, country = $8,
                 is_default = is_default OR $9
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, label, line, city, state, postal_code, country,
                       is_default, created_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.line)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(address)
    }

    /// Make an owned address the default. Returns `false` if not owned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_default(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result =
            sqlx::query("UPDATE addresses SET is_default = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Delete an owned, non-default address. The caller enforces the
    /// "cannot delete the default or only address" rules; the predicate
    /// here is the last line of defense.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM addresses WHERE id = $1 AND user_id = $2 AND is_default = FALSE",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("address is referenced by an order".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(result.rows_affected() == 1)
    }
}

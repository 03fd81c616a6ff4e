//! User repository.
//!
//! Registration creates the user, the member loyalty profile, and the cart
//! in a single transaction so an account can never exist half-initialized.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Row};

use winniecho_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::user::User;

/// Private row shape; `email` is validated into the `Email` newtype on load.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    phone: String,
    role: UserRole,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            email,
            phone: self.phone,
            role: self.role,
            created_at: self.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, phone, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user and their password hash by email, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, role, created_at, password_hash
             FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let password_hash: String = row.try_get("password_hash")?;
                let user = UserRow {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    phone: row.try_get("phone")?,
                    role: row.try_get("role")?,
                    created_at: row.try_get("created_at")?,
                }
                .into_user()?;
                Ok(Some((user, password_hash)))
            }
            None => Ok(None),
        }
    }

    /// Update a user's editable profile fields. Email stays fixed; it is
    /// the login identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        phone: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET name = $2, phone = $3 WHERE id = $1
             RETURNING id, name, email, phone, role, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(phone)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Fetch the stored password hash, for verifying a password change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash =
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(hash)
    }

    /// Create a member account: user row, member profile, and cart, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_member(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        phone: &str,
    ) -> Result<User, RepositoryError> {
        self.create_with_role(name, email, password_hash, phone, UserRole::Member)
            .await
    }

    /// Create an account with an explicit role. Staff accounts are
    /// provisioned this way by the CLI; they still get a member profile
    /// and cart so the invariant "every user has both" holds everywhere.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_with_role(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        phone: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (name, email, password_hash, phone, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, email, phone, role, created_at",
        )
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(phone)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        sqlx::query("INSERT INTO members (user_id) VALUES ($1)")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO carts (user_id) VALUES ($1)")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.into_user()
    }
}

/// Replace a user's password hash. Takes an executor so the reset flow can
/// run it in the same transaction as the token claim.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_password_hash(
    executor: impl PgExecutor<'_>,
    id: UserId,
    password_hash: &str,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

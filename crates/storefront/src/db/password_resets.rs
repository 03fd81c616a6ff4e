//! Password reset token repository.
//!
//! Consuming a token is a conditional UPDATE claiming the row, the same
//! shape as the payment success claim: two concurrent resets with the same
//! token produce exactly one password change.

use sqlx::PgExecutor;

use winniecho_core::UserId;

use super::RepositoryError;

/// How long a reset token stays valid.
const VALIDITY: &str = "30 minutes";

/// Store a fresh reset token for a user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
    token: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO password_reset_tokens (user_id, token) VALUES ($1, $2)")
        .bind(user_id)
        .bind(token)
        .execute(executor)
        .await?;

    Ok(())
}

/// Claim a token: marks it used and returns its user, but only when it has
/// not been used and is still within its validity window. Returns `None`
/// for unknown, expired, and already-used tokens alike.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn consume(
    executor: impl PgExecutor<'_>,
    token: &str,
) -> Result<Option<UserId>, RepositoryError> {
    let user_id = sqlx::query_scalar::<_, UserId>(&format!(
        "UPDATE password_reset_tokens SET used_at = NOW()
         WHERE token = $1
           AND used_at IS NULL
           AND created_at > NOW() - INTERVAL '{VALIDITY}'
         RETURNING user_id"
    ))
    .bind(token)
    .fetch_optional(executor)
    .await?;

    Ok(user_id)
}

//! Authentication service.
//!
//! Password registration and login for member accounts. Staff accounts
//! (admin, driver) are provisioned by the seeding CLI and log in through
//! the same path.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;

use winniecho_core::{Email, UserId};

use crate::db::users::UserRepository;
use crate::db::{RepositoryError, password_resets, users};
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of generated password reset tokens.
const RESET_TOKEN_LENGTH: usize = 48;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] winniecho_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    Hash(String),

    /// Reset token unknown, expired, or already used.
    #[error("invalid or expired reset link")]
    InvalidResetToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A started password reset: who asked, and the token to mail them.
#[derive(Debug)]
pub struct PasswordReset {
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
        }
    }

    /// Register a new member with email and password. Also creates the
    /// member loyalty profile and an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_member(name, &email, &password_hash, phone)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a logged-in user's password after re-verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the current password is
    /// wrong and `AuthError::WeakPassword` when the new one is too short.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let hash = self
            .users
            .password_hash(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(current_password, &hash)?;

        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;
        users::set_password_hash(self.pool, user_id, &new_hash).await?;

        Ok(())
    }

    /// Begin a password reset for an email address. Returns `None` when the
    /// address matches no account, without distinguishing that case for the
    /// caller's response (don't reveal which emails exist).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if token storage fails.
    pub async fn start_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<PasswordReset>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        let Some((user, _)) = self.users.get_with_password(&email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token();
        password_resets::create(self.pool, user.id, &token).await?;

        Ok(Some(PasswordReset { user, token }))
    }

    /// Complete a password reset: claim the token and replace the hash in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` for unknown, expired, or
    /// already-used tokens and `AuthError::WeakPassword` for short
    /// passwords.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let Some(user_id) = password_resets::consume(&mut *tx, token).await? else {
            return Err(AuthError::InvalidResetToken);
        };
        users::set_password_hash(&mut *tx, user_id, &new_hash).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(%user_id, "password reset completed");
        Ok(())
    }
}

fn generate_reset_token() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id. Public for the provisioning CLI.
///
/// # Errors
///
/// Returns `AuthError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        let result = validate_password("seven77");
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password!", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn reset_tokens_are_long_and_url_safe() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn garbage_hash_reads_as_invalid_credentials() {
        assert!(matches!(
            verify_password("anything8", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}

//! Staff account provisioning.
//!
//! Registration through the storefront only ever creates members; admin
//! and driver accounts are created here.

use winniecho_core::{Email, UserRole};
use winniecho_storefront::db::users::UserRepository;
use winniecho_storefront::services::auth;

use super::{CommandError, connect};

/// Create a staff account with the given role.
///
/// # Errors
///
/// Returns an error if the role or email is invalid, the email is already
/// registered, or the database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<(), CommandError> {
    let role = match role {
        "admin" => UserRole::Admin,
        "driver" => UserRole::Driver,
        other => {
            return Err(CommandError::InvalidArgument(format!(
                "unknown role '{other}' (expected 'admin' or 'driver')"
            )));
        }
    };

    let email = Email::parse(email)
        .map_err(|e| CommandError::InvalidArgument(format!("invalid email: {e}")))?;
    let password_hash =
        auth::hash_password(password).map_err(|e| CommandError::Other(e.to_string()))?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .create_with_role(name, &email, &password_hash, "", role)
        .await
        .map_err(|e| CommandError::Other(e.to_string()))?;

    tracing::info!(
        user_id = user.id.as_i32(),
        role = %user.role,
        "Created staff account for {}",
        user.email
    );
    Ok(())
}

//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;

use winniecho_core::UserRole;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::services::notifications::PasswordResetNotification;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot-password request body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset-password request body, carrying the emailed token.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Public shape of an authenticated user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i32(),
            name: user.name,
            email: user.email.into_inner(),
            role: user.role,
        }
    }
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = AuthService::new(state.pool())
        .register(
            &request.name,
            &request.email,
            &request.password,
            &request.phone,
        )
        .await?;

    sign_in(&session, &user).await?;

    tracing::info!(user_id = %user.id, "member registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await?;

    // Rotate the session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    sign_in(&session, &user).await?;

    Ok(Json(user.into()))
}

/// POST /auth/forgot-password
///
/// Always answers with the same message, whether or not the email matches
/// an account, so the endpoint can't be used to enumerate members.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    if let Some(reset) = AuthService::new(state.pool())
        .start_password_reset(&request.email)
        .await?
    {
        let reset_url = format!(
            "{}/reset-password?token={}",
            state.config().base_url,
            reset.token
        );
        state
            .notifier()
            .notify_password_reset(PasswordResetNotification {
                customer_name: reset.user.name,
                customer_email: reset.user.email.into_inner(),
                reset_url,
            });
    }

    Ok(Json(json!({
        "message": "If that email exists, a reset link has been sent."
    })))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    AuthService::new(state.pool())
        .reset_password(&request.token, &request.new_password)
        .await?;

    Ok(Json(json!({ "ok": true })))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(json!({ "ok": true })))
}

async fn sign_in(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    };
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

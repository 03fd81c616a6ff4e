//! Account route handlers: profile, loyalty balance, and addresses.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use winniecho_core::AddressId;

use crate::db::addresses::{AddressInput, AddressRepository};
use crate::db::members::MemberRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::models::address::Address;
use crate::routes::auth::UserResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Profile response: identity plus the loyalty ledger.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub loyalty_points: Decimal,
    /// What the balance is worth as a discount, in RM.
    pub points_value: Decimal,
    pub total_spent: Decimal,
}

/// Address create/update request body.
#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub label: String,
    pub line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressRequest {
    fn into_input(self) -> AddressInput {
        AddressInput {
            label: self.label,
            line: self.line,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            is_default: self.is_default,
        }
    }
}

/// GET /account
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<ProfileResponse>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account".into()))?;

    let member = MemberRepository::new(state.pool())
        .get(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("member profile".into()))?;

    Ok(Json(ProfileResponse {
        user: user.into(),
        loyalty_points: member.loyalty_points,
        points_value: member.points_value(),
        total_spent: member.total_spent,
    }))
}

/// Profile update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// PUT /account/profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".into()));
    }

    let user = UserRepository::new(state.pool())
        .update_profile(current.id, name, request.phone.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("account".into()))?;

    Ok(Json(user.into()))
}

/// POST /account/password
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    AuthService::new(state.pool())
        .change_password(current.id, &request.current_password, &request.new_password)
        .await?;

    tracing::info!(user_id = %current.id, "password changed");
    Ok(Json(json!({ "ok": true })))
}

/// GET /account/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(addresses))
}

/// POST /account/addresses
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<AddressRequest>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = AddressRepository::new(state.pool())
        .create(user.id, &request.into_input())
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// PUT /account/addresses/{id}
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(request): Json<AddressRequest>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .update(id, user.id, &request.into_input())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;

    Ok(Json(address))
}

/// POST /account/addresses/{id}/default
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<serde_json::Value>> {
    let updated = AddressRepository::new(state.pool())
        .set_default(id, user.id)
        .await?;
    if !updated {
        return Err(AppError::NotFound(format!("address {id}")));
    }

    Ok(Json(json!({ "ok": true })))
}

/// DELETE /account/addresses/{id}
///
/// The default address (and therefore a user's only address) cannot be
/// deleted; pick a new default first.
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<serde_json::Value>> {
    let repo = AddressRepository::new(state.pool());

    let address = repo
        .get_owned(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;

    if address.is_default {
        return Err(AppError::BadRequest(
            "cannot delete the default address".into(),
        ));
    }

    let deleted = repo.delete(id, user.id).await.map_err(|e| match e {
        crate::db::RepositoryError::Conflict(msg) => AppError::BadRequest(msg),
        other => AppError::Database(other),
    })?;
    if !deleted {
        // Raced with a concurrent default change.
        return Err(AppError::BadRequest(
            "cannot delete the default address".into(),
        ));
    }

    Ok(Json(json!({ "ok": true })))
}

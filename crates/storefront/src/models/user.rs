//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use winniecho_core::{Email, UserId, UserRole};

/// A registered user.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this user has a member loyalty profile.
    #[must_use]
    pub const fn is_member(&self) -> bool {
        matches!(self.role, UserRole::Member)
    }
}

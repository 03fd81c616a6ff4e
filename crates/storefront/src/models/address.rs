//! User address model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use winniecho_core::{AddressId, UserId};

/// A delivery address. Many per user; exactly one default at any time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Formatted single-line address.
    #[must_use]
    pub fn full_address(&self) -> String {
        [
            self.line.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.postal_code.as_str(),
            self.country.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_address_skips_empty_parts() {
        let address = Address {
            id: AddressId::new(1),
            user_id: UserId::new(1),
            label: "Home".to_string(),
            line: "12 Jalan Coklat".to_string(),
            city: "Kuala Lumpur".to_string(),
            state: String::new(),
            postal_code: "50000".to_string(),
            country: "Malaysia".to_string(),
            is_default: true,
            created_at: Utc::now(),
        };
        assert_eq!(
            address.full_address(),
            "12 Jalan Coklat, Kuala Lumpur, 50000, Malaysia"
        );
    }
}

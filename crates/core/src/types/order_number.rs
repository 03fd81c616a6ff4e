//! Human-facing order numbers.
//!
//! Distinct from the internal order id: a `CHO`-prefixed string combining a
//! second-resolution timestamp with a random suffix, generated once at order
//! creation and never reused (unique index in the database).

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A unique, human-facing order number like `CHO202608231144053917`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Prefix for all order numbers.
    pub const PREFIX: &'static str = "CHO";

    /// Generate a fresh order number for the current instant.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Generate an order number for a given instant (deterministic except
    /// for the random suffix).
    #[must_use]
    pub fn generate_at(now: DateTime<Utc>) -> Self {
        let suffix: u16 = rand::rng().random_range(1000..=9999);
        Self(format!(
            "{}{}{suffix}",
            Self::PREFIX,
            now.format("%Y%m%d%H%M%S")
        ))
    }

    /// View the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an order number loaded from storage.
    #[must_use]
    pub const fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::from_string(raw))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_number_has_prefix_and_length() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 23, 11, 44, 5).single().expect("ts");
        let number = OrderNumber::generate_at(ts);
        // CHO + 14 timestamp digits + 4 random digits
        assert_eq!(number.as_str().len(), 3 + 14 + 4);
        assert!(number.as_str().starts_with("CHO20260823114405"));
    }

    #[test]
    fn stored_numbers_round_trip() {
        let number = OrderNumber::from_string("CHO202608231144053917".to_string());
        assert_eq!(number.as_str(), "CHO202608231144053917");
        assert_eq!(number.to_string(), "CHO202608231144053917");
    }

    #[test]
    fn random_suffix_is_four_digits() {
        let number = OrderNumber::generate();
        let suffix = &number.as_str()[number.as_str().len() - 4..];
        let parsed: u16 = suffix.parse().expect("numeric suffix");
        assert!((1000..=9999).contains(&parsed));
    }
}

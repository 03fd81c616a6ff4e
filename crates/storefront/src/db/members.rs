//! Member loyalty ledger repository.
//!
//! Both ledger operations are single atomic UPDATE statements against the
//! member row; `redeem` carries its balance check in the predicate so two
//! overlapping redemptions cannot both pass a stale read.

use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use winniecho_core::UserId;

use super::RepositoryError;
use crate::models::member::Member;

/// Repository for member loyalty operations.
pub struct MemberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MemberRepository<'a> {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a member profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<Member>, RepositoryError> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT user_id, loyalty_points, total_spent FROM members WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(member)
    }
}

/// Credit points for a paid amount and bump lifetime spend.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn earn(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
    points: Decimal,
    amount_paid: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE members
         SET loyalty_points = loyalty_points + $2,
             total_spent = total_spent + $3
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(points)
    .bind(amount_paid)
    .execute(executor)
    .await?;

    Ok(())
}

/// Debit points, guarded by the balance in the same statement.
/// Returns `false` when the balance was insufficient (no row mutated).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn redeem(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
    points: Decimal,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE members
         SET loyalty_points = loyalty_points - $2
         WHERE user_id = $1 AND loyalty_points >= $2",
    )
    .bind(user_id)
    .bind(points)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

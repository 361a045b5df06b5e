//! Promo code repository.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, instrument};

use tripmart_core::{DateRange, PercentOff, PromoCode, PromoCodeId};

use super::{RepositoryError, map_constraint_error};
use crate::models::promo_code::{NewPromotion, Promotion};

#[derive(Debug, sqlx::FromRow)]
struct PromotionRow {
    id: PromoCodeId,
    code: PromoCode,
    is_used: bool,
    percent_off: i16,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PromotionRow> for Promotion {
    type Error = RepositoryError;

    fn try_from(row: PromotionRow) -> Result<Self, Self::Error> {
        let percent_off = PercentOff::new(i64::from(row.percent_off))
            .map_err(|e| RepositoryError::DataCorruption(format!("promo code {}: {e}", row.id)))?;
        let date_range = DateRange::new(row.starts_at, row.ends_at)
            .map_err(|e| RepositoryError::DataCorruption(format!("promo code {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            code: row.code,
            is_used: row.is_used,
            percent_off,
            date_range,
            created_at: row.created_at,
        })
    }
}

/// Look up a code and lock its row for redemption.
pub(super) async fn lock_by_code<'e>(
    executor: impl PgExecutor<'e>,
    code: &PromoCode,
) -> Result<Option<Promotion>, RepositoryError> {
    sqlx::query_as::<_, PromotionRow>(
        r"
        SELECT id, code, is_used, percent_off, starts_at, ends_at, created_at
        FROM tripmart.promo_code
        WHERE code = $1
        FOR UPDATE
        ",
    )
    .bind(code)
    .fetch_optional(executor)
    .await?
    .map(Promotion::try_from)
    .transpose()
}

/// Flag a code as redeemed.
pub(super) async fn mark_used<'e>(
    executor: impl PgExecutor<'e>,
    id: PromoCodeId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE tripmart.promo_code SET is_used = TRUE WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Repository for promo code database operations.
pub struct PromoCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromoCodeRepository<'a> {
    /// Create a new promo code repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a promo code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: &NewPromotion) -> Result<Promotion, RepositoryError> {
        let row = sqlx::query_as::<_, PromotionRow>(
            r"
            INSERT INTO tripmart.promo_code (code, percent_off, starts_at, ends_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, is_used, percent_off, starts_at, ends_at, created_at
            ",
        )
        .bind(&input.code)
        .bind(i16::from(input.percent_off.get()))
        .bind(input.date_range.start())
        .bind(input.date_range.end())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, |_| "promo code already exists".to_owned()))?;

        debug!(id = %row.id, "Created promo code");
        Promotion::try_from(row)
    }

    /// All promo codes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Promotion>, RepositoryError> {
        sqlx::query_as::<_, PromotionRow>(
            r"
            SELECT id, code, is_used, percent_off, starts_at, ends_at, created_at
            FROM tripmart.promo_code
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Promotion::try_from)
        .collect()
    }

    /// Get a promo code by its code string.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn get_by_code(&self, code: &PromoCode) -> Result<Option<Promotion>, RepositoryError> {
        sqlx::query_as::<_, PromotionRow>(
            r"
            SELECT id, code, is_used, percent_off, starts_at, ends_at, created_at
            FROM tripmart.promo_code
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?
        .map(Promotion::try_from)
        .transpose()
    }

    /// Delete a promo code. Purchases that used it keep a `NULL` reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such code exists.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: PromoCodeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tripmart.promo_code WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        debug!(id = %id, "Deleted promo code");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn row(percent_off: i16, ends_in: Duration) -> PromotionRow {
        let now = Utc::now();
        PromotionRow {
            id: PromoCodeId::new(1),
            code: PromoCode::parse("NILE20").unwrap(),
            is_used: false,
            percent_off,
            starts_at: now,
            ends_at: now + ends_in,
            created_at: now,
        }
    }

    #[test]
    fn test_row_converts() {
        let promo = Promotion::try_from(row(20, Duration::days(3))).unwrap();
        assert_eq!(promo.percent_off.get(), 20);
        assert!(!promo.is_used);
    }

    #[test]
    fn test_corrupt_rows_are_flagged() {
        assert!(matches!(
            Promotion::try_from(row(140, Duration::days(3))),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            Promotion::try_from(row(10, Duration::zero())),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}

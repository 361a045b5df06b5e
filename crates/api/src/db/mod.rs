//! Database operations for the marketplace `PostgreSQL` schema.
//!
//! # Schema: `tripmart`
//!
//! ## Tables
//!
//! - `product` - Seller listings with stock and the derived rating
//! - `product_review` - Tourist reviews, one row per review
//! - `purchase` - Immutable purchase records
//! - `promo_code` - Single-use discount codes
//! - `tour_guide` - Guide profiles
//! - `itinerary` - Tours published by a guide
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p tripmart-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::services::guard::AccessError;

pub mod itineraries;
pub mod products;
pub mod promo_codes;
pub mod purchases;
pub mod tour_guides;

pub use itineraries::ItineraryRepository;
pub use products::ProductRepository;
pub use promo_codes::PromoCodeRepository;
pub use purchases::PurchaseRepository;
pub use tour_guides::TourGuideRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The operation breaks a business rule (stock, promo validity, missing reference).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The ownership guard refused the caller.
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Map a unique violation to [`RepositoryError::Conflict`] using `describe` to
/// name the clashing field, and a foreign key violation to
/// [`RepositoryError::Rejected`].
pub(crate) fn map_constraint_error(
    e: sqlx::Error,
    describe: impl Fn(Option<&str>) -> String,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(describe(db_err.constraint()));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Rejected(describe(db_err.constraint()));
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2.min(max_connections))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert an `INTEGER` column to `u32`, flagging negative values as corruption.
pub(crate) fn non_negative(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

/// Convert a count to an `INTEGER` bind value.
pub(crate) fn to_db_int(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::Rejected(format!("{column} is too large: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(7, "quantity").ok(), Some(7));
        assert!(matches!(
            non_negative(-1, "quantity"),
            Err(RepositoryError::DataCorruption(msg)) if msg.contains("quantity")
        ));
    }

    #[test]
    fn test_to_db_int() {
        assert_eq!(to_db_int(12, "quantity").ok(), Some(12));
        assert!(matches!(
            to_db_int(u32::MAX, "quantity"),
            Err(RepositoryError::Rejected(_))
        ));
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_constraint_error(sqlx::Error::RowNotFound, |_| "unused".to_owned());
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }
}

//! Tour guide repository.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, info, instrument};

use tripmart_core::{Caller, Email, Nationality, PhoneNumber, TourGuideId, Username};

use super::{RepositoryError, map_constraint_error};
use crate::models::tour_guide::{NewTourGuide, TourGuide, TourGuideUpdate};
use crate::services::guard::{Policy, authorize};

#[derive(Debug, sqlx::FromRow)]
struct TourGuideRow {
    id: TourGuideId,
    email: Email,
    username: Username,
    nationality: Nationality,
    mobile: Option<PhoneNumber>,
    years_of_experience: i16,
    previous_works: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TourGuideRow> for TourGuide {
    type Error = RepositoryError;

    fn try_from(row: TourGuideRow) -> Result<Self, Self::Error> {
        let years_of_experience = u8::try_from(row.years_of_experience).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "tour guide {}: years_of_experience {}",
                row.id, row.years_of_experience
            ))
        })?;

        Ok(Self {
            id: row.id,
            email: row.email,
            username: row.username,
            nationality: row.nationality,
            mobile: row.mobile,
            years_of_experience,
            previous_works: row.previous_works,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Name the clashing field from the violated unique constraint.
fn describe_conflict(constraint: Option<&str>) -> String {
    match constraint {
        Some("tour_guide_email_key") => "email is already registered".to_owned(),
        Some("tour_guide_username_key") => "username is already taken".to_owned(),
        _ => "tour guide already exists".to_owned(),
    }
}

async fn lock_tour_guide<'e>(
    executor: impl PgExecutor<'e>,
    id: TourGuideId,
) -> Result<Option<TourGuide>, RepositoryError> {
    sqlx::query_as::<_, TourGuideRow>(
        r"
        SELECT id, email, username, nationality, mobile, years_of_experience,
               previous_works, created_at, updated_at
        FROM tripmart.tour_guide
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .map(TourGuide::try_from)
    .transpose()
}

/// Repository for tour guide database operations.
pub struct TourGuideRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TourGuideRepository<'a> {
    /// Create a new tour guide repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a tour guide profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or username is taken.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create(&self, input: &NewTourGuide) -> Result<TourGuide, RepositoryError> {
        let row = sqlx::query_as::<_, TourGuideRow>(
            r"
            INSERT INTO tripmart.tour_guide
                (email, username, nationality, mobile, years_of_experience, previous_works)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, username, nationality, mobile, years_of_experience,
                      previous_works, created_at, updated_at
            ",
        )
        .bind(&input.email)
        .bind(&input.username)
        .bind(&input.nationality)
        .bind(input.mobile.as_ref())
        .bind(i16::from(input.years_of_experience))
        .bind(&input.previous_works)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, describe_conflict))?;

        info!(tour_guide = %row.id, "Registered tour guide");
        TourGuide::try_from(row)
    }

    /// All tour guides, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<TourGuide>, RepositoryError> {
        sqlx::query_as::<_, TourGuideRow>(
            r"
            SELECT id, email, username, nationality, mobile, years_of_experience,
                   previous_works, created_at, updated_at
            FROM tripmart.tour_guide
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(TourGuide::try_from)
        .collect()
    }

    /// Get a tour guide by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: TourGuideId) -> Result<Option<TourGuide>, RepositoryError> {
        sqlx::query_as::<_, TourGuideRow>(
            r"
            SELECT id, email, username, nationality, mobile, years_of_experience,
                   previous_works, created_at, updated_at
            FROM tripmart.tour_guide
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(TourGuide::try_from)
        .transpose()
    }

    /// Update a profile. Allowed for the guide it describes and for admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Access` if the profile is missing or
    /// foreign, `RepositoryError::Conflict` on a taken email or username.
    #[instrument(skip(self, update), fields(caller_role = %caller.role, caller_subject = caller.subject))]
    pub async fn update(
        &self,
        id: TourGuideId,
        caller: &Caller,
        update: TourGuideUpdate,
    ) -> Result<TourGuide, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut guide = authorize(
            lock_tour_guide(&mut *tx, id).await?,
            caller,
            Policy::OwnerOrAdmin,
        )?;
        update.apply_to(&mut guide);

        let row = sqlx::query_as::<_, TourGuideRow>(
            r"
            UPDATE tripmart.tour_guide
            SET email = $2, username = $3, nationality = $4, mobile = $5,
                years_of_experience = $6, previous_works = $7
            WHERE id = $1
            RETURNING id, email, username, nationality, mobile, years_of_experience,
                      previous_works, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&guide.email)
        .bind(&guide.username)
        .bind(&guide.nationality)
        .bind(guide.mobile.as_ref())
        .bind(i16::from(guide.years_of_experience))
        .bind(&guide.previous_works)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, describe_conflict))?;

        tx.commit().await?;

        debug!(tour_guide = %id, "Updated tour guide");
        TourGuide::try_from(row)
    }

    /// Delete a profile together with every itinerary it owns.
    ///
    /// Returns the number of itineraries removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Access` if the profile is missing or
    /// foreign.
    #[instrument(skip(self), fields(caller_role = %caller.role, caller_subject = caller.subject))]
    pub async fn delete(&self, id: TourGuideId, caller: &Caller) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        authorize(
            lock_tour_guide(&mut *tx, id).await?,
            caller,
            Policy::OwnerOrAdmin,
        )?;

        let itineraries = sqlx::query("DELETE FROM tripmart.itinerary WHERE tour_guide_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM tripmart.tour_guide WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(tour_guide = %id, itineraries, "Deleted tour guide");
        Ok(itineraries)
    }
}

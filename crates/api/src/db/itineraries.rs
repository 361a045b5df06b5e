//! Itinerary repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, instrument};

use tripmart_core::{Caller, ItineraryId, Price, TourGuideId};

use super::{RepositoryError, map_constraint_error};
use crate::models::itinerary::{Itinerary, ItineraryUpdate, NewItinerary};
use crate::services::guard::{Policy, authorize};

#[derive(Debug, sqlx::FromRow)]
struct ItineraryRow {
    id: ItineraryId,
    tour_guide_id: TourGuideId,
    title: String,
    language: String,
    price: Price,
    activities: Vec<String>,
    locations: Vec<String>,
    available_dates: Vec<NaiveDate>,
    accessibility: bool,
    pickup_location: Option<String>,
    dropoff_location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItineraryRow> for Itinerary {
    fn from(row: ItineraryRow) -> Self {
        Self {
            id: row.id,
            tour_guide: row.tour_guide_id,
            title: row.title,
            language: row.language,
            price: row.price,
            activities: row.activities,
            locations: row.locations,
            available_dates: row.available_dates,
            accessibility: row.accessibility,
            pickup_location: row.pickup_location,
            dropoff_location: row.dropoff_location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn lock_itinerary<'e>(
    executor: impl PgExecutor<'e>,
    id: ItineraryId,
) -> Result<Option<Itinerary>, RepositoryError> {
    let row = sqlx::query_as::<_, ItineraryRow>(
        r"
        SELECT id, tour_guide_id, title, language, price, activities, locations,
               available_dates, accessibility, pickup_location, dropoff_location,
               created_at, updated_at
        FROM tripmart.itinerary
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(Itinerary::from))
}

/// Repository for itinerary database operations.
pub struct ItineraryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItineraryRepository<'a> {
    /// Create a new itinerary repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an itinerary owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Rejected` if `owner` has no tour guide
    /// profile.
    #[instrument(skip(self, input), fields(owner = %owner))]
    pub async fn create(
        &self,
        owner: TourGuideId,
        input: &NewItinerary,
    ) -> Result<Itinerary, RepositoryError> {
        let row = sqlx::query_as::<_, ItineraryRow>(
            r"
            INSERT INTO tripmart.itinerary
                (tour_guide_id, title, language, price, activities, locations,
                 available_dates, accessibility, pickup_location, dropoff_location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, tour_guide_id, title, language, price, activities, locations,
                      available_dates, accessibility, pickup_location, dropoff_location,
                      created_at, updated_at
            ",
        )
        .bind(owner)
        .bind(&input.title)
        .bind(&input.language)
        .bind(input.price)
        .bind(&input.activities)
        .bind(&input.locations)
        .bind(&input.available_dates)
        .bind(input.accessibility)
        .bind(input.pickup_location.as_deref())
        .bind(input.dropoff_location.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            map_constraint_error(e, |_| {
                "create a tour guide profile before publishing itineraries".to_owned()
            })
        })?;

        debug!(itinerary = %row.id, "Created itinerary");
        Ok(row.into())
    }

    /// All itineraries, optionally only those of one guide.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tour_guide: Option<TourGuideId>,
    ) -> Result<Vec<Itinerary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItineraryRow>(
            r"
            SELECT id, tour_guide_id, title, language, price, activities, locations,
                   available_dates, accessibility, pickup_location, dropoff_location,
                   created_at, updated_at
            FROM tripmart.itinerary
            WHERE ($1::integer IS NULL OR tour_guide_id = $1)
            ORDER BY id
            ",
        )
        .bind(tour_guide)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Itinerary::from).collect())
    }

    /// Get an itinerary by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ItineraryId) -> Result<Option<Itinerary>, RepositoryError> {
        let row = sqlx::query_as::<_, ItineraryRow>(
            r"
            SELECT id, tour_guide_id, title, language, price, activities, locations,
                   available_dates, accessibility, pickup_location, dropoff_location,
                   created_at, updated_at
            FROM tripmart.itinerary
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Itinerary::from))
    }

    /// Update an itinerary the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Access` if the itinerary is missing or
    /// owned by another guide.
    #[instrument(skip(self, update), fields(caller_role = %caller.role, caller_subject = caller.subject))]
    pub async fn update(
        &self,
        id: ItineraryId,
        caller: &Caller,
        update: ItineraryUpdate,
    ) -> Result<Itinerary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut itinerary = authorize(
            lock_itinerary(&mut *tx, id).await?,
            caller,
            Policy::OwnerOnly,
        )?;
        update.apply_to(&mut itinerary);

        let row = sqlx::query_as::<_, ItineraryRow>(
            r"
            UPDATE tripmart.itinerary
            SET title = $2, language = $3, price = $4, activities = $5, locations = $6,
                available_dates = $7, accessibility = $8, pickup_location = $9,
                dropoff_location = $10
            WHERE id = $1
            RETURNING id, tour_guide_id, title, language, price, activities, locations,
                      available_dates, accessibility, pickup_location, dropoff_location,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&itinerary.title)
        .bind(&itinerary.language)
        .bind(itinerary.price)
        .bind(&itinerary.activities)
        .bind(&itinerary.locations)
        .bind(&itinerary.available_dates)
        .bind(itinerary.accessibility)
        .bind(itinerary.pickup_location.as_deref())
        .bind(itinerary.dropoff_location.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(itinerary = %id, "Updated itinerary");
        Ok(row.into())
    }

    /// Delete an itinerary the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Access` if the itinerary is missing or
    /// owned by another guide.
    #[instrument(skip(self), fields(caller_role = %caller.role, caller_subject = caller.subject))]
    pub async fn delete(&self, id: ItineraryId, caller: &Caller) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        authorize(
            lock_itinerary(&mut *tx, id).await?,
            caller,
            Policy::OwnerOnly,
        )?;
        sqlx::query("DELETE FROM tripmart.itinerary WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(itinerary = %id, "Deleted itinerary");
        Ok(())
    }
}

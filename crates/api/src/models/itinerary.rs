//! Itinerary types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tripmart_core::{ItineraryId, Price, Principal, TourGuideId};

use super::{ValidationError, non_empty, required_text, text_list, trimmed_text};
use crate::services::guard::Owned;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_LANGUAGE_LENGTH: usize = 50;
const MAX_LOCATION_LENGTH: usize = 300;
const MAX_LIST_ITEMS: usize = 100;
const MAX_LIST_ITEM_LENGTH: usize = 300;

/// A tour published by a guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: ItineraryId,
    pub tour_guide: TourGuideId,
    pub title: String,
    pub language: String,
    pub price: Price,
    pub activities: Vec<String>,
    pub locations: Vec<String>,
    pub available_dates: Vec<NaiveDate>,
    pub accessibility: bool,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Itinerary {
    const KIND: &'static str = "itinerary";

    fn owner(&self) -> Principal {
        self.tour_guide.into()
    }
}

/// Sort and deduplicate dates.
fn normalize_dates(mut dates: Vec<NaiveDate>) -> Result<Vec<NaiveDate>, ValidationError> {
    dates.sort_unstable();
    dates.dedup();
    if dates.len() > MAX_LIST_ITEMS {
        return Err(ValidationError::new(
            "availableDates",
            format!("must have at most {MAX_LIST_ITEMS} entries"),
        ));
    }
    Ok(dates)
}

fn list(field: &'static str, values: Vec<String>) -> Result<Vec<String>, ValidationError> {
    text_list(field, values, MAX_LIST_ITEMS, MAX_LIST_ITEM_LENGTH)
}

/// Body of `POST /itineraries`. The owner is always the calling guide.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewItinerary {
    pub title: String,
    pub language: String,
    pub price: Price,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub available_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub accessibility: bool,
    #[serde(default)]
    pub pickup_location: Option<String>,
    #[serde(default)]
    pub dropoff_location: Option<String>,
}

impl NewItinerary {
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: required_text("title", &self.title, MAX_TITLE_LENGTH)?,
            language: required_text("language", &self.language, MAX_LANGUAGE_LENGTH)?,
            price: self.price,
            activities: list("activities", self.activities)?,
            locations: list("locations", self.locations)?,
            available_dates: normalize_dates(self.available_dates)?,
            accessibility: self.accessibility,
            pickup_location: non_empty(trimmed_text(
                "pickupLocation",
                self.pickup_location,
                MAX_LOCATION_LENGTH,
            )?),
            dropoff_location: non_empty(trimmed_text(
                "dropoffLocation",
                self.dropoff_location,
                MAX_LOCATION_LENGTH,
            )?),
        })
    }
}

/// Body of `PUT /itineraries/{id}`.
///
/// Absent fields keep their value; an empty pickup or dropoff location
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItineraryUpdate {
    pub title: Option<String>,
    pub language: Option<String>,
    pub price: Option<Price>,
    pub activities: Option<Vec<String>>,
    pub locations: Option<Vec<String>>,
    pub available_dates: Option<Vec<NaiveDate>>,
    pub accessibility: Option<bool>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
}

impl ItineraryUpdate {
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: self
                .title
                .map(|t| required_text("title", &t, MAX_TITLE_LENGTH))
                .transpose()?,
            language: self
                .language
                .map(|l| required_text("language", &l, MAX_LANGUAGE_LENGTH))
                .transpose()?,
            price: self.price,
            activities: self.activities.map(|a| list("activities", a)).transpose()?,
            locations: self.locations.map(|l| list("locations", l)).transpose()?,
            available_dates: self.available_dates.map(normalize_dates).transpose()?,
            accessibility: self.accessibility,
            pickup_location: trimmed_text(
                "pickupLocation",
                self.pickup_location,
                MAX_LOCATION_LENGTH,
            )?,
            dropoff_location: trimmed_text(
                "dropoffLocation",
                self.dropoff_location,
                MAX_LOCATION_LENGTH,
            )?,
        })
    }

    pub fn apply_to(self, itinerary: &mut Itinerary) {
        if let Some(title) = self.title {
            itinerary.title = title;
        }
        if let Some(language) = self.language {
            itinerary.language = language;
        }
        if let Some(price) = self.price {
            itinerary.price = price;
        }
        if let Some(activities) = self.activities {
            itinerary.activities = activities;
        }
        if let Some(locations) = self.locations {
            itinerary.locations = locations;
        }
        if let Some(dates) = self.available_dates {
            itinerary.available_dates = dates;
        }
        if let Some(accessibility) = self.accessibility {
            itinerary.accessibility = accessibility;
        }
        if let Some(pickup) = self.pickup_location {
            itinerary.pickup_location = non_empty(Some(pickup));
        }
        if let Some(dropoff) = self.dropoff_location {
            itinerary.dropoff_location = non_empty(Some(dropoff));
        }
    }
}

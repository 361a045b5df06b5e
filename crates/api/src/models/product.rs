//! Product domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripmart_core::{Price, Principal, ProductId, ReviewId, SellerId, Stars, TouristId};

use super::{ValidationError, non_empty, required_text, trimmed_text};
use crate::services::guard::Owned;

const MAX_NAME_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 5_000;
const MAX_REVIEW_LENGTH: usize = 2_000;
const MAX_PICTURE_LENGTH: usize = 2_048;

/// A tourist's review of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    /// Author, absent for reviews the seller imported through an update.
    pub tourist: Option<TouristId>,
    pub rating: Stars,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A product listed by a seller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub description: Option<String>,
    pub picture: Option<String>,
    pub seller: SellerId,
    /// Mean of `reviews[*].rating`, `None` while there are no reviews.
    pub rating: Option<f64>,
    /// Reviews in the order they were written.
    pub reviews: Vec<Review>,
    /// Units in stock.
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Product {
    const KIND: &'static str = "product";

    fn owner(&self) -> Principal {
        self.seller.into()
    }
}

/// Review body as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewInput {
    pub rating: Stars,
    #[serde(default)]
    pub text: Option<String>,
}

impl ReviewInput {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the text is too long.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            rating: self.rating,
            text: non_empty(trimmed_text("text", self.text, MAX_REVIEW_LENGTH)?),
        })
    }
}

/// Body of `POST /products`. The seller is always the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub quantity: u32,
}

impl NewProduct {
    /// Trim text fields and check bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, MAX_NAME_LENGTH)?,
            price: self.price,
            description: non_empty(trimmed_text(
                "description",
                self.description,
                MAX_DESCRIPTION_LENGTH,
            )?),
            picture: non_empty(validate_picture(self.picture)?),
            quantity: self.quantity,
        })
    }
}

/// Body of `PUT /products/{id}`.
///
/// Absent fields keep their value. An empty `description` or `picture`
/// clears it. `reviews`, when present, replaces the whole review list and
/// the rating is recomputed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub picture: Option<String>,
    pub quantity: Option<u32>,
    pub reviews: Option<Vec<ReviewInput>>,
}

impl ProductUpdate {
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = self
            .name
            .map(|n| required_text("name", &n, MAX_NAME_LENGTH))
            .transpose()?;
        let reviews = self
            .reviews
            .map(|reviews| {
                reviews
                    .into_iter()
                    .map(ReviewInput::validated)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(Self {
            name,
            price: self.price,
            description: trimmed_text("description", self.description, MAX_DESCRIPTION_LENGTH)?,
            picture: validate_picture(self.picture)?,
            quantity: self.quantity,
            reviews,
        })
    }

    /// Apply the scalar fields to `product`. Reviews are not touched; they
    /// are rewritten by the repository, which owns review ids.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = &self.description {
            product.description = non_empty(Some(description.clone()));
        }
        if let Some(picture) = &self.picture {
            product.picture = non_empty(Some(picture.clone()));
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
    }
}

/// Picture must be an absolute `http(s)` URL; empty passes through for clearing.
fn validate_picture(picture: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(picture) = trimmed_text("picture", picture, MAX_PICTURE_LENGTH)? else {
        return Ok(None);
    };
    if picture.is_empty() {
        return Ok(Some(picture));
    }
    let url = url::Url::parse(&picture)
        .map_err(|e| ValidationError::new("picture", format!("must be a URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::new("picture", "must be an http or https URL"));
    }
    Ok(Some(picture))
}

/// Inclusive price bounds parsed from `minPrice` / `maxPrice`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<Price>,
    pub max: Option<Price>,
}

impl PriceRange {
    /// Parse the raw query values. Blank values count as absent.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a non-numeric or negative bound.
    pub fn parse(min: Option<&str>, max: Option<&str>) -> Result<Self, ValidationError> {
        let bound = |field: &'static str, raw: Option<&str>| {
            raw.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    Price::parse(s).map_err(|e| ValidationError::new(field, e.to_string()))
                })
                .transpose()
        };

        Ok(Self {
            min: bound("minPrice", min)?,
            max: bound("maxPrice", max)?,
        })
    }

    /// Whether no price can satisfy both bounds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            name: "Papyrus scroll".into(),
            price: Price::parse("12.00").unwrap(),
            description: Some("Hand made".into()),
            picture: None,
            seller: SellerId::new(5),
            rating: None,
            reviews: Vec::new(),
            quantity: 10,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_new_product_rejects_unknown_fields() {
        let json = r#"{"name":"Lamp","price":"3.50","seller":99}"#;
        assert!(serde_json::from_str::<NewProduct>(json).is_err());
    }

    #[test]
    fn test_new_product_validated_trims() {
        let json = r#"{"name":"  Lamp ","price":3.5,"description":"  ","quantity":4}"#;
        let input: NewProduct = serde_json::from_str(json).unwrap();
        let input = input.validated().unwrap();

        assert_eq!(input.name, "Lamp");
        assert_eq!(input.description, None);
        assert_eq!(input.quantity, 4);
    }

    #[test]
    fn test_new_product_rejects_bad_values() {
        assert!(serde_json::from_str::<NewProduct>(r#"{"name":"Lamp","price":"-1"}"#).is_err());
        assert!(serde_json::from_str::<NewProduct>(r#"{"name":"Lamp","price":1,"quantity":-2}"#).is_err());

        let blank: NewProduct = serde_json::from_str(r#"{"name":" ","price":1}"#).unwrap();
        assert_eq!(blank.validated().unwrap_err().field, "name");

        let ftp: NewProduct =
            serde_json::from_str(r#"{"name":"Lamp","price":1,"picture":"ftp://x.test/a.png"}"#)
                .unwrap();
        assert_eq!(ftp.validated().unwrap_err().field, "picture");
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let mut p = product();
        let update: ProductUpdate = serde_json::from_str(r#"{"price":"15.25"}"#).unwrap();
        update.validated().unwrap().apply_to(&mut p);

        assert_eq!(p.price, Price::parse("15.25").unwrap());
        assert_eq!(p.name, "Papyrus scroll");
        assert_eq!(p.description.as_deref(), Some("Hand made"));
        assert_eq!(p.quantity, 10);
    }

    #[test]
    fn test_update_empty_string_clears() {
        let mut p = product();
        let update: ProductUpdate = serde_json::from_str(r#"{"description":""}"#).unwrap();
        update.validated().unwrap().apply_to(&mut p);
        assert_eq!(p.description, None);
    }

    #[test]
    fn test_update_rejects_out_of_range_review() {
        let json = r#"{"reviews":[{"rating":4},{"rating":7}]}"#;
        assert!(serde_json::from_str::<ProductUpdate>(json).is_err());
    }

    #[test]
    fn test_product_is_owned_by_seller() {
        assert_eq!(product().owner(), Principal::from(SellerId::new(5)));
    }

    #[test]
    fn test_price_range_parse() {
        let range = PriceRange::parse(Some("10"), Some("")).unwrap();
        assert_eq!(range.min, Some(Price::parse("10").unwrap()));
        assert_eq!(range.max, None);

        assert_eq!(
            PriceRange::parse(Some("cheap"), None).unwrap_err().field,
            "minPrice"
        );
        assert_eq!(
            PriceRange::parse(None, Some("-4")).unwrap_err().field,
            "maxPrice"
        );
    }

    #[test]
    fn test_inverted_price_range_is_empty() {
        assert!(PriceRange::parse(Some("10"), Some("5")).unwrap().is_empty());
        assert!(!PriceRange::parse(Some("5"), Some("5")).unwrap().is_empty());
        assert!(!PriceRange::parse(None, Some("5")).unwrap().is_empty());
    }

    #[test]
    fn test_unrated_product_serializes_null_rating() {
        let json = serde_json::to_value(product()).unwrap();
        assert!(json["rating"].is_null());
        assert_eq!(json["price"], "12.00");
        assert_eq!(json["seller"], 5);
    }
}

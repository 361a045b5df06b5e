//! Review stars and the product rating aggregate.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors raised when validating review stars.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingError {
    /// Stars outside `0..=5`.
    #[error("rating must be between {min} and {max}, got {got}")]
    OutOfRange {
        /// Lowest accepted value.
        min: u8,
        /// Highest accepted value.
        max: u8,
        /// Rejected value.
        got: i64,
    },
}

/// A single review's rating, an integer from 0 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Stars(u8);

impl Stars {
    /// Lowest rating a review can give.
    pub const MIN: u8 = 0;
    /// Highest rating a review can give.
    pub const MAX: u8 = 5;

    /// Validate a raw star count.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] outside `0..=5`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(RatingError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                got: value,
            })
    }

    /// The star count.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Stars {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Arithmetic mean of a review sequence's stars.
///
/// Returns `None` for an empty sequence: a product nobody has reviewed has no
/// rating, rather than a rating of zero or NaN.
///
/// ```
/// use tripmart_core::{Stars, average_rating};
///
/// let reviews = [Stars::new(4).unwrap(), Stars::new(2).unwrap()];
/// assert_eq!(average_rating(reviews), Some(3.0));
/// assert_eq!(average_rating([]), None);
/// ```
#[must_use]
pub fn average_rating<I>(stars: I) -> Option<f64>
where
    I: IntoIterator<Item = Stars>,
{
    let (sum, count) = stars
        .into_iter()
        .fold((0_u64, 0_u32), |(sum, count), s| {
            (sum + u64::from(s.get()), count + 1)
        });

    if count == 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)] // sums of 0..=5 stars stay far below 2^52
    let mean = sum as f64 / f64::from(count);
    Some(mean)
}

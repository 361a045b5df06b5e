//! Promo code values and validity windows.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Errors raised when validating promo code fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromoCodeError {
    /// The code is shorter than [`PromoCode::MIN_LENGTH`].
    #[error("promo code must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The code is longer than [`PromoCode::MAX_LENGTH`].
    #[error("promo code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The code contains something other than ASCII letters and digits.
    #[error("promo code may only contain letters and digits")]
    InvalidCharacters,
    /// The discount is outside `0..=100`.
    #[error("percent off must be between 0 and 100, got {0}")]
    PercentOutOfRange(i64),
    /// The window ends at or before its start.
    #[error("promo code end must be after its start")]
    EmptyWindow,
}

/// A promo code string, normalized to uppercase.
///
/// ```
/// use tripmart_core::PromoCode;
///
/// assert_eq!(PromoCode::parse(" summer25 ").unwrap().as_str(), "SUMMER25");
/// assert!(PromoCode::parse("ab").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 32;

    /// # Errors
    ///
    /// Returns a [`PromoCodeError`] for bad length or characters.
    pub fn parse(s: &str) -> Result<Self, PromoCodeError> {
        let s = s.trim();
        if s.len() < Self::MIN_LENGTH {
            return Err(PromoCodeError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(PromoCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PromoCodeError::InvalidCharacters);
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PromoCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for PromoCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PromoCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for PromoCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Discount percentage, `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PercentOff(u8);

impl PercentOff {
    /// # Errors
    ///
    /// Returns [`PromoCodeError::PercentOutOfRange`] outside `0..=100`.
    pub fn new(value: i64) -> Result<Self, PromoCodeError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(PromoCodeError::PercentOutOfRange(value))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for PercentOff {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Half-open validity window `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns [`PromoCodeError::EmptyWindow`] unless `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PromoCodeError> {
        if end <= start {
            return Err(PromoCodeError::EmptyWindow);
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Raw {
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}

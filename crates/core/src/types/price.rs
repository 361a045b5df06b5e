//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are non-negative amounts with at most two decimal places. Product
//! prices, itinerary prices and purchase totals all use this type, so the
//! bounds are enforced once at parse time.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("price must have at most 2 decimal places")]
    TooPrecise,
    /// The input is not a decimal number.
    #[error("price must be a decimal number")]
    NotANumber,
    /// The amount does not fit a `NUMERIC(12,2)` column.
    #[error("price must be at most {}", Price::MAX)]
    TooLarge,
}

/// A non-negative monetary amount in the platform currency.
///
/// Serialized as a two-decimal string (`"19.90"`) to avoid float rounding in
/// clients. Deserialization accepts either a string or a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Number of decimal places a price may carry.
    pub const SCALE: u32 = 2;

    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable price, 9 999 999 999.99.
    pub const MAX: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, Self::SCALE));

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`], [`PriceError::TooPrecise`] or
    /// [`PriceError::TooLarge`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(PriceError::TooPrecise);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount.normalize()))
    }

    /// Parse a price from user input such as a query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] if the input is not a decimal,
    /// otherwise the bounds errors of [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount: Decimal = s.trim().parse().map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `quantity` units after taking `percent_off` percent off.
    ///
    /// Rounded to cents, midpoints away from zero.
    #[must_use]
    pub fn total(&self, quantity: u32, percent_off: u8) -> Self {
        let percent_off = Decimal::from(percent_off.min(100));
        let gross = self.0 * Decimal::from(quantity);
        let net = gross * (Decimal::ONE_HUNDRED - percent_off) / Decimal::ONE_HUNDRED;
        Self(
            net.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let amount = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        Self::parse(&amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

//! Tour guide profile fields with format rules.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors raised when validating profile fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("username must be {min}-{max} characters")]
    UsernameLength { min: usize, max: usize },
    #[error("username may only contain letters, digits, '_', '.' and '-'")]
    UsernameCharacters,
    #[error("nationality must be a two-letter ISO 3166-1 country code")]
    Nationality,
    #[error("mobile number must be {min}-{max} characters of digits, spaces, '+' or '-'")]
    PhoneNumber { min: usize, max: usize },
}

macro_rules! string_newtype {
    ($name:ident) => {
        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(Self(s))
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

/// Public handle of a tour guide, unique across the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 50;

    /// # Errors
    ///
    /// Returns a [`ProfileError`] for bad length or characters.
    pub fn parse(s: &str) -> Result<Self, ProfileError> {
        let s = s.trim();
        let len = s.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            return Err(ProfileError::UsernameLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            return Err(ProfileError::UsernameCharacters);
        }
        Ok(Self(s.to_owned()))
    }
}

string_newtype!(Username);

/// ISO 3166-1 alpha-2 country code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Nationality(String);

impl Nationality {
    /// # Errors
    ///
    /// Returns [`ProfileError::Nationality`] unless the input is two ASCII letters.
    pub fn parse(s: &str) -> Result<Self, ProfileError> {
        let s = s.trim();
        if s.len() != 2 || !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ProfileError::Nationality);
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

string_newtype!(Nationality);

/// Contact number, loosely formatted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub const MIN_LENGTH: usize = 7;
    pub const MAX_LENGTH: usize = 20;

    /// # Errors
    ///
    /// Returns [`ProfileError::PhoneNumber`] for bad length or characters.
    pub fn parse(s: &str) -> Result<Self, ProfileError> {
        let s = s.trim();
        let valid_chars = s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-'));
        let has_digits = s.chars().filter(char::is_ascii_digit).count() >= Self::MIN_LENGTH;
        if !valid_chars || !has_digits || s.len() > Self::MAX_LENGTH {
            return Err(ProfileError::PhoneNumber {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }
}

string_newtype!(PhoneNumber);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert_eq!(Username::parse(" nile.guide_1 ").unwrap().as_str(), "nile.guide_1");
        assert!(matches!(
            Username::parse("ab"),
            Err(ProfileError::UsernameLength { .. })
        ));
        assert_eq!(
            Username::parse("has space"),
            Err(ProfileError::UsernameCharacters)
        );
    }

    #[test]
    fn test_nationality_uppercased() {
        assert_eq!(Nationality::parse("eg").unwrap().as_str(), "EG");
        assert!(Nationality::parse("EGY").is_err());
        assert!(Nationality::parse("1A").is_err());
    }

    #[test]
    fn test_phone_number() {
        assert!(PhoneNumber::parse("+20 100-123-4567").is_ok());
        assert!(PhoneNumber::parse("12345").is_err());
        assert!(PhoneNumber::parse("call me maybe").is_err());
        assert!(PhoneNumber::parse("+1 234 567 890 123 456 789").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Nationality>("\"fr\"").is_ok());
        assert!(serde_json::from_str::<Nationality>("\"France\"").is_err());
    }
}

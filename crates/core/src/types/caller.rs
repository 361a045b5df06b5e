//! Authenticated caller identity.
//!
//! The identity collaborator authenticates users and hands the API an opaque
//! subject id plus a role. Handlers receive a [`Caller`] explicitly instead
//! of reading identity from request-scoped globals.

use serde::{Deserialize, Serialize};

use super::id::{SellerId, TourGuideId, TouristId};

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    /// Lists and manages products.
    Seller,
    /// Buys products, writes reviews.
    Tourist,
    /// Publishes itineraries.
    TourGuide,
    /// Platform operator.
    Admin,
}

impl CallerRole {
    /// Wire name of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Tourist => "tourist",
            Self::TourGuide => "tour_guide",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for CallerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`CallerRole`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid caller role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for CallerRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seller" => Ok(Self::Seller),
            "tourist" => Ok(Self::Tourist),
            "tour_guide" => Ok(Self::TourGuide),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError(s.to_owned())),
        }
    }
}

/// A role-scoped subject: the unit ownership is compared in.
///
/// Seller 5 and tour guide 5 are different principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub role: CallerRole,
    pub subject: i32,
}

impl From<SellerId> for Principal {
    fn from(id: SellerId) -> Self {
        Self {
            role: CallerRole::Seller,
            subject: id.as_i32(),
        }
    }
}

impl From<TouristId> for Principal {
    fn from(id: TouristId) -> Self {
        Self {
            role: CallerRole::Tourist,
            subject: id.as_i32(),
        }
    }
}

impl From<TourGuideId> for Principal {
    fn from(id: TourGuideId) -> Self {
        Self {
            role: CallerRole::TourGuide,
            subject: id.as_i32(),
        }
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Opaque subject id issued by the identity collaborator.
    pub subject: i32,
    /// Role the subject acts in.
    pub role: CallerRole,
}

impl Caller {
    /// Create a caller.
    #[must_use]
    pub const fn new(role: CallerRole, subject: i32) -> Self {
        Self { subject, role }
    }

    /// The caller as a role-scoped principal.
    #[must_use]
    pub const fn principal(&self) -> Principal {
        Principal {
            role: self.role,
            subject: self.subject,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, CallerRole::Admin)
    }

    /// The caller's seller id, if acting as a seller.
    #[must_use]
    pub const fn seller_id(&self) -> Option<SellerId> {
        match self.role {
            CallerRole::Seller => Some(SellerId::new(self.subject)),
            _ => None,
        }
    }

    /// The caller's tourist id, if acting as a tourist.
    #[must_use]
    pub const fn tourist_id(&self) -> Option<TouristId> {
        match self.role {
            CallerRole::Tourist => Some(TouristId::new(self.subject)),
            _ => None,
        }
    }

    /// The caller's tour guide id, if acting as a tour guide.
    #[must_use]
    pub const fn tour_guide_id(&self) -> Option<TourGuideId> {
        match self.role {
            CallerRole::TourGuide => Some(TourGuideId::new(self.subject)),
            _ => None,
        }
    }
}

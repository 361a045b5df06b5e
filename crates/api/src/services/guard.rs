//! Ownership guard for mutations on owned resources.
//!
//! Every update or delete of a product, tour guide profile or itinerary runs
//! through [`authorize`]. Existence is checked first, so a missing resource is
//! `404` for every caller and a foreign one is `403`.

use thiserror::Error;

use tripmart_core::{Caller, Principal};

/// Outcome of a refused access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The resource exists but belongs to someone else.
    #[error("you are not allowed to modify this {0}")]
    Forbidden(&'static str),
}

/// Who besides the owner may mutate a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Only the owning principal.
    OwnerOnly,
    /// The owning principal or any admin.
    OwnerOrAdmin,
}

/// A resource with a single owning principal.
pub trait Owned {
    /// Human-readable resource name used in error messages.
    const KIND: &'static str;

    /// The principal that owns this resource.
    fn owner(&self) -> Principal;
}

/// Check that `caller` may mutate `resource` under `policy`.
///
/// # Errors
///
/// Returns [`AccessError::NotFound`] when `resource` is `None` and
/// [`AccessError::Forbidden`] when the caller is not allowed.
pub fn authorize<T: Owned>(
    resource: Option<T>,
    caller: &Caller,
    policy: Policy,
) -> Result<T, AccessError> {
    let resource = resource.ok_or(AccessError::NotFound(T::KIND))?;

    if resource.owner() == caller.principal() {
        return Ok(resource);
    }
    if policy == Policy::OwnerOrAdmin && caller.is_admin() {
        return Ok(resource);
    }

    tracing::debug!(
        kind = T::KIND,
        caller_role = %caller.role,
        caller_subject = caller.subject,
        "Ownership check refused"
    );
    Err(AccessError::Forbidden(T::KIND))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tripmart_core::{CallerRole, SellerId, TourGuideId};

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Listing(SellerId);

    impl Owned for Listing {
        const KIND: &'static str = "listing";

        fn owner(&self) -> Principal {
            self.0.into()
        }
    }

    #[derive(Debug, PartialEq)]
    struct Tour(TourGuideId);

    impl Owned for Tour {
        const KIND: &'static str = "tour";

        fn owner(&self) -> Principal {
            self.0.into()
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        let caller = Caller::new(CallerRole::Seller, 42);
        let listing = authorize(Some(Listing(SellerId::new(42))), &caller, Policy::OwnerOnly);
        assert_eq!(listing.unwrap(), Listing(SellerId::new(42)));
    }

    #[test]
    fn test_other_seller_is_forbidden() {
        let caller = Caller::new(CallerRole::Seller, 7);
        let result = authorize(Some(Listing(SellerId::new(42))), &caller, Policy::OwnerOnly);
        assert_eq!(result, Err(AccessError::Forbidden("listing")));
    }

    #[test]
    fn test_missing_resource_is_not_found_for_everyone() {
        for caller in [
            Caller::new(CallerRole::Seller, 42),
            Caller::new(CallerRole::Tourist, 1),
            Caller::new(CallerRole::Admin, 1),
        ] {
            let result = authorize::<Listing>(None, &caller, Policy::OwnerOrAdmin);
            assert_eq!(result, Err(AccessError::NotFound("listing")));
        }
    }

    #[test]
    fn test_same_subject_in_other_role_is_forbidden() {
        let guide = Caller::new(CallerRole::TourGuide, 42);
        let result = authorize(Some(Listing(SellerId::new(42))), &guide, Policy::OwnerOnly);
        assert_eq!(result, Err(AccessError::Forbidden("listing")));
    }

    #[test]
    fn test_admin_depends_on_policy() {
        let admin = Caller::new(CallerRole::Admin, 1);

        let owner_only = authorize(Some(Tour(TourGuideId::new(3))), &admin, Policy::OwnerOnly);
        assert_eq!(owner_only, Err(AccessError::Forbidden("tour")));

        let with_admin = authorize(Some(Tour(TourGuideId::new(3))), &admin, Policy::OwnerOrAdmin);
        assert!(with_admin.is_ok());
    }
}

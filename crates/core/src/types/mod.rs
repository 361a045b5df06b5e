//! Core types for Tripmart.
//!
//! This module provides type-safe wrappers for the marketplace's domain concepts.

pub mod caller;
pub mod email;
pub mod id;
pub mod payment;
pub mod price;
pub mod profile;
pub mod promo;
pub mod rating;

pub use caller::{Caller, CallerRole, ParseRoleError, Principal};
pub use email::{Email, EmailError};
pub use id::*;
pub use payment::PaymentMethod;
pub use price::{Price, PriceError};
pub use profile::{Nationality, PhoneNumber, ProfileError, Username};
pub use promo::{DateRange, PercentOff, PromoCode, PromoCodeError};
pub use rating::{RatingError, Stars, average_rating};

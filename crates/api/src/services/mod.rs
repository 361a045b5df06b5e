//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Bearer token signing and verification
//! - `guard` - Ownership checks for owned resources

pub mod auth;
pub mod guard;

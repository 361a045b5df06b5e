//! Tripmart Core - Shared domain types.
//!
//! This crate provides the types used across all Tripmart components:
//! - `api` - JSON REST API for products, purchases, tour guides and itineraries
//! - `cli` - Command-line tools for migrations, seeding and token minting
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Validation rules that every entry point must agree on
//! (price bounds, rating bounds, promo code format) live here.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, ratings, emails, roles and promo codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

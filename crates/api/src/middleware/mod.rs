//! Middleware for the API.
//!
//! Provides authentication extractors, request IDs and rate limiting.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{RequireAdmin, RequireCaller, RequireSeller, RequireTourGuide, RequireTourist};
pub use rate_limit::{RateLimiterLayer, api_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

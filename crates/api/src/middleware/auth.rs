//! Authentication extractors.
//!
//! Callers present `Authorization: Bearer <token>`. The extractors verify the
//! token against the shared signing key and hand the handler a typed
//! identity. A missing or invalid token is `401`; a valid token in the wrong
//! role is `403`.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn create_product(
//!     RequireSeller(seller): RequireSeller,
//!     ApiJson(input): ApiJson<NewProduct>,
//! ) -> Result<Json<Product>> {
//!     // `seller` is the caller's SellerId
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use tripmart_core::{Caller, SellerId, TourGuideId, TouristId};

use crate::error::{AppError, set_sentry_caller};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::Malformed("authorization header is not ASCII"))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::Malformed("expected a bearer token"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed("expected a bearer token"));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Caller, AppError> {
    let token = bearer_token(parts)?;
    let caller = state.tokens().verify(token, Utc::now())?;
    set_sentry_caller(&caller);
    Ok(caller)
}

fn wrong_role(expected: &str) -> AppError {
    AppError::Forbidden(format!("this action requires a {expected} account"))
}

/// Any authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct RequireCaller(pub Caller);

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

/// A caller acting as a seller.
#[derive(Debug, Clone, Copy)]
pub struct RequireSeller(pub SellerId);

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = authenticate(parts, state)?;
        caller
            .seller_id()
            .map(Self)
            .ok_or_else(|| wrong_role("seller"))
    }
}

/// A caller acting as a tourist.
#[derive(Debug, Clone, Copy)]
pub struct RequireTourist(pub TouristId);

impl FromRequestParts<AppState> for RequireTourist {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = authenticate(parts, state)?;
        caller
            .tourist_id()
            .map(Self)
            .ok_or_else(|| wrong_role("tourist"))
    }
}

/// A caller acting as a tour guide.
#[derive(Debug, Clone, Copy)]
pub struct RequireTourGuide(pub TourGuideId);

impl FromRequestParts<AppState> for RequireTourGuide {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = authenticate(parts, state)?;
        caller
            .tour_guide_id()
            .map(Self)
            .ok_or_else(|| wrong_role("tour guide"))
    }
}

/// A platform admin.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Caller);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = authenticate(parts, state)?;
        if caller.is_admin() {
            Ok(Self(caller))
        } else {
            Err(wrong_role("admin"))
        }
    }
}

//! Promo code route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use tracing::instrument;

use tripmart_core::{PromoCode, PromoCodeId};

use crate::db::{PromoCodeRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{RequireAdmin, RequireCaller};
use crate::models::promo_code::{NewPromotion, Promotion, PromotionView};
use crate::state::AppState;

/// `GET` takes a code string and `DELETE` takes a numeric id on the same
/// path segment.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/promo-codes", post(create).get(list))
        .route("/promo-codes/{key}", get(show).delete(remove))
}

#[instrument(skip(state, input))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<NewPromotion>,
) -> Result<(StatusCode, Json<Promotion>)> {
    let promotion = PromoCodeRepository::new(state.pool())
        .create(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Promotion>>> {
    let promotions = PromoCodeRepository::new(state.pool()).list().await?;
    Ok(Json(promotions))
}

/// Look up a code and report whether it can be redeemed right now.
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    RequireCaller(_caller): RequireCaller,
    ApiPath(raw): ApiPath<String>,
) -> Result<Json<PromotionView>> {
    let code = PromoCode::parse(&raw).map_err(|e| AppError::BadRequest(format!("code: {e}")))?;

    let promotion = PromoCodeRepository::new(state.pool())
        .get_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("promo code not found".to_owned()))?;

    let status = promotion.status_at(Utc::now());
    Ok(Json(PromotionView { promotion, status }))
}

#[instrument(skip(state))]
async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<PromoCodeId>,
) -> Result<StatusCode> {
    PromoCodeRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("promo code not found".to_owned()),
            other => other.into(),
        })?;
    Ok(StatusCode::NO_CONTENT)
}

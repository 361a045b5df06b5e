//! Tour guide route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use tracing::instrument;

use tripmart_core::TourGuideId;

use crate::db::TourGuideRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireCaller;
use crate::models::tour_guide::{NewTourGuide, TourGuide, TourGuideUpdate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tour-guides", get(list).post(register))
        .route("/tour-guides/{id}", get(show).put(update).delete(remove))
}

/// Public registration.
#[instrument(skip(state, input))]
async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewTourGuide>,
) -> Result<(StatusCode, Json<TourGuide>)> {
    let input = input.validated()?;
    let guide = TourGuideRepository::new(state.pool())
        .create(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(guide)))
}

#[instrument(skip(state))]
async fn list(State(state): State<AppState>) -> Result<Json<Vec<TourGuide>>> {
    let guides = TourGuideRepository::new(state.pool()).list().await?;
    Ok(Json(guides))
}

#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TourGuideId>,
) -> Result<Json<TourGuide>> {
    TourGuideRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("tour guide not found".to_owned()))
}

#[instrument(skip(state, update))]
async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<TourGuideId>,
    ApiJson(update): ApiJson<TourGuideUpdate>,
) -> Result<Json<TourGuide>> {
    let update = update.validated()?;
    let guide = TourGuideRepository::new(state.pool())
        .update(id, &caller, update)
        .await?;
    Ok(Json(guide))
}

/// Removes the profile and all of its itineraries.
#[instrument(skip(state))]
async fn remove(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<TourGuideId>,
) -> Result<StatusCode> {
    TourGuideRepository::new(state.pool())
        .delete(id, &caller)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Itinerary route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use tracing::instrument;

use tripmart_core::{ItineraryId, TourGuideId};

use crate::db::ItineraryRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireCaller, RequireTourGuide};
use crate::models::itinerary::{Itinerary, ItineraryUpdate, NewItinerary};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/itineraries", get(list).post(create))
        .route("/itineraries/{id}", get(show).put(update).delete(remove))
}

/// Query for `GET /itineraries`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub tour_guide_id: Option<TourGuideId>,
}

#[instrument(skip(state, input))]
async fn create(
    State(state): State<AppState>,
    RequireTourGuide(owner): RequireTourGuide,
    ApiJson(input): ApiJson<NewItinerary>,
) -> Result<(StatusCode, Json<Itinerary>)> {
    let input = input.validated()?;
    let itinerary = ItineraryRepository::new(state.pool())
        .create(owner, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(itinerary)))
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Itinerary>>> {
    let itineraries = ItineraryRepository::new(state.pool())
        .list(query.tour_guide_id)
        .await?;
    Ok(Json(itineraries))
}

#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ItineraryId>,
) -> Result<Json<Itinerary>> {
    ItineraryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("itinerary not found".to_owned()))
}

#[instrument(skip(state, update))]
async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ItineraryId>,
    ApiJson(update): ApiJson<ItineraryUpdate>,
) -> Result<Json<Itinerary>> {
    let update = update.validated()?;
    let itinerary = ItineraryRepository::new(state.pool())
        .update(id, &caller, update)
        .await?;
    Ok(Json(itinerary))
}

#[instrument(skip(state))]
async fn remove(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ItineraryId>,
) -> Result<StatusCode> {
    ItineraryRepository::new(state.pool())
        .delete(id, &caller)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use tripmart_core::CallerRole;

    use crate::routes::testing::{bearer, send};

    #[tokio::test]
    async fn test_create_requires_tour_guide() {
        let (status, body) = send(
            Request::post("/itineraries")
                .header("authorization", bearer(CallerRole::Seller, 4))
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"title":"Old Cairo walk","language":"en","price":"40"}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(status, 403);
        assert_eq!(
            body["error"],
            "this action requires a tour guide account"
        );
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let (status, _) = send(
            Request::post("/itineraries")
                .header("authorization", bearer(CallerRole::TourGuide, 4))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":" ","language":"en","price":"40"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_filter() {
        let (status, _) = send(
            Request::get("/itineraries?tourGuideId=seven")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, 400);
    }
}

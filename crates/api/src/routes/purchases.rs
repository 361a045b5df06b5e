//! Purchase route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use tracing::instrument;

use tripmart_core::PurchaseId;

use crate::db::{PurchaseRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{RequireCaller, RequireTourist};
use crate::models::purchase::{NewPurchase, Purchase};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/purchases", post(create))
        .route("/purchases/mine", get(mine))
        .route("/purchases/{id}", get(show))
}

#[instrument(skip(state, input))]
async fn create(
    State(state): State<AppState>,
    RequireTourist(tourist): RequireTourist,
    ApiJson(input): ApiJson<NewPurchase>,
) -> Result<(StatusCode, Json<Purchase>)> {
    let input = input.validated()?;
    let purchase = PurchaseRepository::new(state.pool())
        .create(tourist, &input, Utc::now())
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("product not found".to_owned()),
            other => other.into(),
        })?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

#[instrument(skip(state))]
async fn mine(
    State(state): State<AppState>,
    RequireTourist(tourist): RequireTourist,
) -> Result<Json<Vec<Purchase>>> {
    let purchases = PurchaseRepository::new(state.pool())
        .by_tourist(tourist)
        .await?;
    Ok(Json(purchases))
}

/// A purchase is visible to its buyer, the product's seller and admins.
/// Anyone else gets the same `404` as for a missing purchase.
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<PurchaseId>,
) -> Result<Json<Purchase>> {
    PurchaseRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|purchase| purchase.is_visible_to(&caller))
        .map(Json)
        .ok_or_else(|| AppError::NotFound("purchase not found".to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use tripmart_core::CallerRole;

    use crate::routes::testing::{bearer, send};

    fn checkout(role: CallerRole, body: &'static str) -> Request<Body> {
        Request::post("/purchases")
            .header("authorization", bearer(role, 7))
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_only_tourists_check_out() {
        let (status, _) = send(checkout(
            CallerRole::Seller,
            r#"{"product":1,"quantity":1,"paymentMethod":"credit_card"}"#,
        ))
        .await;
        assert_eq!(status, 403);
    }

    #[tokio::test]
    async fn test_quantity_is_validated() {
        let (status, body) = send(checkout(
            CallerRole::Tourist,
            r#"{"product":1,"quantity":0,"paymentMethod":"credit_card"}"#,
        ))
        .await;
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains("quantity"));
    }

    #[tokio::test]
    async fn test_malformed_promo_code_is_rejected() {
        let (status, _) = send(checkout(
            CallerRole::Tourist,
            r#"{"product":1,"quantity":1,"paymentMethod":"credit_card","promoCode":"no spaces!"}"#,
        ))
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_unknown_payment_method_is_rejected() {
        let (status, _) = send(checkout(
            CallerRole::Tourist,
            r#"{"product":1,"quantity":1,"paymentMethod":"barter"}"#,
        ))
        .await;
        assert_eq!(status, 400);
    }
}

//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (database ping)
//!
//! # Products
//! GET    /products                    - All products
//! GET    /products/search?name=       - Case-insensitive name search
//! GET    /products/sorted-by-rating   - Highest rated first
//! GET    /products/filter?minPrice=&maxPrice=
//! GET    /products/mine               - Caller's listings (seller)
//! GET    /products/{id}               - One product
//! POST   /products                    - Create (seller)
//! PUT    /products/{id}               - Update (owner)
//! DELETE /products/{id}               - Delete (owner)
//! POST   /products/{id}/reviews       - Add review (tourist)
//! GET    /products/{id}/purchases     - Sales of a product (owner, admin)
//! DELETE /admin/products/{id}         - Delete any product (admin)
//!
//! # Purchases
//! POST   /purchases                   - Check out (tourist)
//! GET    /purchases/mine              - Caller's purchases (tourist)
//! GET    /purchases/{id}              - One purchase (buyer, seller, admin)
//!
//! # Promo codes
//! POST   /promo-codes                 - Create (admin)
//! GET    /promo-codes                 - All codes (admin)
//! GET    /promo-codes/{code}          - Code and current status
//! DELETE /promo-codes/{id}            - Delete (admin)
//!
//! # Tour guides
//! POST   /tour-guides                 - Register
//! GET    /tour-guides                 - All profiles
//! GET    /tour-guides/{id}            - One profile
//! PUT    /tour-guides/{id}            - Update (self, admin)
//! DELETE /tour-guides/{id}            - Delete with itineraries (self, admin)
//!
//! # Itineraries
//! POST   /itineraries                 - Create (tour guide)
//! GET    /itineraries?tourGuideId=    - All, optionally one guide's
//! GET    /itineraries/{id}            - One itinerary
//! PUT    /itineraries/{id}            - Update (owner)
//! DELETE /itineraries/{id}            - Delete (owner)
//! ```

pub mod itineraries;
pub mod products;
pub mod promo_codes;
pub mod purchases;
pub mod tour_guides;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(products::router())
        .merge(purchases::router())
        .merge(promo_codes::router())
        .merge(tour_guides::router())
        .merge(itineraries::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use secrecy::SecretString;
    use serde_json::Value;
    use tower::ServiceExt;

    use tripmart_core::{Caller, CallerRole};

    use crate::services::auth::TokenSigner;
    use crate::state::testing;

    pub fn app() -> Router {
        super::routes().with_state(testing::state())
    }

    /// `Authorization` header value for a fresh token.
    pub fn bearer(role: CallerRole, subject: i32) -> String {
        let token = TokenSigner::new(SecretString::from(testing::TEST_SECRET))
            .issue(&Caller::new(role, subject), Utc::now(), Duration::hours(1))
            .unwrap();
        format!("Bearer {token}")
    }

    /// Run one request and decode the JSON body (`Null` when empty).
    pub async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use super::testing::send;

    #[tokio::test]
    async fn test_health() {
        let (status, _) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_database() {
        let (status, _) = send(
            Request::get("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, 503);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = send(Request::get("/hotels").body(Body::empty()).unwrap()).await;
        assert_eq!(status, 404);
    }
}

//! HTTP-level tests for the marketplace API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (tm-cli migrate)
//! - The API server running (cargo run -p tripmart-api)
//! - `TRIPMART_AUTH_SECRET` matching the server's
//!
//! Run with: cargo test -p tripmart-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};

use tripmart_core::CallerRole;
use tripmart_integration_tests::{TestContext, unique_subject, unique_suffix};

async fn create_product(ctx: &TestContext, seller: i32, body: Value) -> Value {
    let resp = ctx
        .as_caller(ctx.client.post(ctx.url("/products")), CallerRole::Seller, seller)
        .json(&body)
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn get_json(ctx: &TestContext, path: &str) -> (StatusCode, Value) {
    let resp = ctx.client.get(ctx.url(path)).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_foreign_seller_cannot_modify_product() {
    let ctx = TestContext::new();
    let owner = unique_subject();
    let intruder = unique_subject();

    let product = create_product(
        &ctx,
        owner,
        json!({"name": "Brass lantern", "price": "22.00", "quantity": 3}),
    )
    .await;
    let id = product["id"].as_i64().unwrap();

    let resp = ctx
        .as_caller(
            ctx.client.put(ctx.url(&format!("/products/{id}"))),
            CallerRole::Seller,
            intruder,
        )
        .json(&json!({"name": "Hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = ctx
        .as_caller(
            ctx.client.delete(ctx.url(&format!("/products/{id}"))),
            CallerRole::Seller,
            intruder,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let (status, current) = get_json(&ctx, &format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["name"], "Brass lantern");
}

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_missing_product_is_404_before_ownership() {
    let ctx = TestContext::new();

    let resp = ctx
        .as_caller(
            ctx.client.put(ctx.url("/products/2147483000")),
            CallerRole::Seller,
            unique_subject(),
        )
        .json(&json!({"name": "Anything"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "product not found"}));
}

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_admin_can_delete_any_product() {
    let ctx = TestContext::new();
    let product = create_product(
        &ctx,
        unique_subject(),
        json!({"name": "Clay jar", "price": "9.00"}),
    )
    .await;
    let id = product["id"].as_i64().unwrap();

    let resp = ctx
        .as_caller(
            ctx.client.delete(ctx.url(&format!("/admin/products/{id}"))),
            CallerRole::Admin,
            1,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, _) = get_json(&ctx, &format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Ratings
// ============================================================================

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_rating_follows_reviews() {
    let ctx = TestContext::new();
    let seller = unique_subject();
    let product = create_product(
        &ctx,
        seller,
        json!({"name": "Camel leather bag", "price": "40.00"}),
    )
    .await;
    let id = product["id"].as_i64().unwrap();
    assert_eq!(product["rating"], Value::Null);

    for stars in [4, 2] {
        let resp = ctx
            .as_caller(
                ctx.client.post(ctx.url(&format!("/products/{id}/reviews"))),
                CallerRole::Tourist,
                unique_subject(),
            )
            .json(&json!({"rating": stars, "text": "Fine"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let (_, current) = get_json(&ctx, &format!("/products/{id}")).await;
    assert!((current["rating"].as_f64().unwrap() - 3.0).abs() < 1e-9);
    assert_eq!(current["reviews"].as_array().unwrap().len(), 2);

    // Replacing the reviews with an empty list clears the rating
    let resp = ctx
        .as_caller(
            ctx.client.put(ctx.url(&format!("/products/{id}"))),
            CallerRole::Seller,
            seller,
        )
        .json(&json!({"reviews": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["rating"], Value::Null);
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_inverted_price_range_is_empty() {
    let ctx = TestContext::new();
    let (status, body) = get_json(&ctx, "/products/filter?minPrice=10&maxPrice=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_empty_search_returns_everything() {
    let ctx = TestContext::new();
    create_product(
        &ctx,
        unique_subject(),
        json!({"name": "100% cotton scarf", "price": "15.00"}),
    )
    .await;

    let (_, all) = get_json(&ctx, "/products").await;
    let (_, blank) = get_json(&ctx, "/products/search?name=").await;
    assert_eq!(all, blank);

    let (_, literal) = get_json(&ctx, "/products/search?name=100%25").await;
    assert!(
        literal
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p["name"].as_str().unwrap().contains("100%"))
    );
}

// ============================================================================
// Tour guides
// ============================================================================

async fn register_guide(ctx: &TestContext) -> i32 {
    let suffix = unique_suffix().to_ascii_lowercase();
    let resp = ctx
        .client
        .post(ctx.url("/tour-guides"))
        .json(&json!({
            "email": format!("guide-{suffix}@tripmart.test"),
            "username": format!("guide_{suffix}"),
            "nationality": "EG",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let guide: Value = resp.json().await.unwrap();
    i32::try_from(guide["id"].as_i64().unwrap()).unwrap()
}

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_deleting_guide_removes_only_their_itineraries() {
    let ctx = TestContext::new();

    let doomed = register_guide(&ctx).await;
    let survivor = register_guide(&ctx).await;

    for guide in [doomed, doomed, survivor] {
        let resp = ctx
            .as_caller(
                ctx.client.post(ctx.url("/itineraries")),
                CallerRole::TourGuide,
                guide,
            )
            .json(&json!({"title": "Coptic Cairo", "language": "en", "price": "25"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = ctx
        .as_caller(
            ctx.client.delete(ctx.url(&format!("/tour-guides/{doomed}"))),
            CallerRole::TourGuide,
            doomed,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (_, gone) = get_json(&ctx, &format!("/itineraries?tourGuideId={doomed}")).await;
    assert_eq!(gone, json!([]));
    let (_, kept) = get_json(&ctx, &format!("/itineraries?tourGuideId={survivor}")).await;
    assert_eq!(kept.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_duplicate_username_conflicts() {
    let ctx = TestContext::new();
    let suffix = unique_suffix().to_ascii_lowercase();
    let body = |email: &str| {
        json!({"email": email, "username": format!("dup_{suffix}"), "nationality": "FR"})
    };

    let first = ctx
        .client
        .post(ctx.url("/tour-guides"))
        .json(&body(&format!("a-{suffix}@tripmart.test")))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = ctx
        .client
        .post(ctx.url("/tour-guides"))
        .json(&body(&format!("b-{suffix}@tripmart.test")))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let error: Value = second.json().await.unwrap();
    assert_eq!(error["error"], "username is already taken");
}

// ============================================================================
// Purchases
// ============================================================================

#[tokio::test]
#[ignore = "Requires running api server and database"]
async fn test_checkout_applies_promo_and_decrements_stock() {
    let ctx = TestContext::new();
    let seller = unique_subject();
    let tourist = unique_subject();
    let code = format!("T{}", unique_suffix());

    let product = create_product(
        &ctx,
        seller,
        json!({"name": "Hibiscus tea", "price": "10.00", "quantity": 3}),
    )
    .await;
    let id = product["id"].as_i64().unwrap();

    let now = Utc::now();
    let resp = ctx
        .as_caller(ctx.client.post(ctx.url("/promo-codes")), CallerRole::Admin, 1)
        .json(&json!({
            "code": code,
            "percentOff": 25,
            "dateRange": {"start": now - Duration::hours(1), "end": now + Duration::days(1)},
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let checkout = |promo: Option<&str>, quantity: u32| {
        ctx.as_caller(ctx.client.post(ctx.url("/purchases")), CallerRole::Tourist, tourist)
            .json(&json!({
                "product": id,
                "quantity": quantity,
                "paymentMethod": "credit_card",
                "promoCode": promo,
            }))
    };

    let resp = checkout(Some(&code), 2).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let purchase: Value = resp.json().await.unwrap();
    assert_eq!(purchase["totalPrice"], "15.00");

    // Single use
    let resp = checkout(Some(&code), 1).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Only one left
    let resp = checkout(None, 2).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (_, current) = get_json(&ctx, &format!("/products/{id}")).await;
    assert_eq!(current["quantity"], 1);

    let resp = ctx
        .as_caller(ctx.client.get(ctx.url("/purchases/mine")), CallerRole::Tourist, tourist)
        .send()
        .await
        .unwrap();
    let mine: Value = resp.json().await.unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // Sellers see their product's sales; other sellers do not
    let resp = ctx
        .as_caller(
            ctx.client.get(ctx.url(&format!("/products/{id}/purchases"))),
            CallerRole::Seller,
            unique_subject(),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

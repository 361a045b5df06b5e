//! Product route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;
use tracing::instrument;

use tripmart_core::ProductId;

use crate::db::{ProductRepository, PurchaseRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireCaller, RequireSeller, RequireTourist};
use crate::models::product::{NewProduct, PriceRange, Product, ProductUpdate, ReviewInput};
use crate::models::purchase::Purchase;
use crate::models::reject_nul;
use crate::services::guard::{Policy, authorize};
use crate::state::AppState;

/// Product routes, mounted at the root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/search", get(search))
        .route("/products/sorted-by-rating", get(sorted_by_rating))
        .route("/products/filter", get(filter))
        .route("/products/mine", get(mine))
        .route(
            "/products/{id}",
            get(show).put(update).delete(remove),
        )
        .route("/products/{id}/reviews", post(add_review))
        .route("/products/{id}/purchases", get(purchases))
        .route("/admin/products/{id}", delete(admin_remove))
}

/// Query for `GET /products/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

/// Query for `GET /products/filter`. Bounds stay raw here so a bad number
/// is reported against its own field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn product_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("product not found".to_owned()),
        other => other.into(),
    }
}

#[instrument(skip(state))]
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    if let Some(name) = query.name.as_deref() {
        reject_nul("name", name)?;
    }
    let products = ProductRepository::new(state.pool())
        .search(query.name.as_deref())
        .await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
async fn sorted_by_rating(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .sorted_by_rating()
        .await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
async fn filter(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> Result<Json<Vec<Product>>> {
    let range = PriceRange::parse(query.min_price.as_deref(), query.max_price.as_deref())?;
    let products = ProductRepository::new(state.pool()).by_price(range).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
async fn mine(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .by_seller(seller)
        .await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))
}

#[instrument(skip(state, input))]
async fn create(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = input.validated()?;
    let product = ProductRepository::new(state.pool())
        .create(seller, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, update))]
async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Product>> {
    let update = update.validated()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &caller, &update)
        .await?;
    Ok(Json(product))
}

#[instrument(skip(state))]
async fn remove(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(id, &caller, Policy::OwnerOnly)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Administrative delete: existence is still checked, ownership is not.
#[instrument(skip(state))]
async fn admin_remove(
    State(state): State<AppState>,
    RequireAdmin(caller): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(id, &caller, Policy::OwnerOrAdmin)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, review))]
async fn add_review(
    State(state): State<AppState>,
    RequireTourist(tourist): RequireTourist,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(review): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let review = review.validated()?;
    let product = ProductRepository::new(state.pool())
        .add_review(id, tourist, &review)
        .await
        .map_err(product_not_found)?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Purchases of a product, for its seller or an admin.
#[instrument(skip(state))]
async fn purchases(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Vec<Purchase>>> {
    let product = ProductRepository::new(state.pool()).get(id).await?;
    authorize(product, &caller, Policy::OwnerOrAdmin)?;

    let purchases = PurchaseRepository::new(state.pool())
        .by_product(id)
        .await?;
    Ok(Json(purchases))
}

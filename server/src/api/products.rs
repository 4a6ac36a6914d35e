//! Product-scoped endpoints.
//!
//! - GET /api/products/:product_id/rating - Stored rating aggregate
//! - GET /api/products/:product_id/reviews - Approved reviews, paged and sorted
//! - GET /api/products/:product_id/can-review - Eligibility of the caller (requires auth)

use crate::auth::SessionUser;
use crate::server::state::AppState;
use axum::{Json, extract::State};
use product_reviews_core::{
    ProductId, RatingAggregate, ReviewEligibility, ReviewPage, ReviewSortField, SortOrder,
};
use product_reviews_web::{ApiPath, ApiQuery, WebResult};
use serde::Deserialize;

/// Query parameters for listing a product's reviews.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReviewsQuery {
    /// 1-based page number (default 1)
    pub page: Option<u32>,
    /// Page size (default 10, capped at the configured maximum)
    pub limit: Option<u32>,
    /// `createdAt`, `rating` or `helpfulCount` (default `createdAt`)
    #[serde(default)]
    pub sort_by: ReviewSortField,
    /// `asc` or `desc` (default `desc`)
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// The rating aggregate stored on a product.
///
/// Reads the product's denormalized fields; never recomputes.
///
/// ```bash
/// curl http://localhost:8080/api/products/550e8400-e29b-41d4-a716-446655440000/rating
/// # {"average":4.3,"count":3,"breakdown":{"1":0,"2":0,"3":0,"4":2,"5":1}}
/// ```
pub async fn get_rating(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> WebResult<Json<RatingAggregate>> {
    let aggregate = state.services.queries.product_rating(product_id).await?;
    Ok(Json(aggregate))
}

/// Approved reviews of a product.
///
/// ```bash
/// curl "http://localhost:8080/api/products/550e8400-e29b-41d4-a716-446655440000/reviews?sortBy=helpfulCount&limit=5"
/// ```
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<ListReviewsQuery>,
) -> WebResult<Json<ReviewPage>> {
    let page = state
        .services
        .queries
        .list_product_reviews(
            product_id,
            query.page,
            query.limit,
            query.sort_by,
            query.sort_order,
        )
        .await?;
    Ok(Json(page))
}

/// Whether the caller may review the product.
///
/// ```bash
/// curl http://localhost:8080/api/products/550e8400-e29b-41d4-a716-446655440000/can-review \
///   -H "Authorization: Bearer <session_token>"
/// # {"canReview":true,"hasPurchased":true,"hasReviewed":false}
/// ```
pub async fn can_review(
    session: SessionUser,
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> WebResult<Json<ReviewEligibility>> {
    let eligibility = state
        .services
        .queries
        .can_user_review(session.user_id(), product_id)
        .await?;
    Ok(Json(eligibility))
}

//! Review endpoints.
//!
//! - POST /api/reviews - Submit a review (requires auth)
//! - GET /api/reviews/:review_id - A single approved review
//! - PUT /api/reviews/:review_id - Edit a review (owner or admin)
//! - DELETE /api/reviews/:review_id - Remove a review (owner or admin)
//! - POST /api/reviews/:review_id/helpful - Mark a review helpful (requires auth)

use crate::auth::SessionUser;
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use product_reviews_core::{NewReview, ReviewId, ReviewPatch, ReviewView};
use product_reviews_web::{ApiJson, ApiPath, CorrelationId, WebResult};
use serde::Serialize;

/// Response after deleting a review.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReviewResponse {
    /// Always `true`
    pub deleted: bool,
    /// The removed review
    pub review_id: ReviewId,
}

/// Response after a helpful vote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpfulResponse {
    /// Distinct helpful votes after this one
    pub helpful_count: u64,
}

/// Submit a review for a product.
///
/// The author is the authenticated caller. `verifiedPurchase` is decided by
/// the server from the order history.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/reviews \
///   -H "Authorization: Bearer <session_token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "productId": "550e8400-e29b-41d4-a716-446655440000",
///     "rating": 4,
///     "title": "Solid",
///     "comment": "Does exactly what it says on the box."
///   }'
/// ```
pub async fn submit_review(
    CorrelationId(correlation_id): CorrelationId,
    session: SessionUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewReview>,
) -> WebResult<(StatusCode, Json<ReviewView>)> {
    let review = state
        .services
        .mutations
        .submit_review(session.user_id(), input)
        .await?;
    tracing::debug!(
        %correlation_id,
        review_id = %review.id,
        product_id = %review.product_id,
        "Submit request completed"
    );
    Ok((StatusCode::CREATED, Json(review.into())))
}

/// A single approved review.
pub async fn get_review(
    State(state): State<AppState>,
    ApiPath(review_id): ApiPath<ReviewId>,
) -> WebResult<Json<ReviewView>> {
    let review = state.services.queries.get_review(review_id).await?;
    Ok(Json(review.into()))
}

/// Edit a review's rating, title, comment or images.
///
/// Omitted fields are left as they are. `"title": null` or a blank title
/// removes the title.
///
/// ```bash
/// curl -X PUT http://localhost:8080/api/reviews/6f9619ff-8b86-d011-b42d-00c04fc964ff \
///   -H "Authorization: Bearer <session_token>" \
///   -H "Content-Type: application/json" \
///   -d '{"rating": 5}'
/// ```
pub async fn update_review(
    CorrelationId(correlation_id): CorrelationId,
    session: SessionUser,
    State(state): State<AppState>,
    ApiPath(review_id): ApiPath<ReviewId>,
    ApiJson(patch): ApiJson<ReviewPatch>,
) -> WebResult<Json<ReviewView>> {
    let review = state
        .services
        .mutations
        .update_review(review_id, &session.requester, patch)
        .await?;
    tracing::debug!(%correlation_id, %review_id, "Update request completed");
    Ok(Json(review.into()))
}

/// Remove a review.
pub async fn delete_review(
    CorrelationId(correlation_id): CorrelationId,
    session: SessionUser,
    State(state): State<AppState>,
    ApiPath(review_id): ApiPath<ReviewId>,
) -> WebResult<Json<DeleteReviewResponse>> {
    state
        .services
        .mutations
        .delete_review(review_id, &session.requester)
        .await?;
    tracing::debug!(%correlation_id, %review_id, "Delete request completed");
    Ok(Json(DeleteReviewResponse {
        deleted: true,
        review_id,
    }))
}

/// Mark a review as helpful. One vote per user; authors cannot vote.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/reviews/6f9619ff-8b86-d011-b42d-00c04fc964ff/helpful \
///   -H "Authorization: Bearer <session_token>"
/// # {"helpfulCount":3}
/// ```
pub async fn mark_helpful(
    session: SessionUser,
    State(state): State<AppState>,
    ApiPath(review_id): ApiPath<ReviewId>,
) -> WebResult<Json<HelpfulResponse>> {
    let helpful_count = state
        .services
        .helpful
        .mark_helpful(review_id, session.user_id())
        .await?;
    Ok(Json(HelpfulResponse { helpful_count }))
}

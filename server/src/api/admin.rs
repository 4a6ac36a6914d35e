//! Rating reconciliation for administrators.
//!
//! A review mutation whose aggregate write failed leaves the product's rating
//! stale. These endpoints find and repair such products.
//!
//! - GET /api/admin/products/:product_id/rating/audit - Compare stored and computed
//! - POST /api/admin/products/:product_id/rating/recompute - Rewrite from reviews

use crate::auth::RequireAdmin;
use crate::server::state::AppState;
use axum::{Json, extract::State};
use product_reviews_core::{AggregateAudit, ProductId, RatingAggregate};
use product_reviews_web::{ApiPath, WebResult};

/// Compare the stored aggregate with one computed from approved reviews.
pub async fn audit_rating(
    admin: RequireAdmin,
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> WebResult<Json<AggregateAudit>> {
    let audit = state.services.aggregator.audit(product_id).await?;
    if !audit.consistent {
        tracing::warn!(
            %product_id,
            admin = %admin.requester.user_id,
            "Audit found a stale rating aggregate"
        );
    }
    Ok(Json(audit))
}

/// Recompute and rewrite a product's aggregate.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/admin/products/550e8400-e29b-41d4-a716-446655440000/rating/recompute \
///   -H "Authorization: Bearer <admin_token>"
/// ```
pub async fn recompute_rating(
    admin: RequireAdmin,
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> WebResult<Json<RatingAggregate>> {
    let aggregate = state.services.aggregator.recompute(product_id).await?;
    tracing::info!(
        %product_id,
        admin = %admin.requester.user_id,
        count = aggregate.count,
        "Rating aggregate recomputed"
    );
    Ok(Json(aggregate))
}

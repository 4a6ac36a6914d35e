//! Endpoints scoped to the authenticated user.
//!
//! - GET /api/users/me/reviews - The caller's reviews, newest first

use super::PageParams;
use crate::auth::SessionUser;
use crate::server::state::AppState;
use axum::{Json, extract::State};
use product_reviews_core::ReviewPage;
use product_reviews_web::{ApiQuery, WebResult};

/// The caller's reviews, including ones not yet approved.
///
/// ```bash
/// curl "http://localhost:8080/api/users/me/reviews?page=2" \
///   -H "Authorization: Bearer <session_token>"
/// ```
pub async fn list_my_reviews(
    session: SessionUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> WebResult<Json<ReviewPage>> {
    let page = state
        .services
        .queries
        .list_user_reviews(session.user_id(), params.page, params.limit)
        .await?;
    Ok(Json(page))
}

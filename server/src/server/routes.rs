//! Router configuration for the review API.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{admin, products, reviews, users};
use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{get, post},
};
use product_reviews_web::correlation_id_layer;
use tower_http::cors::{Any, CorsLayer};

/// Build the complete Axum router.
///
/// Public reads, authenticated mutations and admin reconciliation live under
/// `/api`; `/health` and `/ready` sit at the root. Every request runs through
/// the correlation ID layer.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Product-scoped reads
        .route("/products/:product_id/rating", get(products::get_rating))
        .route(
            "/products/:product_id/reviews",
            get(products::list_reviews),
        )
        .route(
            "/products/:product_id/can-review",
            get(products::can_review),
        )
        // Reviews
        .route("/reviews", post(reviews::submit_review))
        .route(
            "/reviews/:review_id",
            get(reviews::get_review)
                .put(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route("/reviews/:review_id/helpful", post(reviews::mark_helpful))
        // Current user
        .route("/users/me/reviews", get(users::list_my_reviews))
        // Reconciliation
        .route(
            "/admin/products/:product_id/rating/recompute",
            post(admin::recompute_rating),
        )
        .route(
            "/admin/products/:product_id/rating/audit",
            get(admin::audit_rating),
        );

    let correlation_id = HeaderName::from_static("x-correlation-id");
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            correlation_id.clone(),
        ])
        .expose_headers([correlation_id]);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(correlation_id_layer())
        .with_state(state)
}

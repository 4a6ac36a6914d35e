//! Axum integration for the product review services.
//!
//! The HTTP shell around `product_reviews_runtime`: it turns requests into
//! service calls and service results into responses, and owns nothing else.
//!
//! - [`error`]: [`AppError`], the single error type handlers return, with the
//!   status and code mapping of every [`ReviewError`](product_reviews_core::ReviewError)
//! - [`extractors`]: correlation IDs, bearer tokens and JSON/path/query
//!   extractors that reject with [`AppError`]
//! - [`middleware`]: the correlation ID and request timing layer
//!
//! # Example
//!
//! ```ignore
//! use product_reviews_web::{AppError, correlation_id_layer, extractors::ApiPath};
//! use axum::{Router, routing::get, Json};
//!
//! async fn get_review(
//!     State(state): State<AppState>,
//!     ApiPath(review_id): ApiPath<ReviewId>,
//! ) -> Result<Json<ReviewView>, AppError> {
//!     let review = state.services.queries.get_review(review_id).await?;
//!     Ok(Json(review.into()))
//! }
//!
//! let app = Router::new()
//!     .route("/api/reviews/:review_id", get(get_review))
//!     .layer(correlation_id_layer())
//!     .with_state(app_state);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod middleware;

pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery, BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

//! REST API endpoints for product reviews.
//!
//! - **Products**: stored rating, public review listing, can-review check
//! - **Reviews**: submit, read, update, delete, mark helpful
//! - **Users**: the caller's own reviews
//! - **Admin**: aggregate recompute and audit
//!
//! Handlers are thin: they authenticate, extract, call one service method
//! and serialize the result. Errors convert through
//! [`AppError`](product_reviews_web::AppError).

use serde::Deserialize;

pub mod admin;
pub mod products;
pub mod reviews;
pub mod users;

/// `page` and `limit` query parameters, clamped by the service.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

//! Product review HTTP server.
//!
//! Serves the review and rating API on top of `product_reviews_runtime`:
//!
//! ```text
//! HTTP (axum) ──► auth extractors ──► ReviewServices ──► ports
//!                                      │                   ├─ PostgresReviewRepository
//!                                      │                   ├─ PostgresProductCatalog
//!                                      │                   ├─ PostgresOrderLookup
//!                                      │                   └─ PostgresIdentityProvider
//!                                      └─ RatingAggregator writes product rating columns
//! ```
//!
//! - [`config`]: environment configuration
//! - [`auth`]: bearer token extractors
//! - [`api`]: request handlers
//! - [`server`]: state, router and health checks

#![forbid(unsafe_code)]

pub mod api;
pub mod auth;
pub mod config;
pub mod server;

pub use config::Config;
pub use server::{AppState, build_router};

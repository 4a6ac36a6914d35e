//! Application state for the review HTTP server.

use product_reviews_core::ports::IdentityProvider;
use product_reviews_runtime::ReviewServices;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// The review services
    pub services: ReviewServices,

    /// Resolves bearer tokens to callers
    pub identity: Arc<dyn IdentityProvider>,

    /// Database pool checked by the readiness probe; `None` when the
    /// services run without a database
    pub database: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(services: ReviewServices, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            services,
            identity,
            database: None,
        }
    }

    /// Attach the pool the readiness probe should ping.
    #[must_use]
    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }
}

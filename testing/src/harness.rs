//! Fluent harness wiring in-memory collaborators into the review services.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use crate::mocks::{TickingClock, test_clock};
use crate::{InMemoryProductCatalog, InMemoryReviewRepository, StubOrderLookup};
use product_reviews_core::environment::Clock;
use product_reviews_core::{
    NewReview, ProductId, RatingAggregate, Review, ReviewError, UserId,
};
use product_reviews_runtime::retry::RetryPolicy;
use product_reviews_runtime::{ReviewEnvironment, ReviewPolicy, ReviewServices};
use std::sync::Arc;
use std::time::Duration;

/// Review services over fresh in-memory stores.
///
/// Each harness owns independent stores, so tests never share state.
///
/// # Example
///
/// ```ignore
/// let harness = ReviewTestHarness::new();
/// let product = harness.product();
/// let buyer = UserId::new();
/// harness.orders.add_delivered(buyer, product);
///
/// let review = harness.submit(buyer, product, 4, "Sturdy and well made.").await?;
/// assert!(review.verified_purchase);
/// ```
pub struct ReviewTestHarness {
    /// Review storage
    pub reviews: Arc<InMemoryReviewRepository>,
    /// Product catalog and aggregate sink
    pub catalog: Arc<InMemoryProductCatalog>,
    /// Order history
    pub orders: Arc<StubOrderLookup>,
    /// The environment the services were built from
    pub env: ReviewEnvironment,
    /// The services under test
    pub services: ReviewServices,
}

impl ReviewTestHarness {
    /// Harness with answering order history and fast retries
    #[must_use]
    pub fn new() -> Self {
        Self::with_orders(StubOrderLookup::new())
    }

    /// Harness with a specific order collaborator
    #[must_use]
    pub fn with_orders(orders: StubOrderLookup) -> Self {
        Self::build(orders, Self::test_policy())
    }

    /// Policy used by [`new`](Self::new): no retry delays, short purchase timeout
    #[must_use]
    pub fn test_policy() -> ReviewPolicy {
        ReviewPolicy {
            purchase_check_timeout: Duration::from_millis(200),
            aggregate_retry: RetryPolicy::immediate(1),
            ..ReviewPolicy::default()
        }
    }

    /// Harness with full control over collaborators and policy
    #[must_use]
    pub fn build(orders: StubOrderLookup, policy: ReviewPolicy) -> Self {
        let reviews = Arc::new(InMemoryReviewRepository::new());
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let orders = Arc::new(orders);
        let clock: Arc<dyn Clock> = Arc::new(TickingClock::new(test_clock().now()));

        let env = ReviewEnvironment::new(
            reviews.clone(),
            catalog.clone(),
            catalog.clone(),
            orders.clone(),
        )
        .with_clock(clock);
        let services = ReviewServices::new(&env, &policy);

        Self {
            reviews,
            catalog,
            orders,
            env,
            services,
        }
    }

    /// Register a fresh product
    pub fn product(&self) -> ProductId {
        self.catalog.add_product()
    }

    /// Submit a review with no title or images.
    ///
    /// # Errors
    ///
    /// Whatever `submit_review` returns.
    pub async fn submit(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i64,
        comment: &str,
    ) -> Result<Review, ReviewError> {
        self.services
            .mutations
            .submit_review(
                user_id,
                NewReview {
                    product_id,
                    rating,
                    title: None,
                    comment: comment.to_string(),
                    images: None,
                },
            )
            .await
    }

    /// The stored aggregate of a registered product
    #[must_use]
    pub fn aggregate(&self, product_id: ProductId) -> RatingAggregate {
        self.catalog.aggregate(product_id).unwrap()
    }
}

impl Default for ReviewTestHarness {
    fn default() -> Self {
        Self::new()
    }
}

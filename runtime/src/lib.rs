//! # Product Reviews Runtime
//!
//! The review services: mutations, rating aggregation, helpful votes and
//! read queries, wired against the collaborator traits from
//! `product_reviews_core::ports`.
//!
//! ## Core Components
//!
//! - **`ReviewMutationService`**: submit, update and delete reviews
//! - **`RatingAggregator`**: recompute a product's aggregate from its approved reviews
//! - **`PurchaseVerifier`**: best-effort, time-bounded purchase check
//! - **`HelpfulVoteTracker`**: one helpful vote per user per review
//! - **`ReviewQueries`**: listings, eligibility and stored aggregates
//!
//! ## Example
//!
//! ```ignore
//! use product_reviews_runtime::{ReviewEnvironment, ReviewPolicy, ReviewServices};
//!
//! let env = ReviewEnvironment::new(reviews, products, aggregates, orders);
//! let services = ReviewServices::new(&env, &ReviewPolicy::default());
//!
//! let review = services.mutations.submit_review(user_id, input).await?;
//! let rating = services.queries.product_rating(review.product_id).await?;
//! ```

/// Rating aggregate recomputation
pub mod aggregator;

/// Injected collaborators and tunables
pub mod environment;

/// Helpful vote tracking
pub mod helpful;

/// Prometheus metrics for observability
pub mod metrics;

/// Review submission, update and deletion
pub mod mutation;

/// Best-effort purchase verification
pub mod purchase;

/// Read paths
pub mod queries;

/// Retry logic with exponential backoff
pub mod retry;

pub use aggregator::RatingAggregator;
pub use environment::{ReviewEnvironment, ReviewPolicy};
pub use helpful::HelpfulVoteTracker;
pub use mutation::ReviewMutationService;
pub use purchase::PurchaseVerifier;
pub use queries::ReviewQueries;

/// All review services built from one environment.
#[derive(Clone)]
pub struct ReviewServices {
    /// Submit, update and delete
    pub mutations: ReviewMutationService,
    /// Aggregate recomputation and audit
    pub aggregator: RatingAggregator,
    /// Helpful votes
    pub helpful: HelpfulVoteTracker,
    /// Read paths
    pub queries: ReviewQueries,
}

impl ReviewServices {
    /// Build every service from the environment and policy.
    #[must_use]
    pub fn new(env: &ReviewEnvironment, policy: &ReviewPolicy) -> Self {
        let verifier = PurchaseVerifier::new(env.orders.clone(), policy.purchase_check_timeout);
        let aggregator = RatingAggregator::new(
            env.reviews.clone(),
            env.aggregates.clone(),
            policy.aggregate_retry.clone(),
        );

        Self {
            mutations: ReviewMutationService::new(env, verifier.clone(), aggregator.clone()),
            helpful: HelpfulVoteTracker::new(env.reviews.clone()),
            queries: ReviewQueries::new(
                env.reviews.clone(),
                env.products.clone(),
                env.aggregates.clone(),
                verifier,
            )
            .with_page_sizes(policy.default_page_size, policy.max_page_size),
            aggregator,
        }
    }
}

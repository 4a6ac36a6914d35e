//! Injected dependencies and tunables for the review services.

use crate::retry::RetryPolicy;
use product_reviews_core::environment::{Clock, SystemClock};
use product_reviews_core::ports::{
    OrderLookup, ProductAggregateWriter, ProductLookup, ReviewRepository,
};
use std::sync::Arc;
use std::time::Duration;

/// Everything the review services talk to.
///
/// Constructed explicitly by the caller; there is no global registry.
#[derive(Clone)]
pub struct ReviewEnvironment {
    /// Review storage
    pub reviews: Arc<dyn ReviewRepository>,
    /// Product existence checks
    pub products: Arc<dyn ProductLookup>,
    /// Product rating sink
    pub aggregates: Arc<dyn ProductAggregateWriter>,
    /// Order history for purchase verification
    pub orders: Arc<dyn OrderLookup>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl ReviewEnvironment {
    /// Create an environment using the system clock.
    #[must_use]
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        products: Arc<dyn ProductLookup>,
        aggregates: Arc<dyn ProductAggregateWriter>,
        orders: Arc<dyn OrderLookup>,
    ) -> Self {
        Self {
            reviews,
            products,
            aggregates,
            orders,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Tunables for the review services.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPolicy {
    /// Upper bound on a purchase check before it counts as "not purchased"
    pub purchase_check_timeout: Duration,
    /// Retries for aggregate sink writes
    pub aggregate_retry: RetryPolicy,
    /// Page size when the caller does not ask for one
    pub default_page_size: u32,
    /// Largest page size a caller may ask for
    pub max_page_size: u32,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            purchase_check_timeout: Duration::from_secs(2),
            aggregate_retry: RetryPolicy::default(),
            default_page_size: 10,
            max_page_size: 50,
        }
    }
}

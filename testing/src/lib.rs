//! # Product Reviews Testing
//!
//! Testing utilities for the product review services.
//!
//! This crate provides:
//! - Deterministic clocks
//! - In-memory implementations of every collaborator trait, with failure
//!   injection where the services have a failure policy to exercise
//! - Property-based testing strategies
//! - [`ReviewTestHarness`], wiring all of the above into `ReviewServices`
//!
//! ## Example
//!
//! ```ignore
//! use product_reviews_testing::ReviewTestHarness;
//! use product_reviews_core::UserId;
//!
//! #[tokio::test]
//! async fn test_first_review() {
//!     let harness = ReviewTestHarness::new();
//!     let product = harness.product();
//!
//!     harness.submit(UserId::new(), product, 5, "Great product, love it!").await.unwrap();
//!
//!     assert_eq!(harness.aggregate(product).count, 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use product_reviews_core::environment::Clock;

mod collaborators;
mod harness;
mod review_store;

pub use collaborators::{InMemoryProductCatalog, StaticIdentityProvider, StubOrderLookup};
pub use harness::ReviewTestHarness;
pub use review_store::InMemoryReviewRepository;

/// Mock clocks.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use product_reviews_testing::mocks::FixedClock;
    /// use product_reviews_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that advances by one second on every reading.
    ///
    /// Gives reviews created in sequence strictly increasing timestamps so
    /// "newest first" orderings are deterministic.
    #[derive(Debug)]
    pub struct TickingClock {
        start: DateTime<Utc>,
        ticks: AtomicI64,
    }

    impl TickingClock {
        /// Start ticking from `start`
        #[must_use]
        pub const fn new(start: DateTime<Utc>) -> Self {
            Self {
                start,
                ticks: AtomicI64::new(0),
            }
        }
    }

    impl Clock for TickingClock {
        fn now(&self) -> DateTime<Utc> {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
            self.start + chrono::Duration::seconds(tick)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing strategies.
pub mod properties {
    use product_reviews_core::Rating;
    use proptest::prelude::*;

    /// Any valid star rating.
    pub fn rating() -> impl Strategy<Value = Rating> {
        (1u8..=5).prop_filter_map("rating in range", |v| Rating::new(v).ok())
    }

    /// Up to `max` valid ratings.
    pub fn ratings(max: usize) -> impl Strategy<Value = Vec<Rating>> {
        prop::collection::vec(rating(), 0..=max)
    }

    /// A comment that passes validation.
    pub fn valid_comment() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z ,.!]{9,200}"
            .prop_map(|s| s.trim_end().to_string())
            .prop_filter("long enough after trimming", |s| s.chars().count() >= 10)
    }
}

/// Install a test subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub use mocks::{FixedClock, TickingClock, test_clock};

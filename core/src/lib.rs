//! # Product Reviews Core
//!
//! Domain types, validation rules and collaborator traits for the review and
//! rating aggregation subsystem of a product catalog.
//!
//! This crate contains no I/O. Everything that touches storage, the order
//! system or the identity provider is expressed as a trait in [`ports`] and
//! injected by the caller, so the service layer can run against PostgreSQL in
//! production and against in-memory fakes in tests.
//!
//! ## Core Concepts
//!
//! - **Review**: one user's rating and comment for one product, unique per
//!   `(user, product)` pair
//! - **Rating aggregate**: the denormalized `{average, count, breakdown}`
//!   summary stored on a product, always derived from approved reviews
//! - **Helpful vote**: a distinct user's endorsement of a review, counted
//!   from the voter set
//!
//! ## Example
//!
//! ```
//! use product_reviews_core::{Rating, RatingAggregate};
//!
//! let ratings = [Rating::new(5).unwrap(), Rating::new(3).unwrap()];
//! let aggregate = RatingAggregate::from_ratings(&ratings);
//!
//! assert_eq!(aggregate.count, 2);
//! assert!((aggregate.average - 4.0).abs() < f64::EPSILON);
//! assert_eq!(aggregate.breakdown.get(3), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod error;
pub mod ports;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use aggregate::{AggregateAudit, RatingAggregate, RatingBreakdown};
pub use chrono::{DateTime, Utc};
pub use error::{ResourceKind, ReviewError, StorageError};
pub use types::*;

/// Environment module - injected dependencies that are not storage ports.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Review timestamps (`createdAt`, `updatedAt`) are always taken from the
    /// injected clock so tests can pin or step time.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

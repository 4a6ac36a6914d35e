//! Rating aggregate recomputation.
//!
//! The aggregate on a product is only ever produced by reading every approved
//! review of that product and computing the summary from scratch. Two
//! overlapping recomputes can finish in either order; each one reflects the
//! review set it read, so the last write is a correct snapshot.

use crate::metrics::ReviewMetrics;
use crate::retry::{RetryPolicy, retry_with_predicate};
use product_reviews_core::ports::{ProductAggregateWriter, ReviewRepository};
use product_reviews_core::{AggregateAudit, ProductId, RatingAggregate, ReviewError, StorageError};
use std::sync::Arc;
use std::time::Instant;

/// Recomputes and persists product rating aggregates.
#[derive(Clone)]
pub struct RatingAggregator {
    reviews: Arc<dyn ReviewRepository>,
    sink: Arc<dyn ProductAggregateWriter>,
    retry: RetryPolicy,
}

impl RatingAggregator {
    /// Create an aggregator.
    #[must_use]
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        sink: Arc<dyn ProductAggregateWriter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            reviews,
            sink,
            retry,
        }
    }

    /// Recompute the aggregate from the approved reviews and overwrite the
    /// product's stored aggregate.
    ///
    /// Sink writes are retried according to the configured policy, except
    /// when the product no longer exists.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::NotFound`] if the product does not exist
    /// - [`ReviewError::Storage`] if reading reviews or writing the sink fails
    #[tracing::instrument(skip(self), fields(product_id = %product_id))]
    pub async fn recompute(&self, product_id: ProductId) -> Result<RatingAggregate, ReviewError> {
        let started = Instant::now();
        let aggregate = self.get_average_rating(product_id).await?;

        retry_with_predicate(
            &self.retry,
            || self.sink.write_aggregate(product_id, aggregate),
            |err| !matches!(err, StorageError::NotFound(_)),
        )
        .await
        .map_err(|err| match err {
            StorageError::NotFound(_) => ReviewError::product_not_found(product_id),
            other => ReviewError::Storage(other),
        })?;

        ReviewMetrics::record_recompute(started.elapsed());
        tracing::debug!(
            count = aggregate.count,
            average = aggregate.average,
            "Rating aggregate recomputed"
        );
        Ok(aggregate)
    }

    /// Compute the aggregate without persisting it.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Storage`] if the reviews cannot be read.
    pub async fn get_average_rating(
        &self,
        product_id: ProductId,
    ) -> Result<RatingAggregate, ReviewError> {
        let ratings = self.reviews.approved_ratings(product_id).await?;
        Ok(RatingAggregate::from_ratings(&ratings))
    }

    /// Recompute after a committed review mutation.
    ///
    /// The mutation is already durable, so a failure here does not fail the
    /// request: the product is logged as stale for reconciliation and `None`
    /// is returned.
    pub async fn refresh_after_mutation(&self, product_id: ProductId) -> Option<RatingAggregate> {
        match self.recompute(product_id).await {
            Ok(aggregate) => Some(aggregate),
            Err(err) => {
                ReviewMetrics::record_stale_aggregate();
                tracing::error!(
                    product_id = %product_id,
                    error = %err,
                    "Rating aggregate is stale, reconciliation required"
                );
                None
            }
        }
    }

    /// Compare the stored aggregate with a fresh computation.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::NotFound`] if the product does not exist
    /// - [`ReviewError::Storage`] on storage failure
    pub async fn audit(&self, product_id: ProductId) -> Result<AggregateAudit, ReviewError> {
        let stored = self
            .sink
            .load_aggregate(product_id)
            .await?
            .ok_or_else(|| ReviewError::product_not_found(product_id))?;
        let computed = self.get_average_rating(product_id).await?;
        Ok(AggregateAudit::new(stored, computed))
    }
}

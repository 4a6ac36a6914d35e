//! Helpful votes.

use crate::metrics::ReviewMetrics;
use product_reviews_core::ports::ReviewRepository;
use product_reviews_core::{HelpfulVoteOutcome, ReviewError, ReviewId, UserId};
use std::sync::Arc;

/// Records each voter against a review at most once.
///
/// The count is never stored on its own; it is the voter-set size reported by
/// the repository in the same atomic step as the insertion.
#[derive(Clone)]
pub struct HelpfulVoteTracker {
    reviews: Arc<dyn ReviewRepository>,
}

impl HelpfulVoteTracker {
    /// Create a tracker.
    #[must_use]
    pub fn new(reviews: Arc<dyn ReviewRepository>) -> Self {
        Self { reviews }
    }

    /// Mark a review as helpful and return the new helpful count.
    ///
    /// Does not touch the product's rating aggregate.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::NotFound`] if the review does not exist
    /// - [`ReviewError::SelfVote`] if the voter wrote the review
    /// - [`ReviewError::AlreadyVoted`] if the voter already voted
    /// - [`ReviewError::Storage`] on storage failure
    #[tracing::instrument(skip(self))]
    pub async fn mark_helpful(
        &self,
        review_id: ReviewId,
        voter_id: UserId,
    ) -> Result<u64, ReviewError> {
        let result = self.try_mark(review_id, voter_id).await;
        match &result {
            Ok(count) => {
                ReviewMetrics::record_helpful_vote();
                tracing::debug!(helpful_count = count, "Helpful vote recorded");
            }
            Err(err) if err.is_client_error() => ReviewMetrics::record_rejected(err.kind()),
            Err(err) => tracing::error!(error = %err, "Helpful vote failed"),
        }
        result
    }

    async fn try_mark(&self, review_id: ReviewId, voter_id: UserId) -> Result<u64, ReviewError> {
        let review = self
            .reviews
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| ReviewError::review_not_found(review_id))?;

        if review.user_id == voter_id {
            return Err(ReviewError::SelfVote);
        }
        if review.helpful_voters.contains(&voter_id) {
            return Err(ReviewError::AlreadyVoted);
        }

        match self.reviews.add_helpful_voter(review_id, voter_id).await? {
            HelpfulVoteOutcome::Recorded { helpful_count } => Ok(helpful_count),
            HelpfulVoteOutcome::AlreadyVoted => Err(ReviewError::AlreadyVoted),
            HelpfulVoteOutcome::ReviewMissing => Err(ReviewError::review_not_found(review_id)),
        }
    }
}

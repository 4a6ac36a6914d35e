//! Submit, update and delete reviews.
//!
//! Every mutation follows the same shape: validate and authorize, persist,
//! then refresh the product's rating aggregate before returning. Client
//! errors abort before anything is written.

use crate::aggregator::RatingAggregator;
use crate::environment::ReviewEnvironment;
use crate::metrics::ReviewMetrics;
use crate::purchase::PurchaseVerifier;
use product_reviews_core::environment::Clock;
use product_reviews_core::ports::{ProductLookup, ReviewRepository};
use product_reviews_core::validation::{validate_new_review, validate_patch};
use product_reviews_core::{
    NewReview, Requester, Review, ReviewError, ReviewId, ReviewPatch, StorageError, UserId,
};
use std::collections::BTreeSet;
use std::sync::Arc;

const FORBIDDEN_MESSAGE: &str = "You can only modify your own reviews";

/// Orchestrates review mutations.
#[derive(Clone)]
pub struct ReviewMutationService {
    reviews: Arc<dyn ReviewRepository>,
    products: Arc<dyn ProductLookup>,
    clock: Arc<dyn Clock>,
    verifier: PurchaseVerifier,
    aggregator: RatingAggregator,
}

impl ReviewMutationService {
    /// Create the service from its environment and collaborators.
    #[must_use]
    pub fn new(
        env: &ReviewEnvironment,
        verifier: PurchaseVerifier,
        aggregator: RatingAggregator,
    ) -> Self {
        Self {
            reviews: Arc::clone(&env.reviews),
            products: Arc::clone(&env.products),
            clock: Arc::clone(&env.clock),
            verifier,
            aggregator,
        }
    }

    /// Submit a new review.
    ///
    /// The purchase check is best-effort and never fails the submission. The
    /// storage uniqueness constraint decides concurrent submissions for the
    /// same user and product; the loser gets [`ReviewError::DuplicateReview`].
    ///
    /// # Errors
    ///
    /// - [`ReviewError::Validation`] for invalid content
    /// - [`ReviewError::NotFound`] if the product does not exist
    /// - [`ReviewError::DuplicateReview`] if the user already reviewed it
    /// - [`ReviewError::Storage`] on storage failure
    #[tracing::instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn submit_review(
        &self,
        user_id: UserId,
        input: NewReview,
    ) -> Result<Review, ReviewError> {
        let result = self.try_submit(user_id, input).await;
        record_outcome(&result, ReviewMetrics::record_submitted);
        result
    }

    async fn try_submit(&self, user_id: UserId, input: NewReview) -> Result<Review, ReviewError> {
        let content = validate_new_review(&input)?;
        let product_id = input.product_id;

        if !self.products.product_exists(product_id).await? {
            return Err(ReviewError::product_not_found(product_id));
        }

        // Fast path only; the insert below is what actually enforces uniqueness.
        if self
            .reviews
            .find_by_user_and_product(user_id, product_id)
            .await?
            .is_some()
        {
            return Err(ReviewError::DuplicateReview {
                user_id,
                product_id,
            });
        }

        let verified_purchase = self.verifier.has_delivered_order(user_id, product_id).await;

        let now = self.clock.now();
        let review = Review {
            id: ReviewId::new(),
            user_id,
            product_id,
            rating: content.rating,
            title: content.title,
            comment: content.comment,
            images: content.images,
            verified_purchase,
            helpful_voters: BTreeSet::new(),
            is_approved: true,
            created_at: now,
            updated_at: now,
        };

        self.reviews
            .insert(&review)
            .await
            .map_err(|err| match err {
                StorageError::Conflict(_) => ReviewError::DuplicateReview {
                    user_id,
                    product_id,
                },
                other => ReviewError::Storage(other),
            })?;

        self.aggregator.refresh_after_mutation(product_id).await;

        tracing::info!(
            review_id = %review.id,
            rating = review.rating.value(),
            verified_purchase,
            "Review submitted"
        );
        Ok(review)
    }

    /// Update a review's rating, title, comment or images.
    ///
    /// Author, product and purchase flag never change. The aggregate is
    /// refreshed when a rating is supplied.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::NotFound`] if the review does not exist
    /// - [`ReviewError::Forbidden`] unless the requester owns it or is an admin
    /// - [`ReviewError::Validation`] for invalid fields
    /// - [`ReviewError::Storage`] on storage failure
    #[tracing::instrument(
        skip(self, patch),
        fields(review_id = %review_id, requester = %requester.user_id)
    )]
    pub async fn update_review(
        &self,
        review_id: ReviewId,
        requester: &Requester,
        patch: ReviewPatch,
    ) -> Result<Review, ReviewError> {
        let result = self.try_update(review_id, requester, &patch).await;
        record_outcome(&result, ReviewMetrics::record_updated);
        result
    }

    async fn try_update(
        &self,
        review_id: ReviewId,
        requester: &Requester,
        patch: &ReviewPatch,
    ) -> Result<Review, ReviewError> {
        let mut review = self.load_authorized(review_id, requester).await?;
        let changes = validate_patch(patch)?;

        let rating_supplied = changes.rating.is_some();
        if let Some(rating) = changes.rating {
            review.rating = rating;
        }
        if let Some(title) = changes.title {
            review.title = title;
        }
        if let Some(comment) = changes.comment {
            review.comment = comment;
        }
        if let Some(images) = changes.images {
            review.images = images;
        }
        review.updated_at = self.clock.now();

        self.reviews
            .update_content(&review)
            .await
            .map_err(|err| match err {
                StorageError::NotFound(_) => ReviewError::review_not_found(review_id),
                other => ReviewError::Storage(other),
            })?;

        if rating_supplied {
            self.aggregator
                .refresh_after_mutation(review.product_id)
                .await;
        }

        tracing::info!(rating_supplied, "Review updated");
        Ok(review)
    }

    /// Delete a review and refresh its product's aggregate.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::NotFound`] if the review does not exist
    /// - [`ReviewError::Forbidden`] unless the requester owns it or is an admin
    /// - [`ReviewError::Storage`] on storage failure
    #[tracing::instrument(
        skip(self),
        fields(review_id = %review_id, requester = %requester.user_id)
    )]
    pub async fn delete_review(
        &self,
        review_id: ReviewId,
        requester: &Requester,
    ) -> Result<(), ReviewError> {
        let result = self.try_delete(review_id, requester).await;
        record_outcome(&result, ReviewMetrics::record_deleted);
        result
    }

    async fn try_delete(
        &self,
        review_id: ReviewId,
        requester: &Requester,
    ) -> Result<(), ReviewError> {
        let review = self.load_authorized(review_id, requester).await?;

        if !self.reviews.delete(review_id).await? {
            return Err(ReviewError::review_not_found(review_id));
        }

        self.aggregator
            .refresh_after_mutation(review.product_id)
            .await;

        tracing::info!(product_id = %review.product_id, "Review deleted");
        Ok(())
    }

    async fn load_authorized(
        &self,
        review_id: ReviewId,
        requester: &Requester,
    ) -> Result<Review, ReviewError> {
        let review = self
            .reviews
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| ReviewError::review_not_found(review_id))?;

        if !requester.may_modify(&review) {
            return Err(ReviewError::Forbidden(FORBIDDEN_MESSAGE.to_string()));
        }
        Ok(review)
    }
}

fn record_outcome<T>(result: &Result<T, ReviewError>, on_success: fn()) {
    match result {
        Ok(_) => on_success(),
        Err(err) if err.is_client_error() => ReviewMetrics::record_rejected(err.kind()),
        Err(err) => tracing::error!(error = %err, "Review mutation failed"),
    }
}

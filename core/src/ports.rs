//! Collaborator traits.
//!
//! Every dependency of the review services is one of these traits, injected
//! as `Arc<dyn Trait>`. Methods return boxed futures so the traits stay
//! object-safe.
//!
//! ```text
//! ┌────────────────────┐   ┌──────────────────────────┐   ┌───────────────┐
//! │  ReviewRepository  │   │ ProductLookup +          │   │  OrderLookup  │
//! │  (owned store)     │   │ ProductAggregateWriter   │   │  (external)   │
//! └────────────────────┘   │ (external product sink)  │   └───────────────┘
//!                          └──────────────────────────┘
//! ```

use crate::aggregate::RatingAggregate;
use crate::error::StorageError;
use crate::types::{
    HelpfulVoteOutcome, PageRequest, ProductId, Rating, Requester, Review, ReviewId,
    ReviewListQuery, UserId,
};
use futures::future::BoxFuture;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable storage of reviews.
///
/// Implementations must enforce uniqueness of `(user_id, product_id)` in
/// storage itself: [`insert`](Self::insert) is the only guard against two
/// concurrent submissions for the same pair.
pub trait ReviewRepository: Send + Sync {
    /// Insert a new review.
    ///
    /// Fails with [`StorageError::Conflict`] if a review for the same user and
    /// product already exists.
    fn insert<'a>(&'a self, review: &'a Review) -> BoxFuture<'a, StorageResult<()>>;

    /// Load a review by id.
    fn find_by_id(&self, id: ReviewId) -> BoxFuture<'_, StorageResult<Option<Review>>>;

    /// Load the review a user wrote for a product, if any.
    fn find_by_user_and_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<Option<Review>>>;

    /// Persist rating, title, comment, images and `updated_at`.
    ///
    /// Author, product, purchase flag, approval and helpful voters are left
    /// untouched. Fails with [`StorageError::NotFound`] if the review is gone.
    fn update_content<'a>(&'a self, review: &'a Review) -> BoxFuture<'a, StorageResult<()>>;

    /// Delete a review; `false` when nothing was deleted.
    fn delete(&self, id: ReviewId) -> BoxFuture<'_, StorageResult<bool>>;

    /// Ratings of every approved review of a product.
    fn approved_ratings(&self, product_id: ProductId) -> BoxFuture<'_, StorageResult<Vec<Rating>>>;

    /// One page of a product's approved reviews and the total number of them.
    fn list_by_product(
        &self,
        product_id: ProductId,
        query: ReviewListQuery,
    ) -> BoxFuture<'_, StorageResult<(Vec<Review>, u64)>>;

    /// One page of a user's reviews (any approval state), newest first.
    fn list_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> BoxFuture<'_, StorageResult<(Vec<Review>, u64)>>;

    /// Atomically add `voter_id` to the review's helpful voters.
    ///
    /// The returned count is the voter-set size observed in the same atomic
    /// step as the insertion.
    fn add_helpful_voter(
        &self,
        review_id: ReviewId,
        voter_id: UserId,
    ) -> BoxFuture<'_, StorageResult<HelpfulVoteOutcome>>;
}

/// Product existence checks against the external catalog.
pub trait ProductLookup: Send + Sync {
    /// Whether the product exists.
    fn product_exists(&self, product_id: ProductId) -> BoxFuture<'_, StorageResult<bool>>;
}

/// The product's denormalized rating fields.
pub trait ProductAggregateWriter: Send + Sync {
    /// Overwrite the product's aggregate.
    ///
    /// Fails with [`StorageError::NotFound`] if the product does not exist.
    fn write_aggregate(
        &self,
        product_id: ProductId,
        aggregate: RatingAggregate,
    ) -> BoxFuture<'_, StorageResult<()>>;

    /// Read the product's aggregate; `None` if the product does not exist.
    fn load_aggregate(
        &self,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<Option<RatingAggregate>>>;
}

/// Order history of the external order collaborator.
pub trait OrderLookup: Send + Sync {
    /// True iff the user has a delivered order containing the product.
    fn has_delivered_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Bearer token resolution by the external auth collaborator.
pub trait IdentityProvider: Send + Sync {
    /// Resolve a token to the caller's identity; `None` for unknown or
    /// expired tokens.
    fn resolve<'a>(&'a self, token: &'a str) -> BoxFuture<'a, StorageResult<Option<Requester>>>;
}

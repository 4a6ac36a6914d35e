//! In-memory review repository.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use futures::future::BoxFuture;
use product_reviews_core::ports::{ReviewRepository, StorageResult};
use product_reviews_core::{
    HelpfulVoteOutcome, PageRequest, ProductId, Rating, Review, ReviewId, ReviewListQuery,
    ReviewSortField, SortOrder, StorageError, UserId,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct StoreState {
    reviews: HashMap<ReviewId, Review>,
    by_author: HashMap<(UserId, ProductId), ReviewId>,
    unavailable: bool,
}

impl StoreState {
    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable {
            Err(StorageError::Backend("review store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// `HashMap`-backed review storage.
///
/// The `(user, product)` index is checked and updated under one write lock,
/// so it enforces uniqueness the same way a database unique index does.
///
/// # Example
///
/// ```
/// use product_reviews_testing::InMemoryReviewRepository;
///
/// let repo = InMemoryReviewRepository::new();
/// assert!(repo.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryReviewRepository {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryReviewRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reviews
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().unwrap().reviews.len()
    }

    /// Check if the repository is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().unwrap().reviews.is_empty()
    }

    /// Every stored review, in no particular order
    #[must_use]
    pub fn all(&self) -> Vec<Review> {
        self.state.read().unwrap().reviews.values().cloned().collect()
    }

    /// Flip a review's approval flag; `false` if the review does not exist.
    ///
    /// There is no moderation operation in the services, so tests use this to
    /// put unapproved rows in place.
    pub fn set_approved(&self, review_id: ReviewId, approved: bool) -> bool {
        self.state
            .write()
            .unwrap()
            .reviews
            .get_mut(&review_id)
            .map(|review| review.is_approved = approved)
            .is_some()
    }

    /// Make every operation fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }
}

fn compare(a: &Review, b: &Review, sort_by: ReviewSortField) -> Ordering {
    match sort_by {
        ReviewSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ReviewSortField::Rating => a.rating.cmp(&b.rating),
        ReviewSortField::HelpfulCount => a.helpful_count().cmp(&b.helpful_count()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn page_of(mut reviews: Vec<Review>, page: PageRequest) -> (Vec<Review>, u64) {
    let total = reviews.len() as u64;
    let rows: Vec<Review> = reviews
        .drain(..)
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect();
    (rows, total)
}

impl ReviewRepository for InMemoryReviewRepository {
    fn insert<'a>(&'a self, review: &'a Review) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            let mut state = self.state.write().unwrap();
            state.check_available()?;
            let key = (review.user_id, review.product_id);
            if state.by_author.contains_key(&key) || state.reviews.contains_key(&review.id) {
                return Err(StorageError::Conflict(format!(
                    "review by {} for {} already exists",
                    review.user_id, review.product_id
                )));
            }
            state.by_author.insert(key, review.id);
            state.reviews.insert(review.id, review.clone());
            Ok(())
        })
    }

    fn find_by_id(&self, id: ReviewId) -> BoxFuture<'_, StorageResult<Option<Review>>> {
        Box::pin(async move {
            let state = self.state.read().unwrap();
            state.check_available()?;
            Ok(state.reviews.get(&id).cloned())
        })
    }

    fn find_by_user_and_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<Option<Review>>> {
        Box::pin(async move {
            let state = self.state.read().unwrap();
            state.check_available()?;
            Ok(state
                .by_author
                .get(&(user_id, product_id))
                .and_then(|id| state.reviews.get(id))
                .cloned())
        })
    }

    fn update_content<'a>(&'a self, review: &'a Review) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            let mut state = self.state.write().unwrap();
            state.check_available()?;
            let stored = state
                .reviews
                .get_mut(&review.id)
                .ok_or_else(|| StorageError::NotFound(format!("review {}", review.id)))?;
            stored.rating = review.rating;
            stored.title.clone_from(&review.title);
            stored.comment.clone_from(&review.comment);
            stored.images.clone_from(&review.images);
            stored.updated_at = review.updated_at;
            Ok(())
        })
    }

    fn delete(&self, id: ReviewId) -> BoxFuture<'_, StorageResult<bool>> {
        Box::pin(async move {
            let mut state = self.state.write().unwrap();
            state.check_available()?;
            match state.reviews.remove(&id) {
                Some(review) => {
                    state.by_author.remove(&(review.user_id, review.product_id));
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn approved_ratings(&self, product_id: ProductId) -> BoxFuture<'_, StorageResult<Vec<Rating>>> {
        Box::pin(async move {
            let state = self.state.read().unwrap();
            state.check_available()?;
            Ok(state
                .reviews
                .values()
                .filter(|r| r.product_id == product_id && r.is_approved)
                .map(|r| r.rating)
                .collect())
        })
    }

    fn list_by_product(
        &self,
        product_id: ProductId,
        query: ReviewListQuery,
    ) -> BoxFuture<'_, StorageResult<(Vec<Review>, u64)>> {
        Box::pin(async move {
            let state = self.state.read().unwrap();
            state.check_available()?;
            let mut matching: Vec<Review> = state
                .reviews
                .values()
                .filter(|r| r.product_id == product_id && r.is_approved)
                .cloned()
                .collect();
            matching.sort_by(|a, b| {
                let primary = match query.sort_order {
                    SortOrder::Asc => compare(a, b, query.sort_by),
                    SortOrder::Desc => compare(b, a, query.sort_by),
                };
                primary
                    .then_with(|| b.created_at.cmp(&a.created_at))
                    .then_with(|| a.id.cmp(&b.id))
            });
            Ok(page_of(matching, query.page))
        })
    }

    fn list_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> BoxFuture<'_, StorageResult<(Vec<Review>, u64)>> {
        Box::pin(async move {
            let state = self.state.read().unwrap();
            state.check_available()?;
            let mut matching: Vec<Review> = state
                .reviews
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
            Ok(page_of(matching, page))
        })
    }

    fn add_helpful_voter(
        &self,
        review_id: ReviewId,
        voter_id: UserId,
    ) -> BoxFuture<'_, StorageResult<HelpfulVoteOutcome>> {
        Box::pin(async move {
            let mut state = self.state.write().unwrap();
            state.check_available()?;
            let Some(review) = state.reviews.get_mut(&review_id) else {
                return Ok(HelpfulVoteOutcome::ReviewMissing);
            };
            if review.helpful_voters.insert(voter_id) {
                Ok(HelpfulVoteOutcome::Recorded {
                    helpful_count: review.helpful_count(),
                })
            } else {
                Ok(HelpfulVoteOutcome::AlreadyVoted)
            }
        })
    }
}

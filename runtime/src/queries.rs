//! Read paths. Nothing here recomputes an aggregate.

use crate::purchase::PurchaseVerifier;
use product_reviews_core::ports::{ProductAggregateWriter, ProductLookup, ReviewRepository};
use product_reviews_core::{
    PageRequest, ProductId, RatingAggregate, Review, ReviewEligibility, ReviewError, ReviewId,
    ReviewListQuery, ReviewPage, ReviewSortField, SortOrder, UserId,
};
use std::sync::Arc;

/// Review listings, eligibility checks and stored aggregates.
#[derive(Clone)]
pub struct ReviewQueries {
    reviews: Arc<dyn ReviewRepository>,
    products: Arc<dyn ProductLookup>,
    aggregates: Arc<dyn ProductAggregateWriter>,
    verifier: PurchaseVerifier,
    default_page_size: u32,
    max_page_size: u32,
}

impl ReviewQueries {
    /// Create the query layer.
    #[must_use]
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        products: Arc<dyn ProductLookup>,
        aggregates: Arc<dyn ProductAggregateWriter>,
        verifier: PurchaseVerifier,
    ) -> Self {
        Self {
            reviews,
            products,
            aggregates,
            verifier,
            default_page_size: 10,
            max_page_size: 50,
        }
    }

    /// Override the page size bounds.
    #[must_use]
    pub const fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self.max_page_size = max_page_size;
        self
    }

    /// Clamp caller-supplied paging to the configured bounds.
    #[must_use]
    pub fn page_request(&self, page: Option<u32>, limit: Option<u32>) -> PageRequest {
        PageRequest::new(page, limit, self.default_page_size, self.max_page_size)
    }

    /// One page of a product's approved reviews.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Storage`] on storage failure.
    #[tracing::instrument(skip(self))]
    pub async fn list_product_reviews(
        &self,
        product_id: ProductId,
        page: Option<u32>,
        limit: Option<u32>,
        sort_by: ReviewSortField,
        sort_order: SortOrder,
    ) -> Result<ReviewPage, ReviewError> {
        let query = ReviewListQuery {
            page: self.page_request(page, limit),
            sort_by,
            sort_order,
        };
        let (reviews, total) = self.reviews.list_by_product(product_id, query).await?;
        Ok(ReviewPage::new(reviews, total, query.page))
    }

    /// One page of a user's own reviews, approved or not.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Storage`] on storage failure.
    #[tracing::instrument(skip(self))]
    pub async fn list_user_reviews(
        &self,
        user_id: UserId,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ReviewPage, ReviewError> {
        let request = self.page_request(page, limit);
        let (reviews, total) = self.reviews.list_by_user(user_id, request).await?;
        Ok(ReviewPage::new(reviews, total, request))
    }

    /// Whether the user may review the product.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::NotFound`] if the product does not exist
    /// - [`ReviewError::Storage`] on storage failure
    #[tracing::instrument(skip(self))]
    pub async fn can_user_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<ReviewEligibility, ReviewError> {
        if !self.products.product_exists(product_id).await? {
            return Err(ReviewError::product_not_found(product_id));
        }

        let (has_purchased, existing) = tokio::join!(
            self.verifier.has_delivered_order(user_id, product_id),
            self.reviews.find_by_user_and_product(user_id, product_id),
        );
        Ok(ReviewEligibility::new(
            has_purchased,
            existing?.map(|review| review.id),
        ))
    }

    /// A single public review.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::NotFound`] if the review is missing or not approved
    /// - [`ReviewError::Storage`] on storage failure
    pub async fn get_review(&self, review_id: ReviewId) -> Result<Review, ReviewError> {
        self.reviews
            .find_by_id(review_id)
            .await?
            .filter(|review| review.is_approved)
            .ok_or_else(|| ReviewError::review_not_found(review_id))
    }

    /// The aggregate currently stored on the product.
    ///
    /// # Errors
    ///
    /// - [`ReviewError::NotFound`] if the product does not exist
    /// - [`ReviewError::Storage`] on storage failure
    pub async fn product_rating(
        &self,
        product_id: ProductId,
    ) -> Result<RatingAggregate, ReviewError> {
        self.aggregates
            .load_aggregate(product_id)
            .await?
            .ok_or_else(|| ReviewError::product_not_found(product_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use product_reviews_core::Rating;
    use product_reviews_testing::{
        InMemoryProductCatalog, InMemoryReviewRepository, StubOrderLookup,
    };
    use std::collections::BTreeSet;
    use std::time::Duration;

    struct Fixture {
        reviews: Arc<InMemoryReviewRepository>,
        catalog: Arc<InMemoryProductCatalog>,
        orders: Arc<StubOrderLookup>,
        queries: ReviewQueries,
    }

    fn fixture() -> Fixture {
        let reviews = Arc::new(InMemoryReviewRepository::new());
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let orders = Arc::new(StubOrderLookup::new());
        let queries = ReviewQueries::new(
            reviews.clone(),
            catalog.clone(),
            catalog.clone(),
            PurchaseVerifier::new(orders.clone(), Duration::from_secs(1)),
        )
        .with_page_sizes(2, 3);
        Fixture {
            reviews,
            catalog,
            orders,
            queries,
        }
    }

    async fn seed(
        repo: &InMemoryReviewRepository,
        user_id: UserId,
        product_id: ProductId,
        rating: u8,
        age_minutes: i64,
    ) -> Review {
        let at = Utc::now() - ChronoDuration::minutes(age_minutes);
        let review = Review {
            id: ReviewId::new(),
            user_id,
            product_id,
            rating: Rating::new(rating).unwrap(),
            title: None,
            comment: "Reasonable for the price.".to_string(),
            images: vec![],
            verified_purchase: false,
            helpful_voters: BTreeSet::new(),
            is_approved: true,
            created_at: at,
            updated_at: at,
        };
        repo.insert(&review).await.unwrap();
        review
    }

    #[tokio::test]
    async fn test_product_listing_hides_unapproved_and_pages() {
        let f = fixture();
        let product = f.catalog.add_product();
        let hidden = seed(&f.reviews, UserId::new(), product, 1, 1).await;
        seed(&f.reviews, UserId::new(), product, 5, 2).await;
        seed(&f.reviews, UserId::new(), product, 3, 3).await;
        seed(&f.reviews, UserId::new(), product, 4, 4).await;
        f.reviews.set_approved(hidden.id, false);

        let page = f
            .queries
            .list_product_reviews(product, Some(1), None, ReviewSortField::Rating, SortOrder::Desc)
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        let ratings: Vec<u8> = page.reviews.iter().map(|v| v.review.rating.value()).collect();
        assert_eq!(ratings, vec![5, 4]);
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        let f = fixture();
        assert_eq!(f.queries.page_request(Some(0), Some(500)).limit, 3);
        assert_eq!(f.queries.page_request(None, None), PageRequest { page: 1, limit: 2 });
    }

    #[tokio::test]
    async fn test_user_listing_includes_unapproved() {
        let f = fixture();
        let user = UserId::new();
        let hidden = seed(&f.reviews, user, ProductId::new(), 2, 5).await;
        seed(&f.reviews, user, ProductId::new(), 4, 1).await;
        f.reviews.set_approved(hidden.id, false);

        let page = f.queries.list_user_reviews(user, None, None).await.unwrap();

        assert_eq!(page.total, 2);
        // newest first
        assert_eq!(page.reviews[1].review.id, hidden.id);
    }

    #[tokio::test]
    async fn test_can_review_states() {
        let f = fixture();
        let product = f.catalog.add_product();
        let user = UserId::new();

        let eligibility = f.queries.can_user_review(user, product).await.unwrap();
        assert!(!eligibility.can_review);
        assert!(!eligibility.has_purchased);

        f.orders.add_delivered(user, product);
        assert!(f.queries.can_user_review(user, product).await.unwrap().can_review);

        let review = seed(&f.reviews, user, product, 5, 0).await;
        let eligibility = f.queries.can_user_review(user, product).await.unwrap();
        assert!(!eligibility.can_review);
        assert!(eligibility.has_reviewed);
        assert_eq!(eligibility.existing_review_id, Some(review.id));
    }

    #[tokio::test]
    async fn test_can_review_unknown_product() {
        let f = fixture();
        let err = f
            .queries
            .can_user_review(UserId::new(), ProductId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_get_review_hides_unapproved() {
        let f = fixture();
        let review = seed(&f.reviews, UserId::new(), ProductId::new(), 3, 0).await;
        assert_eq!(f.queries.get_review(review.id).await.unwrap().id, review.id);

        f.reviews.set_approved(review.id, false);
        assert!(f.queries.get_review(review.id).await.is_err());
    }

    #[tokio::test]
    async fn test_product_rating_reads_sink() {
        let f = fixture();
        let product = f.catalog.add_product();
        seed(&f.reviews, UserId::new(), product, 5, 0).await;

        // Nothing recomputed yet, so the stored aggregate is still empty.
        assert_eq!(f.queries.product_rating(product).await.unwrap().count, 0);
        assert!(f.queries.product_rating(ProductId::new()).await.is_err());
    }
}

//! `PostgreSQL` review repository.

use crate::{storage_error, to_count};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use product_reviews_core::ports::{ReviewRepository, StorageResult};
use product_reviews_core::{
    HelpfulVoteOutcome, PageRequest, ProductId, Rating, Review, ReviewId, ReviewListQuery,
    ReviewSortField, SortOrder, StorageError, UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, user_id, product_id, rating, title, comment, images, \
     verified_purchase, helpful_voters, is_approved, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    rating: i16,
    title: Option<String>,
    comment: String,
    images: Vec<String>,
    verified_purchase: bool,
    helpful_voters: Vec<Uuid>,
    is_approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StorageError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(row.rating).map_err(|e| {
            StorageError::Backend(format!("Corrupt rating on review {}: {e}", row.id))
        })?;
        Ok(Self {
            id: ReviewId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            product_id: ProductId::from_uuid(row.product_id),
            rating,
            title: row.title,
            comment: row.comment,
            images: row.images,
            verified_purchase: row.verified_purchase,
            helpful_voters: row.helpful_voters.into_iter().map(UserId::from_uuid).collect(),
            is_approved: row.is_approved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_reviews(rows: Vec<ReviewRow>) -> StorageResult<Vec<Review>> {
    rows.into_iter().map(Review::try_from).collect()
}

/// `ORDER BY` for a product listing. Ties fall back to newest first.
const fn order_clause(sort_by: ReviewSortField, sort_order: SortOrder) -> &'static str {
    match (sort_by, sort_order) {
        (ReviewSortField::CreatedAt, SortOrder::Asc) => "created_at ASC, id",
        (ReviewSortField::CreatedAt, SortOrder::Desc) => "created_at DESC, id",
        (ReviewSortField::Rating, SortOrder::Asc) => "rating ASC, created_at DESC, id",
        (ReviewSortField::Rating, SortOrder::Desc) => "rating DESC, created_at DESC, id",
        (ReviewSortField::HelpfulCount, SortOrder::Asc) => {
            "helpful_count ASC, created_at DESC, id"
        }
        (ReviewSortField::HelpfulCount, SortOrder::Desc) => {
            "helpful_count DESC, created_at DESC, id"
        }
    }
}

#[allow(clippy::cast_possible_wrap, clippy::cast_lossless)]
const fn limit_offset(page: PageRequest) -> (i64, i64) {
    (page.limit as i64, page.offset() as i64)
}

/// Review storage on the `reviews` table.
#[derive(Clone)]
pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ReviewRepository for PostgresReviewRepository {
    fn insert<'a>(&'a self, review: &'a Review) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            let voters: Vec<Uuid> = review.helpful_voters.iter().map(|u| *u.as_uuid()).collect();
            sqlx::query(
                "INSERT INTO reviews
                    (id, user_id, product_id, rating, title, comment, images,
                     verified_purchase, helpful_voters, is_approved, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(review.id.as_uuid())
            .bind(review.user_id.as_uuid())
            .bind(review.product_id.as_uuid())
            .bind(i16::from(review.rating.value()))
            .bind(&review.title)
            .bind(&review.comment)
            .bind(&review.images)
            .bind(review.verified_purchase)
            .bind(&voters)
            .bind(review.is_approved)
            .bind(review.created_at)
            .bind(review.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to insert review", e))?;

            tracing::debug!(review_id = %review.id, "Review row inserted");
            Ok(())
        })
    }

    fn find_by_id(&self, id: ReviewId) -> BoxFuture<'_, StorageResult<Option<Review>>> {
        Box::pin(async move {
            let query = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
            sqlx::query_as::<_, ReviewRow>(&query)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to load review", e))?
                .map(Review::try_from)
                .transpose()
        })
    }

    fn find_by_user_and_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<Option<Review>>> {
        Box::pin(async move {
            let query = format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 AND product_id = $2"
            );
            sqlx::query_as::<_, ReviewRow>(&query)
                .bind(user_id.as_uuid())
                .bind(product_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to load review", e))?
                .map(Review::try_from)
                .transpose()
        })
    }

    fn update_content<'a>(&'a self, review: &'a Review) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE reviews
                 SET rating = $2, title = $3, comment = $4, images = $5, updated_at = $6
                 WHERE id = $1",
            )
            .bind(review.id.as_uuid())
            .bind(i16::from(review.rating.value()))
            .bind(&review.title)
            .bind(&review.comment)
            .bind(&review.images)
            .bind(review.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to update review", e))?;

            if result.rows_affected() == 0 {
                return Err(StorageError::NotFound(format!("review {}", review.id)));
            }
            Ok(())
        })
    }

    fn delete(&self, id: ReviewId) -> BoxFuture<'_, StorageResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to delete review", e))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn approved_ratings(&self, product_id: ProductId) -> BoxFuture<'_, StorageResult<Vec<Rating>>> {
        Box::pin(async move {
            let rows: Vec<i16> = sqlx::query_scalar(
                "SELECT rating FROM reviews WHERE product_id = $1 AND is_approved",
            )
            .bind(product_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to load ratings", e))?;

            rows.into_iter()
                .map(|value| {
                    Rating::new(value)
                        .map_err(|e| StorageError::Backend(format!("Corrupt rating: {e}")))
                })
                .collect()
        })
    }

    fn list_by_product(
        &self,
        product_id: ProductId,
        query: ReviewListQuery,
    ) -> BoxFuture<'_, StorageResult<(Vec<Review>, u64)>> {
        Box::pin(async move {
            let total: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM reviews WHERE product_id = $1 AND is_approved",
            )
            .bind(product_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to count reviews", e))?;

            // The ORDER BY fragment comes from a closed enum, never from input.
            let sql = format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews
                 WHERE product_id = $1 AND is_approved
                 ORDER BY {}
                 LIMIT $2 OFFSET $3",
                order_clause(query.sort_by, query.sort_order)
            );
            let (limit, offset) = limit_offset(query.page);
            let rows = sqlx::query_as::<_, ReviewRow>(&sql)
                .bind(product_id.as_uuid())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to list reviews", e))?;

            Ok((into_reviews(rows)?, to_count(total, "count")?))
        })
    }

    fn list_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> BoxFuture<'_, StorageResult<(Vec<Review>, u64)>> {
        Box::pin(async move {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to count reviews", e))?;

            let sql = format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews
                 WHERE user_id = $1
                 ORDER BY created_at DESC, id
                 LIMIT $2 OFFSET $3"
            );
            let (limit, offset) = limit_offset(page);
            let rows = sqlx::query_as::<_, ReviewRow>(&sql)
                .bind(user_id.as_uuid())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to list reviews", e))?;

            Ok((into_reviews(rows)?, to_count(total, "count")?))
        })
    }

    fn add_helpful_voter(
        &self,
        review_id: ReviewId,
        voter_id: UserId,
    ) -> BoxFuture<'_, StorageResult<HelpfulVoteOutcome>> {
        Box::pin(async move {
            // Row lock + re-check makes concurrent votes serialize on the row.
            let updated: Option<i32> = sqlx::query_scalar(
                "UPDATE reviews
                 SET helpful_voters = array_append(helpful_voters, $2)
                 WHERE id = $1 AND NOT ($2 = ANY (helpful_voters))
                 RETURNING helpful_count",
            )
            .bind(review_id.as_uuid())
            .bind(voter_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to record helpful vote", e))?;

            if let Some(count) = updated {
                return Ok(HelpfulVoteOutcome::Recorded {
                    helpful_count: to_count(i64::from(count), "helpful_count")?,
                });
            }

            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reviews WHERE id = $1)")
                    .bind(review_id.as_uuid())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| storage_error("Failed to load review", e))?;

            Ok(if exists {
                HelpfulVoteOutcome::AlreadyVoted
            } else {
                HelpfulVoteOutcome::ReviewMissing
            })
        })
    }
}

//! Product existence and the denormalized rating columns.

use crate::{storage_error, to_count};
use futures::future::BoxFuture;
use product_reviews_core::ports::{ProductAggregateWriter, ProductLookup, StorageResult};
use product_reviews_core::{ProductId, RatingAggregate, RatingBreakdown, StorageError};
use sqlx::PgPool;
use sqlx::types::Json;

#[derive(sqlx::FromRow)]
struct AggregateRow {
    rating_average: f64,
    rating_count: i64,
    rating_breakdown: Json<RatingBreakdown>,
}

/// The catalog's `products` table, as seen by the review service.
///
/// Only `rating_average`, `rating_count` and `rating_breakdown` are ever
/// written, and always all three together.
#[derive(Clone)]
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    /// Create a catalog adapter over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProductLookup for PostgresProductCatalog {
    fn product_exists(&self, product_id: ProductId) -> BoxFuture<'_, StorageResult<bool>> {
        Box::pin(async move {
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to look up product", e))
        })
    }
}

impl ProductAggregateWriter for PostgresProductCatalog {
    fn write_aggregate(
        &self,
        product_id: ProductId,
        aggregate: RatingAggregate,
    ) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let count = i64::try_from(aggregate.count)
                .map_err(|_| StorageError::Backend("Review count overflow".to_string()))?;
            let result = sqlx::query(
                "UPDATE products
                 SET rating_average = $2, rating_count = $3, rating_breakdown = $4
                 WHERE id = $1",
            )
            .bind(product_id.as_uuid())
            .bind(aggregate.average)
            .bind(count)
            .bind(Json(aggregate.breakdown))
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to write rating aggregate", e))?;

            if result.rows_affected() == 0 {
                return Err(StorageError::NotFound(format!("product {product_id}")));
            }
            Ok(())
        })
    }

    fn load_aggregate(
        &self,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<Option<RatingAggregate>>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, AggregateRow>(
                "SELECT rating_average, rating_count, rating_breakdown
                 FROM products WHERE id = $1",
            )
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to load rating aggregate", e))?;

            row.map(|row| {
                Ok(RatingAggregate {
                    average: row.rating_average,
                    count: to_count(row.rating_count, "rating_count")?,
                    breakdown: row.rating_breakdown.0,
                })
            })
            .transpose()
        })
    }
}

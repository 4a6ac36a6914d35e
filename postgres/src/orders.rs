//! Delivered-order lookups against the order tables.

use crate::storage_error;
use futures::future::BoxFuture;
use product_reviews_core::ports::{OrderLookup, StorageResult};
use product_reviews_core::{ProductId, UserId};
use sqlx::PgPool;

/// Reads `orders` and `order_items`, both owned by the order service.
#[derive(Clone)]
pub struct PostgresOrderLookup {
    pool: PgPool,
}

impl PostgresOrderLookup {
    /// Create an order lookup over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl OrderLookup for PostgresOrderLookup {
    fn has_delivered_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<bool>> {
        Box::pin(async move {
            sqlx::query_scalar(
                "SELECT EXISTS (
                    SELECT 1
                    FROM orders o
                    JOIN order_items i ON i.order_id = o.id
                    WHERE o.user_id = $1 AND i.product_id = $2 AND o.status = 'delivered'
                 )",
            )
            .bind(user_id.as_uuid())
            .bind(product_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to check orders", e))
        })
    }
}

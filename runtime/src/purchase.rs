//! Best-effort purchase verification.

use crate::metrics::ReviewMetrics;
use product_reviews_core::ports::OrderLookup;
use product_reviews_core::{ProductId, UserId};
use std::sync::Arc;
use std::time::Duration;

/// Wraps the order collaborator with a timeout and a fail-open policy.
///
/// A verifier error or timeout never fails a submission: it is logged and
/// treated as "not purchased".
#[derive(Clone)]
pub struct PurchaseVerifier {
    orders: Arc<dyn OrderLookup>,
    timeout: Duration,
}

impl PurchaseVerifier {
    /// Create a verifier bounded by `timeout`.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderLookup>, timeout: Duration) -> Self {
        Self { orders, timeout }
    }

    /// Whether the user has a delivered order containing the product.
    #[tracing::instrument(skip(self))]
    pub async fn has_delivered_order(&self, user_id: UserId, product_id: ProductId) -> bool {
        match tokio::time::timeout(
            self.timeout,
            self.orders.has_delivered_order(user_id, product_id),
        )
        .await
        {
            Ok(Ok(purchased)) => purchased,
            Ok(Err(err)) => {
                ReviewMetrics::record_purchase_check_failure();
                tracing::warn!(error = %err, "Purchase check failed, treating as not purchased");
                false
            }
            Err(_) => {
                ReviewMetrics::record_purchase_check_failure();
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis(),
                    "Purchase check timed out, treating as not purchased"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use product_reviews_testing::StubOrderLookup;

    #[tokio::test]
    async fn test_answers_from_collaborator() {
        let orders = Arc::new(StubOrderLookup::new());
        let (user, product) = (UserId::new(), ProductId::new());
        orders.add_delivered(user, product);
        let verifier = PurchaseVerifier::new(orders, Duration::from_secs(1));

        assert!(verifier.has_delivered_order(user, product).await);
        assert!(!verifier.has_delivered_order(UserId::new(), product).await);
    }

    #[tokio::test]
    async fn test_error_fails_open() {
        let orders = Arc::new(StubOrderLookup::failing());
        let verifier = PurchaseVerifier::new(orders, Duration::from_secs(1));

        assert!(!verifier.has_delivered_order(UserId::new(), ProductId::new()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_open() {
        let orders = Arc::new(StubOrderLookup::hanging());
        let verifier = PurchaseVerifier::new(orders, Duration::from_millis(100));

        assert!(!verifier.has_delivered_order(UserId::new(), ProductId::new()).await);
    }
}

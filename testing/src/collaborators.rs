//! In-memory stand-ins for the external collaborators: product catalog,
//! order history and identity provider.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use futures::future::BoxFuture;
use product_reviews_core::ports::{
    IdentityProvider, OrderLookup, ProductAggregateWriter, ProductLookup, StorageResult,
};
use product_reviews_core::{ProductId, RatingAggregate, Requester, StorageError, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

// ============================================================================
// Product catalog
// ============================================================================

#[derive(Debug, Default)]
struct CatalogState {
    aggregates: HashMap<ProductId, RatingAggregate>,
    failing_writes: usize,
    writes: usize,
}

/// Product catalog holding each product's denormalized rating aggregate.
///
/// Implements both [`ProductLookup`] and [`ProductAggregateWriter`]. Writes
/// can be made to fail a set number of times to exercise the retry and
/// stale-aggregate paths.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryProductCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new product with an empty aggregate and return its id
    pub fn add_product(&self) -> ProductId {
        let product_id = ProductId::new();
        self.insert_product(product_id);
        product_id
    }

    /// Register a product under a known id
    pub fn insert_product(&self, product_id: ProductId) {
        self.state
            .write()
            .unwrap()
            .aggregates
            .insert(product_id, RatingAggregate::empty());
    }

    /// The aggregate currently stored on a product
    #[must_use]
    pub fn aggregate(&self, product_id: ProductId) -> Option<RatingAggregate> {
        self.state.read().unwrap().aggregates.get(&product_id).copied()
    }

    /// Overwrite a stored aggregate directly, bypassing the services.
    ///
    /// Used to simulate drift for reconciliation tests.
    pub fn set_aggregate(&self, product_id: ProductId, aggregate: RatingAggregate) {
        self.state
            .write()
            .unwrap()
            .aggregates
            .insert(product_id, aggregate);
    }

    /// Fail the next `count` aggregate writes with a backend error
    pub fn fail_next_writes(&self, count: usize) {
        self.state.write().unwrap().failing_writes = count;
    }

    /// Number of successful aggregate writes
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.read().unwrap().writes
    }
}

impl ProductLookup for InMemoryProductCatalog {
    fn product_exists(&self, product_id: ProductId) -> BoxFuture<'_, StorageResult<bool>> {
        Box::pin(async move {
            Ok(self
                .state
                .read()
                .unwrap()
                .aggregates
                .contains_key(&product_id))
        })
    }
}

impl ProductAggregateWriter for InMemoryProductCatalog {
    fn write_aggregate(
        &self,
        product_id: ProductId,
        aggregate: RatingAggregate,
    ) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let mut state = self.state.write().unwrap();
            if state.failing_writes > 0 {
                state.failing_writes -= 1;
                return Err(StorageError::Backend(
                    "aggregate sink unavailable".to_string(),
                ));
            }
            let Some(slot) = state.aggregates.get_mut(&product_id) else {
                return Err(StorageError::NotFound(format!("product {product_id}")));
            };
            *slot = aggregate;
            state.writes += 1;
            Ok(())
        })
    }

    fn load_aggregate(
        &self,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<Option<RatingAggregate>>> {
        Box::pin(async move { Ok(self.aggregate(product_id)) })
    }
}

// ============================================================================
// Order history
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OrderBehavior {
    Answer,
    Fail,
    Hang,
}

/// Order history with configurable failure modes.
#[derive(Clone, Debug)]
pub struct StubOrderLookup {
    delivered: Arc<RwLock<HashSet<(UserId, ProductId)>>>,
    behavior: OrderBehavior,
    latency: Duration,
}

impl StubOrderLookup {
    /// Answers from the recorded deliveries
    #[must_use]
    pub fn new() -> Self {
        Self::with_behavior(OrderBehavior::Answer)
    }

    /// Every lookup fails with a backend error
    #[must_use]
    pub fn failing() -> Self {
        Self::with_behavior(OrderBehavior::Fail)
    }

    /// Every lookup never completes
    #[must_use]
    pub fn hanging() -> Self {
        Self::with_behavior(OrderBehavior::Hang)
    }

    fn with_behavior(behavior: OrderBehavior) -> Self {
        Self {
            delivered: Arc::new(RwLock::new(HashSet::new())),
            behavior,
            latency: Duration::ZERO,
        }
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Record a delivered order containing the product
    pub fn add_delivered(&self, user_id: UserId, product_id: ProductId) {
        self.delivered.write().unwrap().insert((user_id, product_id));
    }
}

impl Default for StubOrderLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderLookup for StubOrderLookup {
    fn has_delivered_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> BoxFuture<'_, StorageResult<bool>> {
        Box::pin(async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            match self.behavior {
                OrderBehavior::Hang => return futures::future::pending().await,
                OrderBehavior::Fail => {
                    return Err(StorageError::Backend(
                        "order service unavailable".to_string(),
                    ));
                }
                OrderBehavior::Answer => {}
            }
            let delivered = self.delivered.read().unwrap().contains(&(user_id, product_id));
            Ok(delivered)
        })
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Token table for authenticated request tests.
#[derive(Clone, Debug, Default)]
pub struct StaticIdentityProvider {
    tokens: Arc<RwLock<HashMap<String, Requester>>>,
}

impl StaticIdentityProvider {
    /// Create a provider that knows no tokens
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token
    #[must_use]
    pub fn with_token(self, token: impl Into<String>, requester: Requester) -> Self {
        self.insert(token, requester);
        self
    }

    /// Register a token on a shared provider
    pub fn insert(&self, token: impl Into<String>, requester: Requester) {
        self.tokens.write().unwrap().insert(token.into(), requester);
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve<'a>(&'a self, token: &'a str) -> BoxFuture<'a, StorageResult<Option<Requester>>> {
        Box::pin(async move { Ok(self.tokens.read().unwrap().get(token).copied()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_writes_then_recovers() {
        let catalog = InMemoryProductCatalog::new();
        let product = catalog.add_product();
        catalog.fail_next_writes(1);

        assert!(catalog.write_aggregate(product, RatingAggregate::empty()).await.is_err());
        assert!(catalog.write_aggregate(product, RatingAggregate::empty()).await.is_ok());
        assert_eq!(catalog.write_count(), 1);
    }

    #[tokio::test]
    async fn test_write_to_unknown_product() {
        let catalog = InMemoryProductCatalog::new();
        let err = catalog
            .write_aggregate(ProductId::new(), RatingAggregate::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_token_lookup() {
        let user = UserId::new();
        let provider = StaticIdentityProvider::new().with_token("t1", Requester::customer(user));

        assert_eq!(provider.resolve("t1").await.unwrap().map(|r| r.user_id), Some(user));
        assert!(provider.resolve("nope").await.unwrap().is_none());
    }
}

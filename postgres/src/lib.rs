//! `PostgreSQL` adapters for the product review services.
//!
//! Implements the collaborator traits from `product_reviews_core::ports` on
//! top of a shared `sqlx` pool:
//!
//! - [`PostgresReviewRepository`]: the `reviews` table, owned by this service
//! - [`PostgresProductCatalog`]: product existence and the rating columns on
//!   the catalog's `products` table
//! - [`PostgresOrderLookup`]: delivered orders from the order tables
//! - [`PostgresIdentityProvider`]: bearer tokens from `user_sessions`
//!
//! Uniqueness of `(user_id, product_id)` is a unique index, and helpful votes
//! are a single conditional `UPDATE`, so both invariants hold under
//! concurrent requests without application locks.
//!
//! # Example
//!
//! ```ignore
//! use product_reviews_postgres::{migrate, PostgresReviewRepository};
//! use sqlx::postgres::PgPoolOptions;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = PgPoolOptions::new()
//!         .max_connections(10)
//!         .connect("postgres://localhost/shop")
//!         .await?;
//!     migrate(&pool).await?;
//!     let reviews = PostgresReviewRepository::new(pool);
//!     Ok(())
//! }
//! ```

use product_reviews_core::StorageError;
use sqlx::PgPool;

mod orders;
mod products;
mod reviews;
mod sessions;

pub use orders::PostgresOrderLookup;
pub use products::PostgresProductCatalog;
pub use reviews::PostgresReviewRepository;
pub use sessions::PostgresIdentityProvider;

/// Run the review migrations.
///
/// Expects the catalog's `products` table to exist already.
///
/// # Errors
///
/// Returns [`StorageError::Backend`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StorageError::Backend(format!("Migration failed: {e}")))
}

/// Check that the database answers.
///
/// # Errors
///
/// Returns [`StorageError::Backend`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| storage_error("Ping failed", e))
}

/// Map a `sqlx` error, turning unique violations into conflicts.
pub(crate) fn storage_error(context: &str, err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StorageError::Conflict(format!("{context}: {db}"))
        }
        _ => StorageError::Backend(format!("{context}: {err}")),
    }
}

/// Convert a non-negative database count.
pub(crate) fn to_count(value: i64, column: &str) -> Result<u64, StorageError> {
    u64::try_from(value)
        .map_err(|_| StorageError::Backend(format!("Negative value in {column}: {value}")))
}

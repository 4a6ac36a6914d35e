//! Bearer token resolution from the auth service's session table.

use crate::storage_error;
use futures::future::BoxFuture;
use product_reviews_core::ports::{IdentityProvider, StorageResult};
use product_reviews_core::{Requester, Role, StorageError, UserId};
use sqlx::PgPool;
use uuid::Uuid;

/// Resolves tokens against unexpired rows of `user_sessions`.
#[derive(Clone)]
pub struct PostgresIdentityProvider {
    pool: PgPool,
}

impl PostgresIdentityProvider {
    /// Create an identity provider over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl IdentityProvider for PostgresIdentityProvider {
    fn resolve<'a>(&'a self, token: &'a str) -> BoxFuture<'a, StorageResult<Option<Requester>>> {
        Box::pin(async move {
            let row: Option<(Uuid, String)> = sqlx::query_as(
                "SELECT user_id, role FROM user_sessions
                 WHERE token = $1 AND expires_at > now()",
            )
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to resolve session", e))?;

            row.map(|(user_id, role)| {
                let role: Role = role.parse().map_err(StorageError::Backend)?;
                Ok(Requester {
                    user_id: UserId::from_uuid(user_id),
                    role,
                })
            })
            .transpose()
        })
    }
}

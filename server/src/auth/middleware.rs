//! Authentication extractors.
//!
//! - [`SessionUser`]: any caller with a valid bearer token
//! - [`RequireAdmin`]: a caller whose resolved role is `admin`
//!
//! # Usage
//!
//! ```rust,ignore
//! use product_reviews_server::auth::{RequireAdmin, SessionUser};
//!
//! async fn list_my_reviews(session: SessionUser) -> Result<Json<ReviewPage>, AppError> {
//!     // session.requester.user_id is authenticated
//! }
//!
//! async fn recompute(admin: RequireAdmin) -> Result<Json<RatingAggregate>, AppError> {
//!     // admin.requester.role == Role::Admin
//! }
//! ```

use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use product_reviews_core::{Requester, ReviewError, UserId};
use product_reviews_web::{AppError, BearerToken};

/// Authenticated caller.
///
/// Rejects with 401 when the token is missing, malformed, unknown or
/// expired, and with 500 when the identity provider itself fails.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser {
    /// Identity resolved from the token
    pub requester: Requester,
}

impl SessionUser {
    /// The caller's user ID.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.requester.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let requester = state
            .identity
            .resolve(&token)
            .await
            .map_err(|e| AppError::from(ReviewError::Storage(e)))?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired session"))?;

        Ok(Self { requester })
    }
}

/// Authenticated administrator.
///
/// Rejects with 403 when the caller is authenticated but not an admin.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin {
    /// Identity resolved from the token
    pub requester: Requester,
}

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionUser { requester } = SessionUser::from_request_parts(parts, state).await?;

        if !requester.is_admin() {
            tracing::warn!(user_id = %requester.user_id, "Non-admin attempted an admin operation");
            return Err(AppError::forbidden("Administrator role required"));
        }

        Ok(Self { requester })
    }
}

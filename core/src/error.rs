//! Error taxonomy for review operations.
//!
//! [`ReviewError`] is what callers see: every variant has a stable
//! [`kind`](ReviewError::kind) and a human-readable message. [`StorageError`]
//! is what adapters report; it is wrapped by `ReviewError::Storage` and is
//! never shown to clients verbatim.

use crate::types::{ProductId, UserId};
use std::fmt;
use thiserror::Error;

/// Error type for storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// The addressed record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Backend failure (connection, query, serialization)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Kind of resource named in a [`ReviewError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A catalog product
    Product,
    /// A review
    Review,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => f.write_str("Product"),
            Self::Review => f.write_str("Review"),
        }
    }
}

/// Errors surfaced by review operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    /// A field failed validation; the client can correct it
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field, in wire (camelCase) spelling
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The user already reviewed the product
    #[error("User {user_id} has already reviewed product {product_id}")]
    DuplicateReview {
        /// Author
        user_id: UserId,
        /// Product
        product_id: ProductId,
    },

    /// The product or review does not exist
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// What was looked up
        resource: ResourceKind,
        /// The identifier that failed to resolve
        id: String,
    },

    /// The caller is neither the owner nor an administrator
    #[error("{0}")]
    Forbidden(String),

    /// Authors cannot vote on their own review
    #[error("You cannot mark your own review as helpful")]
    SelfVote,

    /// The voter already marked this review as helpful
    #[error("You have already marked this review as helpful")]
    AlreadyVoted,

    /// Storage failure; details are for logs only
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl ReviewError {
    /// Build a validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Build a not-found error for a product.
    #[must_use]
    pub fn product_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: ResourceKind::Product,
            id: id.to_string(),
        }
    }

    /// Build a not-found error for a review.
    #[must_use]
    pub fn review_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: ResourceKind::Review,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::DuplicateReview { .. } => "DUPLICATE_REVIEW",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::SelfVote => "SELF_VOTE",
            Self::AlreadyVoted => "ALREADY_VOTED",
            Self::Storage(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Client-side errors abort a mutation before anything is persisted.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReviewError::validation("comment", "must be at least 10 characters");
        assert_eq!(
            err.to_string(),
            "Invalid comment: must be at least 10 characters"
        );

        let err = ReviewError::review_not_found("abc");
        assert_eq!(err.to_string(), "Review with id abc not found");
    }

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(ReviewError::SelfVote.kind(), "SELF_VOTE");
        assert_eq!(ReviewError::AlreadyVoted.kind(), "ALREADY_VOTED");
        assert_eq!(
            ReviewError::product_not_found(ProductId::new()).kind(),
            "NOT_FOUND"
        );
        assert_eq!(
            ReviewError::Storage(StorageError::Backend("boom".into())).kind(),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn test_storage_is_not_client_error() {
        let err: ReviewError = StorageError::Backend("pool timed out".into()).into();
        assert!(!err.is_client_error());
        assert!(ReviewError::Forbidden("no".into()).is_client_error());
    }
}

//! Error types for web handlers.
//!
//! [`AppError`] is the only error type that reaches an HTTP client. Domain
//! errors convert into it through `From<ReviewError>`, which fixes the status
//! code and stable error code for every kind. Storage details are logged and
//! replaced with a generic message.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use product_reviews_core::ReviewError;
use serde::Serialize;
use std::fmt;

const GENERIC_INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<ReviewPage>, AppError> {
///     let page = state.services.queries.list_user_reviews(user_id, None, None).await?;
///     Ok(Json(page))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Offending request field, for validation failures
    field: Option<&'static str>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            field: None,
            source: None,
        }
    }

    /// Attach the internal cause. It is logged, never returned.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Name the request field that caused the error.
    #[must_use]
    pub const fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Offending field, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        self.field
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        } else {
            tracing::debug!(status = %self.status, code = self.code, "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            field: self.field,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        let code = err.kind();
        match err {
            ReviewError::Validation { field, .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), code).with_field(field)
            }
            ReviewError::DuplicateReview { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "You have already reviewed this product",
                code,
            ),
            ReviewError::SelfVote | ReviewError::AlreadyVoted => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), code)
            }
            ReviewError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, err.to_string(), code)
            }
            ReviewError::Forbidden(message) => Self::new(StatusCode::FORBIDDEN, message, code),
            ReviewError::Storage(storage) => Self::internal(GENERIC_INTERNAL_MESSAGE)
                .with_source(anyhow::Error::new(storage)),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(GENERIC_INTERNAL_MESSAGE).with_source(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text(), "VALIDATION_ERROR")
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use product_reviews_core::{ProductId, StorageError, UserId};
    use serde_json::Value;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let err: AppError =
            ReviewError::validation("comment", "must be at least 10 characters").into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "comment");
        assert_eq!(body["message"], "Invalid comment: must be at least 10 characters");
    }

    #[tokio::test]
    async fn test_client_errors_map_to_stable_codes() {
        let duplicate = ReviewError::DuplicateReview {
            user_id: UserId::new(),
            product_id: ProductId::new(),
        };
        let cases = [
            (duplicate, StatusCode::BAD_REQUEST, "DUPLICATE_REVIEW"),
            (ReviewError::SelfVote, StatusCode::BAD_REQUEST, "SELF_VOTE"),
            (ReviewError::AlreadyVoted, StatusCode::BAD_REQUEST, "ALREADY_VOTED"),
            (
                ReviewError::review_not_found("abc"),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                ReviewError::Forbidden("You can only modify your own reviews".into()),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
        ];

        for (err, expected_status, expected_code) in cases {
            let (status, body) = body_json(err.into()).await;
            assert_eq!(status, expected_status);
            assert_eq!(body["code"], expected_code);
            assert!(body.get("field").is_none());
        }
    }

    #[tokio::test]
    async fn test_storage_details_are_hidden() {
        let err: AppError =
            ReviewError::Storage(StorageError::Backend("password authentication failed".into()))
                .into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(body["message"], GENERIC_INTERNAL_MESSAGE);
        assert!(!body.to_string().contains("password"));
    }

    #[test]
    fn test_unauthorized() {
        let err = AppError::unauthorized("Missing authorization header");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "UNAUTHORIZED");
        assert_eq!(err.field(), None);
    }
}

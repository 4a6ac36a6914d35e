//! Field-level validation for review content.
//!
//! Lengths are counted in characters after trimming. Each failure names the
//! offending field so clients can highlight it.

use crate::error::ReviewError;
use crate::types::{NewReview, Rating, ReviewPatch};

/// Minimum comment length (characters, trimmed)
pub const COMMENT_MIN_CHARS: usize = 10;
/// Maximum comment length (characters, trimmed)
pub const COMMENT_MAX_CHARS: usize = 1000;
/// Maximum title length (characters, trimmed)
pub const TITLE_MAX_CHARS: usize = 100;
/// Maximum number of attached images
pub const MAX_IMAGES: usize = 4;

/// Review content that passed validation, normalised for storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedContent {
    /// Star rating
    pub rating: Rating,
    /// Trimmed title; blank titles become `None`
    pub title: Option<String>,
    /// Trimmed comment
    pub comment: String,
    /// Image URLs, trimmed
    pub images: Vec<String>,
}

/// Validated subset of a [`ReviewPatch`].
///
/// `title` is doubly optional: `Some(None)` clears the title.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatedPatch {
    /// New rating
    pub rating: Option<Rating>,
    /// New title
    pub title: Option<Option<String>>,
    /// New comment
    pub comment: Option<String>,
    /// New images
    pub images: Option<Vec<String>>,
}

/// Validate a submission.
///
/// # Errors
///
/// Returns [`ReviewError::Validation`] for the first invalid field, checked in
/// the order rating, comment, title, images.
pub fn validate_new_review(input: &NewReview) -> Result<ValidatedContent, ReviewError> {
    Ok(ValidatedContent {
        rating: Rating::new(input.rating)?,
        comment: validate_comment(&input.comment)?,
        title: validate_title(input.title.as_deref())?,
        images: validate_images(input.images.as_deref().unwrap_or_default())?,
    })
}

/// Validate the fields present in a patch.
///
/// # Errors
///
/// Returns [`ReviewError::Validation`] for the first invalid field.
pub fn validate_patch(patch: &ReviewPatch) -> Result<ValidatedPatch, ReviewError> {
    Ok(ValidatedPatch {
        rating: patch.rating.map(Rating::new).transpose()?,
        comment: patch.comment.as_deref().map(validate_comment).transpose()?,
        title: patch
            .title
            .as_ref()
            .map(|title| validate_title(title.as_deref()))
            .transpose()?,
        images: patch.images.as_deref().map(validate_images).transpose()?,
    })
}

/// Validate and trim a comment.
///
/// # Errors
///
/// Returns [`ReviewError::Validation`] naming `comment`.
pub fn validate_comment(comment: &str) -> Result<String, ReviewError> {
    let trimmed = comment.trim();
    let chars = trimmed.chars().count();
    if chars < COMMENT_MIN_CHARS {
        return Err(ReviewError::validation(
            "comment",
            format!("must be at least {COMMENT_MIN_CHARS} characters"),
        ));
    }
    if chars > COMMENT_MAX_CHARS {
        return Err(ReviewError::validation(
            "comment",
            format!("must be at most {COMMENT_MAX_CHARS} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate and trim an optional title.
///
/// # Errors
///
/// Returns [`ReviewError::Validation`] naming `title`.
pub fn validate_title(title: Option<&str>) -> Result<Option<String>, ReviewError> {
    let Some(trimmed) = title.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(ReviewError::validation(
            "title",
            format!("must be at most {TITLE_MAX_CHARS} characters"),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Validate an image list.
///
/// # Errors
///
/// Returns [`ReviewError::Validation`] naming `images`.
pub fn validate_images(images: &[String]) -> Result<Vec<String>, ReviewError> {
    if images.len() > MAX_IMAGES {
        return Err(ReviewError::validation(
            "images",
            format!("at most {MAX_IMAGES} images are allowed"),
        ));
    }
    images
        .iter()
        .map(|url| {
            let url = url.trim();
            if url.is_empty() {
                Err(ReviewError::validation("images", "image URLs must not be blank"))
            } else {
                Ok(url.to_string())
            }
        })
        .collect()
}

//! Domain types for product reviews.
//!
//! Identifiers, the [`Review`] entity, request/patch shapes, paging and the
//! read models returned by the query layer.

use crate::error::ReviewError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a review
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(Uuid);

impl ReviewId {
    /// Creates a new random `ReviewId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ReviewId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user, issued by the external identity collaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a product, owned by the external catalog collaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Creates a new random `ProductId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ProductId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Star rating, 1 through 5 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted star value
    pub const MIN: u8 = 1;
    /// Highest accepted star value
    pub const MAX: u8 = 5;

    /// Create a rating, rejecting anything outside `1..=5`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Validation`] naming the `rating` field.
    pub fn new(value: impl Into<i64>) -> Result<Self, ReviewError> {
        let value = value.into();
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
            Ok(Self(value as u8))
        } else {
            Err(ReviewError::validation(
                "rating",
                format!("must be between {} and {}", Self::MIN, Self::MAX),
            ))
        }
    }

    /// The star value
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of an authenticated caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper
    Customer,
    /// Catalog administrator, may edit or remove any review
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Self::Customer),
            "admin" | "administrator" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Authenticated identity on whose behalf an operation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requester {
    /// The caller
    pub user_id: UserId,
    /// The caller's role
    pub role: Role,
}

impl Requester {
    /// A regular customer
    #[must_use]
    pub const fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    /// An administrator
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Whether the caller has administrative rights
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner or administrator
    #[must_use]
    pub fn may_modify(&self, review: &Review) -> bool {
        self.is_admin() || self.user_id == review.user_id
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A user's review of a product.
///
/// `user_id`, `product_id` and `verified_purchase` are fixed at creation.
/// The helpful count is not a stored field: it is always the size of
/// `helpful_voters`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review ID
    pub id: ReviewId,
    /// Author
    pub user_id: UserId,
    /// Reviewed product
    pub product_id: ProductId,
    /// Star rating
    pub rating: Rating,
    /// Optional headline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Review body
    pub comment: String,
    /// Image URLs attached to the review
    pub images: Vec<String>,
    /// Author had a delivered order for the product at submission time
    pub verified_purchase: bool,
    /// Users who found the review helpful (never includes the author)
    #[serde(skip)]
    pub helpful_voters: BTreeSet<UserId>,
    /// Only approved reviews are public and counted in aggregates
    pub is_approved: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Number of distinct helpful votes
    #[must_use]
    pub fn helpful_count(&self) -> u64 {
        self.helpful_voters.len() as u64
    }
}

/// Wire form of a review: the entity plus its derived helpful count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    /// The review
    #[serde(flatten)]
    pub review: Review,
    /// Number of distinct helpful votes
    pub helpful_count: u64,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        let helpful_count = review.helpful_count();
        Self {
            review,
            helpful_count,
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Input for submitting a new review.
///
/// The rating is carried as a raw integer so out-of-range values surface as a
/// field-level validation error instead of a deserialization failure.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    /// Product being reviewed
    pub product_id: ProductId,
    /// Star rating (validated to 1..=5)
    pub rating: i64,
    /// Optional headline
    #[serde(default)]
    pub title: Option<String>,
    /// Review body
    pub comment: String,
    /// Optional image URLs
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

/// Partial update of a review's editable content.
///
/// Absent fields are left unchanged. `title` distinguishes an absent key from
/// an explicit `null`: both `null` and a blank string clear the title.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    /// New star rating
    #[serde(default)]
    pub rating: Option<i64>,
    /// New headline; `Some(None)` clears it
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    /// New body
    #[serde(default)]
    pub comment: Option<String>,
    /// Replacement image list
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

// Only called when the key is present, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ============================================================================
// Queries
// ============================================================================

/// Sort key for product review listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewSortField {
    /// Submission time
    #[default]
    CreatedAt,
    /// Star rating
    Rating,
    /// Helpful vote count
    HelpfulCount,
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    Asc,
    /// Largest first
    #[default]
    Desc,
}

/// Page request, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl PageRequest {
    /// Build a page request, clamping to `1..` for the page and
    /// `1..=max_limit` for the size.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    /// Number of rows to skip
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// Listing parameters for a product's public reviews.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReviewListQuery {
    /// Page to fetch
    pub page: PageRequest,
    /// Sort key
    pub sort_by: ReviewSortField,
    /// Sort direction
    pub sort_order: SortOrder,
}

/// One page of reviews.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    /// Reviews on this page
    pub reviews: Vec<ReviewView>,
    /// Total matching reviews across all pages
    pub total: u64,
    /// Current page (1-based)
    pub page: u32,
    /// Total number of pages
    pub pages: u64,
}

impl ReviewPage {
    /// Assemble a page from a slice of results and the overall total.
    #[must_use]
    pub fn new(reviews: Vec<Review>, total: u64, request: PageRequest) -> Self {
        Self {
            reviews: reviews.into_iter().map(ReviewView::from).collect(),
            total,
            page: request.page,
            pages: total.div_ceil(u64::from(request.limit)),
        }
    }
}

/// Answer to "may this user review this product".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEligibility {
    /// `has_purchased && !has_reviewed`
    pub can_review: bool,
    /// A delivered order contains the product
    pub has_purchased: bool,
    /// The user already reviewed the product
    pub has_reviewed: bool,
    /// The existing review, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_review_id: Option<ReviewId>,
}

impl ReviewEligibility {
    /// Derive eligibility from purchase status and an existing review.
    #[must_use]
    pub const fn new(has_purchased: bool, existing_review_id: Option<ReviewId>) -> Self {
        let has_reviewed = existing_review_id.is_some();
        Self {
            can_review: has_purchased && !has_reviewed,
            has_purchased,
            has_reviewed,
            existing_review_id,
        }
    }
}

/// Result of an atomic helpful-vote insertion at the storage layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelpfulVoteOutcome {
    /// The voter was added; carries the new size of the voter set
    Recorded {
        /// Size of the voter set after insertion
        helpful_count: u64,
    },
    /// The voter was already in the set
    AlreadyVoted,
    /// The review no longer exists
    ReviewMissing,
}

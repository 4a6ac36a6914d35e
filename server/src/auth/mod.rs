//! Authentication for the review API.
//!
//! Bearer tokens are issued by the shop's auth service; this server only
//! resolves them through the injected
//! [`IdentityProvider`](product_reviews_core::ports::IdentityProvider).

pub mod middleware;

pub use middleware::{RequireAdmin, SessionUser};

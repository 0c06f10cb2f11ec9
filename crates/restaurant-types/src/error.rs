//! Error types for restaurant-types.

use thiserror::Error;

/// Reasons a [`ReviewDraft`](crate::ReviewDraft) is rejected before it
/// reaches the store or the network.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new checks
/// without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The reviewer name is empty or whitespace.
    #[error("reviewer name cannot be empty")]
    EmptyName,

    /// The review text is empty or whitespace.
    #[error("review comments cannot be empty")]
    EmptyComments,

    /// Rating outside 1..=5.
    #[error("rating {0} is out of range (expected 1-5)")]
    RatingOutOfRange(u8),

    /// Restaurant ids are positive.
    #[error("invalid restaurant id {0}")]
    InvalidRestaurantId(i64),
}

/// Result type alias using restaurant-types' ValidationError type.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

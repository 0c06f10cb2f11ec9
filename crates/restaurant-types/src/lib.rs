//! Entity types for the offline-first restaurant review cache.
//!
//! This crate provides the records shared by the local store
//! (restaurant-store) and the sync layer (restaurant-sync).
//!
//! # Features
//!
//! - Typed restaurant, review, pending review and favorite records
//! - Review draft validation
//! - Lenient deserialization of the remote API's loosely typed JSON
//!
//! # Example
//!
//! ```
//! use restaurant_types::ReviewDraft;
//!
//! let draft = ReviewDraft::new(1, "Ana", 5, "Excellent dumplings");
//! assert!(draft.validate().is_ok());
//! ```

pub mod error;
mod millis;
pub mod types;
#[cfg(feature = "serde")]
pub mod wire;

pub use error::{ValidationError, ValidationResult};
pub use millis::{from_unix_millis, now_millis, to_unix_millis};
pub use types::{
    FavoriteMarker, LatLng, MAX_RATING, MIN_RATING, PendingReview, Restaurant, Review, ReviewDraft,
};

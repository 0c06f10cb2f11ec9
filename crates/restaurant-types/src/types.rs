//! Core types for restaurants, reviews and favorites.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ValidationError, ValidationResult};

/// Lowest accepted review rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted review rating.
pub const MAX_RATING: u8 = 5;

/// Geographic position of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A restaurant as served by the remote API.
///
/// `id` is the primary key in the local store; `created_at` orders the
/// retention cap.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Restaurant {
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::wire::lenient_int::deserialize")
    )]
    pub id: i64,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub neighborhood: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cuisine_type: String,
    pub latlng: LatLng,
    /// Photograph basename, absent for some restaurants.
    #[cfg_attr(feature = "serde", serde(default))]
    pub photograph: Option<String>,
    /// Opening hours keyed by day name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub operating_hours: BTreeMap<String, String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::wire::lenient_bool::deserialize")
    )]
    pub is_favorite: bool,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "createdAt", with = "crate::wire::timestamp")
    )]
    pub created_at: OffsetDateTime,
}

/// A server-confirmed review.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Review {
    /// Server-assigned id.
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::wire::lenient_int::deserialize")
    )]
    pub id: i64,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::wire::lenient_int::deserialize")
    )]
    pub restaurant_id: i64,
    pub name: String,
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::wire::lenient_rating::deserialize")
    )]
    pub rating: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub comments: String,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "createdAt", with = "crate::wire::timestamp")
    )]
    pub created_at: OffsetDateTime,
}

/// A review written by the user but not yet confirmed by the server.
///
/// This is the body of `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReviewDraft {
    pub restaurant_id: i64,
    pub name: String,
    pub rating: u8,
    pub comments: String,
}

impl ReviewDraft {
    /// Create a draft. Call [`validate`](Self::validate) before submitting it.
    pub fn new(
        restaurant_id: i64,
        name: impl Into<String>,
        rating: u8,
        comments: impl Into<String>,
    ) -> Self {
        Self {
            restaurant_id,
            name: name.into(),
            rating,
            comments: comments.into(),
        }
    }

    /// Check the fields the review form requires.
    ///
    /// # Examples
    ///
    /// ```
    /// use restaurant_types::{ReviewDraft, ValidationError};
    ///
    /// assert!(ReviewDraft::new(1, "Ana", 4, "Great noodles").validate().is_ok());
    /// assert_eq!(
    ///     ReviewDraft::new(1, "Ana", 9, "Great noodles").validate(),
    ///     Err(ValidationError::RatingOutOfRange(9))
    /// );
    /// ```
    pub fn validate(&self) -> ValidationResult<()> {
        if self.restaurant_id <= 0 {
            return Err(ValidationError::InvalidRestaurantId(self.restaurant_id));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange(self.rating));
        }
        if self.comments.trim().is_empty() {
            return Err(ValidationError::EmptyComments);
        }
        Ok(())
    }

    /// Attach the server's answer, producing the synced record.
    pub fn confirm(self, id: i64, created_at: OffsetDateTime) -> Review {
        Review {
            id,
            restaurant_id: self.restaurant_id,
            name: self.name,
            rating: self.rating,
            comments: self.comments,
            created_at,
        }
    }
}

/// A review queued locally while offline.
///
/// `id` is a temporary client-side id, unique within the pending set only.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PendingReview {
    pub id: i64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub draft: ReviewDraft,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "createdAt", with = "crate::wire::timestamp")
    )]
    pub created_at: OffsetDateTime,
}

impl PendingReview {
    pub fn restaurant_id(&self) -> i64 {
        self.draft.restaurant_id
    }
}

/// Local favorite marker for a restaurant.
///
/// `synced` is false while a toggle made offline has not reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FavoriteMarker {
    pub id: i64,
    pub is_favorite: bool,
    pub synced: bool,
}

//! Record sets and store statistics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four logical record sets kept by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSet {
    /// Restaurants, keyed by restaurant id.
    Restaurants,
    /// Server-confirmed reviews, keyed by server id.
    Reviews,
    /// Reviews written offline, keyed by a temporary id.
    PendingReviews,
    /// Favorite markers, keyed by restaurant id.
    Favorites,
}

impl RecordSet {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            RecordSet::Restaurants => "restaurants",
            RecordSet::Reviews => "reviews",
            RecordSet::PendingReviews => "pending_reviews",
            RecordSet::Favorites => "favorites",
        }
    }

    /// Column that orders the set for retention.
    pub(crate) fn recency_column(self) -> &'static str {
        match self {
            RecordSet::Favorites => "updated_at",
            _ => "created_at",
        }
    }
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Row counts per record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub restaurants: u64,
    pub reviews: u64,
    pub pending_reviews: u64,
    pub favorites: u64,
    /// Favorite toggles not yet pushed to the server.
    pub unsynced_favorites: u64,
}

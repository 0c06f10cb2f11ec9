//! Local persistence for the offline restaurant review cache.
//!
//! This crate provides SQLite-based storage for restaurants and reviews
//! fetched from the remote API, plus the queue of writes made while offline.
//!
//! # Features
//!
//! - Four record sets: restaurants, synced reviews, pending reviews, favorites
//! - Upsert by primary key, lookup by restaurant through an index
//! - Retention cap evicting the oldest records by `createdAt`
//! - Atomic promotion of replayed reviews from the pending set
//! - Additive schema migrations
//!
//! # Example
//!
//! ```no_run
//! use restaurant_store::{RecordSet, Store};
//!
//! let store = Store::open_default()?;
//!
//! for restaurant in store.list_restaurants()? {
//!     println!("{} ({})", restaurant.name, restaurant.neighborhood);
//! }
//! println!("{} review(s) waiting to sync", store.count(RecordSet::PendingReviews)?);
//! # Ok::<(), restaurant_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{RecordSet, StoreStats};
pub use queries::ReviewQuery;
pub use schema::SCHEMA_VERSION;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/restaurant-reviews/cache.db`
/// - macOS: `~/Library/Application Support/restaurant-reviews/cache.db`
/// - Windows: `C:\Users\<user>\AppData\Local\restaurant-reviews\cache.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("restaurant-reviews")
        .join("cache.db")
}

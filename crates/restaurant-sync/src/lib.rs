//! Offline-first sync between the local store and the restaurant review API.
//!
//! This crate serves restaurant and review data from the local
//! [`Store`](restaurant_store::Store) when it can, falls back to the remote
//! API when it must, and queues writes made while offline for later replay.
//!
//! # Features
//!
//! - [`SyncCoordinator`]: read-through cache, online writes, offline queue
//! - [`RemoteGateway`] trait with [`HttpGateway`] (reqwest) and
//!   [`MockGateway`] implementations
//! - [`Connectivity`] signal and a [`ReplayWorker`] that drains on restore
//! - Configurable [`ReplayPolicy`] for reviews the server refuses
//!
//! # Example
//!
//! ```no_run
//! use restaurant_store::Store;
//! use restaurant_sync::{Connectivity, HttpGateway, SyncCoordinator, SyncOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = SyncCoordinator::new(
//!     Store::open_default()?,
//!     HttpGateway::new("http://localhost:1337")?,
//!     Connectivity::online(),
//!     SyncOptions::default(),
//! );
//!
//! for cuisine in coordinator.fetch_cuisines().await? {
//!     println!("{}", cuisine);
//! }
//! # Ok(())
//! # }
//! ```

mod connectivity;
mod coordinator;
mod error;
pub mod gateway;
pub mod mock;
mod options;
mod replay;

pub use connectivity::Connectivity;
pub use coordinator::{
    DrainReport, FavoriteOutcome, RestaurantReviews, SubmitOutcome, SyncCoordinator,
};
pub use error::{BoxError, Error, Result};
pub use gateway::{DEFAULT_TIMEOUT, HttpGateway, RemoteGateway};
pub use mock::MockGateway;
pub use options::{DEFAULT_RETENTION, ReplayPolicy, SyncOptions};
pub use replay::ReplayWorker;

//! In-memory gateway for testing.
//!
//! [`MockGateway`] implements [`RemoteGateway`] over in-memory collections
//! so that coordinator behavior can be tested without a server.
//!
//! # Features
//!
//! - **Failure injection**: go unreachable, fail every call, fail the next N
//!   calls, or reject reviews from a given reviewer
//! - **Call counters**: assert how many requests an operation made
//! - **Latency simulation**: delay every call to widen race windows

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use restaurant_types::{Restaurant, Review, ReviewDraft, now_millis};

use crate::error::{Error, Result};
use crate::gateway::RemoteGateway;

const MOCK_URL: &str = "mock://restaurants";

/// A mock remote API for testing.
///
/// # Example
///
/// ```
/// use restaurant_sync::{MockGateway, RemoteGateway};
/// use restaurant_types::ReviewDraft;
///
/// #[tokio::main]
/// async fn main() {
///     let gateway = MockGateway::new();
///     let review = gateway
///         .create_review(&ReviewDraft::new(1, "Ana", 5, "Lovely"))
///         .await
///         .unwrap();
///     assert_eq!(review.restaurant_id, 1);
///     assert_eq!(gateway.create_review_calls(), 1);
/// }
/// ```
pub struct MockGateway {
    restaurants: RwLock<Vec<Restaurant>>,
    reviews: RwLock<Vec<Review>>,
    next_review_id: AtomicI64,
    reachable: AtomicBool,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    /// Number of calls to fail before succeeding again.
    remaining_failures: AtomicU32,
    rejected_reviewers: RwLock<HashSet<String>>,
    /// Simulated latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    fetch_restaurants_calls: AtomicU32,
    fetch_reviews_calls: AtomicU32,
    create_review_calls: AtomicU32,
    set_favorite_calls: AtomicU32,
}

impl std::fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGateway")
            .field("reachable", &self.reachable.load(Ordering::Relaxed))
            .field("total_calls", &self.total_calls())
            .finish()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create an empty, reachable mock.
    pub fn new() -> Self {
        Self {
            restaurants: RwLock::new(Vec::new()),
            reviews: RwLock::new(Vec::new()),
            next_review_id: AtomicI64::new(1),
            reachable: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
            fail_message: RwLock::new("Mock failure".to_string()),
            remaining_failures: AtomicU32::new(0),
            rejected_reviewers: RwLock::new(HashSet::new()),
            latency_ms: AtomicU64::new(0),
            fetch_restaurants_calls: AtomicU32::new(0),
            fetch_reviews_calls: AtomicU32::new(0),
            create_review_calls: AtomicU32::new(0),
            set_favorite_calls: AtomicU32::new(0),
        }
    }

    /// Create a mock serving the given restaurants.
    pub fn with_restaurants(restaurants: Vec<Restaurant>) -> Self {
        Self {
            restaurants: RwLock::new(restaurants),
            ..Self::new()
        }
    }

    // --- Test control methods ---

    /// Replace the served restaurants.
    pub async fn set_restaurants(&self, restaurants: Vec<Restaurant>) {
        *self.restaurants.write().await = restaurants;
    }

    /// Add server-side reviews. Later created reviews get ids above these.
    pub async fn add_reviews(&self, reviews: Vec<Review>) {
        if let Some(max) = reviews.iter().map(|r| r.id).max() {
            self.next_review_id.fetch_max(max + 1, Ordering::Relaxed);
        }
        self.reviews.write().await.extend(reviews);
    }

    /// Reviews the server has accepted, including seeded ones.
    pub async fn server_reviews(&self) -> Vec<Review> {
        self.reviews.read().await.clone()
    }

    /// Simulate losing or regaining the network.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    /// Make every call fail with a server error.
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Fail the next `count` calls, then succeed.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Reject every review submitted under this reviewer name.
    pub async fn reject_reviews_from(&self, name: &str) {
        self.rejected_reviewers.write().await.insert(name.to_string());
    }

    /// Set simulated latency for every call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn fetch_restaurants_calls(&self) -> u32 {
        self.fetch_restaurants_calls.load(Ordering::Relaxed)
    }

    pub fn fetch_reviews_calls(&self) -> u32 {
        self.fetch_reviews_calls.load(Ordering::Relaxed)
    }

    pub fn create_review_calls(&self) -> u32 {
        self.create_review_calls.load(Ordering::Relaxed)
    }

    pub fn set_favorite_calls(&self) -> u32 {
        self.set_favorite_calls.load(Ordering::Relaxed)
    }

    /// Calls of any kind, connectivity probes excluded.
    pub fn total_calls(&self) -> u32 {
        self.fetch_restaurants_calls()
            + self.fetch_reviews_calls()
            + self.create_review_calls()
            + self.set_favorite_calls()
    }

    /// Reset all call counters.
    pub fn reset_calls(&self) {
        self.fetch_restaurants_calls.store(0, Ordering::Relaxed);
        self.fetch_reviews_calls.store(0, Ordering::Relaxed);
        self.create_review_calls.store(0, Ordering::Relaxed);
        self.set_favorite_calls.store(0, Ordering::Relaxed);
    }

    async fn check_should_fail(&self, path: &str) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if !self.reachable.load(Ordering::Relaxed) {
            return Err(Error::NetworkUnavailable {
                url: format!("{}{}", MOCK_URL, path),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "mock gateway unreachable",
                )),
            });
        }

        // Check for transient failures first
        if self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(self.server_error().await);
        }

        if self.should_fail.load(Ordering::Relaxed) {
            Err(self.server_error().await)
        } else {
            Ok(())
        }
    }

    async fn server_error(&self) -> Error {
        Error::ServerError {
            status: 500,
            message: self.fail_message.read().await.clone(),
        }
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>> {
        self.fetch_restaurants_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail("/restaurants").await?;
        Ok(self.restaurants.read().await.clone())
    }

    async fn fetch_reviews(&self, restaurant_id: i64) -> Result<Vec<Review>> {
        self.fetch_reviews_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail("/reviews/").await?;
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn create_review(&self, draft: &ReviewDraft) -> Result<Review> {
        self.create_review_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail("/reviews/").await?;

        if self.rejected_reviewers.read().await.contains(&draft.name) {
            return Err(Error::ServerError {
                status: 400,
                message: format!("review from {} rejected", draft.name),
            });
        }

        let id = self.next_review_id.fetch_add(1, Ordering::Relaxed);
        let review = draft.clone().confirm(id, now_millis());
        self.reviews.write().await.push(review.clone());
        Ok(review)
    }

    async fn set_favorite(&self, restaurant_id: i64, is_favorite: bool) -> Result<Restaurant> {
        self.set_favorite_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail("/restaurants/").await?;

        let mut restaurants = self.restaurants.write().await;
        let restaurant = restaurants
            .iter_mut()
            .find(|r| r.id == restaurant_id)
            .ok_or_else(|| Error::ServerError {
                status: 404,
                message: format!("restaurant {} not found", restaurant_id),
            })?;
        restaurant.is_favorite = is_favorite;
        Ok(restaurant.clone())
    }

    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }
}

//! Read-through cache and offline write queue over the local store.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

use restaurant_store::{Store, StoreStats};
use restaurant_types::{PendingReview, Restaurant, Review, ReviewDraft, now_millis};

use crate::connectivity::Connectivity;
use crate::error::{Error, Result};
use crate::gateway::RemoteGateway;
use crate::options::{ReplayPolicy, SyncOptions};

/// Reviews shown for one restaurant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RestaurantReviews {
    /// Server-confirmed reviews, oldest first.
    pub synced: Vec<Review>,
    /// Reviews written offline and not yet replayed, oldest first.
    pub pending: Vec<PendingReview>,
}

impl RestaurantReviews {
    pub fn len(&self) -> usize {
        self.synced.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of submitting a review.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Accepted by the server and cached.
    Synced(Review),
    /// Stored locally, to be sent on the next drain.
    Queued(PendingReview),
}

/// Result of toggling a favorite.
#[derive(Debug, Clone, PartialEq)]
pub enum FavoriteOutcome {
    /// Accepted by the server; the returned restaurant was cached.
    Synced(Restaurant),
    /// Applied locally, to be pushed on the next drain.
    Queued { id: i64, is_favorite: bool },
}

/// What a drain did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Pending reviews in the drained snapshot.
    pub attempted: usize,
    /// Reviews accepted by the server and moved to the synced set.
    pub synced: usize,
    /// Reviews the server did not accept.
    pub failed: usize,
    /// Failed reviews dropped under [`ReplayPolicy::LossyClear`].
    pub discarded: usize,
    /// Offline favorite toggles pushed to the server.
    pub favorites_synced: usize,
}

impl DrainReport {
    /// True when the drain had nothing to send.
    pub fn is_empty(&self) -> bool {
        self.attempted == 0 && self.favorites_synced == 0
    }
}

/// Mediates every read and write between the caller, the local store and
/// the remote API.
///
/// Reads are served from the store when it has data and fall through to the
/// gateway otherwise. Writes go straight to the gateway while online and are
/// queued in the store while offline. The store lock is never held across a
/// gateway call.
pub struct SyncCoordinator<G> {
    store: Arc<Mutex<Store>>,
    gateway: G,
    connectivity: Connectivity,
    options: SyncOptions,
    drain_lock: Mutex<()>,
    replay_requested: Arc<Notify>,
}

impl<G: RemoteGateway> SyncCoordinator<G> {
    pub fn new(store: Store, gateway: G, connectivity: Connectivity, options: SyncOptions) -> Self {
        Self::with_shared_store(Arc::new(Mutex::new(store)), gateway, connectivity, options)
    }

    /// Create a coordinator over a store shared with other tasks.
    pub fn with_shared_store(
        store: Arc<Mutex<Store>>,
        gateway: G,
        connectivity: Connectivity,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            gateway,
            connectivity,
            options,
            drain_lock: Mutex::new(()),
            replay_requested: Arc::new(Notify::new()),
        }
    }

    pub fn store(&self) -> &Arc<Mutex<Store>> {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Notified whenever a write is queued offline.
    pub fn replay_trigger(&self) -> Arc<Notify> {
        Arc::clone(&self.replay_requested)
    }

    /// Probe the gateway and update the connectivity flag.
    pub async fn check_connectivity(&self) -> bool {
        let online = self.gateway.is_reachable().await;
        self.connectivity.set_online(online);
        online
    }

    // === Read path ===

    /// All restaurants, from the cache when it has any.
    ///
    /// There is no freshness check: a non-empty cache is always served.
    pub async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>> {
        let cached = self.store.lock().await.list_restaurants()?;
        if !cached.is_empty() {
            debug!("Cache hit: {} restaurant(s)", cached.len());
            return Ok(cached);
        }

        debug!("Cache miss: restaurants");
        self.refresh_restaurants().await
    }

    /// Fetch restaurants from the API, store them and return the cached set.
    pub async fn refresh_restaurants(&self) -> Result<Vec<Restaurant>> {
        if !self.is_online() {
            return Err(Error::Offline("restaurant list".to_string()));
        }

        let fetched = self.gateway.fetch_restaurants().await?;

        let store = self.store.lock().await;
        store.put_restaurants_capped(&fetched, self.options.retention)?;
        let restaurants = store.list_restaurants()?;
        info!(
            "Fetched {} restaurant(s), {} cached",
            fetched.len(),
            restaurants.len()
        );
        Ok(restaurants)
    }

    /// Reviews of a restaurant, with reviews still queued offline appended.
    pub async fn fetch_reviews_for(&self, restaurant_id: i64) -> Result<RestaurantReviews> {
        let (mut synced, pending) = {
            let store = self.store.lock().await;
            (
                store.reviews_for_restaurant(restaurant_id)?,
                store.pending_reviews_for_restaurant(restaurant_id)?,
            )
        };

        if !synced.is_empty() {
            debug!(
                "Cache hit: {} review(s) for restaurant {}",
                synced.len(),
                restaurant_id
            );
        } else if self.is_online() {
            debug!("Cache miss: reviews for restaurant {}", restaurant_id);
            let fetched = self.gateway.fetch_reviews(restaurant_id).await?;

            let store = self.store.lock().await;
            store.put_reviews_capped(&fetched, self.options.retention)?;
            synced = store.reviews_for_restaurant(restaurant_id)?;
        } else if pending.is_empty() {
            return Err(Error::Offline(format!("reviews for restaurant {}", restaurant_id)));
        }

        Ok(RestaurantReviews { synced, pending })
    }

    /// A single restaurant from the restaurant list.
    pub async fn fetch_restaurant_by_id(&self, id: i64) -> Result<Restaurant> {
        self.fetch_restaurants()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("restaurant {}", id)))
    }

    pub async fn fetch_by_cuisine(&self, cuisine: &str) -> Result<Vec<Restaurant>> {
        self.fetch_by_cuisine_and_neighborhood(Some(cuisine), None).await
    }

    pub async fn fetch_by_neighborhood(&self, neighborhood: &str) -> Result<Vec<Restaurant>> {
        self.fetch_by_cuisine_and_neighborhood(None, Some(neighborhood)).await
    }

    /// Restaurants matching both filters; `None` matches everything.
    pub async fn fetch_by_cuisine_and_neighborhood(
        &self,
        cuisine: Option<&str>,
        neighborhood: Option<&str>,
    ) -> Result<Vec<Restaurant>> {
        let restaurants = self.fetch_restaurants().await?;
        Ok(restaurants
            .into_iter()
            .filter(|r| cuisine.is_none_or(|c| r.cuisine_type == c))
            .filter(|r| neighborhood.is_none_or(|n| r.neighborhood == n))
            .collect())
    }

    /// Distinct neighborhoods in first-seen order.
    pub async fn fetch_neighborhoods(&self) -> Result<Vec<String>> {
        let restaurants = self.fetch_restaurants().await?;
        Ok(unique_in_order(restaurants.iter().map(|r| r.neighborhood.as_str())))
    }

    /// Distinct cuisines in first-seen order.
    pub async fn fetch_cuisines(&self) -> Result<Vec<String>> {
        let restaurants = self.fetch_restaurants().await?;
        Ok(unique_in_order(restaurants.iter().map(|r| r.cuisine_type.as_str())))
    }

    /// Queued reviews in submission order.
    pub async fn pending_reviews(&self) -> Result<Vec<PendingReview>> {
        Ok(self.store.lock().await.pending_reviews()?)
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(self.store.lock().await.stats()?)
    }

    // === Write path ===

    /// Submit a review, or queue it while offline.
    ///
    /// The draft is validated before anything is stored or sent. An online
    /// failure is returned to the caller and nothing is queued.
    pub async fn submit_review(&self, draft: ReviewDraft) -> Result<SubmitOutcome> {
        draft.validate()?;

        if !self.is_online() {
            let pending = self
                .store
                .lock()
                .await
                .insert_pending_review(&draft, now_millis())?;
            self.request_replay();
            return Ok(SubmitOutcome::Queued(pending));
        }

        let review = match self.gateway.create_review(&draft).await {
            Ok(review) => review,
            Err(e) => {
                warn!(
                    "Failed to submit review for restaurant {}: {}",
                    draft.restaurant_id, e
                );
                return Err(e);
            }
        };

        self.store
            .lock()
            .await
            .put_reviews_capped(std::slice::from_ref(&review), self.options.retention)?;
        info!(
            "Review {} for restaurant {} synced",
            review.id, review.restaurant_id
        );
        Ok(SubmitOutcome::Synced(review))
    }

    /// Mark or unmark a restaurant as favorite.
    pub async fn set_favorite(&self, id: i64, is_favorite: bool) -> Result<FavoriteOutcome> {
        if !self.is_online() {
            if !self.store.lock().await.queue_favorite(id, is_favorite)? {
                debug!("Restaurant {} not cached, queueing toggle only", id);
            }
            self.request_replay();
            info!("Favorite toggle for restaurant {} queued", id);
            return Ok(FavoriteOutcome::Queued { id, is_favorite });
        }

        let restaurant = match self.gateway.set_favorite(id, is_favorite).await {
            Ok(restaurant) => restaurant,
            Err(e) => {
                warn!("Failed to update favorite for restaurant {}: {}", id, e);
                return Err(e);
            }
        };

        self.store.lock().await.confirm_favorite(&restaurant)?;
        Ok(FavoriteOutcome::Synced(restaurant))
    }

    fn request_replay(&self) {
        self.replay_requested.notify_one();
    }

    // === Replay ===

    /// Send everything queued offline.
    ///
    /// Drains are serialized. Only the pending reviews present when the
    /// drain starts are sent or cleared; reviews queued meanwhile wait for
    /// the next drain. Each success is promoted in its own transaction.
    pub async fn drain_pending(&self) -> Result<DrainReport> {
        if !self.is_online() {
            debug!("Offline, skipping drain");
            return Ok(DrainReport::default());
        }

        let _guard = self.drain_lock.lock().await;

        let snapshot = self.store.lock().await.pending_reviews()?;
        let mut report = DrainReport {
            attempted: snapshot.len(),
            ..Default::default()
        };
        if !snapshot.is_empty() {
            info!("Replaying {} pending review(s)", snapshot.len());
        }

        let mut failed_ids = Vec::new();
        for pending in &snapshot {
            match self.gateway.create_review(&pending.draft).await {
                Ok(review) => {
                    let promoted = self.store.lock().await.promote_pending(
                        pending.id,
                        &review,
                        self.options.retention,
                    )?;
                    if promoted {
                        report.synced += 1;
                    }
                }
                Err(e) => {
                    warn!("Replay of pending review {} failed: {}", pending.id, e);
                    report.failed += 1;
                    failed_ids.push(pending.id);
                }
            }
        }

        if self.options.replay_policy == ReplayPolicy::LossyClear && !failed_ids.is_empty() {
            report.discarded = self.store.lock().await.delete_pending(&failed_ids)?;
            warn!(
                "Discarded {} pending review(s) that failed to replay",
                report.discarded
            );
        }

        report.favorites_synced = self.push_favorites().await?;

        if !report.is_empty() {
            info!(
                "Drain finished: {} synced, {} failed, {} discarded, {} favorite(s)",
                report.synced, report.failed, report.discarded, report.favorites_synced
            );
        }
        Ok(report)
    }

    async fn push_favorites(&self) -> Result<usize> {
        let markers = self.store.lock().await.unsynced_favorites()?;
        let mut pushed = 0;

        for marker in markers {
            match self.gateway.set_favorite(marker.id, marker.is_favorite).await {
                Ok(restaurant) => {
                    let store = self.store.lock().await;
                    // A newer toggle made during the call stays queued.
                    if store.get_favorite(marker.id)? == Some(marker) {
                        store.confirm_favorite(&restaurant)?;
                    }
                    pushed += 1;
                }
                Err(e) => {
                    warn!("Favorite push for restaurant {} failed: {}", marker.id, e);
                }
            }
        }

        Ok(pushed)
    }
}

fn unique_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(String::from)
        .collect()
}

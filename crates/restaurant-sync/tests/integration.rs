//! End-to-end tests for the offline queue and the replay worker, using the
//! mock gateway and an on-disk store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use restaurant_store::{RecordSet, Store};
use restaurant_sync::{
    Connectivity, MockGateway, ReplayPolicy, ReplayWorker, SubmitOutcome, SyncCoordinator,
    SyncOptions,
};
use restaurant_types::{LatLng, Restaurant, ReviewDraft, from_unix_millis};

const WAIT: Duration = Duration::from_secs(5);

fn restaurant(id: i64) -> Restaurant {
    Restaurant {
        id,
        name: format!("Restaurant {id}"),
        address: String::new(),
        neighborhood: "Manhattan".to_string(),
        cuisine_type: "Asian".to_string(),
        latlng: LatLng {
            lat: 40.71,
            lng: -73.99,
        },
        photograph: None,
        operating_hours: BTreeMap::new(),
        is_favorite: false,
        created_at: from_unix_millis(1_000 * id).unwrap(),
    }
}

fn coordinator(store: Store, online: bool) -> Arc<SyncCoordinator<MockGateway>> {
    Arc::new(SyncCoordinator::new(
        store,
        MockGateway::with_restaurants((1..=3).map(restaurant).collect()),
        Connectivity::new(online),
        SyncOptions::default(),
    ))
}

async fn pending_count(c: &SyncCoordinator<MockGateway>) -> u64 {
    c.store()
        .lock()
        .await
        .count(RecordSet::PendingReviews)
        .unwrap()
}

#[tokio::test]
async fn test_worker_drains_when_connectivity_restored() {
    let c = coordinator(Store::open_in_memory().unwrap(), false);
    let worker = ReplayWorker::spawn(Arc::clone(&c));
    let mut reports = worker.subscribe();

    for name in ["Ana", "Bo"] {
        let outcome = c
            .submit_review(ReviewDraft::new(1, name, 5, "Great"))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Queued(_)));
    }
    assert_eq!(c.gateway().create_review_calls(), 0);

    c.connectivity().set_online(true);

    // Wait for the drain that sent the queue; offline triggers may report
    // empty drains first.
    let report = tokio::time::timeout(WAIT, async {
        loop {
            let report = reports.recv().await.unwrap();
            if report.attempted > 0 {
                return report;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(report.synced, 2);
    assert_eq!(pending_count(&c).await, 0);
    assert_eq!(c.fetch_reviews_for(1).await.unwrap().synced.len(), 2);

    worker.shutdown().await;
}

#[tokio::test]
async fn test_worker_stops_on_cancel() {
    let c = coordinator(Store::open_in_memory().unwrap(), false);
    let worker = ReplayWorker::spawn(c);
    assert!(worker.is_active());

    worker.cancellation_token().cancel();
    tokio::time::timeout(WAIT, async {
        while worker.is_active() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_worker_keeps_failed_reviews_queued() {
    let c = coordinator(Store::open_in_memory().unwrap(), false);
    c.submit_review(ReviewDraft::new(2, "Spam", 1, "Buy now"))
        .await
        .unwrap();
    c.gateway().reject_reviews_from("Spam").await;

    let worker = ReplayWorker::spawn(Arc::clone(&c));
    let mut reports = worker.subscribe();
    c.connectivity().set_online(true);

    let report = tokio::time::timeout(WAIT, async {
        loop {
            let report = reports.recv().await.unwrap();
            if report.attempted > 0 {
                return report;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(pending_count(&c).await, 1);
    worker.shutdown().await;
}

#[tokio::test]
async fn test_queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    {
        let c = coordinator(Store::open(&path).unwrap(), false);
        c.submit_review(ReviewDraft::new(3, "Ana", 4, "Nice"))
            .await
            .unwrap();
        c.set_favorite(3, true).await.unwrap();
    }

    let options = SyncOptions::default().replay_policy(ReplayPolicy::RetainFailed);
    let c = SyncCoordinator::new(
        Store::open(&path).unwrap(),
        MockGateway::with_restaurants((1..=3).map(restaurant).collect()),
        Connectivity::online(),
        options,
    );

    let report = c.drain_pending().await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(report.favorites_synced, 1);
    assert_eq!(pending_count(&c).await, 0);
}

#[tokio::test]
async fn test_favorite_toggle_then_refetch() {
    let c = coordinator(Store::open_in_memory().unwrap(), true);
    c.fetch_restaurants().await.unwrap();

    c.set_favorite(1, true).await.unwrap();
    let restaurants = c.refresh_restaurants().await.unwrap();

    let matching: Vec<_> = restaurants.iter().filter(|r| r.id == 1).collect();
    assert_eq!(matching.len(), 1);
    assert!(matching[0].is_favorite);
}

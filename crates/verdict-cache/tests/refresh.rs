mod common;

use std::time::Duration;

use common::*;
use tokio::time::sleep;
use verdict_cache::prelude::*;

fn refresh_config() -> CacheConfig {
    CacheConfig::default()
        .with_default_ttl(Duration::from_millis(200))
        .with_hot_threshold(2)
        .with_refresh_trigger_fraction(0.5)
        .with_background_refresh(true)
        .with_worker_pool_size(2)
}

#[tokio::test]
async fn hot_entry_is_refreshed_ahead_of_expiry() {
    init_tracing();
    let source = CountingSource::new();
    let cache = facade(refresh_config(), &source, &policies()).await;
    let request = read("User::alice", "Document::hot");

    // Frequency 1 is already warm: 1.5 x 200ms.
    cache.authorize(&request).await.unwrap();
    assert_eq!(cache.entry_ttl(&request), Some(Duration::from_millis(300)));

    // Hot but young: no refresh yet.
    cache.authorize(&request).await.unwrap();
    assert_eq!(cache.pending_refreshes(), 0);

    sleep(Duration::from_millis(180)).await;
    assert!(cache.authorize(&request).await.unwrap());
    wait_for_refreshes(&cache).await;

    assert_eq!(source.calls(), 2);
    assert_eq!(cache.entry_ttl(&request), Some(Duration::from_millis(400)));
    cache.shutdown().await;
}

#[tokio::test]
async fn cold_entries_are_never_refreshed() {
    let source = CountingSource::new();
    let config = refresh_config().with_hot_threshold(50);
    let cache = facade(config, &source, &policies()).await;
    let request = read("User::alice", "Document::cold");

    cache.authorize(&request).await.unwrap();
    sleep(Duration::from_millis(150)).await;
    cache.authorize(&request).await.unwrap();
    assert_eq!(cache.pending_refreshes(), 0);
    assert_eq!(source.calls(), 1);
    cache.shutdown().await;
}

#[tokio::test]
async fn refresh_disabled_by_default() {
    let source = CountingSource::new();
    let config = refresh_config().with_background_refresh(false);
    let cache = facade(config, &source, &policies()).await;
    let request = read("User::alice", "Document::hot");

    for _ in 0..3 {
        cache.authorize(&request).await.unwrap();
    }
    sleep(Duration::from_millis(180)).await;
    cache.authorize(&request).await.unwrap();
    assert_eq!(cache.pending_refreshes(), 0);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_serving_the_stale_entry() {
    init_tracing();
    let source = CountingSource::new();
    let cache = facade(refresh_config(), &source, &policies()).await;
    let request = read("User::alice", "Document::hot");

    cache.authorize(&request).await.unwrap();
    cache.authorize(&request).await.unwrap();
    source.set_failing(true);

    sleep(Duration::from_millis(180)).await;
    assert!(cache.authorize(&request).await.unwrap());
    wait_for_refreshes(&cache).await;

    assert_eq!(source.calls(), 2);
    assert!(cache.contains(&request));
    assert!(cache.authorize(&request).await.unwrap());
    assert_eq!(cache.entry_ttl(&request), Some(Duration::from_millis(300)));
    cache.shutdown().await;
}

#[tokio::test]
async fn refresh_racing_a_policy_change_is_discarded() {
    init_tracing();
    let source = CountingSource::new();
    let set = policies();
    let cache = facade(refresh_config(), &source, &set).await;
    let request = read("User::alice", "Document::hot");

    cache.authorize(&request).await.unwrap();
    cache.authorize(&request).await.unwrap();
    sleep(Duration::from_millis(180)).await;

    source.set_delay(Duration::from_millis(50));
    cache.authorize(&request).await.unwrap();
    assert_eq!(cache.pending_refreshes(), 1);

    set.upsert("deny-all", "forbid(principal, action, resource);");
    assert_eq!(cache.invalidate_on_policy_change().await, 1);
    wait_for_refreshes(&cache).await;

    assert!(!cache.contains(&request));
    assert_eq!(cache.len(), 0);
    cache.shutdown().await;
}

#[tokio::test]
async fn shutdown_cancels_slow_refreshes() {
    let source = CountingSource::new();
    let cache = facade(refresh_config(), &source, &policies()).await;
    let request = read("User::alice", "Document::hot");

    cache.authorize(&request).await.unwrap();
    cache.authorize(&request).await.unwrap();
    sleep(Duration::from_millis(180)).await;
    source.set_delay(Duration::from_secs(30));
    cache.authorize(&request).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), cache.shutdown())
        .await
        .expect("shutdown must not wait for the slow source");
    assert_eq!(cache.pending_refreshes(), 0);

    // Lookups keep working after shutdown; only refresh-ahead stops.
    source.set_delay(Duration::ZERO);
    assert!(cache.authorize(&request).await.unwrap());
}

//! Connection manager feeding the message store, observed through the hub.

mod common;

use common::{eventually, frame, frame_with_age, MockDialer};
use pulseboard::connection::{ConnectionConfig, ConnectionManager};
use pulseboard::store::MessageStore;
use std::sync::Arc;
use std::time::Duration;

fn spawn(
    store: &Arc<MessageStore>,
) -> (
    pulseboard::connection::ConnectionHandle,
    tokio::sync::mpsc::UnboundedReceiver<common::ServerEnd>,
) {
    let (dialer, accepted) = MockDialer::new(true);
    let handle = ConnectionManager::spawn(
        ConnectionConfig::new("ws://probe.test/ws"),
        dialer,
        store.clone(),
    );
    (handle, accepted)
}

#[tokio::test]
async fn test_history_keeps_newest_thirty() {
    let store = Arc::new(MessageStore::new());
    let (_handle, mut accepted) = spawn(&store);
    let server = accepted.recv().await.unwrap();

    for now in 1..=35 {
        server.send_frame(frame(now));
    }
    eventually(|| store.frames_received() == 35).await;

    let times: Vec<i64> = store.history().iter().map(|s| s.server_time).collect();
    assert_eq!(times, (6..=35).collect::<Vec<_>>());
    assert_eq!(store.latest().unwrap().server_time, 35);
}

#[tokio::test]
async fn test_consumer_sees_increasing_snapshots() {
    let store = Arc::new(MessageStore::new());
    let mut updates = store.hub().subscribe_latest();
    let (_handle, mut accepted) = spawn(&store);
    let server = accepted.recv().await.unwrap();

    let consumer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(snapshot) = updates.next_snapshot().await {
            seen.push(snapshot.server_time);
            if snapshot.server_time == 100 {
                break;
            }
        }
        seen
    });

    for now in 1..=100 {
        server.send_frame(frame(now));
    }

    let seen = tokio::time::timeout(Duration::from_secs(5), consumer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_history_subscriber_sees_committed_buffer() {
    let store = Arc::new(MessageStore::with_capacity(3));
    let mut history = store.hub().subscribe_history();
    let (_handle, mut accepted) = spawn(&store);
    let server = accepted.recv().await.unwrap();

    for now in 1..=5 {
        server.send_frame(frame(now));
    }
    eventually(|| store.frames_received() == 5).await;

    let view = history.next().await.unwrap();
    let times: Vec<i64> = view.iter().map(|s| s.server_time).collect();
    assert_eq!(times, vec![3, 4, 5]);
}

#[tokio::test]
async fn test_invalid_frame_is_not_published() {
    let store = Arc::new(MessageStore::new());
    let mut updates = store.hub().subscribe_latest();
    let (_handle, mut accepted) = spawn(&store);
    let server = accepted.recv().await.unwrap();

    server.send_frame(frame(1));
    assert_eq!(updates.next_snapshot().await.unwrap().server_time, 1);

    server.send_frame("{\"servers\":[]}");
    server.send_frame("garbage");
    eventually(|| store.frames_received() == 3).await;

    assert!(!updates.has_changed());
    assert_eq!(store.decode_failures(), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.latest().unwrap().server_time, 1);
}

#[tokio::test]
async fn test_unsubscribe_releases_consumer() {
    let store = Arc::new(MessageStore::new());
    let latest = store.hub().subscribe_latest();
    let history = store.hub().subscribe_history();
    assert_eq!(store.hub().subscriber_count(), 2);

    latest.unsubscribe();
    drop(history);
    assert_eq!(store.hub().subscriber_count(), 0);

    // Publishing with nobody listening still commits.
    store.ingest(&frame(7)).unwrap();
    assert_eq!(store.latest().unwrap().server_time, 7);
}

#[tokio::test]
async fn test_history_survives_reconnect() {
    let store = Arc::new(MessageStore::new());
    let (_handle, mut accepted) = spawn(&store);

    let first = accepted.recv().await.unwrap();
    first.send_frame(frame(1));
    eventually(|| store.len() == 1).await;
    first.close();

    let second = tokio::time::timeout(Duration::from_secs(5), accepted.recv())
        .await
        .unwrap()
        .unwrap();
    second.send_frame(frame(2));
    eventually(|| store.len() == 2).await;

    let times: Vec<i64> = store.history().iter().map(|s| s.server_time).collect();
    assert_eq!(times, vec![1, 2]);
}

#[test]
fn test_presence_follows_backend_clock() {
    let store = MessageStore::new();
    let now = 1_700_000_000_000;

    store.ingest(&frame_with_age(now, 1, 10_000)).unwrap();
    assert!(store.latest().unwrap().views()[0].online);

    store.ingest(&frame_with_age(now, 1, 30_000)).unwrap();
    assert!(store.latest().unwrap().views()[0].online);

    store.ingest(&frame_with_age(now, 1, 45_000)).unwrap();
    let latest = store.latest().unwrap();
    assert!(!latest.views()[0].online);
    assert_eq!(latest.overview().offline, 1);

    let series = store.series(1);
    assert_eq!(
        series.iter().map(|p| p.online).collect::<Vec<_>>(),
        vec![true, true, false]
    );
}

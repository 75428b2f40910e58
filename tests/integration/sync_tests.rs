//! Sync stage against a mock ingestion service

use crate::common::{normalized_record, requests_to, sync_config, FailFor, IMPORT_PATH, SUMMARY_PATH};
use carfeed::storage::{NormalizedStore, SqliteStore};
use carfeed::sync::{run_sync, SyncDispatcher};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_url(n: usize) -> String {
    format!("https://www.autoscout24.com/offers/car-{}", n)
}

fn store_with_records(dir: &TempDir, count: usize) -> SqliteStore {
    let mut store = SqliteStore::new(&dir.path().join("carfeed.db")).unwrap();
    let run_id = store.create_run("hash").unwrap();
    for n in 1..=count {
        store
            .insert_normalized(&normalized_record(&listing_url(n)), run_id)
            .unwrap();
    }
    store
}

#[tokio::test]
async fn test_failed_record_does_not_stop_the_pass() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(FailFor(listing_url(4)))
        .expect(10)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store_with_records(&dir, 10);
    let dispatcher = SyncDispatcher::new(&sync_config(&server.uri())).unwrap();

    let tally = run_sync(&mut store, &dispatcher).await.unwrap();

    assert_eq!(tally.succeeded, 9);
    assert_eq!(tally.failed, 1);

    // Records 5 to 10 were still sent, in order
    let sent: Vec<String> = requests_to(&server, IMPORT_PATH)
        .await
        .iter()
        .map(|r| {
            let body: serde_json::Value = r.body_json().unwrap();
            body["cars"][0]["url"].as_str().unwrap().to_string()
        })
        .collect();
    let expected: Vec<String> = (1..=10).map(listing_url).collect();
    assert_eq!(sent, expected);

    let summary = requests_to(&server, SUMMARY_PATH).await;
    let body: serde_json::Value = summary[0].body_json().unwrap();
    assert_eq!(body, serde_json::json!({ "count": 9 }));

    // Only the failed record is left for the next run
    let pending = store.pending_sync().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, listing_url(4));
    assert_eq!(store.count_synced().unwrap(), 9);
}

#[tokio::test]
async fn test_payload_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store_with_records(&dir, 1);
    let dispatcher = SyncDispatcher::new(&sync_config(&server.uri())).unwrap();

    run_sync(&mut store, &dispatcher).await.unwrap();

    let requests = requests_to(&server, IMPORT_PATH).await;
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["notify"], serde_json::json!(false));
    assert_eq!(body["cars"].as_array().unwrap().len(), 1);
    assert_eq!(body["cars"][0]["brand"], serde_json::json!("Audi"));
    assert_eq!(body["cars"][0]["price_numeric"], serde_json::json!(12500));
    assert_eq!(body["cars"][0]["valid"], serde_json::json!(true));
}

#[tokio::test]
async fn test_summary_failure_is_tolerated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store_with_records(&dir, 2);
    let dispatcher = SyncDispatcher::new(&sync_config(&server.uri())).unwrap();

    let pending = store.pending_sync().unwrap();
    let summary = dispatcher.sync(&pending).await;
    assert_eq!(summary.succeeded, 2);
    assert!(!summary.summary_sent);

    let tally = run_sync(&mut store, &dispatcher).await.unwrap();
    assert_eq!(tally.succeeded, 2);
    assert_eq!(store.count_synced().unwrap(), 2);
}

#[tokio::test]
async fn test_unreachable_endpoint_counts_every_record_as_failed() {
    let dir = TempDir::new().unwrap();
    let mut store = store_with_records(&dir, 3);
    // Nothing listens on the discard port
    let dispatcher = SyncDispatcher::new(&sync_config("http://127.0.0.1:9")).unwrap();

    let tally = run_sync(&mut store, &dispatcher).await.unwrap();

    assert_eq!(tally.succeeded, 0);
    assert_eq!(tally.failed, 3);
    assert_eq!(store.pending_sync().unwrap().len(), 3);
}

#[tokio::test]
async fn test_summary_skipped_when_nothing_delivered() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(422))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store_with_records(&dir, 2);
    let dispatcher = SyncDispatcher::new(&sync_config(&server.uri())).unwrap();

    let tally = run_sync(&mut store, &dispatcher).await.unwrap();

    assert_eq!(tally.failed, 2);
    assert_eq!(store.count_synced().unwrap(), 0);
}

//! Whole-pipeline runs against a mock marketplace and ingestion service

use crate::common::{
    create_test_config, detail_page, requests_to, results_page, IMPORT_PATH, SUMMARY_PATH,
};
use carfeed::pipeline::Stage;
use carfeed::storage::{open_store, Ledger, NormalizedStore, RunStatus};
use carfeed::{run_pipeline_once, Pipeline};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts two results pages' worth of marketplace: three cards, one of them unbranded
async fn mount_marketplace(server: &MockServer) {
    let cards = results_page(&[
        ("audi-a4-1", "Audi A4", "€ 12,500"),
        ("bmw-320d-2", "BMW 320d", "€ 18,900"),
        ("mystery-3", "Mystery Roadster", "€ 7,000"),
    ]);

    Mock::given(method("GET"))
        .and(path("/lst"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(cards))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lst"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(server)
        .await;

    for (slug, mileage, registration) in [
        ("audi-a4-1", "88,000 km", "06/2018"),
        ("bmw-320d-2", "45 km", "2020"),
        ("mystery-3", "120,000 km", "01/2012"),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/offers/{}", slug)))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(detail_page(mileage, registration)),
            )
            .mount(server)
            .await;
    }
}

async fn mount_ingestion(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(SUMMARY_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_pipeline_run() {
    let server = MockServer::start().await;
    mount_marketplace(&server).await;
    mount_ingestion(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let mut pipeline = Pipeline::new(config.clone(), "test-hash").unwrap();

    let report = pipeline.run_once().await;

    assert!(report.is_success(), "run failed: {:?}", report.error);
    assert_eq!(report.tallies.crawl.succeeded, 3);
    assert_eq!(report.tallies.normalize.succeeded, 2);
    assert_eq!(report.tallies.normalize.failed, 1);
    assert_eq!(report.tallies.sync.succeeded, 2);

    // The ledger holds every extracted record, tracking parameters stripped
    let ledger = Ledger::load_strict(&config.storage.ledger_path).unwrap();
    assert_eq!(ledger.len(), 3);
    let audi_url = format!("{}/offers/audi-a4-1", server.uri());
    assert!(ledger.contains(&audi_url));

    let audi = &ledger.records()[0];
    assert_eq!(audi.title, "Audi A4");
    assert_eq!(audi.price_text, "€ 12,500");
    assert_eq!(
        audi.images,
        vec!["https://img.example/abc/1280x960.webp".to_string()]
    );
    assert_eq!(audi.seller_info.phones, vec!["+49 30 1234567".to_string()]);

    // Delivered payloads are typed
    let imports = requests_to(&server, IMPORT_PATH).await;
    assert_eq!(imports.len(), 2);
    let bmw: serde_json::Value = imports[1].body_json().unwrap();
    assert_eq!(bmw["cars"][0]["brand"], serde_json::json!("BMW"));
    assert_eq!(bmw["cars"][0]["mileage_numeric"], serde_json::json!(45000));
    assert_eq!(bmw["cars"][0]["year_numeric"], serde_json::json!(2020));
    assert_eq!(bmw["cars"][0]["power_kw"], serde_json::json!(110));
    assert_eq!(bmw["cars"][0]["fuel_type"], serde_json::json!("diesel"));

    let summaries = requests_to(&server, SUMMARY_PATH).await;
    let body: serde_json::Value = summaries[0].body_json().unwrap();
    assert_eq!(body, serde_json::json!({ "count": 2 }));

    // The unbranded listing waits for review
    let store = open_store(Path::new(&config.storage.database_path)).unwrap();
    let breakdown = store.review_breakdown().unwrap();
    assert_eq!(breakdown.values().sum::<u64>(), 1);

    let run = store.get_run(report.run_id.unwrap()).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
}

#[tokio::test]
async fn test_rerun_yields_zero_new_records() {
    let server = MockServer::start().await;
    mount_marketplace(&server).await;
    mount_ingestion(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let first = Pipeline::new(config.clone(), "h").unwrap().run_once().await;
    assert!(first.is_success());

    let second = Pipeline::new(config.clone(), "h").unwrap().run_once().await;

    assert!(second.is_success());
    assert_eq!(second.tallies.crawl.succeeded, 0);
    assert_eq!(second.tallies.crawl.skipped, 3);
    assert_eq!(second.tallies.normalize.succeeded, 0);
    assert_eq!(second.tallies.sync.succeeded, 0);

    // Only the first run delivered anything
    assert_eq!(requests_to(&server, IMPORT_PATH).await.len(), 2);
    assert_eq!(requests_to(&server, SUMMARY_PATH).await.len(), 1);

    let ledger = Ledger::load_strict(&config.storage.ledger_path).unwrap();
    assert_eq!(ledger.len(), 3);
}

#[tokio::test]
async fn test_single_stage_run() {
    let server = MockServer::start().await;
    mount_marketplace(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let mut pipeline = Pipeline::new(config.clone(), "h").unwrap();

    let report = pipeline.run_stages(&[Stage::Crawl]).await;

    assert!(report.is_success());
    assert_eq!(report.completed, vec![Stage::Crawl]);
    assert_eq!(report.tallies.crawl.succeeded, 3);

    let store = open_store(Path::new(&config.storage.database_path)).unwrap();
    assert_eq!(store.count_normalized().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_ledger_short_circuits_sync() {
    let server = MockServer::start().await;
    mount_ingestion(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let mut pipeline = Pipeline::new(config, "h").unwrap();

    let report = pipeline.run_stages(&[Stage::Normalize, Stage::Sync]).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.failed_stage, Some(Stage::Normalize));
    assert!(requests_to(&server, IMPORT_PATH).await.is_empty());
}

#[tokio::test]
async fn test_run_pipeline_once_from_config_file() {
    let server = MockServer::start().await;
    mount_marketplace(&server).await;
    mount_ingestion(&server).await;

    let dir = TempDir::new().unwrap();
    let toml = format!(
        r#"
[crawler]
start-url = "{uri}/lst"
max-pages = 3
settle-ms = 0
results-timeout-ms = 10
section-timeout-ms = 10
gallery-timeout-ms = 10

[rate-limit]
cooldown-secs = 0

[storage]
ledger-path = "{ledger}"
database-path = "{db}"

[sync]
endpoint = "{uri}{import}"
summary-endpoint = "{uri}{summary}"
inter-request-delay-ms = 0
"#,
        uri = server.uri(),
        ledger = dir.path().join("output.json").display(),
        db = dir.path().join("carfeed.db").display(),
        import = IMPORT_PATH,
        summary = SUMMARY_PATH,
    );
    let config_path = dir.path().join("carfeed.toml");
    std::fs::write(&config_path, toml).unwrap();

    let report = run_pipeline_once(&config_path).await;

    assert!(report.is_success(), "run failed: {:?}", report.error);
    assert_eq!(report.tallies.sync.succeeded, 2);
}

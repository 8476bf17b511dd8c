//! Integration tests for the HTTP clients against the in-process mocks
//!
//! Tests cover:
//! - Metadata batching and per-batch failure handling
//! - Store upsert, missing-duration query and patch
//! - Feed download error reporting

use std::time::Duration;

use mediasync_common::config::{FeedConfig, MetadataConfig, StoreConfig};
use mediasync_common::models::VideoRecord;
use mediasync_common::services::{FeedClient, MetadataClient, PatchOutcome, StoreClient};
use mediasync_common::Error;
use mediasync_mock::fixtures::three_entry_feed;
use mediasync_mock::{MockServer, MockState, MockVideo};
use serde_json::json;

const SERVICE_KEY: &str = "service-role-test-key";

async fn start_server() -> MockServer {
    let state = MockState::default();
    state.store.require_key(SERVICE_KEY);
    state.metadata.require_key("metadata-key");
    MockServer::start(state).await.expect("Should bind mock server")
}

fn metadata_client(server: &MockServer) -> MetadataClient {
    MetadataClient::new(MetadataConfig {
        api_key: "metadata-key".to_string(),
        base_url: server.metadata_base_url(),
    })
    .unwrap()
    .with_batch_pause(Duration::from_millis(1))
}

fn store_client(server: &MockServer) -> StoreClient {
    StoreClient::new(StoreConfig {
        url: server.base_url(),
        service_key: SERVICE_KEY.to_string(),
        table: "youtube_videos".to_string(),
    })
    .unwrap()
}

// =============================================================================
// Metadata client
// =============================================================================

#[tokio::test]
async fn test_120_ids_take_three_batches() {
    let server = start_server().await;
    let ids: Vec<String> = (0..120).map(|i| format!("id{:03}", i)).collect();
    for id in &ids {
        server
            .state
            .metadata
            .add_video(MockVideo::new(id, Some("PT2M")));
    }

    let details = metadata_client(&server).fetch_details(&ids).await;

    let batches = server.state.metadata.batches();
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(|b| b.len() <= 50));
    assert_eq!(batches.concat(), ids);
    assert_eq!(details.len(), 120);
    assert_eq!(details["id119"].duration_seconds, 120);
}

#[tokio::test]
async fn test_failed_batch_is_skipped() {
    let server = start_server().await;
    let ids: Vec<String> = (0..60).map(|i| format!("id{:03}", i)).collect();
    for id in &ids {
        server
            .state
            .metadata
            .add_video(MockVideo::new(id, Some("PT10M")));
    }
    server.state.metadata.fail_batch(0);

    let details = metadata_client(&server).fetch_details(&ids).await;

    assert_eq!(server.state.metadata.batches().len(), 2);
    assert_eq!(details.len(), 10);
    assert!(!details.contains_key("id000"));
    assert!(details.contains_key("id059"));
}

#[tokio::test]
async fn test_empty_id_list_makes_no_request() {
    let server = start_server().await;

    let details = metadata_client(&server).fetch_details(&[]).await;

    assert!(details.is_empty());
    assert!(server.state.metadata.batches().is_empty());
}

#[tokio::test]
async fn test_wrong_api_key_yields_no_details() {
    let server = start_server().await;
    server
        .state
        .metadata
        .add_video(MockVideo::new("abc", Some("PT10M")));
    let client = MetadataClient::new(MetadataConfig {
        api_key: "wrong".to_string(),
        base_url: server.metadata_base_url(),
    })
    .unwrap();

    let details = client.fetch_details(&["abc".to_string()]).await;
    assert!(details.is_empty());
}

// =============================================================================
// Store client
// =============================================================================

#[tokio::test]
async fn test_upsert_echoes_rows() {
    let server = start_server().await;
    let mut record = VideoRecord::new("vid1").unwrap();
    record.title = Some("First".to_string());
    record.duration_seconds = Some(420);

    let response = store_client(&server)
        .upsert(&[record.to_row()])
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.row_count(), Some(1));
    assert_eq!(response.body[0]["duration"], "420");
    assert_eq!(server.state.store.rows().len(), 1);
}

#[tokio::test]
async fn test_upsert_twice_keeps_one_row() {
    let server = start_server().await;
    let client = store_client(&server);
    let mut record = VideoRecord::new("vid1").unwrap();
    record.title = Some("First".to_string());

    client.upsert(&[record.to_row()]).await.unwrap();
    client.upsert(&[record.to_row()]).await.unwrap();
    assert_eq!(server.state.store.rows().len(), 1);

    record.title = Some("Renamed".to_string());
    client.upsert(&[record.to_row()]).await.unwrap();
    let rows = server.state.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Renamed");
}

#[tokio::test]
async fn test_upsert_rejection_carries_status_and_body() {
    let server = start_server().await;
    server.state.store.fail_writes(400);

    let err = store_client(&server)
        .upsert(&[VideoRecord::new("vid1").unwrap().to_row()])
        .await
        .unwrap_err();

    match err {
        Error::StoreWrite { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("write rejected"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_query_missing_durations_uses_combined_filter() {
    let server = start_server().await;
    server
        .state
        .store
        .insert_row(json!({ "video_id": "no_iso", "duration": null, "duration_seconds": 60 }));
    server
        .state
        .store
        .insert_row(json!({ "video_id": "no_secs", "duration": "PT1M", "duration_seconds": null }));
    server
        .state
        .store
        .insert_row(json!({ "video_id": "complete", "duration": "PT1M", "duration_seconds": 60 }));

    let ids = store_client(&server).query_missing_durations().await.unwrap();

    assert_eq!(ids, vec!["no_iso".to_string(), "no_secs".to_string()]);
    assert_eq!(server.state.store.requests_with_method("GET").len(), 1);
}

#[tokio::test]
async fn test_narrow_query_after_rejection() {
    let server = start_server().await;
    server.state.store.reject_or_filter();
    server
        .state
        .store
        .insert_row(json!({ "video_id": "no_iso", "duration": null }));
    server
        .state
        .store
        .insert_row(json!({ "video_id": "no_secs", "duration": "PT1M", "duration_seconds": null }));

    let ids = store_client(&server).query_missing_durations().await.unwrap();

    assert_eq!(ids, vec!["no_iso".to_string()]);
    assert_eq!(server.state.store.requests_with_method("GET").len(), 2);
}

#[tokio::test]
async fn test_patch_updates_single_row() {
    let server = start_server().await;
    server
        .state
        .store
        .insert_row(json!({ "video_id": "a", "duration": null }));
    server
        .state
        .store
        .insert_row(json!({ "video_id": "b", "duration": null }));

    let outcome = store_client(&server)
        .patch_duration("a", "PT3M", 180)
        .await
        .unwrap();

    assert!(matches!(outcome, PatchOutcome::Updated(ref rows) if rows.len() == 1));
    assert_eq!(server.state.store.row("a").unwrap()["duration_seconds"], 180);
    assert!(server.state.store.row("b").unwrap()["duration"].is_null());
}

#[tokio::test]
async fn test_patch_matching_nothing_is_noop() {
    let server = start_server().await;

    let outcome = store_client(&server)
        .patch_duration("missing", "PT3M", 180)
        .await
        .unwrap();

    assert_eq!(outcome, PatchOutcome::NoOp);
}

// =============================================================================
// Feed client
// =============================================================================

#[tokio::test]
async fn test_feed_records_from_mock() {
    let server = start_server().await;
    server.state.feed.set_body(three_entry_feed());
    let client = FeedClient::new(FeedConfig {
        channel_id: "UC_mock_channel".to_string(),
        base_url: server.base_url(),
    })
    .unwrap();

    let records = client.fetch_records(None).await.unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec!["vid_alpha", "vid_gamma"]);
}

#[tokio::test]
async fn test_feed_error_status_includes_excerpt() {
    let server = start_server().await;
    server.state.feed.set_response(500, "x".repeat(1000));
    let client = FeedClient::new(FeedConfig {
        channel_id: "UC_mock_channel".to_string(),
        base_url: server.base_url(),
    })
    .unwrap();

    let err = client.fetch_body().await.unwrap_err();
    let Error::FeedFetch(message) = err else {
        panic!("expected FeedFetch");
    };
    assert!(message.contains("500"));
    assert!(message.len() < 400);
}

#[tokio::test]
async fn test_unreachable_feed_host_is_fetch_error() {
    let client = FeedClient::new(FeedConfig {
        channel_id: "UC_mock_channel".to_string(),
        base_url: "http://127.0.0.1:1".to_string(),
    })
    .unwrap();

    let err = client.fetch_body().await.unwrap_err();
    assert!(matches!(err, Error::FeedFetch(_)));
}

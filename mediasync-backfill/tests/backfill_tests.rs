//! Integration tests for the duration backfill job

use mediasync_backfill::run;
use mediasync_common::config::{BackfillConfig, MetadataConfig, StoreConfig};
use mediasync_common::services::{PatchOutcome, StoreClient};
use mediasync_mock::{MockServer, MockState, MockVideo};
use serde_json::json;

const SERVICE_KEY: &str = "service-role-test-key";

async fn start_server() -> MockServer {
    let state = MockState::default();
    state.store.require_key(SERVICE_KEY);
    MockServer::start(state).await.expect("Should bind mock server")
}

fn store_config(server: &MockServer) -> StoreConfig {
    StoreConfig {
        url: server.base_url(),
        service_key: SERVICE_KEY.to_string(),
        table: "youtube_videos".to_string(),
    }
}

fn backfill_config(server: &MockServer) -> BackfillConfig {
    BackfillConfig {
        store: store_config(server),
        metadata: MetadataConfig {
            api_key: "metadata-test-key".to_string(),
            base_url: server.metadata_base_url(),
        },
        dry_run: false,
    }
}

fn seed_missing(server: &MockServer, id: &str) {
    server.state.store.insert_row(json!({
        "video_id": id,
        "title": format!("Stored {}", id),
        "duration": null,
        "duration_seconds": null,
    }));
}

#[tokio::test]
async fn test_patches_rows_missing_duration() {
    let server = start_server().await;
    seed_missing(&server, "a1");
    seed_missing(&server, "b2");
    server.state.store.insert_row(json!({
        "video_id": "done",
        "duration": "PT9M",
        "duration_seconds": 540,
    }));
    server
        .state
        .metadata
        .add_video(MockVideo::new("a1", Some("PT1H23M45S")));
    server
        .state
        .metadata
        .add_video(MockVideo::new("b2", Some("PT45S")));

    let report = run(backfill_config(&server)).await.unwrap();

    assert_eq!(report.candidates, 2);
    assert_eq!(report.updated, 2);
    assert_eq!(report.failed, 0);

    let a1 = server.state.store.row("a1").unwrap();
    assert_eq!(a1["duration"], "PT1H23M45S");
    assert_eq!(a1["duration_seconds"], 5025);
    assert_eq!(a1["title"], "Stored a1");
    let b2 = server.state.store.row("b2").unwrap();
    assert_eq!(b2["duration_seconds"], 45);

    // Only the two candidates were looked up
    let batches = server.state.metadata.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0], vec!["a1".to_string(), "b2".to_string()]);
    assert_eq!(
        server.state.metadata.requested_parts(),
        vec!["contentDetails".to_string()]
    );

    let patches = server.state.store.requests_with_method("PATCH");
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0].param("video_id"), Some("eq.a1"));
    assert_eq!(patches[0].prefer.as_deref(), Some("return=representation"));
}

#[tokio::test]
async fn test_combined_filter_rejection_retries_once() {
    let server = start_server().await;
    server.state.store.reject_or_filter();
    seed_missing(&server, "a1");
    server
        .state
        .metadata
        .add_video(MockVideo::new("a1", Some("PT5M")));

    let report = run(backfill_config(&server)).await.unwrap();
    assert_eq!(report.updated, 1);

    let gets = server.state.store.requests_with_method("GET");
    assert_eq!(gets.len(), 2);
    assert_eq!(
        gets[0].param("or"),
        Some("(duration.is.null,duration_seconds.is.null)")
    );
    assert_eq!(gets[1].param("or"), None);
    assert_eq!(gets[1].param("duration"), Some("is.null"));
    assert_eq!(gets[1].param("limit"), Some("1000"));
}

#[tokio::test]
async fn test_query_failure_after_retry_fails_run() {
    let state = MockState::default();
    state.store.require_key("other-key");
    let server = MockServer::start(state).await.unwrap();

    let err = run(backfill_config(&server)).await.unwrap_err();
    let cause = err
        .chain()
        .find_map(|c| c.downcast_ref::<mediasync_common::Error>())
        .unwrap();
    assert!(matches!(
        cause,
        mediasync_common::Error::StoreQuery { status: 401, .. }
    ));
    assert_eq!(server.state.store.requests_with_method("GET").len(), 2);
    assert!(server.state.metadata.batches().is_empty());
}

#[tokio::test]
async fn test_patch_without_match_is_noop() {
    let server = start_server().await;
    let client = StoreClient::new(store_config(&server)).unwrap();

    let outcome = client.patch_duration("ghost", "PT1M", 60).await.unwrap();

    assert_eq!(outcome, PatchOutcome::NoOp);
    assert!(server.state.store.rows().is_empty());
}

#[tokio::test]
async fn test_missing_api_duration_is_skipped() {
    let server = start_server().await;
    seed_missing(&server, "upcoming");
    seed_missing(&server, "unknown");
    server
        .state
        .metadata
        .add_video(MockVideo::new("upcoming", None));

    let report = run(backfill_config(&server)).await.unwrap();

    assert_eq!(report.missing_duration, 2);
    assert_eq!(report.updated, 0);
    assert!(server.state.store.requests_with_method("PATCH").is_empty());
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_later_batches() {
    let server = start_server().await;
    for i in 0..120 {
        let id = format!("vid{:03}", i);
        seed_missing(&server, &id);
        server
            .state
            .metadata
            .add_video(MockVideo::new(&id, Some("PT6M")));
    }
    server.state.metadata.fail_batch(1);

    let report = run(backfill_config(&server)).await.unwrap();

    let batches = server.state.metadata.batches();
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(|b| b.len() <= 50));
    assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 120);

    assert_eq!(report.updated, 70);
    assert_eq!(report.missing_duration, 50);
    assert!(server.state.store.row("vid000").unwrap()["duration_seconds"] == 360);
    assert!(server.state.store.row("vid060").unwrap()["duration_seconds"].is_null());
    assert!(server.state.store.row("vid119").unwrap()["duration_seconds"] == 360);
}

#[tokio::test]
async fn test_patch_failures_are_counted_not_fatal() {
    let server = start_server().await;
    seed_missing(&server, "a1");
    server
        .state
        .metadata
        .add_video(MockVideo::new("a1", Some("PT7M")));
    server.state.store.fail_writes(500);

    let report = run(backfill_config(&server)).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.updated, 0);
}

#[tokio::test]
async fn test_dry_run_sends_no_patch() {
    let server = start_server().await;
    seed_missing(&server, "a1");
    server
        .state
        .metadata
        .add_video(MockVideo::new("a1", Some("PT7M")));

    let mut config = backfill_config(&server);
    config.dry_run = true;
    let report = run(config).await.unwrap();

    assert_eq!(report.skipped, 1);
    assert!(server.state.store.requests_with_method("PATCH").is_empty());
    assert!(server.state.store.row("a1").unwrap()["duration"].is_null());
}

#[tokio::test]
async fn test_nothing_missing_makes_no_lookup() {
    let server = start_server().await;

    let report = run(backfill_config(&server)).await.unwrap();

    assert_eq!(report.candidates, 0);
    assert!(server.state.metadata.batches().is_empty());
}

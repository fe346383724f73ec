//! Integration tests for cluster sources.
//!
//! Uses wiremock to stand in for an external clustering service.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use erbench::source::{ClusterOutcome, ClusterSource, DirectorySource, HttpSource};
use erbench_core::Partition;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_source(server: &MockServer) -> HttpSource {
    HttpSource::new(format!("{}/cluster", server.uri()), Duration::from_secs(5)).unwrap()
}

// =============================================================================
// HTTP SOURCE TESTS
// =============================================================================

#[tokio::test]
async fn test_http_source_returns_clusters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cluster"))
        .and(body_json(json!({"model": "openai:gpt"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"clusters": [[1, 2], [3, 4]]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = http_source(&server).produce("openai:gpt").await;

    assert_eq!(
        outcome,
        ClusterOutcome::FinalClusters {
            model: "openai:gpt".to_string(),
            clusters: Partition::from_ids(vec![vec![1, 2], vec![3, 4]]),
        }
    );
}

#[tokio::test]
async fn test_http_source_sends_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cluster"))
        .and(body_json(json!({"model": "m", "records": "id\n1\n2\n"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"clusters": [[1, 2]]})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = http_source(&server)
        .with_records("id\n1\n2\n")
        .produce("m")
        .await;

    assert!(matches!(outcome, ClusterOutcome::FinalClusters { .. }));
}

#[tokio::test]
async fn test_http_source_server_error_is_tagged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cluster"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let outcome = http_source(&server).produce("m").await;

    match outcome {
        ClusterOutcome::Error { model, error } => {
            assert_eq!(model, "m");
            assert!(error.contains("500"));
        }
        ClusterOutcome::FinalClusters { .. } => panic!("expected an error outcome"),
    }
}

#[tokio::test]
async fn test_http_source_bad_body_is_tagged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cluster"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"groups": []})))
        .mount(&server)
        .await;

    let outcome = http_source(&server).produce("m").await;
    assert!(matches!(outcome, ClusterOutcome::Error { .. }));
}

#[tokio::test]
async fn test_http_source_unreachable_is_tagged() {
    let source = HttpSource::new("http://127.0.0.1:1/cluster", Duration::from_secs(2)).unwrap();
    let outcome = source.produce("m").await;
    assert!(matches!(outcome, ClusterOutcome::Error { .. }));
}

// =============================================================================
// DIRECTORY SOURCE TESTS
// =============================================================================

#[tokio::test]
async fn test_directory_source_reads_model_file() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("anthropic_claude.json"), "[[7, 8]]").unwrap();

    let outcome = DirectorySource::new(temp.path())
        .produce("anthropic:claude")
        .await;

    assert_eq!(
        outcome,
        ClusterOutcome::FinalClusters {
            model: "anthropic:claude".to_string(),
            clusters: Partition::from_ids(vec![vec![7, 8]]),
        }
    );
}

#[tokio::test]
async fn test_directory_source_bad_file_is_tagged() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("m.json"), "[[1, \"x\"]]").unwrap();

    let source = DirectorySource::new(temp.path());
    assert!(matches!(
        source.produce("m").await,
        ClusterOutcome::Error { .. }
    ));
    assert!(matches!(
        source.produce("absent").await,
        ClusterOutcome::Error { .. }
    ));
}

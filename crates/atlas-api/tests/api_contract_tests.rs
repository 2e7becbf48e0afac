//! Integration tests for response normalization and error classification
//! against a mock HTTP server.

use std::time::Duration;

use atlas_api::{ApiClient, ApiError, AtlasBackend};
use atlas_core::ProcessingStatus;
use serde_json::json;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

async fn serve_json(server: &MockServer, path: &str, body: serde_json::Value) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path(path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

mod shape_normalization {
    use super::*;

    #[tokio::test]
    async fn test_null_subjects_is_empty() {
        let server = MockServer::start().await;
        serve_json(&server, "/api/subjects", json!(null)).await;

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let subjects = client.fetch_subjects().await.unwrap();
        assert!(subjects.is_empty());
    }

    #[tokio::test]
    async fn test_object_subjects_is_empty() {
        let server = MockServer::start().await;
        serve_json(&server, "/api/subjects", json!({})).await;

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert!(client.fetch_subjects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_without_files_is_empty() {
        let server = MockServer::start().await;
        serve_json(&server, "/api/gcs/list", json!({"error": "bucket not found"})).await;

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let entries = client.list_storage("nope", "", 100).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_reads_as_pending() {
        let server = MockServer::start().await;
        serve_json(
            &server,
            "/api/subjects",
            json!([
                {"subject_id": "a", "processing_status": "completed"},
                {"subject_id": "b", "processing_status": "archived"},
                {"subject_id": "c", "processing_status": null}
            ]),
        )
        .await;

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let subjects = client.fetch_subjects().await.unwrap();
        assert_eq!(subjects.len(), 3);
        assert_eq!(subjects[0].processing_status, ProcessingStatus::Completed);
        assert_eq!(subjects[1].processing_status, ProcessingStatus::Pending);
        assert_eq!(subjects[2].processing_status, ProcessingStatus::Pending);
    }

    #[tokio::test]
    async fn test_scans_keep_free_form_status() {
        let server = MockServer::start().await;
        serve_json(
            &server,
            "/api/scans",
            json!([{"subject_id": "a", "modality": "DTI", "processing_status": "engine2_complete"}]),
        )
        .await;

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let scans = client.fetch_scans().await.unwrap();
        assert_eq!(scans[0].status_label(), "engine2_complete");
        assert!(scans[0].reached_engine2());
    }
}

mod error_classification {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Nothing listens on port 9 (discard) in the test environment.
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.fetch_subjects().await.unwrap_err();
        assert!(err.is_network_error(), "unexpected error: {err:?}");
        assert_eq!(err.endpoint(), Some("/api/subjects"));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/api/scans"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), Duration::from_millis(200)).unwrap();
        let err = client.fetch_scans().await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout { .. }), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_chat_error_status_propagates() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/nucleus/chat"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let backend: &dyn AtlasBackend = &client;
        let err = backend.chat("hello").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 502, .. }));
    }
}

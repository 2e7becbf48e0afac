//! HTTP client for the Nucleus Atlas backend.
//!
//! [`ApiClient`] issues one request per call with a fixed timeout. There is
//! no retry and no backoff: the pollers simply try again on their next tick.
//!
//! ## Example
//!
//! ```no_run
//! use atlas_api::ApiClient;
//! use atlas_config::AtlasConfig;
//!
//! # async fn example() -> atlas_api::Result<()> {
//! let client = ApiClient::from_config(&AtlasConfig::default())?;
//! let subjects = client.fetch_subjects().await?;
//! println!("{} subjects", subjects.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use atlas_config::AtlasConfig;
use atlas_core::log_api_call;
use atlas_core::types::{Scan, StorageEntry, Subject};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::normalize;

/// Subjects listing endpoint.
pub const SUBJECTS_PATH: &str = "/api/subjects";
/// Scans listing endpoint.
pub const SCANS_PATH: &str = "/api/scans";
/// Storage listing endpoint.
pub const STORAGE_LIST_PATH: &str = "/api/gcs/list";
/// Orchestrator chat endpoint.
pub const CHAT_PATH: &str = "/api/nucleus/chat";

/// Reply used when the chat endpoint answers without a usable `response`.
pub const NO_REPLY_FALLBACK: &str = "Sorry, I could not process your request.";

/// Longest error body kept in [`ApiError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Backend API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client for `base_url` with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Client(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Create a client from dashboard configuration.
    pub fn from_config(config: &AtlasConfig) -> Result<Self> {
        Self::new(config.base_url(), config.request_timeout())
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and parse the body as JSON.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        log_api_call!(path, method = "GET");

        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(path, &e))?;

        self.read_json(path, response).await
    }

    /// POST a JSON body to `path` and parse the reply as JSON.
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        log_api_call!(path, method = "POST");

        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(path, &e))?;

        self.read_json(path, response).await
    }

    async fn read_json(&self, path: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(path, &e))?;

        if !status.is_success() {
            let mut body = text;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            warn!(endpoint = path, status = status.as_u16(), "backend returned error status");
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            debug!(endpoint = path, error = %e, "response body is not JSON");
            ApiError::Parse {
                endpoint: path.to_string(),
                message: e.to_string(),
            }
        })
    }

    fn classify(&self, path: &str, err: &reqwest::Error) -> ApiError {
        let classified = ApiError::from_reqwest(path, err, self.timeout.as_secs());
        warn!(endpoint = path, error = %classified, "backend request failed");
        classified
    }

    /// Fetch every subject known to the pipeline.
    pub async fn fetch_subjects(&self) -> Result<Vec<Subject>> {
        let body = self.get_json(SUBJECTS_PATH, &[]).await?;
        Ok(normalize::sequence(SUBJECTS_PATH, body))
    }

    /// Fetch every scan known to the pipeline.
    pub async fn fetch_scans(&self) -> Result<Vec<Scan>> {
        let body = self.get_json(SCANS_PATH, &[]).await?;
        Ok(normalize::sequence(SCANS_PATH, body))
    }

    /// List the entries of `bucket` directly under `prefix`.
    pub async fn list_storage(
        &self,
        bucket: &str,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<StorageEntry>> {
        let query = [
            ("bucket", bucket.to_string()),
            ("prefix", prefix.to_string()),
            ("max_results", max_results.to_string()),
        ];
        let body = self.get_json(STORAGE_LIST_PATH, &query).await?;
        Ok(normalize::field_sequence(STORAGE_LIST_PATH, body, "files"))
    }

    /// Send one message to the orchestrator and return its reply text.
    pub async fn chat(&self, message: &str) -> Result<String> {
        let body = self.post_json(CHAT_PATH, &ChatRequest { message }).await?;
        Ok(normalize::text_field(&body, "response").unwrap_or_else(|| {
            debug!("chat reply had no response text");
            NO_REPLY_FALLBACK.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:9000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
        assert_eq!(client.url(SUBJECTS_PATH), "http://localhost:9000/api/subjects");
    }

    #[test]
    fn test_from_config_uses_backend_url() {
        let config = AtlasConfig::default().with_backend_url("http://example.test");
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://example.test");
    }

    mod http_tests {
        use super::*;
        use serde_json::json;
        use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

        async fn client_for(server: &MockServer) -> ApiClient {
            ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap()
        }

        #[tokio::test]
        async fn test_fetch_subjects() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path(SUBJECTS_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    {"subject_id": "sub-01", "processing_status": "completed", "age": 34},
                    {"subject_id": "sub-02", "processing_status": "processing"}
                ])))
                .mount(&server)
                .await;

            let subjects = client_for(&server).await.fetch_subjects().await.unwrap();
            assert_eq!(subjects.len(), 2);
            assert_eq!(subjects[0].subject_id, "sub-01");
            assert_eq!(subjects[0].age, Some(34));
        }

        #[tokio::test]
        async fn test_list_storage_sends_query() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path(STORAGE_LIST_PATH))
                .and(matchers::query_param("bucket", "raw"))
                .and(matchers::query_param("prefix", "sub-01/"))
                .and(matchers::query_param("max_results", "100"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "files": [
                        {"name": "ses-1/", "path": "sub-01/ses-1/", "is_directory": true},
                        {"name": "a.dcm", "path": "sub-01/a.dcm", "size": 2048}
                    ]
                })))
                .expect(1)
                .mount(&server)
                .await;

            let entries = client_for(&server)
                .await
                .list_storage("raw", "sub-01/", 100)
                .await
                .unwrap();
            assert_eq!(entries.len(), 2);
            assert!(entries[0].is_directory);
            assert_eq!(entries[1].size, 2048);
        }

        #[tokio::test]
        async fn test_chat_reply() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("POST"))
                .and(matchers::path(CHAT_PATH))
                .and(matchers::body_json(json!({"message": "status?"})))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"response": "All green."})),
                )
                .mount(&server)
                .await;

            let reply = client_for(&server).await.chat("status?").await.unwrap();
            assert_eq!(reply, "All green.");
        }

        #[tokio::test]
        async fn test_chat_without_response_field() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("POST"))
                .and(matchers::path(CHAT_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "?"})))
                .mount(&server)
                .await;

            let reply = client_for(&server).await.chat("hi").await.unwrap();
            assert_eq!(reply, NO_REPLY_FALLBACK);
        }

        #[tokio::test]
        async fn test_error_status_is_status_error() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path(SCANS_PATH))
                .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
                .mount(&server)
                .await;

            let err = client_for(&server).await.fetch_scans().await.unwrap_err();
            match err {
                ApiError::Status { status, body, .. } => {
                    assert_eq!(status, 500);
                    assert_eq!(body, "boom");
                }
                other => panic!("expected status error, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_invalid_json_is_parse_error() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path(SUBJECTS_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
                .mount(&server)
                .await;

            let err = client_for(&server).await.fetch_subjects().await.unwrap_err();
            assert!(err.is_parse_error());
        }
    }
}

//! Backend abstraction used by screens and the chat session.
//!
//! Screens never talk to [`ApiClient`] directly; they hold an
//! `Arc<dyn AtlasBackend>` so tests can swap in [`MockBackend`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use ::async_trait::async_trait;
use atlas_core::types::{Scan, StorageEntry, Subject};
use tokio::time::Duration;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};

/// Operations the dashboard needs from the pipeline backend.
#[async_trait]
pub trait AtlasBackend: Send + Sync {
    /// Fetch every subject.
    async fn fetch_subjects(&self) -> Result<Vec<Subject>>;

    /// Fetch every scan.
    async fn fetch_scans(&self) -> Result<Vec<Scan>>;

    /// List the entries of `bucket` under `prefix`, capped at `max_results`.
    async fn list_storage(
        &self,
        bucket: &str,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<StorageEntry>>;

    /// Send a chat message and return the reply text.
    async fn chat(&self, message: &str) -> Result<String>;

    /// Backend name for logs and the status bar.
    fn name(&self) -> &str;
}

#[async_trait]
impl AtlasBackend for ApiClient {
    async fn fetch_subjects(&self) -> Result<Vec<Subject>> {
        ApiClient::fetch_subjects(self).await
    }

    async fn fetch_scans(&self) -> Result<Vec<Scan>> {
        ApiClient::fetch_scans(self).await
    }

    async fn list_storage(
        &self,
        bucket: &str,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<StorageEntry>> {
        ApiClient::list_storage(self, bucket, prefix, max_results).await
    }

    async fn chat(&self, message: &str) -> Result<String> {
        ApiClient::chat(self, message).await
    }

    fn name(&self) -> &str {
        self.base_url()
    }
}

// ============ Mock Backend ============

#[derive(Debug, Default)]
struct MockState {
    subjects: Vec<Subject>,
    scans: Vec<Scan>,
    listings: HashMap<(String, String), Vec<StorageEntry>>,
    chat_reply: String,
    failure: Option<ApiError>,
    calls: Vec<String>,
}

/// In-memory backend for tests.
///
/// Unknown storage prefixes list as empty. Every call is recorded and can be
/// inspected with [`MockBackend::calls`].
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    delay_ms: u64,
}

impl MockBackend {
    /// Create an empty mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the subjects listing.
    pub fn with_subjects(self, subjects: Vec<Subject>) -> Self {
        self.set_subjects(subjects);
        self
    }

    /// Set the scans listing.
    pub fn with_scans(self, scans: Vec<Scan>) -> Self {
        self.state().scans = scans;
        self
    }

    /// Set the listing returned for `bucket` at `prefix`.
    pub fn with_listing(
        self,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        entries: Vec<StorageEntry>,
    ) -> Self {
        self.state()
            .listings
            .insert((bucket.into(), prefix.into()), entries);
        self
    }

    /// Set the chat reply text.
    pub fn with_chat_reply(self, reply: impl Into<String>) -> Self {
        self.state().chat_reply = reply.into();
        self
    }

    /// Make every call fail with `error`.
    pub fn failing(self, error: ApiError) -> Self {
        self.set_failure(Some(error));
        self
    }

    /// Delay every call.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Replace the subjects listing on a shared mock.
    pub fn set_subjects(&self, subjects: Vec<Subject>) {
        self.state().subjects = subjects;
    }

    /// Start or stop failing on a shared mock.
    pub fn set_failure(&self, error: Option<ApiError>) {
        self.state().failure = error;
    }

    /// Calls received so far, e.g. `list_storage raw sub-01/`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of calls whose description starts with `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.starts_with(operation))
            .count()
    }

    async fn record(&self, call: String) -> Result<()> {
        let failure = {
            let mut state = self.state();
            state.calls.push(call);
            state.failure.clone()
        };
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AtlasBackend for MockBackend {
    async fn fetch_subjects(&self) -> Result<Vec<Subject>> {
        self.record("fetch_subjects".to_string()).await?;
        Ok(self.state().subjects.clone())
    }

    async fn fetch_scans(&self) -> Result<Vec<Scan>> {
        self.record("fetch_scans".to_string()).await?;
        Ok(self.state().scans.clone())
    }

    async fn list_storage(
        &self,
        bucket: &str,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<StorageEntry>> {
        self.record(format!("list_storage {} {}", bucket, prefix))
            .await?;
        let state = self.state();
        let entries = state
            .listings
            .get(&(bucket.to_string(), prefix.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(entries.into_iter().take(max_results as usize).collect())
    }

    async fn chat(&self, message: &str) -> Result<String> {
        self.record(format!("chat {}", message)).await?;
        Ok(self.state().chat_reply.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

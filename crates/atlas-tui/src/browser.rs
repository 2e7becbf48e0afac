//! Hierarchical storage browser state.
//!
//! Every bucket keeps its own cursor (the current path prefix, `""` for the
//! root) and its own listing. Navigation never fetches by itself; it returns
//! a [`ListingRequest`] the caller is expected to issue, and the response is
//! fed back through [`StorageBrowser::apply_listing`]. Listings for a prefix
//! the cursor has since moved away from are discarded.

use atlas_api::ApiError;
use atlas_config::AtlasConfig;
use atlas_core::types::StorageEntry;
use atlas_core::{ApplyOutcome, Snapshot};
use tracing::{debug, warn};

/// Prefix one level above `prefix`.
///
/// `"a/b/"` becomes `"a/"`, `"a/"` becomes `""`, and the root stays the root.
pub fn parent_prefix(prefix: &str) -> String {
    let mut segments: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
    segments.pop();
    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}

/// A listing the browser wants fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    /// Index of the bucket in the browser
    pub slot: usize,
    pub bucket: String,
    pub prefix: String,
    pub max_results: u32,
    pub seq: u64,
}

/// Cursor and listing for one bucket.
#[derive(Debug, Clone)]
pub struct BucketCursor {
    /// Tab label, e.g. `DICOM`
    pub label: String,
    pub bucket: String,
    prefix: String,
    listing: Snapshot<Vec<StorageEntry>>,
    selected: usize,
    next_seq: u64,
}

impl BucketCursor {
    pub fn new(label: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bucket: bucket.into(),
            prefix: String::new(),
            listing: Snapshot::default(),
            selected: 0,
            next_seq: 0,
        }
    }

    /// Current path prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Entries of the last applied listing.
    pub fn entries(&self) -> &[StorageEntry] {
        self.listing.value()
    }

    pub fn listing(&self) -> &Snapshot<Vec<StorageEntry>> {
        &self.listing
    }

    pub fn is_loading(&self) -> bool {
        self.listing.is_loading()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&StorageEntry> {
        self.entries().get(self.selected)
    }

    /// Breadcrumb text, e.g. `nucleus-atlas-raw-prod/sub-01/`.
    pub fn location(&self) -> String {
        format!("{}/{}", self.bucket, self.prefix)
    }
}

/// Browser over one or more buckets with a single active tab.
#[derive(Debug, Clone)]
pub struct StorageBrowser {
    buckets: Vec<BucketCursor>,
    active: usize,
    max_results: u32,
}

impl StorageBrowser {
    /// Create a browser over `buckets`, listing at most `max_results` entries per prefix.
    pub fn new(buckets: Vec<BucketCursor>, max_results: u32) -> Self {
        Self {
            buckets,
            active: 0,
            max_results,
        }
    }

    /// DICOM (raw) and NIFTI (processed) buckets from configuration.
    pub fn from_config(config: &AtlasConfig) -> Self {
        Self::new(
            vec![
                BucketCursor::new("DICOM", &config.raw_bucket),
                BucketCursor::new("NIFTI", &config.processed_bucket),
            ],
            config.max_results,
        )
    }

    pub fn buckets(&self) -> &[BucketCursor] {
        &self.buckets
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Cursor of the active bucket.
    pub fn active(&self) -> Option<&BucketCursor> {
        self.buckets.get(self.active)
    }

    /// Switch tabs. Returns a listing request if the bucket has never been listed.
    pub fn select_bucket(&mut self, slot: usize) -> Option<ListingRequest> {
        if slot >= self.buckets.len() {
            return None;
        }
        self.active = slot;
        let cursor = &self.buckets[slot];
        if cursor.listing.is_loaded() || cursor.is_loading() {
            None
        } else {
            self.refresh()
        }
    }

    pub fn next_bucket(&mut self) -> Option<ListingRequest> {
        if self.buckets.is_empty() {
            return None;
        }
        self.select_bucket((self.active + 1) % self.buckets.len())
    }

    pub fn prev_bucket(&mut self) -> Option<ListingRequest> {
        if self.buckets.is_empty() {
            return None;
        }
        let len = self.buckets.len();
        self.select_bucket((self.active + len - 1) % len)
    }

    fn request(&mut self, prefix: String) -> Option<ListingRequest> {
        let max_results = self.max_results;
        let slot = self.active;
        let cursor = self.buckets.get_mut(slot)?;

        if cursor.prefix != prefix {
            cursor.prefix = prefix;
            cursor.listing = Snapshot::default();
            cursor.selected = 0;
        }

        cursor.next_seq += 1;
        let seq = cursor.next_seq;
        cursor.listing.mark_requested(seq);
        debug!(bucket = %cursor.bucket, prefix = %cursor.prefix, seq, "storage listing requested");

        Some(ListingRequest {
            slot,
            bucket: cursor.bucket.clone(),
            prefix: cursor.prefix.clone(),
            max_results,
            seq,
        })
    }

    /// Move the active cursor to `path` and list it.
    pub fn enter(&mut self, path: &str) -> Option<ListingRequest> {
        self.request(path.to_string())
    }

    /// Move the active cursor one level up and list it. At the root this re-lists the root.
    pub fn go_up(&mut self) -> Option<ListingRequest> {
        let parent = parent_prefix(self.active()?.prefix());
        self.request(parent)
    }

    /// List the active cursor's prefix again.
    pub fn refresh(&mut self) -> Option<ListingRequest> {
        let prefix = self.active()?.prefix.clone();
        self.request(prefix)
    }

    /// Enter the selected entry if it is a directory.
    pub fn enter_selected(&mut self) -> Option<ListingRequest> {
        let entry = self.active()?.selected_entry()?;
        if !entry.is_directory {
            return None;
        }
        let path = entry.path.clone();
        self.enter(&path)
    }

    pub fn select_next(&mut self) {
        if let Some(cursor) = self.buckets.get_mut(self.active) {
            let len = cursor.entries().len();
            if len > 0 {
                cursor.selected = (cursor.selected + 1).min(len - 1);
            }
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(cursor) = self.buckets.get_mut(self.active) {
            cursor.selected = cursor.selected.saturating_sub(1);
        }
    }

    pub fn select_first(&mut self) {
        if let Some(cursor) = self.buckets.get_mut(self.active) {
            cursor.selected = 0;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(cursor) = self.buckets.get_mut(self.active) {
            cursor.selected = cursor.entries().len().saturating_sub(1);
        }
    }

    /// Apply a listing response to the bucket it was requested for.
    pub fn apply_listing(
        &mut self,
        request: &ListingRequest,
        result: Result<Vec<StorageEntry>, ApiError>,
    ) -> ApplyOutcome {
        let Some(cursor) = self.buckets.get_mut(request.slot) else {
            return ApplyOutcome::Stale;
        };
        if cursor.prefix != request.prefix {
            debug!(bucket = %request.bucket, prefix = %request.prefix, "dropping listing for abandoned prefix");
            return ApplyOutcome::Stale;
        }

        if let Err(e) = &result {
            warn!(
                bucket = %request.bucket,
                prefix = %request.prefix,
                endpoint = e.endpoint().unwrap_or_default(),
                error = %e,
                "storage listing failed"
            );
        }
        let outcome = cursor
            .listing
            .apply(request.seq, result.map_err(|e| e.friendly_message()));
        if outcome == ApplyOutcome::Replaced {
            cursor.selected = 0;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser() -> StorageBrowser {
        StorageBrowser::new(
            vec![BucketCursor::new("DICOM", "raw"), BucketCursor::new("NIFTI", "processed")],
            100,
        )
    }

    fn prefix(browser: &StorageBrowser) -> String {
        browser.active().map(|c| c.prefix().to_string()).unwrap_or_default()
    }

    #[test]
    fn test_parent_prefix() {
        assert_eq!(parent_prefix(""), "");
        assert_eq!(parent_prefix("a/"), "");
        assert_eq!(parent_prefix("a/b/"), "a/");
        assert_eq!(parent_prefix("a/b/c/"), "a/b/");
        assert_eq!(parent_prefix("a//b/"), "a/");
        assert_eq!(parent_prefix("a/b"), "a/");
    }

    #[test]
    fn test_go_up_at_root_stays_and_refetches() {
        let mut b = browser();
        let req = b.go_up().unwrap();
        assert_eq!(req.prefix, "");
        assert_eq!(prefix(&b), "");
        assert_eq!(req.seq, 1);
    }

    #[test]
    fn test_enter_then_go_up() {
        let mut b = browser();
        let req = b.enter("a/b/").unwrap();
        assert_eq!(req.bucket, "raw");
        assert_eq!(req.prefix, "a/b/");
        assert_eq!(req.max_results, 100);

        let req = b.go_up().unwrap();
        assert_eq!(req.prefix, "a/");
        assert_eq!(prefix(&b), "a/");
    }

    #[test]
    fn test_refresh_keeps_prefix() {
        let mut b = browser();
        b.enter("x/").unwrap();
        let first = b.refresh().unwrap();
        let second = b.refresh().unwrap();
        assert_eq!(first.prefix, "x/");
        assert!(second.seq > first.seq);
    }

    #[test]
    fn test_listing_for_abandoned_prefix_is_dropped() {
        let mut b = browser();
        let old = b.enter("a/").unwrap();
        let new = b.enter("b/").unwrap();

        let outcome = b.apply_listing(&old, Ok(vec![StorageEntry::file("x", "a/x", 1)]));
        assert_eq!(outcome, ApplyOutcome::Stale);
        assert!(b.active().unwrap().entries().is_empty());
        assert!(b.active().unwrap().is_loading());

        let outcome = b.apply_listing(&new, Ok(vec![StorageEntry::file("y", "b/y", 1)]));
        assert_eq!(outcome, ApplyOutcome::Replaced);
        assert_eq!(b.active().unwrap().entries()[0].name, "y");
        assert!(!b.active().unwrap().is_loading());
    }

    #[test]
    fn test_out_of_order_refresh_keeps_newest() {
        let mut b = browser();
        let first = b.refresh().unwrap();
        let second = b.refresh().unwrap();

        b.apply_listing(&second, Ok(vec![StorageEntry::directory("new/", "new/")]));
        let outcome = b.apply_listing(&first, Ok(vec![StorageEntry::directory("old/", "old/")]));
        assert_eq!(outcome, ApplyOutcome::Stale);
        assert_eq!(b.active().unwrap().entries()[0].name, "new/");
    }

    #[test]
    fn test_failed_listing_keeps_entries() {
        let mut b = browser();
        let req = b.refresh().unwrap();
        b.apply_listing(&req, Ok(vec![StorageEntry::directory("a/", "a/")]));

        let req = b.refresh().unwrap();
        let outcome = b.apply_listing(
            &req,
            Err(ApiError::Network {
                endpoint: "/api/gcs/list".into(),
                message: "down".into(),
            }),
        );
        assert_eq!(outcome, ApplyOutcome::Failed);
        assert_eq!(b.active().unwrap().entries().len(), 1);
        assert_eq!(
            b.active().unwrap().listing().last_error(),
            Some("Backend unreachable. Showing last known data.")
        );
    }

    #[test]
    fn test_new_listing_resets_selection() {
        let mut b = browser();
        let req = b.refresh().unwrap();
        b.apply_listing(
            &req,
            Ok(vec![
                StorageEntry::directory("a/", "a/"),
                StorageEntry::directory("b/", "b/"),
                StorageEntry::directory("c/", "c/"),
            ]),
        );
        b.select_last();
        assert_eq!(b.active().unwrap().selected_index(), 2);

        let req = b.refresh().unwrap();
        b.apply_listing(
            &req,
            Ok(vec![
                StorageEntry::directory("a/", "a/"),
                StorageEntry::directory("b/", "b/"),
                StorageEntry::directory("c/", "c/"),
            ]),
        );
        assert_eq!(b.active().unwrap().selected_index(), 0);
    }

    #[test]
    fn test_enter_selected_only_opens_directories() {
        let mut b = browser();
        let req = b.refresh().unwrap();
        b.apply_listing(
            &req,
            Ok(vec![
                StorageEntry::file("readme.txt", "readme.txt", 10),
                StorageEntry::directory("sub-01/", "sub-01/"),
            ]),
        );

        assert!(b.enter_selected().is_none());
        b.select_next();
        let req = b.enter_selected().unwrap();
        assert_eq!(req.prefix, "sub-01/");
        assert_eq!(b.active().unwrap().selected_index(), 0);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut b = browser();
        let req = b.refresh().unwrap();
        b.apply_listing(&req, Ok(vec![StorageEntry::directory("a/", "a/")]));
        b.select_next();
        b.select_next();
        assert_eq!(b.active().unwrap().selected_index(), 0);
        b.select_prev();
        assert_eq!(b.active().unwrap().selected_index(), 0);
    }

    #[test]
    fn test_buckets_have_independent_cursors() {
        let mut b = browser();
        b.enter("a/b/").unwrap();

        let req = b.next_bucket().unwrap();
        assert_eq!(req.bucket, "processed");
        assert_eq!(req.prefix, "");
        b.enter("c/").unwrap();

        assert!(b.prev_bucket().is_none());
        assert_eq!(prefix(&b), "a/b/");
        assert_eq!(b.buckets()[1].prefix(), "c/");
    }
}

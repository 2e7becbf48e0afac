//! # atlas-api
//!
//! Client for the Nucleus Atlas backend HTTP API.
//!
//! | Method | Path | Returns |
//! |---|---|---|
//! | GET | `/api/subjects` | subjects |
//! | GET | `/api/scans` | scans |
//! | GET | `/api/gcs/list?bucket=&prefix=&max_results=` | storage entries under `files` |
//! | POST | `/api/nucleus/chat` | reply under `response` |
//!
//! Responses are normalized at this boundary: a listing that is not shaped
//! like a list comes back empty instead of failing, and individual records
//! that do not decode are skipped.
//!
//! - [`ApiClient`] - reqwest-based implementation
//! - [`AtlasBackend`] - the trait screens depend on
//! - [`MockBackend`] - in-memory backend for tests

pub mod backend;
pub mod client;
pub mod error;
pub mod normalize;

pub use backend::{AtlasBackend, MockBackend};
pub use client::{ApiClient, NO_REPLY_FALLBACK};
pub use error::{ApiError, Result};

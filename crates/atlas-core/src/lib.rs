//! # atlas-core
//!
//! Core types, errors, and utilities for the Atlas dashboard.
//!
//! This crate provides:
//! - [`AtlasError`] - Error types for setup and configuration
//! - [`logging`] - Tracing setup and log file locations
//! - [`types`] - Pipeline entities decoded from the backend (subjects, scans, storage entries)
//! - [`summary`] - Status counts shown on the dashboard screens
//! - [`snapshot`] - Refresh-fed state with full replacement and stale-response guarding
//!
//! ## Example
//!
//! ```no_run
//! use atlas_core::{Snapshot, SubjectStats, logging};
//! use atlas_core::types::Subject;
//!
//! fn main() -> atlas_core::Result<()> {
//!     let _guard = logging::init_logging(None, false)?;
//!
//!     let mut subjects: Snapshot<Vec<Subject>> = Snapshot::default();
//!     subjects.mark_requested(1);
//!     subjects.apply::<String>(1, Ok(vec![Subject::default()]));
//!
//!     let stats = SubjectStats::from_subjects(subjects.value());
//!     tracing::info!(total = stats.total, "subjects loaded");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod snapshot;
pub mod summary;
pub mod types;

pub use error::{AtlasError, Result};
pub use logging::{LogGuard, init_logging, set_console_logging};
pub use snapshot::{ApplyOutcome, Snapshot};
pub use summary::{ModalityStats, PipelineSummary, SubjectStats};
pub use types::{Modality, ProcessingStatus, Scan, ScanPhase, StorageEntry, Subject};

//! Shared type definitions for the Nucleus Atlas pipeline entities.
//!
//! These mirror the JSON records served by the backend. Decoding is lenient:
//! the backend is an external collaborator, so every field tolerates being
//! absent, `null`, or of a slightly different JSON type. A record that still
//! cannot be decoded is skipped by the API client rather than failing the
//! whole listing.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Processing status of a subject as reported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Not yet picked up (also used for unrecognised values)
    #[default]
    Pending,
    /// Currently being processed
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

impl ProcessingStatus {
    /// All statuses in display order.
    pub const ALL: [ProcessingStatus; 4] = [
        ProcessingStatus::Completed,
        ProcessingStatus::Processing,
        ProcessingStatus::Failed,
        ProcessingStatus::Pending,
    ];

    /// Parse a backend status label. Unknown labels read as [`Pending`](Self::Pending).
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// Wire label for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Imaging modality of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Modality {
    /// Diffusion tensor imaging
    Dti,
    /// Functional MRI
    Fmri,
    /// Anatomical / structural (T1, T2, ...)
    Structural,
    /// Any other label, kept verbatim
    Other(String),
    /// No modality reported
    #[default]
    Unknown,
}

impl Modality {
    /// Parse a backend modality label (case-insensitive).
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Self::Unknown,
            "dti" => Self::Dti,
            "fmri" => Self::Fmri,
            "structural" | "anat" | "t1" | "t1w" | "t2" | "t2w" => Self::Structural,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Display label, matching the backend's spelling for known modalities.
    pub fn label(&self) -> &str {
        match self {
            Self::Dti => "DTI",
            Self::Fmri => "fMRI",
            Self::Structural => "structural",
            Self::Other(label) => label,
            Self::Unknown => "",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Modality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A patient/record entity tracked by the pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default, deserialize_with = "lenient::text")]
    pub subject_id: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub clinical_group: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "lenient::status")]
    pub processing_status: ProcessingStatus,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Coarse phase of a scan, derived from its free-form status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanPhase {
    /// Converted or analysed (`completed` or an `engine2` stage marker)
    Complete,
    /// Contains `failed`
    Failed,
    /// Contains `queued` or `processing`
    InProgress,
    /// Anything else, including no status at all
    Pending,
}

impl ScanPhase {
    /// Classify a raw scan status string.
    pub fn from_status(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return Self::Pending;
        };
        if status.contains("completed") || status.contains("engine2") {
            Self::Complete
        } else if status.contains("failed") {
            Self::Failed
        } else if status.contains("queued") || status.contains("processing") {
            Self::InProgress
        } else {
            Self::Pending
        }
    }
}

/// One imaging acquisition associated with a subject.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scan {
    #[serde(default, deserialize_with = "lenient::text")]
    pub subject_id: String,
    #[serde(default, deserialize_with = "lenient::modality")]
    pub modality: Modality,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub scan_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub nifti_path: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub processing_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Scan {
    /// Coarse phase derived from the status string.
    pub fn phase(&self) -> ScanPhase {
        ScanPhase::from_status(self.processing_status.as_deref())
    }

    /// Whether the status carries the Engine 2 stage marker.
    pub fn reached_engine2(&self) -> bool {
        self.processing_status
            .as_deref()
            .is_some_and(|s| s.contains("engine2"))
    }

    /// Status text for display; an absent status reads as `pending`.
    pub fn status_label(&self) -> &str {
        match self.processing_status.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "pending",
        }
    }
}

/// One item of a storage listing under a prefix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageEntry {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub path: String,
    #[serde(default, deserialize_with = "lenient::size")]
    pub size: u64,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_directory: bool,
}

impl StorageEntry {
    /// Convenience constructor for a folder entry.
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_directory: true,
            ..Default::default()
        }
    }

    /// Convenience constructor for a file entry.
    pub fn file(name: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            ..Default::default()
        }
    }
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339, naive ISO date-times (read as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Field deserializers that never reject a record over one odd field.
mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{Modality, ProcessingStatus, parse_timestamp};

    fn raw<'de, D: Deserializer<'de>>(de: D) -> Result<Value, D::Error> {
        Value::deserialize(de)
    }

    fn as_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn as_u64(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        Ok(as_text(raw(de)?).unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(as_text(raw(de)?).filter(|s| !s.is_empty()))
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
        Ok(as_u64(&raw(de)?).and_then(|n| u32::try_from(n).ok()))
    }

    pub fn size<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
        Ok(as_u64(&raw(de)?).unwrap_or(0))
    }

    pub fn flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
        Ok(matches!(raw(de)?, Value::Bool(true)))
    }

    pub fn status<'de, D: Deserializer<'de>>(de: D) -> Result<ProcessingStatus, D::Error> {
        Ok(as_text(raw(de)?)
            .map(|s| ProcessingStatus::from_label(&s))
            .unwrap_or_default())
    }

    pub fn modality<'de, D: Deserializer<'de>>(de: D) -> Result<Modality, D::Error> {
        Ok(as_text(raw(de)?)
            .map(|s| Modality::from_label(&s))
            .unwrap_or_default())
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(as_text(raw(de)?).and_then(|s| parse_timestamp(&s)))
    }
}

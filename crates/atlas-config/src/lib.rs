//! # atlas-config
//!
//! Configuration for the Atlas dashboard.
//!
//! Settings are read from `~/.atlas/config.yaml`. Every field is optional; a
//! missing file means defaults. The backend base URL can additionally be
//! overridden with the `ATLAS_BACKEND_URL` environment variable, and the CLI
//! applies `--backend-url` on top of that.
//!
//! ```yaml
//! backend_url: https://nucleus-atlas-backend-v2-xeihvetbja-ew.a.run.app
//! raw_bucket: nucleus-atlas-raw-prod
//! processed_bucket: nucleus-atlas-processed-prod
//! summary_interval_secs: 30
//! monitor_interval_secs: 10
//! max_results: 100
//! request_timeout_secs: 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use atlas_core::{AtlasError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment variable overriding the backend base URL.
pub const BACKEND_URL_ENV: &str = "ATLAS_BACKEND_URL";

/// Default backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "https://nucleus-atlas-backend-v2-xeihvetbja-ew.a.run.app";

/// Default bucket holding raw DICOM uploads.
pub const DEFAULT_RAW_BUCKET: &str = "nucleus-atlas-raw-prod";

/// Default bucket holding processed NIFTI outputs.
pub const DEFAULT_PROCESSED_BUCKET: &str = "nucleus-atlas-processed-prod";

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Base URL of the backend API (no trailing slash needed)
    pub backend_url: String,

    /// Bucket browsed on the DICOM tab
    pub raw_bucket: String,

    /// Bucket browsed on the NIFTI tab
    pub processed_bucket: String,

    /// Home screen refresh interval
    pub summary_interval_secs: u64,

    /// Engine monitor refresh interval
    pub monitor_interval_secs: u64,

    /// Cap passed as `max_results` on storage listings
    pub max_results: u32,

    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            raw_bucket: DEFAULT_RAW_BUCKET.to_string(),
            processed_bucket: DEFAULT_PROCESSED_BUCKET.to_string(),
            summary_interval_secs: 30,
            monitor_interval_secs: 10,
            max_results: 100,
            request_timeout_secs: 30,
        }
    }
}

impl AtlasConfig {
    /// Default config file location: `~/.atlas/config.yaml`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(atlas_core::logging::atlas_home()?.join("config.yaml"))
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    ///
    /// The `ATLAS_BACKEND_URL` override is applied. The result is not validated:
    /// callers apply any further overrides and then call [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| AtlasError::ConfigUnreadable {
                path: path.to_path_buf(),
                source: e,
            })?;
            let config = Self::from_yaml(&raw, path)?;
            info!(path = %path.display(), "loaded configuration");
            config
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Self::default()
        };

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                debug!(%url, "backend url overridden from environment");
                config.backend_url = url;
            }
        }

        Ok(config)
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Parse YAML text. An empty document yields defaults.
    pub fn from_yaml(raw: &str, origin: &Path) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| AtlasError::config_invalid(origin, e.to_string()))
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AtlasError::config_validation(format!(
                "backend_url must start with http:// or https:// (got '{}')",
                self.backend_url
            )));
        }
        if self.summary_interval_secs == 0 || self.monitor_interval_secs == 0 {
            return Err(AtlasError::config_validation("refresh intervals must be at least 1 second"));
        }
        if self.max_results == 0 {
            return Err(AtlasError::config_validation("max_results must be positive"));
        }
        if self.request_timeout_secs == 0 {
            return Err(AtlasError::config_validation("request_timeout_secs must be positive"));
        }
        if self.raw_bucket.trim().is_empty() || self.processed_bucket.trim().is_empty() {
            return Err(AtlasError::config_validation("bucket names must not be empty"));
        }
        Ok(())
    }

    /// Override the backend URL.
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Backend URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.backend_url.trim().trim_end_matches('/')
    }

    /// Home screen refresh interval.
    pub fn summary_interval(&self) -> Duration {
        Duration::from_secs(self.summary_interval_secs)
    }

    /// Engine monitor refresh interval.
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::default();
        assert_eq!(config.summary_interval(), Duration::from_secs(30));
        assert_eq!(config.monitor_interval(), Duration::from_secs(10));
        assert_eq!(config.max_results, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AtlasConfig::from_yaml(
            "backend_url: http://localhost:8080/\nmonitor_interval_secs: 5\n",
            Path::new("config.yaml"),
        )
        .unwrap();
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.monitor_interval_secs, 5);
        assert_eq!(config.raw_bucket, DEFAULT_RAW_BUCKET);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = AtlasConfig::from_yaml("max_results: [oops", Path::new("c.yaml")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let config = AtlasConfig {
            monitor_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let config = AtlasConfig::default().with_backend_url("ftp://example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        // SAFETY: serialized with every other test touching the environment
        unsafe { std::env::remove_var(BACKEND_URL_ENV) };
        let dir = TempDir::new().unwrap();
        let config = AtlasConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AtlasConfig::default());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "backend_url: http://file.example\n").unwrap();

        // SAFETY: serialized with every other test touching the environment
        unsafe { std::env::set_var(BACKEND_URL_ENV, "http://env.example") };
        let config = AtlasConfig::load(&path).unwrap();
        unsafe { std::env::remove_var(BACKEND_URL_ENV) };

        assert_eq!(config.backend_url, "http://env.example");
    }

    #[test]
    #[serial]
    fn test_cli_override_repairs_invalid_file_url() {
        // SAFETY: serialized with every other test touching the environment
        unsafe { std::env::remove_var(BACKEND_URL_ENV) };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "backend_url: not-a-url\n").unwrap();

        let config = AtlasConfig::load(&path).unwrap();
        assert!(config.validate().is_err());

        let config = config.with_backend_url("http://localhost:8080");
        assert!(config.validate().is_ok());
    }
}

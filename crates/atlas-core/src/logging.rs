//! Logging infrastructure for Atlas.
//!
//! Structured logging via the `tracing` ecosystem. The TUI owns the terminal
//! while it runs, so the only sink during a session is a JSON lines file under
//! `~/.atlas/logs/`. Console output goes to stderr; the TUI switches it off
//! with [`set_console_logging`] while the alternate screen is active.
//!
//! ## Example
//!
//! ```no_run
//! use atlas_core::logging;
//!
//! let _guard = logging::init_logging(None, false).expect("logging init");
//!
//! tracing::info!("Atlas started");
//! tracing::debug!(endpoint = "/api/subjects", "polling");
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Metadata;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self,
        format::FmtSpan,
        writer::{MakeWriter, MakeWriterExt},
    },
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{AtlasError, Result};

/// File name of the rolling log.
const LOG_FILE_NAME: &str = "atlas.log";

/// Whether the console layer may write to stderr.
static CONSOLE_ENABLED: AtomicBool = AtomicBool::new(true);

/// Enable or silence console logging. The file log is unaffected.
///
/// Call with `false` before entering the alternate screen and `true` after
/// leaving it, so log lines never land on top of the TUI.
pub fn set_console_logging(enabled: bool) {
    CONSOLE_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Whether console logging is currently enabled.
pub fn console_logging_enabled() -> bool {
    CONSOLE_ENABLED.load(Ordering::SeqCst)
}

fn console_open(_: &Metadata<'_>) -> bool {
    console_logging_enabled()
}

/// Wrap `inner` so it only receives warnings and above, and nothing while
/// console logging is switched off.
fn console_writer<W>(inner: W) -> impl for<'a> MakeWriter<'a> + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    inner
        .with_max_level(tracing::Level::WARN)
        .with_filter(console_open as fn(&Metadata<'_>) -> bool)
}

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the Atlas logging system.
///
/// This sets up:
/// - File logging to `~/.atlas/logs/atlas.log` (JSON lines, rolled daily)
/// - Console logging to stderr (human-readable, warnings and above), gated by
///   [`set_console_logging`]
///
/// `RUST_LOG` overrides the default `atlas=info` / `atlas=debug` filter.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| AtlasError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("atlas={default_level}")));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    let console_layer = fmt::layer()
        .with_writer(console_writer(std::io::stderr))
        .with_ansi(true)
        .with_target(true)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Base directory for Atlas state: `~/.atlas/`.
pub fn atlas_home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| AtlasError::Internal {
        message: "home directory could not be determined".into(),
    })?;

    Ok(home.join(".atlas"))
}

/// Get the default log directory path.
///
/// Returns `~/.atlas/logs/`
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(atlas_home()?.join("logs"))
}

/// Get the default log file path.
///
/// Returns `~/.atlas/logs/atlas.log`
pub fn default_log_file() -> Result<PathBuf> {
    Ok(default_log_dir()?.join(LOG_FILE_NAME))
}

/// Log one backend request outcome under the `atlas::api` target.
///
/// # Example
///
/// ```ignore
/// log_api_call!("/api/subjects", status = 200u16, items = 12usize);
/// log_api_call!("/api/scans", error = %err);
/// ```
#[macro_export]
macro_rules! log_api_call {
    ($endpoint:expr, $($field:tt)*) => {
        tracing::debug!(
            target: "atlas::api",
            endpoint = $endpoint,
            $($field)*,
            "api call"
        )
    };
}

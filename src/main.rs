//! Atlas - Nucleus Atlas pipeline dashboard
//!
//! A terminal dashboard for monitoring the Nucleus Atlas imaging pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Start the dashboard against the configured backend
//! atlas
//!
//! # Point at a local backend
//! atlas --backend-url http://localhost:8080
//!
//! # With verbose logging
//! atlas -v
//!
//! # With a custom config file or log directory
//! atlas --config ./atlas.yaml --log-dir /path/to/logs/
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;

use atlas_config::AtlasConfig;
use atlas_core::{AtlasError, LogGuard, init_logging};
use atlas_tui::App;
use clap::Parser;
use tracing::{error, info};

/// Nucleus Atlas pipeline dashboard
///
/// Polls the Atlas backend and shows subjects, scans, storage, and the
/// NUCLEUS orchestrator chat in the terminal.
#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.atlas/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Configuration file (defaults to ~/.atlas/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file and environment
    #[arg(long)]
    backend_url: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("Error: {}", e);
            if let Some(hint) = e.guidance() {
                eprintln!("Hint: {}", hint);
            }
            return ExitCode::from(1);
        }
    };

    // Restore the terminal even if the app panics in raw mode
    install_panic_hook();

    info!(backend = %config.base_url(), "Starting Atlas dashboard");

    match run_app(config) {
        Ok(()) => {
            info!("Atlas dashboard exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = restore_terminal();
            error!("Atlas dashboard error: {}", e);
            eprintln!("Error: {}", e);
            if let Some(hint) = e.downcast_ref::<AtlasError>().and_then(AtlasError::guidance) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();
    atlas_core::set_console_logging(true);
    crossterm::execute!(
        stdout,
        crossterm::event::PopKeyboardEnhancementFlags,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    stdout.flush()?;

    Ok(())
}

/// Set up logging based on CLI arguments.
fn setup_logging(cli: &Cli) -> atlas_core::Result<LogGuard> {
    init_logging(cli.log_dir.clone(), cli.verbose > 0)
}

/// Load configuration, applying the `--backend-url` override last.
///
/// Validation runs once, after every override.
fn load_config(cli: &Cli) -> atlas_core::Result<AtlasConfig> {
    let config = match &cli.config {
        Some(path) => AtlasConfig::load(path)?,
        None => AtlasConfig::load_default()?,
    };
    let config = match &cli.backend_url {
        Some(url) => config.with_backend_url(url.clone()),
        None => config,
    };
    config.validate()?;
    Ok(config)
}

/// Run the TUI application.
fn run_app(config: AtlasConfig) -> atlas_tui::AppResult<()> {
    let mut app = App::new(config)?;
    app.run()
}

//! Terminal UI for the Nucleus Atlas dashboard.
//!
//! This crate provides the Ratatui-based interface over the Atlas backend.
//!
//! ## Features
//!
//! - Pipeline summary with live polling
//! - Engine 1 / Engine 2 job monitors
//! - DICOM / NIFTI storage browser
//! - Read-only database tables
//! - NUCLEUS orchestrator chat
//!
//! ## Hotkeys
//!
//! - `o` - Home (pipeline summary)
//! - `g` - Storage browser
//! - `1` - Engine 1 monitor
//! - `2` - Engine 2 monitor
//! - `d` - Database tables
//! - `:` - NUCLEUS chat
//! - `r` - Refresh
//! - `?` or `h` - Help
//! - `q` - Quit
//! - `Tab` - Cycle views
//! - `Esc` - Cancel / leave chat input

pub mod app;
pub mod browser;
pub mod chat_panel;
pub mod database_panel;
pub mod engine_panel;
pub mod event;
pub mod format;
pub mod poller;
pub mod screen;
pub mod storage_panel;
pub mod summary_panel;
pub mod theme;
pub mod view;
pub mod widget;

pub use app::{App, AppResult};
pub use poller::Poller;
pub use view::View;

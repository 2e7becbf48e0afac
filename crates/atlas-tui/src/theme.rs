//! Colors for the Atlas TUI.

use atlas_core::{ProcessingStatus, ScanPhase};
use ratatui::style::{Color, Modifier, Style};

/// Color palette.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary headers and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text (timestamps, dim info)
    pub text_dim: Color,
    /// Unfocused borders
    pub border_dim: Color,
    /// Selected row background
    pub selection: Color,
    pub status_healthy: Color,
    pub status_warning: Color,
    pub status_error: Color,
    pub status_idle: Color,
    /// Speaker label for the user in chat
    pub chat_user: Color,
    /// Speaker label for NUCLEUS in chat
    pub chat_assistant: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header: Color::Cyan,
            hotkey: Color::Yellow,
            text: Color::White,
            text_dim: Color::Gray,
            border_dim: Color::DarkGray,
            selection: Color::Rgb(40, 60, 80),
            status_healthy: Color::Green,
            status_warning: Color::Yellow,
            status_error: Color::Red,
            status_idle: Color::DarkGray,
            chat_user: Color::Blue,
            chat_assistant: Color::Magenta,
        }
    }
}

impl Theme {
    /// Color for a subject's processing status.
    pub fn status_color(&self, status: ProcessingStatus) -> Color {
        match status {
            ProcessingStatus::Completed => self.status_healthy,
            ProcessingStatus::Processing => self.status_warning,
            ProcessingStatus::Failed => self.status_error,
            ProcessingStatus::Pending => self.status_idle,
        }
    }

    /// Color for a scan's pipeline phase.
    pub fn phase_color(&self, phase: ScanPhase) -> Color {
        match phase {
            ScanPhase::Complete => self.status_healthy,
            ScanPhase::InProgress => self.status_warning,
            ScanPhase::Failed => self.status_error,
            ScanPhase::Pending => self.status_idle,
        }
    }

    /// Bold header style.
    pub fn header_style(&self) -> Style {
        Style::default().fg(self.header).add_modifier(Modifier::BOLD)
    }

    /// Dim text style.
    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Panel border style.
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.header)
        } else {
            Style::default().fg(self.border_dim)
        }
    }
}

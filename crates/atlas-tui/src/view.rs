//! View types and navigation for the Atlas TUI.
//!
//! Each view is one screen of the dashboard. Switching views unmounts the
//! previous screen and mounts the new one.

use std::fmt;

/// Available views in the Atlas dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum View {
    /// Pipeline summary (subjects, scans, completion counts)
    #[default]
    Home,
    /// DICOM / NIFTI storage browser
    Storage,
    /// Engine 1 monitor (DICOM to NIFTI conversion)
    Engine1,
    /// Engine 2 monitor (DTI / fMRI analysis)
    Engine2,
    /// Database tables
    Database,
    /// NUCLEUS orchestrator chat (activated with `:`)
    Chat,
}

impl View {
    /// Returns the hotkey character for this view.
    pub fn hotkey(&self) -> char {
        match self {
            View::Home => 'o',
            View::Storage => 'g',
            View::Engine1 => '1',
            View::Engine2 => '2',
            View::Database => 'd',
            View::Chat => ':',
        }
    }

    /// Returns the display title for this view.
    pub fn title(&self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Storage => "Storage",
            View::Engine1 => "Engine 1",
            View::Engine2 => "Engine 2",
            View::Database => "Database",
            View::Chat => "NUCLEUS",
        }
    }

    /// Returns the hotkey hint for status bar display.
    pub fn hotkey_hint(&self) -> String {
        format!("[{}] {}", self.hotkey(), self.title())
    }

    /// All views in display order (for Tab cycling).
    pub const ALL: [View; 6] = [
        View::Home,
        View::Storage,
        View::Engine1,
        View::Engine2,
        View::Database,
        View::Chat,
    ];

    /// Returns the next view in the cycle (for Tab navigation).
    pub fn next(&self) -> View {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Returns the previous view in the cycle (for Shift+Tab navigation).
    pub fn prev(&self) -> View {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        if idx == 0 {
            Self::ALL[Self::ALL.len() - 1]
        } else {
            Self::ALL[idx - 1]
        }
    }

    /// Try to parse a view from a hotkey character.
    pub fn from_hotkey(key: char) -> Option<View> {
        match key.to_ascii_lowercase() {
            'o' => Some(View::Home),
            'g' => Some(View::Storage),
            '1' => Some(View::Engine1),
            '2' => Some(View::Engine2),
            'd' => Some(View::Database),
            ':' => Some(View::Chat),
            _ => None,
        }
    }

    /// Whether the view refreshes itself on a timer.
    pub fn is_polled(&self) -> bool {
        matches!(self, View::Home | View::Engine1 | View::Engine2)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

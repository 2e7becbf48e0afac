//! Event handling for the Atlas TUI.
//!
//! Provides keyboard input handling and event routing.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::view::View;

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Switch to a specific view
    SwitchView(View),
    /// Cycle to the next view
    NextView,
    /// Cycle to the previous view
    PrevView,
    /// Show help overlay
    ShowHelp,
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Refresh current view
    Refresh,
    /// Cancel current operation / leave chat input
    Cancel,
    /// Navigate up in a list
    NavigateUp,
    /// Navigate down in a list
    NavigateDown,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Go to top
    GoToTop,
    /// Go to bottom
    GoToBottom,
    /// Open the selected item
    Select,
    /// Go up one level
    Back,
    /// Next tab inside the current view
    NextTab,
    /// Previous tab inside the current view
    PrevTab,
    /// Text input character
    TextInput(char),
    /// Line break in text input
    Newline,
    /// Backspace in text input
    Backspace,
    /// Submit text input
    Submit,
    /// No action needed
    None,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler {
    /// Whether keystrokes go to the chat input
    chat_mode: bool,
}

impl InputHandler {
    /// Create a new input handler.
    pub fn new() -> Self {
        Self { chat_mode: false }
    }

    /// Set whether chat/text input mode is active.
    pub fn set_chat_mode(&mut self, active: bool) {
        self.chat_mode = active;
    }

    /// Returns whether chat mode is active.
    pub fn is_chat_mode(&self) -> bool {
        self.chat_mode
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        // Ctrl+C always force quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        // Ctrl+L refreshes
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            return AppEvent::Refresh;
        }

        if key.code == KeyCode::Esc {
            self.chat_mode = false;
            return AppEvent::Cancel;
        }

        if self.chat_mode {
            return self.handle_chat_input(key);
        }

        self.handle_normal_mode(key)
    }

    /// Handle input when in chat/text mode.
    fn handle_chat_input(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                AppEvent::Newline
            }
            KeyCode::Enter => AppEvent::Submit,
            KeyCode::Backspace => AppEvent::Backspace,
            KeyCode::Char(c) => AppEvent::TextInput(c),
            KeyCode::Up => AppEvent::NavigateUp,
            KeyCode::Down => AppEvent::NavigateDown,
            KeyCode::PageUp => AppEvent::PageUp,
            KeyCode::PageDown => AppEvent::PageDown,
            KeyCode::Tab => AppEvent::NextView,
            KeyCode::BackTab => AppEvent::PrevView,
            _ => AppEvent::None,
        }
    }

    /// Handle input when in normal navigation mode.
    fn handle_normal_mode(&mut self, key: KeyEvent) -> AppEvent {
        match key.code {
            // Quit
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,

            // Help
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => AppEvent::ShowHelp,

            // Chat mode activation
            KeyCode::Char(':') => {
                self.chat_mode = true;
                AppEvent::SwitchView(View::Chat)
            }

            // Refresh
            KeyCode::Char('r') | KeyCode::Char('R') => AppEvent::Refresh,

            // Tabs inside a view
            KeyCode::Char(']') => AppEvent::NextTab,
            KeyCode::Char('[') => AppEvent::PrevTab,

            // Tab cycling
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    AppEvent::PrevView
                } else {
                    AppEvent::NextView
                }
            }
            KeyCode::BackTab => AppEvent::PrevView,

            // List navigation
            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::PageUp => AppEvent::PageUp,
            KeyCode::PageDown => AppEvent::PageDown,
            KeyCode::Home => AppEvent::GoToTop,
            KeyCode::End => AppEvent::GoToBottom,

            // Hierarchy
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => AppEvent::Select,
            KeyCode::Backspace | KeyCode::Left => AppEvent::Back,

            // View navigation hotkeys
            KeyCode::Char(c) => View::from_hotkey(c).map_or(AppEvent::None, AppEvent::SwitchView),

            _ => AppEvent::None,
        }
    }
}

//! Main application state and logic for the Atlas TUI.
//!
//! The `App` struct owns the async runtime, the active screen, and view
//! switching. Exactly one screen is mounted at a time; switching views drops
//! the old screen (stopping its pollers) before the new one is mounted.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use atlas_api::{ApiClient, AtlasBackend};
use atlas_config::AtlasConfig;
use atlas_core::AtlasError;
use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tracing::{debug, info};

use crate::chat_panel::ChatPanel;
use crate::database_panel::DatabasePanel;
use crate::engine_panel::{Engine1Panel, Engine2Panel};
use crate::event::{AppEvent, InputHandler};
use crate::format::truncate;
use crate::screen::{MountedScreen, ScreenContext, ScreenState};
use crate::storage_panel::StoragePanel;
use crate::summary_panel::SummaryPanel;
use crate::theme::Theme;
use crate::view::View;

/// Result type for app operations.
pub type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Target frame rate (30 FPS is plenty for a polling dashboard).
const TARGET_FPS: u64 = 30;
const FRAME_DURATION: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// How often delivered fetch results are drained.
const DATA_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Header timestamp cache duration (update every second).
const TIMESTAMP_CACHE_DURATION: Duration = Duration::from_secs(1);

/// Rows moved by PageUp / PageDown.
const PAGE_SIZE: usize = 10;

/// Keyboard protocol flags requested from terminals that support them.
///
/// Disambiguated escape codes let Shift+Enter reach the chat input as a
/// modified Enter instead of a plain carriage return.
pub fn keyboard_enhancement_flags() -> KeyboardEnhancementFlags {
    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
}

/// Main application state.
pub struct App {
    /// Current active view
    current_view: View,
    /// Previous view (for back navigation)
    previous_view: Option<View>,
    /// Input handler for key events
    input_handler: InputHandler,
    /// Whether the app should quit
    should_quit: bool,
    /// Whether to show the help overlay
    show_help: bool,
    /// Status message to display
    status_message: Option<String>,
    /// The mounted screen; dropped before the runtime
    screen: Option<MountedScreen>,
    /// Handles shared with every mounted screen
    ctx: ScreenContext,
    theme: Theme,
    dirty: bool,
    cached_timestamp: String,
    last_timestamp_update: Instant,
    last_poll_time: Instant,
    /// Runtime all network work runs on
    _runtime: tokio::runtime::Runtime,
}

impl App {
    /// Create the app against the configured backend.
    pub fn new(config: AtlasConfig) -> AppResult<Self> {
        let client = ApiClient::from_config(&config)?;
        info!(backend = %client.base_url(), "using backend");
        Self::with_backend(config, Arc::new(client))
    }

    /// Create the app against any backend implementation.
    pub fn with_backend(config: AtlasConfig, backend: Arc<dyn AtlasBackend>) -> AppResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("atlas-io")
            .enable_all()
            .build()
            .map_err(|e| AtlasError::RuntimeInit {
                message: e.to_string(),
            })?;

        let ctx = ScreenContext {
            runtime: runtime.handle().clone(),
            backend,
            config: Arc::new(config),
        };

        let current_view = View::default();
        let screen = MountedScreen::mount(current_view, ctx.clone());

        Ok(Self {
            current_view,
            previous_view: None,
            input_handler: InputHandler::new(),
            should_quit: false,
            show_help: false,
            status_message: None,
            screen: Some(screen),
            ctx,
            theme: Theme::default(),
            dirty: true,
            cached_timestamp: String::new(),
            last_timestamp_update: Instant::now() - TIMESTAMP_CACHE_DURATION,
            last_poll_time: Instant::now(),
            _runtime: runtime,
        })
    }

    /// Get the current view.
    pub fn current_view(&self) -> View {
        self.current_view
    }

    /// Check if the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Check if help overlay is shown.
    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// Whether keystrokes currently go to the chat input.
    pub fn is_chat_mode(&self) -> bool {
        self.input_handler.is_chat_mode()
    }

    /// The mounted screen.
    pub fn screen(&self) -> Option<&MountedScreen> {
        self.screen.as_ref()
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn get_cached_timestamp(&mut self) -> String {
        if self.last_timestamp_update.elapsed() >= TIMESTAMP_CACHE_DURATION {
            self.cached_timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
            self.last_timestamp_update = Instant::now();
        }
        self.cached_timestamp.clone()
    }

    /// Switch to a specific view, unmounting the current screen.
    pub fn switch_view(&mut self, view: View) {
        if self.current_view == view {
            return;
        }
        self.previous_view = Some(self.current_view);
        self.current_view = view;

        // Unmount first so the old pollers stop before new ones start.
        self.screen = None;
        self.screen = Some(MountedScreen::mount(view, self.ctx.clone()));

        self.input_handler.set_chat_mode(view == View::Chat);
        self.status_message = None;
        debug!(view = %view, "view switched");
        self.mark_dirty();
    }

    /// Go to the next view in the cycle.
    pub fn next_view(&mut self) {
        let next = self.current_view.next();
        self.switch_view(next);
    }

    /// Go to the previous view in the cycle.
    pub fn prev_view(&mut self) {
        let prev = self.current_view.prev();
        self.switch_view(prev);
    }

    /// Go back to the previous view (if any).
    pub fn go_back(&mut self) {
        if let Some(prev) = self.previous_view.take() {
            self.switch_view(prev);
        }
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let event = self.input_handler.handle_key(key);

        // Any key closes the help overlay.
        if self.show_help && event != AppEvent::ForceQuit {
            self.show_help = false;
            self.mark_dirty();
            return;
        }
        self.handle_app_event(event);
    }

    /// Handle an application event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        if event == AppEvent::None {
            return;
        }
        self.mark_dirty();

        match event {
            AppEvent::SwitchView(view) => self.switch_view(view),
            AppEvent::NextView => self.next_view(),
            AppEvent::PrevView => self.prev_view(),
            AppEvent::ShowHelp => self.show_help = true,
            AppEvent::Quit | AppEvent::ForceQuit => {
                info!("quit requested");
                self.should_quit = true;
            }
            AppEvent::Refresh => {
                if let Some(screen) = self.screen.as_mut() {
                    screen.refresh();
                }
                self.status_message = Some(format!("Refreshing {}...", self.current_view.title()));
            }
            AppEvent::Cancel => {
                self.show_help = false;
                self.status_message = None;
            }
            other => {
                let Some(screen) = self.screen.as_mut() else {
                    return;
                };
                match other {
                    AppEvent::NavigateUp => screen.navigate_up(),
                    AppEvent::NavigateDown => screen.navigate_down(),
                    AppEvent::PageUp => screen.page(false, PAGE_SIZE),
                    AppEvent::PageDown => screen.page(true, PAGE_SIZE),
                    AppEvent::GoToTop => screen.go_to_top(),
                    AppEvent::GoToBottom => screen.go_to_bottom(),
                    AppEvent::Select => screen.select(),
                    AppEvent::Back => screen.back(),
                    AppEvent::NextTab => screen.next_tab(),
                    AppEvent::PrevTab => screen.prev_tab(),
                    AppEvent::TextInput(c) => screen.input_char(c),
                    AppEvent::Newline => screen.input_newline(),
                    AppEvent::Backspace => screen.input_backspace(),
                    AppEvent::Submit => screen.submit(),
                    _ => {}
                }
            }
        }
    }

    /// Apply fetch results delivered since the last poll.
    pub fn poll_data(&mut self) -> bool {
        let changed = self.screen.as_mut().is_some_and(|s| s.drain());
        if changed {
            self.status_message = None;
            self.mark_dirty();
        }
        changed
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        crossterm::terminal::enable_raw_mode().map_err(AtlasError::terminal_init)?;
        let mut stdout = io::stdout();
        atlas_core::set_console_logging(false);
        if let Err(e) = crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen) {
            atlas_core::set_console_logging(true);
            let _ = crossterm::terminal::disable_raw_mode();
            return Err(AtlasError::terminal_init(e).into());
        }

        // Without disambiguated escape codes Shift+Enter arrives as a bare Enter.
        let enhanced = matches!(crossterm::terminal::supports_keyboard_enhancement(), Ok(true));
        if enhanced {
            crossterm::execute!(
                stdout,
                PushKeyboardEnhancementFlags(keyboard_enhancement_flags())
            )?;
        }
        debug!(enhanced, "keyboard enhancement");

        let backend = CrosstermBackend::new(stdout);
        let result = match Terminal::new(backend) {
            Ok(mut terminal) => {
                let result = self.run_loop(&mut terminal);
                let _ = terminal.show_cursor();
                result
            }
            Err(e) => Err(AtlasError::terminal_init(e).into()),
        };

        let mut stdout = io::stdout();
        if enhanced {
            let _ = crossterm::execute!(stdout, PopKeyboardEnhancementFlags);
        }
        let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
        let _ = crossterm::terminal::disable_raw_mode();
        atlas_core::set_console_logging(true);

        // Stop the pollers while the runtime is still alive.
        self.screen = None;
        result
    }

    /// The inner event loop with frame-rate limiting.
    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> AppResult<()> {
        while !self.should_quit {
            let frame_start = Instant::now();

            if self.last_poll_time.elapsed() >= DATA_POLL_INTERVAL {
                self.poll_data();
                self.last_poll_time = Instant::now();
            }

            let needs_redraw =
                self.take_dirty() || self.last_timestamp_update.elapsed() >= TIMESTAMP_CACHE_DURATION;
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
            }

            let elapsed = frame_start.elapsed();
            let event_timeout = if elapsed < FRAME_DURATION {
                FRAME_DURATION - elapsed
            } else {
                Duration::from_millis(10)
            };

            if event::poll(event_timeout)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key_event(key),
                    Event::Resize(..) => self.mark_dirty(),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let [header, content, footer] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(2),
        ])
        .areas(area);

        self.draw_header(frame, header);
        self.draw_content(frame, content);
        self.draw_footer(frame, footer);

        if self.show_help {
            self.draw_help_overlay(frame, area);
        }
    }

    fn draw_header(&mut self, frame: &mut Frame, area: Rect) {
        let now = self.get_cached_timestamp();
        let theme = &self.theme;
        let title = format!(" NUCLEUS ATLAS - {} ", self.current_view.title());

        let (status_text, status_color) = match self.screen.as_ref() {
            Some(screen) if screen.last_error().is_some() => {
                ("[Backend error]".to_string(), theme.status_error)
            }
            Some(screen) if screen.is_loading() => ("[Loading...]".to_string(), theme.status_warning),
            Some(screen) if screen.view().is_polled() => ("[Live]".to_string(), theme.status_healthy),
            _ => ("[Ready]".to_string(), theme.text_dim),
        };

        let right_len = now.len() + 2 + status_text.len();
        let spacing = area
            .width
            .saturating_sub(title.len() as u16 + right_len as u16 + 2) as usize;

        let header = Paragraph::new(Line::from(vec![
            Span::styled(title, theme.header_style()),
            Span::raw(" ".repeat(spacing)),
            Span::styled(now, theme.dim_style()),
            Span::raw("  "),
            Span::styled(status_text, Style::default().fg(status_color)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_dim)),
        );

        frame.render_widget(header, area);
    }

    fn draw_content(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let Some(screen) = self.screen.as_ref() else {
            return;
        };
        match screen.state() {
            ScreenState::Home(s) => frame.render_widget(SummaryPanel::new(s, theme), area),
            ScreenState::Storage(s) => frame.render_widget(StoragePanel::new(&s.browser, theme), area),
            ScreenState::Engine1(s) => frame.render_widget(Engine1Panel::new(s, theme), area),
            ScreenState::Engine2(s) => frame.render_widget(Engine2Panel::new(s, theme), area),
            ScreenState::Database(s) => frame.render_widget(DatabasePanel::new(s, theme), area),
            ScreenState::Chat(s) => frame.render_widget(ChatPanel::new(s, theme), area),
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let hotkey_style = Style::default().fg(theme.hotkey);
        let mut hints = Vec::new();
        for view in View::ALL {
            hints.push(Span::styled(format!("[{}]", view.hotkey()), hotkey_style));
            hints.push(Span::raw(format!("{} ", view.title())));
        }
        hints.push(Span::styled("[r]", hotkey_style));
        hints.push(Span::raw("Refresh "));
        hints.push(Span::styled("[?]", hotkey_style));
        hints.push(Span::raw("Help "));
        hints.push(Span::styled("[q]", hotkey_style));
        hints.push(Span::raw("Quit"));

        let status = self
            .status_message
            .clone()
            .or_else(|| self.screen.as_ref().and_then(|s| s.notice()).map(str::to_string))
            .or_else(|| {
                self.screen
                    .as_ref()
                    .and_then(|s| s.last_error())
                    .map(|e| truncate(e, (area.width / 2) as usize))
            })
            .unwrap_or_default();
        let status_color = if self.screen.as_ref().is_some_and(|s| s.last_error().is_some()) {
            theme.status_error
        } else {
            theme.text_dim
        };

        let footer = Paragraph::new(Line::from(hints))
            .style(theme.dim_style())
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(theme.border_dim))
                    .title(Span::styled(status, Style::default().fg(status_color)))
                    .title_alignment(Alignment::Right),
            );

        frame.render_widget(footer, area);
    }

    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let overlay_width = 62.min(area.width.saturating_sub(4));
        let overlay_height = 32.min(area.height.saturating_sub(2));
        let overlay_x = (area.width - overlay_width) / 2;
        let overlay_y = (area.height - overlay_height) / 2;
        let overlay_area = Rect::new(overlay_x, overlay_y, overlay_width, overlay_height);

        frame.render_widget(Clear, overlay_area);

        let help_text = "\
Atlas Hotkey Reference

Screens:
  o          Home (pipeline summary)
  g          Storage (DICOM / NIFTI buckets)
  1          Engine 1 monitor
  2          Engine 2 monitor
  d          Database tables
  :          NUCLEUS chat
  Tab        Cycle screens forward
  Shift+Tab  Cycle screens backward

General:
  ?  h       Show this help
  q          Quit
  Esc        Cancel / leave chat input
  Ctrl+C     Force quit
  r  Ctrl+L  Refresh

Lists:
  ↑ k / ↓ j  Move selection
  [ ]        Switch tab (bucket, modality, table)
  Enter  →   Open directory
  Bksp   ←   Up one level

Chat:
  Enter        Send
  Shift+Enter  New line
  Alt+Enter    New line (any terminal)

Press any key to close this help.";

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(theme.text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.header))
                    .title(Span::styled(
                        " Help ",
                        Style::default().fg(theme.header).add_modifier(Modifier::BOLD),
                    ))
                    .style(Style::default().bg(Color::Black)),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(help, overlay_area);
    }
}

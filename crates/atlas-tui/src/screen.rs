//! Mounted screen state.
//!
//! A [`MountedScreen`] exists only while its view is active. It owns the
//! screen's pollers and the receiving end of its result channel; switching
//! views drops it, which stops the pollers and makes any late results
//! undeliverable. All state changes happen in [`MountedScreen::drain`] and
//! the input handlers, on the UI thread.

use std::sync::Arc;

use atlas_api::{ApiError, AtlasBackend};
use atlas_chat::{ChatError, ChatSession};
use atlas_config::AtlasConfig;
use atlas_core::types::{Modality, Scan, StorageEntry, Subject};
use atlas_core::{ApplyOutcome, PipelineSummary, Snapshot};
use futures_util::future;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::browser::{ListingRequest, StorageBrowser};
use crate::poller::Poller;
use crate::view::View;

type ApiResult<T> = Result<T, ApiError>;

/// Shared handles every screen needs to issue requests.
#[derive(Clone)]
pub struct ScreenContext {
    pub runtime: Handle,
    pub backend: Arc<dyn AtlasBackend>,
    pub config: Arc<AtlasConfig>,
}

/// Which snapshot a request feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Summary,
    Subjects,
    Scans,
}

/// Results delivered from fetch tasks to the UI thread.
#[derive(Debug)]
pub enum DataEvent {
    /// A fetch with sequence `seq` has started
    Requested { feed: Feed, seq: u64 },
    Summary {
        seq: u64,
        result: ApiResult<PipelineSummary>,
    },
    Subjects {
        seq: u64,
        result: ApiResult<Vec<Subject>>,
    },
    Scans {
        seq: u64,
        result: ApiResult<Vec<Scan>>,
    },
    Listing {
        request: ListingRequest,
        result: ApiResult<Vec<StorageEntry>>,
    },
    ChatReply { result: ApiResult<String> },
}

// ============ Fetch tasks ============

async fn fetch_summary(backend: Arc<dyn AtlasBackend>, tx: UnboundedSender<DataEvent>, seq: u64) {
    let _ = tx.send(DataEvent::Requested {
        feed: Feed::Summary,
        seq,
    });
    let result = future::try_join(backend.fetch_subjects(), backend.fetch_scans())
        .await
        .map(|(subjects, scans)| PipelineSummary::from_listings(&subjects, &scans));
    let _ = tx.send(DataEvent::Summary { seq, result });
}

async fn fetch_subjects(backend: Arc<dyn AtlasBackend>, tx: UnboundedSender<DataEvent>, seq: u64) {
    let _ = tx.send(DataEvent::Requested {
        feed: Feed::Subjects,
        seq,
    });
    let result = backend.fetch_subjects().await;
    let _ = tx.send(DataEvent::Subjects { seq, result });
}

async fn fetch_scans(backend: Arc<dyn AtlasBackend>, tx: UnboundedSender<DataEvent>, seq: u64) {
    let _ = tx.send(DataEvent::Requested {
        feed: Feed::Scans,
        seq,
    });
    let result = backend.fetch_scans().await;
    let _ = tx.send(DataEvent::Scans { seq, result });
}

async fn fetch_listing(
    backend: Arc<dyn AtlasBackend>,
    tx: UnboundedSender<DataEvent>,
    request: ListingRequest,
) {
    let result = backend
        .list_storage(&request.bucket, &request.prefix, request.max_results)
        .await;
    let _ = tx.send(DataEvent::Listing { request, result });
}

async fn send_chat(backend: Arc<dyn AtlasBackend>, tx: UnboundedSender<DataEvent>, message: String) {
    let result = backend.chat(&message).await;
    let _ = tx.send(DataEvent::ChatReply { result });
}

fn spawn_poller<F, Fut>(
    ctx: &ScreenContext,
    tx: &UnboundedSender<DataEvent>,
    name: &'static str,
    interval: std::time::Duration,
    fetch: F,
) -> Poller
where
    F: Fn(Arc<dyn AtlasBackend>, UnboundedSender<DataEvent>, u64) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let backend = Arc::clone(&ctx.backend);
    let tx = tx.clone();
    Poller::spawn(&ctx.runtime, name, interval, move |seq| {
        fetch(Arc::clone(&backend), tx.clone(), seq)
    })
}

fn record<T>(snapshot: &mut Snapshot<T>, feed: Feed, seq: u64, result: ApiResult<T>) -> ApplyOutcome {
    let failure = result
        .as_ref()
        .err()
        .map(|e| (e.to_string(), e.endpoint().unwrap_or_default().to_string()));
    // The snapshot keeps the status-line text; the full error goes to the log.
    let outcome = snapshot.apply(seq, result.map_err(|e| e.friendly_message()));
    match outcome {
        ApplyOutcome::Failed => {
            let (error, endpoint) = failure.unwrap_or_default();
            warn!(?feed, seq, %endpoint, %error, "refresh failed, keeping previous data");
        }
        ApplyOutcome::Stale => debug!(?feed, seq, "discarding stale response"),
        ApplyOutcome::Replaced => debug!(?feed, seq, "snapshot replaced"),
    }
    outcome
}

// ============ Screen states ============

/// Home: headline pipeline numbers.
#[derive(Debug)]
pub struct HomeScreen {
    pub summary: Snapshot<PipelineSummary>,
    poller: Poller,
}

/// Engine 1: subject conversion progress.
#[derive(Debug)]
pub struct Engine1Screen {
    pub subjects: Snapshot<Vec<Subject>>,
    poller: Poller,
}

/// Analysis modality tabs on the Engine 2 screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalityTab {
    #[default]
    Dti,
    Fmri,
}

impl ModalityTab {
    pub const ALL: [ModalityTab; 2] = [ModalityTab::Dti, ModalityTab::Fmri];

    pub fn modality(&self) -> Modality {
        match self {
            ModalityTab::Dti => Modality::Dti,
            ModalityTab::Fmri => Modality::Fmri,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ModalityTab::Dti => "DTI Analysis",
            ModalityTab::Fmri => "fMRI Analysis",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ModalityTab::Dti => ModalityTab::Fmri,
            ModalityTab::Fmri => ModalityTab::Dti,
        }
    }
}

/// Engine 2: DTI / fMRI analysis progress.
#[derive(Debug)]
pub struct Engine2Screen {
    pub scans: Snapshot<Vec<Scan>>,
    pub tab: ModalityTab,
    poller: Poller,
}

impl Engine2Screen {
    /// Scans of the active tab's modality, in listing order.
    pub fn tab_scans(&self) -> Vec<&Scan> {
        let modality = self.tab.modality();
        self.scans
            .value()
            .iter()
            .filter(|s| s.modality == modality)
            .collect()
    }
}

/// Tables on the Database screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseTab {
    #[default]
    Subjects,
    Scans,
    DtiMetrics,
    FmriNetworks,
    Decisions,
}

impl DatabaseTab {
    pub const ALL: [DatabaseTab; 5] = [
        DatabaseTab::Subjects,
        DatabaseTab::Scans,
        DatabaseTab::DtiMetrics,
        DatabaseTab::FmriNetworks,
        DatabaseTab::Decisions,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DatabaseTab::Subjects => "Subjects",
            DatabaseTab::Scans => "Scans",
            DatabaseTab::DtiMetrics => "DTI Metrics",
            DatabaseTab::FmriNetworks => "fMRI Networks",
            DatabaseTab::Decisions => "Decisions",
        }
    }

    /// Text shown for tables the backend does not serve yet.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            DatabaseTab::DtiMetrics => Some("DTI metrics endpoint not yet implemented"),
            DatabaseTab::FmriNetworks => Some("fMRI networks endpoint not yet implemented"),
            DatabaseTab::Decisions => Some("Decision log endpoint not yet implemented"),
            DatabaseTab::Subjects | DatabaseTab::Scans => None,
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Database: read-only tables, fetched on mount and on `r`.
#[derive(Debug)]
pub struct DatabaseScreen {
    pub subjects: Snapshot<Vec<Subject>>,
    pub scans: Snapshot<Vec<Scan>>,
    pub tab: DatabaseTab,
    /// First visible row of the active table
    pub scroll: usize,
    next_seq: u64,
}

impl DatabaseScreen {
    fn row_count(&self) -> usize {
        match self.tab {
            DatabaseTab::Subjects => self.subjects.value().len(),
            DatabaseTab::Scans => self.scans.value().len(),
            _ => 0,
        }
    }
}

/// Storage: DICOM / NIFTI browser.
#[derive(Debug)]
pub struct StorageScreen {
    pub browser: StorageBrowser,
}

/// Chat: NUCLEUS session plus the input line.
#[derive(Debug, Default)]
pub struct ChatScreen {
    pub session: ChatSession,
    pub input: String,
    /// Lines scrolled up from the bottom of the transcript
    pub scroll: u16,
}

/// State of the mounted screen.
#[derive(Debug)]
pub enum ScreenState {
    Home(HomeScreen),
    Storage(StorageScreen),
    Engine1(Engine1Screen),
    Engine2(Engine2Screen),
    Database(DatabaseScreen),
    Chat(ChatScreen),
}

/// The active screen with its channel and pollers.
pub struct MountedScreen {
    view: View,
    state: ScreenState,
    ctx: ScreenContext,
    tx: UnboundedSender<DataEvent>,
    rx: UnboundedReceiver<DataEvent>,
    notice: Option<String>,
}

impl MountedScreen {
    /// Mount `view`: create its state, start its pollers, and issue initial fetches.
    pub fn mount(view: View, ctx: ScreenContext) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Arc::clone(&ctx.config);

        let state = match view {
            View::Home => ScreenState::Home(HomeScreen {
                summary: Snapshot::default(),
                poller: spawn_poller(&ctx, &tx, "home", config.summary_interval(), fetch_summary),
            }),
            View::Engine1 => ScreenState::Engine1(Engine1Screen {
                subjects: Snapshot::default(),
                poller: spawn_poller(&ctx, &tx, "engine1", config.monitor_interval(), fetch_subjects),
            }),
            View::Engine2 => ScreenState::Engine2(Engine2Screen {
                scans: Snapshot::default(),
                tab: ModalityTab::default(),
                poller: spawn_poller(&ctx, &tx, "engine2", config.monitor_interval(), fetch_scans),
            }),
            View::Database => ScreenState::Database(DatabaseScreen {
                subjects: Snapshot::default(),
                scans: Snapshot::default(),
                tab: DatabaseTab::default(),
                scroll: 0,
                next_seq: 0,
            }),
            View::Storage => ScreenState::Storage(StorageScreen {
                browser: StorageBrowser::from_config(&config),
            }),
            View::Chat => ScreenState::Chat(ChatScreen::default()),
        };

        debug!(view = %view, "screen mounted");
        let mut screen = Self {
            view,
            state,
            ctx,
            tx,
            rx,
            notice: None,
        };
        if matches!(view, View::Database | View::Storage) {
            screen.refresh();
        }
        screen
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    /// Latest transient message for the status line.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Error text of the most recent failed refresh on this screen, if it has not since succeeded.
    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            ScreenState::Home(s) => s.summary.last_error(),
            ScreenState::Engine1(s) => s.subjects.last_error(),
            ScreenState::Engine2(s) => s.scans.last_error(),
            ScreenState::Database(s) => s.subjects.last_error().or(s.scans.last_error()),
            ScreenState::Storage(s) => s.browser.active().and_then(|c| c.listing().last_error()),
            ScreenState::Chat(_) => None,
        }
    }

    /// Whether any request of this screen is outstanding.
    pub fn is_loading(&self) -> bool {
        match &self.state {
            ScreenState::Home(s) => s.summary.is_loading(),
            ScreenState::Engine1(s) => s.subjects.is_loading(),
            ScreenState::Engine2(s) => s.scans.is_loading(),
            ScreenState::Database(s) => s.subjects.is_loading() || s.scans.is_loading(),
            ScreenState::Storage(s) => s.browser.active().is_some_and(|c| c.is_loading()),
            ScreenState::Chat(s) => s.session.is_pending(),
        }
    }

    /// Apply every result delivered since the last call. Returns whether anything changed.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
            changed = true;
        }
        changed
    }

    fn apply(&mut self, event: DataEvent) {
        match (&mut self.state, event) {
            (ScreenState::Home(s), DataEvent::Requested { seq, .. }) => s.summary.mark_requested(seq),
            (ScreenState::Home(s), DataEvent::Summary { seq, result }) => {
                record(&mut s.summary, Feed::Summary, seq, result);
            }
            (ScreenState::Engine1(s), DataEvent::Requested { seq, .. }) => s.subjects.mark_requested(seq),
            (ScreenState::Engine1(s), DataEvent::Subjects { seq, result }) => {
                record(&mut s.subjects, Feed::Subjects, seq, result);
            }
            (ScreenState::Engine2(s), DataEvent::Requested { seq, .. }) => s.scans.mark_requested(seq),
            (ScreenState::Engine2(s), DataEvent::Scans { seq, result }) => {
                record(&mut s.scans, Feed::Scans, seq, result);
            }
            (ScreenState::Database(s), DataEvent::Requested { feed, seq }) => match feed {
                Feed::Scans => s.scans.mark_requested(seq),
                _ => s.subjects.mark_requested(seq),
            },
            (ScreenState::Database(s), DataEvent::Subjects { seq, result }) => {
                record(&mut s.subjects, Feed::Subjects, seq, result);
                s.scroll = s.scroll.min(s.row_count().saturating_sub(1));
            }
            (ScreenState::Database(s), DataEvent::Scans { seq, result }) => {
                record(&mut s.scans, Feed::Scans, seq, result);
                s.scroll = s.scroll.min(s.row_count().saturating_sub(1));
            }
            (ScreenState::Storage(s), DataEvent::Listing { request, result }) => {
                s.browser.apply_listing(&request, result);
            }
            (ScreenState::Chat(s), DataEvent::ChatReply { result }) => {
                if let Err(e) = s.session.resolve(result) {
                    debug!(error = %e, "ignoring chat reply");
                }
            }
            (_, event) => debug!(view = %self.view, ?event, "event for another screen ignored"),
        }
    }

    fn spawn_listing(&self, request: Option<ListingRequest>) {
        if let Some(request) = request {
            self.ctx.runtime.spawn(fetch_listing(
                Arc::clone(&self.ctx.backend),
                self.tx.clone(),
                request,
            ));
        }
    }

    /// Manual refresh (`r`).
    pub fn refresh(&mut self) {
        self.notice = None;
        match &mut self.state {
            ScreenState::Home(s) => {
                s.poller.trigger();
            }
            ScreenState::Engine1(s) => {
                s.poller.trigger();
            }
            ScreenState::Engine2(s) => {
                s.poller.trigger();
            }
            ScreenState::Database(s) => {
                s.next_seq += 1;
                let seq = s.next_seq;
                let backend = &self.ctx.backend;
                self.ctx
                    .runtime
                    .spawn(fetch_subjects(Arc::clone(backend), self.tx.clone(), seq));
                self.ctx
                    .runtime
                    .spawn(fetch_scans(Arc::clone(backend), self.tx.clone(), seq));
            }
            ScreenState::Storage(s) => {
                let request = s.browser.refresh();
                self.spawn_listing(request);
            }
            ScreenState::Chat(_) => {}
        }
    }

    pub fn navigate_up(&mut self) {
        match &mut self.state {
            ScreenState::Storage(s) => s.browser.select_prev(),
            ScreenState::Database(s) => s.scroll = s.scroll.saturating_sub(1),
            ScreenState::Chat(s) => s.scroll = s.scroll.saturating_add(1),
            _ => {}
        }
    }

    pub fn navigate_down(&mut self) {
        match &mut self.state {
            ScreenState::Storage(s) => s.browser.select_next(),
            ScreenState::Database(s) => {
                s.scroll = (s.scroll + 1).min(s.row_count().saturating_sub(1));
            }
            ScreenState::Chat(s) => s.scroll = s.scroll.saturating_sub(1),
            _ => {}
        }
    }

    pub fn page(&mut self, down: bool, rows: usize) {
        for _ in 0..rows {
            if down {
                self.navigate_down();
            } else {
                self.navigate_up();
            }
        }
    }

    pub fn go_to_top(&mut self) {
        match &mut self.state {
            ScreenState::Storage(s) => s.browser.select_first(),
            ScreenState::Database(s) => s.scroll = 0,
            _ => {}
        }
    }

    pub fn go_to_bottom(&mut self) {
        match &mut self.state {
            ScreenState::Storage(s) => s.browser.select_last(),
            ScreenState::Database(s) => s.scroll = s.row_count().saturating_sub(1),
            ScreenState::Chat(s) => s.scroll = 0,
            _ => {}
        }
    }

    /// Open the selected storage entry.
    pub fn select(&mut self) {
        if let ScreenState::Storage(s) = &mut self.state {
            let request = s.browser.enter_selected();
            self.spawn_listing(request);
        }
    }

    /// Go up one level in the storage browser.
    pub fn back(&mut self) {
        if let ScreenState::Storage(s) = &mut self.state {
            let request = s.browser.go_up();
            self.spawn_listing(request);
        }
    }

    pub fn next_tab(&mut self) {
        self.switch_tab(true);
    }

    pub fn prev_tab(&mut self) {
        self.switch_tab(false);
    }

    fn switch_tab(&mut self, forward: bool) {
        match &mut self.state {
            ScreenState::Storage(s) => {
                let request = if forward {
                    s.browser.next_bucket()
                } else {
                    s.browser.prev_bucket()
                };
                self.spawn_listing(request);
            }
            ScreenState::Engine2(s) => s.tab = s.tab.toggle(),
            ScreenState::Database(s) => {
                s.tab = if forward { s.tab.next() } else { s.tab.prev() };
                s.scroll = 0;
            }
            _ => {}
        }
    }

    // ============ Chat input ============

    pub fn input_char(&mut self, c: char) {
        if let ScreenState::Chat(s) = &mut self.state {
            s.input.push(c);
        }
    }

    pub fn input_newline(&mut self) {
        if let ScreenState::Chat(s) = &mut self.state {
            s.input.push('\n');
        }
    }

    pub fn input_backspace(&mut self) {
        if let ScreenState::Chat(s) = &mut self.state {
            s.input.pop();
        }
    }

    /// Submit the chat input. Blank input and submissions while waiting are ignored.
    pub fn submit(&mut self) {
        let ScreenState::Chat(s) = &mut self.state else {
            return;
        };
        match s.session.begin(&s.input) {
            Ok(message) => {
                s.input.clear();
                s.scroll = 0;
                self.notice = None;
                self.ctx.runtime.spawn(send_chat(
                    Arc::clone(&self.ctx.backend),
                    self.tx.clone(),
                    message,
                ));
            }
            Err(ChatError::EmptyInput) => {}
            Err(e) => self.notice = e.suggested_action().map(str::to_string),
        }
    }
}

impl Drop for MountedScreen {
    fn drop(&mut self) {
        debug!(view = %self.view, "screen unmounted");
    }
}

//! Fixed-interval refresh timer owned by a mounted screen.
//!
//! A [`Poller`] runs its fetch once immediately and then on every interval
//! tick. Each fetch is spawned as its own task, so a slow request never
//! holds back the next tick and several requests may overlap. Every fetch
//! receives a fresh sequence number; the receiving side uses it to discard
//! responses that arrive after a newer one was applied.
//!
//! Dropping the poller stops the timer. Fetches already in flight finish on
//! their own and deliver into a channel nobody reads any more.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

type FetchFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type FetchFn = dyn Fn(u64) -> FetchFuture + Send + Sync;

/// Periodic refresh task.
pub struct Poller {
    name: &'static str,
    interval: Duration,
    runtime: Handle,
    fetch: Arc<FetchFn>,
    seq: Arc<AtomicU64>,
    timer: JoinHandle<()>,
}

impl Poller {
    /// Start polling on `runtime`.
    ///
    /// `fetch` is called with the sequence number of each request.
    pub fn spawn<F, Fut>(runtime: &Handle, name: &'static str, interval: Duration, fetch: F) -> Self
    where
        F: Fn(u64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let fetch: Arc<FetchFn> = Arc::new(move |seq| Box::pin(fetch(seq)) as FetchFuture);
        let seq = Arc::new(AtomicU64::new(0));

        let timer = {
            let fetch = Arc::clone(&fetch);
            let seq = Arc::clone(&seq);
            let runtime_handle = runtime.clone();
            runtime.spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let next = seq.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(poller = name, seq = next, "poll tick");
                    runtime_handle.spawn(fetch(next));
                }
            })
        };

        debug!(poller = name, interval_ms = interval.as_millis() as u64, "poller started");

        Self {
            name,
            interval,
            runtime: runtime.clone(),
            fetch,
            seq,
            timer,
        }
    }

    /// Run an extra fetch now, outside the schedule. Returns its sequence number.
    pub fn trigger(&self) -> u64 {
        let next = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(poller = self.name, seq = next, "manual refresh");
        self.runtime.spawn((self.fetch)(next));
        next
    }

    /// Number of fetches issued so far.
    pub fn issued(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.timer.abort();
        debug!(poller = self.name, issued = self.issued(), "poller stopped");
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("issued", &self.issued())
            .finish()
    }
}

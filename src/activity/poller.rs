//! Fixed-interval polling with out-of-order suppression.
//!
//! A [`Poller`] owns one background driver task. The driver fires a poll
//! cycle immediately and then on every tick; each cycle runs as its own task
//! so a slow response never delays the schedule. Completed cycles come back
//! to the driver, which is the only writer of the published snapshot:
//!
//! - every cycle carries a sequence number; a response older than the one
//!   already applied is dropped
//! - every cycle carries the query generation; changing the query bumps the
//!   generation, aborts in-flight cycles, and drops any that still complete
//! - failures keep the previous snapshot and only record the error
//!
//! Dropping the `Poller` cancels the driver and every in-flight cycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::query::WindowQuery;
use crate::errors::ActivityError;

/// One source the poller can query.
#[async_trait]
pub trait Fetch<T>: Send + Sync + 'static {
    async fn fetch(&self, query: &WindowQuery) -> Result<T, ActivityError>;
}

/// First-load state machine. Only `Uninitialized` shows as loading; once a
/// cycle has succeeded later refreshes replace the data silently.
#[derive(Debug)]
pub enum LoadState<T> {
    Uninitialized,
    Ready(Arc<T>),
}

impl<T> Clone for LoadState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Uninitialized => Self::Uninitialized,
            Self::Ready(data) => Self::Ready(Arc::clone(data)),
        }
    }
}

/// What a subscriber sees after each applied cycle.
#[derive(Debug)]
pub struct PollSnapshot<T> {
    pub state: LoadState<T>,
    /// Sequence number of the cycle whose data is shown (0 before any).
    pub applied_seq: u64,
    /// Error from the most recent failed cycle, cleared on success.
    pub last_error: Option<String>,
}

impl<T> Clone for PollSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            applied_seq: self.applied_seq,
            last_error: self.last_error.clone(),
        }
    }
}

impl<T> Default for PollSnapshot<T> {
    fn default() -> Self {
        Self {
            state: LoadState::Uninitialized,
            applied_seq: 0,
            last_error: None,
        }
    }
}

impl<T> PollSnapshot<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Uninitialized)
    }

    pub fn data(&self) -> Option<Arc<T>> {
        match &self.state {
            LoadState::Uninitialized => None,
            LoadState::Ready(data) => Some(Arc::clone(data)),
        }
    }
}

enum Control {
    SetQuery(WindowQuery),
    RefreshNow,
}

type CycleOutput<T> = (u64, u64, Result<T, ActivityError>);

pub struct Poller<T> {
    name: &'static str,
    query: WindowQuery,
    control_tx: mpsc::UnboundedSender<Control>,
    state_rx: watch::Receiver<PollSnapshot<T>>,
    cancel: CancellationToken,
    driver: Option<JoinHandle<()>>,
}

impl<T: Send + Sync + 'static> Poller<T> {
    /// Start polling `fetcher` with `query` every `interval`. The first cycle
    /// is issued immediately. Must be called inside a tokio runtime.
    pub fn spawn(
        name: &'static str,
        fetcher: Arc<dyn Fetch<T>>,
        query: WindowQuery,
        interval: Duration,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PollSnapshot::default());
        let cancel = CancellationToken::new();

        let driver = Driver {
            name,
            fetcher,
            query: query.clone(),
            generation: 0,
            next_seq: 0,
            state_tx,
            inflight: JoinSet::new(),
        };
        let handle = tokio::spawn(driver.run(interval, control_rx, cancel.clone()));

        Self {
            name,
            query,
            control_tx,
            state_rx,
            cancel,
            driver: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn query(&self) -> &WindowQuery {
        &self.query
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PollSnapshot<T> {
        self.state_rx.borrow().clone()
    }

    /// Receiver that is notified each time a cycle is applied.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot<T>> {
        self.state_rx.clone()
    }

    /// Switch to a new query. In-flight cycles for the previous query are
    /// discarded and the new query is fetched immediately. No-op when the
    /// query is unchanged.
    pub fn set_query(&mut self, query: WindowQuery) {
        if query == self.query {
            return;
        }
        self.query = query.clone();
        let _ = self.control_tx.send(Control::SetQuery(query));
    }

    /// Issue an extra cycle now without disturbing the schedule.
    pub fn refresh(&self) {
        let _ = self.control_tx.send(Control::RefreshNow);
    }

    /// Cancel polling and wait for the driver to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.driver.take() {
            let _ = handle.await;
        }
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Driver<T> {
    name: &'static str,
    fetcher: Arc<dyn Fetch<T>>,
    query: WindowQuery,
    generation: u64,
    next_seq: u64,
    state_tx: watch::Sender<PollSnapshot<T>>,
    inflight: JoinSet<CycleOutput<T>>,
}

impl<T: Send + Sync + 'static> Driver<T> {
    async fn run(
        mut self,
        interval: Duration,
        mut control_rx: mpsc::UnboundedReceiver<Control>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(control) = control_rx.recv() => match control {
                    Control::SetQuery(query) => {
                        self.switch_query(query);
                        ticker.reset_immediately();
                    }
                    Control::RefreshNow => self.start_cycle(),
                },
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => {
                    if let Ok((seq, generation, result)) = joined {
                        self.apply(seq, generation, result);
                    }
                }
                _ = ticker.tick() => self.start_cycle(),
            }
        }

        self.inflight.abort_all();
        tracing::debug!(poller = self.name, "poller stopped");
    }

    fn start_cycle(&mut self) {
        self.next_seq += 1;
        let seq = self.next_seq;
        let generation = self.generation;
        let query = self.query.clone();
        let fetcher = Arc::clone(&self.fetcher);
        tracing::trace!(poller = self.name, seq, %query, "poll cycle started");
        self.inflight.spawn(async move {
            let result = fetcher.fetch(&query).await;
            (seq, generation, result)
        });
    }

    fn switch_query(&mut self, query: WindowQuery) {
        tracing::debug!(poller = self.name, %query, "query changed, invalidating in-flight cycles");
        self.inflight.abort_all();
        self.generation += 1;
        self.query = query;
        self.state_tx.send_replace(PollSnapshot::default());
    }

    fn apply(&mut self, seq: u64, generation: u64, result: Result<T, ActivityError>) {
        if generation != self.generation {
            tracing::debug!(poller = self.name, seq, "dropping response for superseded query");
            return;
        }
        let applied_seq = self.state_tx.borrow().applied_seq;
        if seq <= applied_seq {
            tracing::debug!(poller = self.name, seq, applied_seq, "dropping out-of-order response");
            return;
        }

        match result {
            Ok(data) => {
                self.state_tx.send_replace(PollSnapshot {
                    state: LoadState::Ready(Arc::new(data)),
                    applied_seq: seq,
                    last_error: None,
                });
            }
            Err(e) => {
                tracing::warn!(poller = self.name, seq, error = %e, "poll cycle failed, keeping last snapshot");
                self.state_tx.send_modify(|snapshot| {
                    snapshot.last_error = Some(e.to_string());
                });
            }
        }
    }
}

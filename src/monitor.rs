// monitor.rs - Fetch cycles, cancellation and polling for the funding comparison

use crate::config::{Config, MonitorConfig};
use crate::core::*;
use crate::cross_exchange::{build_opportunities, SnapshotBook, SymbolFilter};
use crate::error_handling::{record_error, user_message, ErrorCategory};
use crate::network::api_client::{build_http_client, LighterSource, PacificaSource, RateSource};
use crate::sorting::{sort_opportunities, SortState};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Host options for a monitor instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorOptions {
    pub filter: SymbolFilter,
    pub refresh_interval: Option<Duration>,
}

impl From<&MonitorConfig> for MonitorOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            filter: config.symbol_filter(),
            refresh_interval: config.refresh_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Everything a renderer needs after each transition
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub state: MonitorState,
    pub opportunities: Arc<Vec<Opportunity>>,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Cycle that produced this snapshot
    pub generation: u64,
    /// Cycles that reached `Ready` or `Error`
    pub completed_cycles: u64,
}

impl MonitorSnapshot {
    fn initial() -> Self {
        Self {
            state: MonitorState::Idle,
            opportunities: Arc::new(Vec::new()),
            error: None,
            last_updated: None,
            generation: 0,
            completed_cycles: 0,
        }
    }

    pub fn loading(&self) -> bool {
        self.state == MonitorState::Loading
    }
}

/// The live cycle. Only the holder of the current generation may publish a
/// terminal state.
struct Cycle {
    token: CancellationToken,
    generation: u64,
}

struct MonitorInner {
    source_a: Arc<dyn RateSource>,
    source_b: Arc<dyn RateSource>,
    options: MonitorOptions,
    cycle: Mutex<Cycle>,
    state_tx: watch::Sender<MonitorSnapshot>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        self.cycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .cancel();
        if let Some(handle) = self.poller.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}

/// Joins both funding sources into one opportunity list, one live cycle at a
/// time. Cheap to clone; the polling timer and in-flight cycle are torn down
/// with the last handle.
#[derive(Clone)]
pub struct FundingMonitor {
    inner: Arc<MonitorInner>,
}

impl FundingMonitor {
    pub fn new(
        source_a: Arc<dyn RateSource>,
        source_b: Arc<dyn RateSource>,
        options: MonitorOptions,
    ) -> Self {
        let (state_tx, _) = watch::channel(MonitorSnapshot::initial());
        Self {
            inner: Arc::new(MonitorInner {
                source_a,
                source_b,
                options,
                cycle: Mutex::new(Cycle { token: CancellationToken::new(), generation: 0 }),
                state_tx,
                poller: Mutex::new(None),
            }),
        }
    }

    /// Monitor wired to the live Pacifica and Lighter endpoints
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(&config.sources)?;
        let pacifica = PacificaSource::new(client.clone(), &config.sources.pacifica_base_url);
        let lighter = LighterSource::new(client, &config.sources.lighter_base_url);
        Ok(Self::new(
            Arc::new(pacifica),
            Arc::new(lighter),
            MonitorOptions::from(&config.monitor),
        ))
    }

    /// Receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.inner.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.inner.state_tx.borrow().clone()
    }

    /// Kick off the first fetch and the configured polling timer. Must be
    /// called from within a tokio runtime.
    pub fn start(&self) {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.refetch().await });
        self.set_refresh_interval(self.inner.options.refresh_interval);
    }

    /// Run one fetch cycle, cancelling whichever cycle was live before it.
    pub async fn refetch(&self) {
        let (cancel, generation) = self.begin_cycle();
        let result = self.run_cycle(&cancel).await;
        self.finish_cycle(generation, &cancel, result);
    }

    /// Replace the polling timer. `None` or a zero interval stops polling.
    pub fn set_refresh_interval(&self, interval: Option<Duration>) {
        let mut poller = self.inner.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = poller.take() {
            handle.abort();
        }

        let Some(period) = interval.filter(|d| !d.is_zero()) else {
            return;
        };

        info!("Polling funding rates every {:?}", period);
        let weak = Arc::downgrade(&self.inner);
        *poller = Some(tokio::spawn(run_poller(weak, period)));
    }

    /// Stop polling and cancel the live cycle
    pub fn shutdown(&self) {
        self.set_refresh_interval(None);
        self.inner
            .cycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .cancel();
        info!("Funding monitor stopped");
    }

    fn begin_cycle(&self) -> (CancellationToken, u64) {
        let mut cycle = self.inner.cycle.lock().unwrap_or_else(PoisonError::into_inner);
        cycle.token.cancel();

        let token = CancellationToken::new();
        cycle.token = token.clone();
        cycle.generation += 1;
        let generation = cycle.generation;

        self.inner.state_tx.send_modify(|snapshot| {
            snapshot.state = MonitorState::Loading;
            snapshot.error = None;
            snapshot.generation = generation;
        });
        debug!("Funding cycle {} started", generation);

        (token, generation)
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<Vec<Opportunity>, AppError> {
        let (snapshots_a, snapshots_b) = futures::try_join!(
            self.inner.source_a.fetch(cancel),
            self.inner.source_b.fetch(cancel)
        )?;

        let book_a = SnapshotBook::from_snapshots(snapshots_a);
        let book_b = SnapshotBook::from_snapshots(snapshots_b);
        let mut opportunities = build_opportunities(&book_a, &book_b, &self.inner.options.filter);
        sort_opportunities(&mut opportunities, SortState::default(), 1.0);
        Ok(opportunities)
    }

    fn finish_cycle(
        &self,
        generation: u64,
        cancel: &CancellationToken,
        result: Result<Vec<Opportunity>, AppError>,
    ) {
        let cycle = self.inner.cycle.lock().unwrap_or_else(PoisonError::into_inner);
        if cycle.generation != generation || cancel.is_cancelled() {
            debug!("Funding cycle {} superseded, result dropped", generation);
            return;
        }

        match result {
            Err(e) if e.is_cancelled() => {
                debug!("Funding cycle {} cancelled", generation);
            }
            Err(e) => {
                record_error(&e);
                if ErrorCategory::from(&e).is_transient() {
                    warn!("Funding cycle {} failed, next refresh may recover: {}", generation, e);
                } else {
                    error!("Funding cycle {} failed: {}", generation, e);
                }
                let message = user_message(&e);
                self.inner.state_tx.send_modify(|snapshot| {
                    snapshot.state = MonitorState::Error;
                    snapshot.error = Some(message);
                    snapshot.opportunities = Arc::new(Vec::new());
                    snapshot.generation = generation;
                    snapshot.completed_cycles += 1;
                });
            }
            Ok(opportunities) => {
                info!("Funding cycle {} found {} opportunities", generation, opportunities.len());
                self.inner.state_tx.send_modify(|snapshot| {
                    snapshot.state = MonitorState::Ready;
                    snapshot.error = None;
                    snapshot.opportunities = Arc::new(opportunities);
                    snapshot.last_updated = Some(Utc::now());
                    snapshot.generation = generation;
                    snapshot.completed_cycles += 1;
                });
            }
        }
    }
}

/// Fire a refetch every `period` until the monitor is gone. Each tick runs on
/// its own task so a slow cycle is cancelled by the next tick rather than
/// delaying it.
async fn run_poller(monitor: Weak<MonitorInner>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = monitor.upgrade() else {
            break;
        };
        let monitor = FundingMonitor { inner };
        tokio::spawn(async move { monitor.refetch().await });
    }
}

use std::{sync::Arc, time::Duration};

use followme_api::{FetchError, PositionRecord, PositionSource};
use followme_map::{MapRenderer, MarkerRegistry};
use poll_promise::Promise;
use tracing::{debug, error, info, warn};

use super::history::{TickHistory, TickOutcome};

type FetchResult = Result<Vec<PositionRecord>, FetchError>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    /// drop a response if a newer tick was already reconciled
    pub discard_stale_responses: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            discard_stale_responses: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SchedulerState {
    Stopped,
    /// timestamp (in seconds) of the last issued fetch, or of `start`
    Running { last_tick: f64 },
}

struct InFlight {
    tick: u64,
    promise: Promise<FetchResult>,
}

/// Polls a [PositionSource] at a fixed interval and reconciles every snapshot into its markers.
///
/// The scheduler owns the registry and the renderer. Fetches run on background threads
/// and are allowed to overlap: a slow response doesn't hold back the next tick.
/// Completed fetches are reconciled on the thread that calls [Self::tick], in whatever order they finish.
pub struct PollScheduler<S, R: MapRenderer> {
    source: Arc<S>,
    renderer: R,
    registry: MarkerRegistry<R::Handle>,
    config: SchedulerConfig,
    state: SchedulerState,
    ticks_issued: u64,
    in_flight: Vec<InFlight>,
    highest_reconciled: Option<u64>,
    history: TickHistory,
}

impl<S: PositionSource, R: MapRenderer> PollScheduler<S, R> {
    pub fn new(source: S, renderer: R, config: SchedulerConfig) -> Self {
        Self {
            source: Arc::new(source),
            renderer,
            registry: MarkerRegistry::new(),
            config,
            state: SchedulerState::Stopped,
            ticks_issued: 0,
            in_flight: vec![],
            highest_reconciled: None,
            history: TickHistory::new(),
        }
    }

    /// Starts the timer. The first fetch is due one interval after `now`.
    pub fn start(&mut self, now: f64) {
        if self.is_running() {
            warn!("poll scheduler is already running");
            return;
        }
        info!(interval = ?self.config.poll_interval, "starting poll scheduler");
        self.state = SchedulerState::Running { last_tick: now };
    }

    /// Stops the timer. Fetches that are still in flight are abandoned and their results never reach the map.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        info!(
            abandoned = self.in_flight.len(),
            "stopping poll scheduler"
        );
        self.state = SchedulerState::Stopped;
        self.in_flight.clear();
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// Called from the main loop with the current time in seconds.
    /// Issues a fetch if the interval has elapsed, then reconciles whatever finished.
    pub fn tick(&mut self, now: f64) {
        if let SchedulerState::Running { last_tick } = &mut self.state {
            if now - *last_tick >= self.config.poll_interval.as_secs_f64() {
                *last_tick = now;
                self.issue_fetch();
            }
        }
        self.poll_completions();
    }

    fn issue_fetch(&mut self) {
        self.ticks_issued += 1;
        let tick = self.ticks_issued;
        let source = self.source.clone();
        let promise = Promise::spawn_thread(format!("position fetch {tick}"), move || {
            source.fetch()
        });
        self.in_flight.push(InFlight { tick, promise });
    }

    /// Reconciles every fetch that has completed so far, without blocking.
    /// Returns how many completions were handled.
    pub fn poll_completions(&mut self) -> usize {
        let mut completed = vec![];
        let mut pending = Vec::with_capacity(self.in_flight.len());
        for flight in self.in_flight.drain(..) {
            match flight.promise.try_take() {
                Ok(result) => completed.push((flight.tick, result)),
                Err(promise) => pending.push(InFlight {
                    tick: flight.tick,
                    promise,
                }),
            }
        }
        self.in_flight = pending;
        let handled = completed.len();
        for (tick, result) in completed {
            self.complete(tick, result);
        }
        handled
    }

    /// Blocks until every in-flight fetch has finished and reconciles them in the order they were issued.
    pub fn wait_for_in_flight(&mut self) {
        for flight in std::mem::take(&mut self.in_flight) {
            let result = flight.promise.block_and_take();
            self.complete(flight.tick, result);
        }
    }

    fn complete(&mut self, tick: u64, result: FetchResult) {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(tick, %e, "position fetch failed. skipping tick");
                self.history.push(tick, TickOutcome::FetchFailed(e.to_string()));
                return;
            }
        };
        if self.config.discard_stale_responses
            && self.highest_reconciled.is_some_and(|highest| tick < highest)
        {
            debug!(tick, highest = ?self.highest_reconciled, "dropping stale snapshot");
            self.history.push(tick, TickOutcome::Stale);
            return;
        }
        match self.registry.reconcile(&mut self.renderer, &snapshot) {
            Ok(report) => {
                debug!(tick, ?report, "reconciled snapshot");
                self.highest_reconciled = self.highest_reconciled.max(Some(tick));
                self.history.push(tick, TickOutcome::Reconciled(report));
            }
            Err(e) => {
                error!(tick, ?e, "rejected snapshot");
                self.history.push(tick, TickOutcome::Rejected(e.to_string()));
            }
        }
    }

    pub fn registry(&self) -> &MarkerRegistry<R::Handle> {
        &self.registry
    }
    pub fn renderer(&self) -> &R {
        &self.renderer
    }
    pub fn history(&self) -> &TickHistory {
        &self.history
    }
    /// number of fetches that were issued but not reconciled yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
    pub fn ticks_issued(&self) -> u64 {
        self.ticks_issued
    }
}

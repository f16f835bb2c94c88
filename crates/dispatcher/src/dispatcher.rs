//! DeferredDispatcher - first trigger wins, roster runs once

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, trace, warn};

use contracts::{ActionEntry, LoaderConfig, Roster, SharedHost, TriggerKind, TriggerSource};
use injector::Diagnostics;
use observability::EntryOutcome;

use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, DispatchSnapshot};
use crate::registry::{Registry, TriggerRegistration};
use crate::report::{DispatchReport, FailedEntry};
use crate::state::{DispatchState, Phase};

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// Fallback delay before dispatching without interaction
    pub delay: Duration,
    /// Upper bound on waiting for idle before arming the fallback
    pub idle_timeout: Duration,
    /// Interaction events that start dispatch
    pub triggers: Vec<TriggerKind>,
    /// Enables debug-gated diagnostics
    pub debug: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(5000),
            idle_timeout: Duration::from_millis(1000),
            triggers: TriggerKind::DEFAULT.to_vec(),
            debug: false,
        }
    }
}

impl DispatcherConfig {
    /// Core timing and triggers from a loaded configuration
    pub fn from_loader(config: &LoaderConfig) -> Self {
        Self {
            delay: config.delay(),
            idle_timeout: config.idle_timeout(),
            triggers: config.triggers.clone(),
            debug: config.debug,
        }
    }

    fn validate(&self) -> Result<(), DispatcherError> {
        for (i, kind) in self.triggers.iter().enumerate() {
            if self.triggers[..i].contains(kind) {
                return Err(DispatcherError::invalid_config(
                    "triggers",
                    format!("duplicate trigger '{kind}'"),
                ));
            }
        }
        Ok(())
    }
}

/// State shared with host callbacks through `Weak` references
struct Shared {
    host: SharedHost,
    config: DispatcherConfig,
    roster: Roster,
    diagnostics: Diagnostics,
    state: DispatchState,
    registry: Mutex<Registry>,
    metrics: DispatchMetrics,
    report: Mutex<Option<DispatchReport>>,
}

/// Defers the roster until the first interaction or the fallback timer
///
/// Dropping the dispatcher tears it down if it has not fired yet.
pub struct DeferredDispatcher {
    shared: Arc<Shared>,
}

impl DeferredDispatcher {
    /// Create a dispatcher; nothing is registered until `install` or `arm`
    pub fn new(
        host: SharedHost,
        config: DispatcherConfig,
        roster: Roster,
    ) -> Result<Self, DispatcherError> {
        config.validate()?;
        let diagnostics = Diagnostics::new(config.debug);
        Ok(Self {
            shared: Arc::new(Shared {
                host,
                config,
                roster,
                diagnostics,
                state: DispatchState::new(),
                registry: Mutex::new(Registry::default()),
                metrics: DispatchMetrics::new(),
                report: Mutex::new(None),
            }),
        })
    }

    /// Arm once the host reports the document ready
    #[instrument(name = "dispatcher_install", skip(self))]
    pub fn install(&self) -> Result<(), DispatcherError> {
        self.shared
            .state
            .transition(Phase::Unstarted, Phase::Pending)
            .map_err(|phase| DispatcherError::InvalidState {
                operation: "install",
                phase,
            })?;

        let weak = Arc::downgrade(&self.shared);
        self.shared.host.when_ready(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                if let Err(e) = Shared::arm(&shared, Phase::Pending) {
                    debug!(error = %e, "Ready callback found dispatcher inactive");
                }
            }
        }));
        debug!("Dispatcher waiting for document ready");
        Ok(())
    }

    /// Register listeners and schedule the fallback immediately
    #[instrument(name = "dispatcher_arm", skip(self))]
    pub fn arm(&self) -> Result<(), DispatcherError> {
        Shared::arm(&self.shared, Phase::Unstarted)
    }

    /// Deliver a trigger
    ///
    /// Returns true when this call performed the dispatch.
    pub fn trigger(&self, source: TriggerSource) -> bool {
        self.shared.fire(source)
    }

    /// Remove listeners and timer without dispatching
    ///
    /// Returns false when the dispatcher already fired or was torn down.
    pub fn teardown(&self) -> bool {
        self.shared.teardown()
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.load()
    }

    pub fn is_fired(&self) -> bool {
        self.phase().is_fired()
    }

    /// Report of the dispatch pass, once complete
    pub fn report(&self) -> Option<DispatchReport> {
        lock(&self.shared.report).clone()
    }

    pub fn metrics(&self) -> DispatchSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Listeners currently owned by this dispatcher
    pub fn registered_listeners(&self) -> Vec<TriggerRegistration> {
        lock(&self.shared.registry).listeners().to_vec()
    }

    pub fn has_pending_timer(&self) -> bool {
        lock(&self.shared.registry).has_timer()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.shared.config
    }

    pub fn roster(&self) -> &Roster {
        &self.shared.roster
    }
}

impl Drop for DeferredDispatcher {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl Shared {
    /// Move `from -> Armed` and register every trigger
    ///
    /// The registry lock is held across registration so a trigger that wins
    /// the race meanwhile waits for the complete set before draining it.
    /// Hosts never invoke listeners from inside `add_listener`.
    fn arm(this: &Arc<Self>, from: Phase) -> Result<(), DispatcherError> {
        let mut registry = lock(&this.registry);
        this.state
            .transition(from, Phase::Armed)
            .map_err(|phase| DispatcherError::InvalidState {
                operation: "arm",
                phase,
            })?;

        for &kind in &this.config.triggers {
            let weak = Arc::downgrade(this);
            let id = this.host.add_listener(
                kind,
                Arc::new(move |event| {
                    if let Some(shared) = weak.upgrade() {
                        shared.fire(TriggerSource::Interaction(event));
                    }
                }),
            );
            registry.register(kind, id);
        }

        if this.host.supports_idle() {
            let weak = Arc::downgrade(this);
            this.host.request_idle(
                this.config.idle_timeout,
                Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        Shared::schedule_fallback(&shared);
                    }
                }),
            );
        } else {
            Self::schedule_fallback_locked(this, &mut registry);
        }

        info!(
            triggers = this.config.triggers.len(),
            delay_ms = this.config.delay.as_millis() as u64,
            idle = this.host.supports_idle(),
            "Dispatcher armed"
        );
        Ok(())
    }

    fn schedule_fallback(this: &Arc<Self>) {
        let mut registry = lock(&this.registry);
        Self::schedule_fallback_locked(this, &mut registry);
    }

    /// Arm the fallback timer unless a trigger already won
    fn schedule_fallback_locked(this: &Arc<Self>, registry: &mut Registry) {
        if this.state.load() != Phase::Armed {
            trace!("Dispatch already happened, fallback not armed");
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(this);
        let timer = this.host.set_timeout(
            this.config.delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.fire(TriggerSource::Timer);
                }
            }),
        );
        if let Some(stale) = registry.set_timer(timer) {
            this.host.clear_timeout(stale);
        }
        debug!(timer = %timer, "Fallback timer armed");
    }

    #[instrument(name = "dispatcher_fire", skip_all, fields(source = %source))]
    fn fire(&self, source: TriggerSource) -> bool {
        let label = source.to_string();
        self.metrics.inc_triggers_received();
        observability::record_trigger_received(&label);

        if let Err(phase) = self.state.transition(Phase::Armed, Phase::Firing) {
            if phase.is_fired() {
                self.metrics.inc_triggers_absorbed();
                observability::record_trigger_absorbed(&label);
                trace!(%phase, "Trigger absorbed");
            } else {
                self.metrics.inc_triggers_ignored();
                trace!(%phase, "Trigger ignored, dispatcher not armed");
            }
            return false;
        }

        self.diagnostics.log(format!("Dispatching on {source}"));
        self.disarm();

        let report = self.run_roster(source);
        observability::record_dispatch(&label, report.visited(), report.duration_ms);
        info!(
            ran = report.ran.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            duration_ms = report.duration_ms,
            "Dispatch complete"
        );

        *lock(&self.report) = Some(report);
        self.state.store(Phase::Fired);
        true
    }

    fn teardown(&self) -> bool {
        match self.state.transition_from_any(
            &[Phase::Unstarted, Phase::Pending, Phase::Armed],
            Phase::TornDown,
        ) {
            Ok(previous) => {
                self.disarm();
                debug!(%previous, "Dispatcher torn down");
                true
            }
            Err(_) => false,
        }
    }

    /// Release every listener and the timer; host calls happen outside the lock
    fn disarm(&self) {
        let released = lock(&self.registry).drain();
        if let Some(timer) = released.timer {
            self.host.clear_timeout(timer);
        }
        for registration in &released.listeners {
            self.host.remove_listener(registration.listener);
        }
        trace!(
            listeners = released.listeners.len(),
            timer = released.timer.is_some(),
            "Disarmed"
        );
    }

    fn run_roster(&self, source: TriggerSource) -> DispatchReport {
        let started = Instant::now();
        let mut report = DispatchReport::new(source);

        for entry in self.roster.entries() {
            match run_entry(entry) {
                EntryResult::Ran => {
                    self.metrics.inc_entries_run();
                    observability::record_entry_outcome(entry.name(), EntryOutcome::Ran);
                    report.ran.push(entry.name().to_string());
                }
                EntryResult::Skipped => {
                    self.metrics.inc_entries_skipped();
                    observability::record_entry_outcome(entry.name(), EntryOutcome::Skipped);
                    self.diagnostics
                        .log(format!("{} not configured, skipping", entry.name()));
                    report.skipped.push(entry.name().to_string());
                }
                EntryResult::Failed(message) => {
                    self.metrics.inc_entries_failed();
                    observability::record_entry_outcome(entry.name(), EntryOutcome::Failed);
                    warn!(entry = entry.name(), error = %message, "Roster entry failed");
                    report.failed.push(FailedEntry {
                        name: entry.name().to_string(),
                        message,
                    });
                }
            }
        }

        report.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        report
    }
}

enum EntryResult {
    Ran,
    Skipped,
    Failed(String),
}

/// Evaluate one entry, isolating errors and panics from the rest of the roster
fn run_entry(entry: &ActionEntry) -> EntryResult {
    let enabled = match panic::catch_unwind(AssertUnwindSafe(|| entry.is_enabled())) {
        Ok(enabled) => enabled,
        Err(payload) => {
            return EntryResult::Failed(format!(
                "predicate panicked: {}",
                panic_message(payload.as_ref())
            ));
        }
    };
    if !enabled {
        return EntryResult::Skipped;
    }

    match panic::catch_unwind(AssertUnwindSafe(|| entry.run())) {
        Ok(Ok(())) => EntryResult::Ran,
        Ok(Err(e)) => EntryResult::Failed(e.to_string()),
        Err(payload) => EntryResult::Failed(format!(
            "effect panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! Injector lifecycle and base contract
//!
//! Every injector walks `Idle -> Running -> Completed` and may be started
//! again once completed. The ledger append and the `Completed` transition are
//! made under the same lock, so a reader never sees one without the other.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::InjectorSettings;
use crate::ledger::{Interval, IntervalLedger};
use crate::workload::{run_work_body, BurstPacer, RunOutcome, Workload};

/// Construction parameters of an injector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectorConfig {
    /// Free-form label shown in the injector name
    pub tag: String,

    /// Requested run length in milliseconds
    pub duration_ms: u64,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            tag: String::new(),
            duration_ms: 1000,
        }
    }
}

impl InjectorConfig {
    pub fn new(tag: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            tag: tag.into(),
            duration_ms,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Lifecycle state of an injector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Capabilities shared by every injector variant
pub trait LoadInjector: Send + Sync {
    /// False when one-time setup failed; such an injector never runs
    fn is_valid(&self) -> bool;

    /// Launch the work body on its own thread and return immediately.
    /// A no-op while a run is in progress or when the injector is invalid.
    fn inject(&self);

    fn run_state(&self) -> RunState;

    fn is_running(&self) -> bool {
        self.run_state() == RunState::Running
    }

    /// Best-effort request to end the current run early
    fn force_close(&self) {}

    /// Snapshot of every completed run so far
    fn injections(&self) -> Vec<Interval>;

    fn variant_name(&self) -> &'static str;

    fn config(&self) -> &InjectorConfig;

    /// `"[<tag>]<VariantName>(d<durationMs>)"`
    fn name(&self) -> String {
        let config = self.config();
        format!("[{}]{}(d{})", config.tag, self.variant_name(), config.duration_ms)
    }

    /// Reason the most recent run ended abnormally, if it did
    fn last_failure(&self) -> Option<String>;

    /// Block until the current worker (if any) has exited. Once a run is
    /// observed as `Running`, this returns only after that run completes.
    fn wait(&self);
}

#[derive(Debug)]
struct Lifecycle {
    state: RunState,
    ledger: IntervalLedger,
    last_failure: Option<String>,
}

/// Generic injector driving a [`Workload`] on a dedicated thread
pub struct Injector<W: Workload> {
    config: InjectorConfig,
    settings: InjectorSettings,
    valid: bool,
    variant_name: &'static str,
    lifecycle: Arc<Mutex<Lifecycle>>,
    workload: Arc<Mutex<W>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cancel: Arc<AtomicBool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("work body panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("work body panicked: {}", message)
    } else {
        "work body panicked".to_string()
    }
}

impl<W: Workload> Injector<W> {
    /// Build an injector and run the workload's one-time setup
    pub fn with_workload(config: InjectorConfig, settings: InjectorSettings, mut workload: W) -> Self {
        let variant_name = workload.variant_name();
        let valid = match workload.setup() {
            Ok(()) => true,
            Err(e) => {
                warn!("Setup of {} failed, injector marked invalid: {}", variant_name, e);
                false
            }
        };

        Self {
            config,
            settings,
            valid,
            variant_name,
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                state: RunState::Idle,
                ledger: IntervalLedger::new(),
                last_failure: None,
            })),
            workload: Arc::new(Mutex::new(workload)),
            worker: Mutex::new(None),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    fn spawn_worker(&self) -> std::io::Result<JoinHandle<()>> {
        let lifecycle = Arc::clone(&self.lifecycle);
        let workload = Arc::clone(&self.workload);
        let cancel = Arc::clone(&self.cancel);
        let duration = self.config.duration();
        let max_pause = Duration::from_millis(self.settings.max_pause_ms);
        let seed = self.settings.seed;
        let name = self.name();

        thread::Builder::new()
            .name(format!("injector-{}", self.variant_name))
            .spawn(move || {
                let start_ms = Utc::now().timestamp_millis();
                let started = Instant::now();
                info!(injector = %name, "Injection started");

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut workload = lock(&workload);
                    let mut pacer = BurstPacer::new(max_pause, seed);
                    run_work_body(&mut *workload, &mut pacer, started, duration, &cancel)
                }))
                .unwrap_or_else(|payload| RunOutcome::Failed(panic_message(payload.as_ref())));

                let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

                let mut lifecycle = lock(&lifecycle);
                let interval = lifecycle.ledger.record(start_ms, start_ms.saturating_add(elapsed_ms));
                match outcome {
                    RunOutcome::Completed => {
                        info!(injector = %name, elapsed_ms = interval.duration_ms(), "Injection completed");
                    }
                    RunOutcome::Cancelled => {
                        info!(injector = %name, elapsed_ms = interval.duration_ms(), "Injection force-closed");
                    }
                    RunOutcome::Failed(reason) => {
                        error!(injector = %name, "Injection failed: {}", reason);
                        lifecycle.last_failure = Some(reason);
                    }
                }
                lifecycle.state = RunState::Completed;
            })
    }
}

impl<W: Workload> LoadInjector for Injector<W> {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn inject(&self) {
        if !self.valid {
            warn!("Refusing to start invalid injector {}", self.name());
            return;
        }

        // Held until the new handle is stored, so `wait` never sees Running without it
        let mut worker = lock(&self.worker);

        let previous = {
            let mut lifecycle = lock(&self.lifecycle);
            if lifecycle.state == RunState::Running {
                debug!("Injector {} already running, ignoring start", self.name());
                return;
            }
            let previous = lifecycle.state;
            self.cancel.store(false, Ordering::Release);
            lifecycle.state = RunState::Running;
            lifecycle.last_failure = None;
            previous
        };

        if let Some(finished) = worker.take() {
            let _ = finished.join();
        }

        match self.spawn_worker() {
            Ok(handle) => *worker = Some(handle),
            Err(e) => {
                error!("Failed to spawn worker for {}: {}", self.name(), e);
                let mut lifecycle = lock(&self.lifecycle);
                lifecycle.state = previous;
                lifecycle.last_failure = Some(format!("worker spawn failed: {}", e));
            }
        }
    }

    fn run_state(&self) -> RunState {
        lock(&self.lifecycle).state
    }

    fn force_close(&self) {
        let lifecycle = lock(&self.lifecycle);
        if lifecycle.state == RunState::Running {
            debug!("Force-closing injector {}", self.name());
            self.cancel.store(true, Ordering::Release);
        }
    }

    fn injections(&self) -> Vec<Interval> {
        lock(&self.lifecycle).ledger.snapshot()
    }

    fn variant_name(&self) -> &'static str {
        self.variant_name
    }

    fn config(&self) -> &InjectorConfig {
        &self.config
    }

    fn last_failure(&self) -> Option<String> {
        lock(&self.lifecycle).last_failure.clone()
    }

    fn wait(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Worker of {} exited abnormally", self.name());
            }
        }
    }
}

impl<W: Workload> Drop for Injector<W> {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
    }
}

impl<W: Workload> fmt::Debug for Injector<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("name", &self.name())
            .field("valid", &self.valid)
            .field("state", &self.run_state())
            .finish()
    }
}

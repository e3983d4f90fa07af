//! Work-body contract shared by all injector variants
//!
//! A variant only supplies the resource it touches ([`Workload`]); the
//! pacing and the duration loop live here so every variant overshoots its
//! requested duration by at most one burst.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::error::WorkloadResult;

/// Variant-specific simulated activity
pub trait Workload: Send + 'static {
    /// Name used in `"[<tag>]<VariantName>(d<durationMs>)"`
    fn variant_name(&self) -> &'static str;

    /// One-time setup. A failure marks the owning injector invalid.
    fn setup(&mut self) -> WorkloadResult<()> {
        Ok(())
    }

    /// Read-like activity following a pause
    fn read_burst(&mut self, rng: &mut dyn RngCore) -> WorkloadResult<()>;

    /// Write-like activity following a pause
    fn write_burst(&mut self, rng: &mut dyn RngCore) -> WorkloadResult<()>;
}

/// How a single run of the work body ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

/// Randomized pause source for the bursts
pub struct BurstPacer {
    rng: StdRng,
    max_pause: Duration,
}

impl BurstPacer {
    pub fn new(max_pause: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, max_pause }
    }

    /// Draw a pause uniformly from `[0, max_pause]`
    pub fn next_pause(&mut self) -> Duration {
        if self.max_pause.is_zero() {
            return Duration::ZERO;
        }
        self.max_pause.mul_f64(self.rng.gen_range(0.0..=1.0))
    }

    pub fn pause(&mut self) {
        let pause = self.next_pause();
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }
}

/// Run read/write bursts until `duration` has elapsed since `started` or
/// `cancel` is raised. Both conditions are checked after every burst.
pub fn run_work_body(
    workload: &mut dyn Workload,
    pacer: &mut BurstPacer,
    started: Instant,
    duration: Duration,
    cancel: &AtomicBool,
) -> RunOutcome {
    let should_stop = || {
        if cancel.load(Ordering::Acquire) {
            Some(RunOutcome::Cancelled)
        } else if started.elapsed() >= duration {
            Some(RunOutcome::Completed)
        } else {
            None
        }
    };

    loop {
        if let Some(outcome) = should_stop() {
            return outcome;
        }

        pacer.pause();
        if let Err(e) = workload.read_burst(pacer.rng()) {
            return RunOutcome::Failed(e.to_string());
        }

        if let Some(outcome) = should_stop() {
            return outcome;
        }

        pacer.pause();
        if let Err(e) = workload.write_burst(pacer.rng()) {
            return RunOutcome::Failed(e.to_string());
        }
    }
}

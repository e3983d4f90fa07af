//! Injection plans: run a list of job descriptions one after another and
//! collect every injector's ledger, so the intervals can be overlaid on an
//! independently sampled monitor timeline.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PlanSettings;
use crate::error::{PlanError, PlanResult};
use crate::injector::LoadInjector;
use crate::ledger::Interval;
use crate::registry::InjectorRegistry;

/// Ordered list of job descriptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionPlan {
    pub jobs: Vec<Value>,

    /// Overrides `PlanSettings::cooldown_ms` for this plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
}

impl InjectionPlan {
    pub fn new(jobs: Vec<Value>) -> Self {
        Self { jobs, cooldown_ms: None }
    }

    /// Parse a plan. A bare JSON array is accepted as the job list.
    pub fn from_json_str(content: &str) -> PlanResult<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| PlanError::InvalidFormat { reason: e.to_string() })?;

        let plan = match value {
            Value::Array(jobs) => InjectionPlan::new(jobs),
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| PlanError::InvalidFormat { reason: e.to_string() })?,
            other => {
                return Err(PlanError::InvalidFormat {
                    reason: format!("expected an object or an array, got {}", other),
                })
            }
        };

        if plan.jobs.is_empty() {
            return Err(PlanError::Empty);
        }
        Ok(plan)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> PlanResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|_| PlanError::FileNotFound { path: path.to_string_lossy().to_string() })?;
        Self::from_json_str(&content)
    }
}

/// Outcome of one job in a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub index: usize,

    /// Injector name, absent when the job did not resolve
    pub name: Option<String>,

    pub skipped: bool,

    pub intervals: Vec<Interval>,

    pub failure: Option<String>,
}

/// Everything a plan run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub aborted: bool,
    pub jobs: Vec<JobRecord>,
}

impl PlanReport {
    /// All recorded intervals in plan order
    pub fn intervals(&self) -> Vec<Interval> {
        self.jobs.iter().flat_map(|job| job.intervals.iter().copied()).collect()
    }

    /// Time spent injecting, summed over every recorded interval
    pub fn total_injected_ms(&self) -> i64 {
        self.jobs
            .iter()
            .flat_map(|job| job.intervals.iter())
            .map(Interval::duration_ms)
            .sum()
    }

    pub fn executed(&self) -> usize {
        self.jobs.iter().filter(|job| !job.skipped).count()
    }
}

/// Runs plans against a registry
pub struct PlanRunner {
    registry: InjectorRegistry,
    settings: PlanSettings,
}

impl PlanRunner {
    pub fn new(registry: InjectorRegistry, settings: PlanSettings) -> Self {
        Self { registry, settings }
    }

    /// Run every job in order. Cancelling `shutdown` force-closes the
    /// current injector and ends the plan early with `aborted` set.
    pub async fn run(&self, plan: &InjectionPlan, shutdown: CancellationToken) -> PlanReport {
        let started_at = Utc::now();
        let cooldown = Duration::from_millis(plan.cooldown_ms.unwrap_or(self.settings.cooldown_ms));
        let mut jobs = Vec::with_capacity(plan.jobs.len());
        let mut aborted = false;

        info!("Running injection plan with {} jobs", plan.jobs.len());

        for (index, description) in plan.jobs.iter().enumerate() {
            if shutdown.is_cancelled() {
                aborted = true;
                break;
            }

            let Some(injector) = self.registry.create_from_description(Some(description)) else {
                warn!("Skipping job {}: no injector for {}", index, description);
                jobs.push(JobRecord {
                    index,
                    name: None,
                    skipped: true,
                    intervals: Vec::new(),
                    failure: None,
                });
                continue;
            };

            let failure = if injector.is_valid() {
                injector.inject();
                aborted = self.drive(injector.as_ref(), &shutdown).await;
                injector.wait();
                injector.last_failure()
            } else {
                Some("injector setup failed".to_string())
            };

            jobs.push(JobRecord {
                index,
                name: Some(injector.name()),
                skipped: false,
                intervals: injector.injections(),
                failure,
            });

            if aborted {
                break;
            }

            if index + 1 < plan.jobs.len() && !cooldown.is_zero() {
                tokio::select! {
                    _ = time::sleep(cooldown) => {}
                    _ = shutdown.cancelled() => {
                        aborted = true;
                        break;
                    }
                }
            }
        }

        let report = PlanReport {
            started_at,
            finished_at: Utc::now(),
            aborted,
            jobs,
        };
        info!("Injection plan finished: {} executed, aborted: {}", report.executed(), report.aborted);
        report
    }

    /// Poll until the injector stops. Returns true if a shutdown was requested.
    async fn drive(&self, injector: &dyn LoadInjector, shutdown: &CancellationToken) -> bool {
        let mut ticker = time::interval(Duration::from_millis(self.settings.poll_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cancelled = false;

        while injector.is_running() {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled(), if !cancelled => {
                    info!("Shutdown requested, force-closing {}", injector.name());
                    injector.force_close();
                    cancelled = true;
                }
            }
        }

        cancelled
    }
}

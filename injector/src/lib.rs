//! LoadInject injector framework
//!
//! Synthetic disk-like and memory-like pressure for a bounded duration, so an
//! independent monitoring process can be exercised under controlled stress.
//! Job descriptions are resolved through an [`InjectorRegistry`]; each
//! injector runs its work body on its own thread and records the intervals
//! it was active in an append-only ledger.

pub mod config;
pub mod error;
pub mod injector;
pub mod ledger;
pub mod plan;
pub mod ram;
pub mod registry;
pub mod ssd;
pub mod workload;

// Re-export commonly used types
pub use config::{HarnessConfig, InjectorSettings, LoggingConfig, PlanSettings};
pub use error::{ConfigError, PlanError, WorkloadError};
pub use injector::{Injector, InjectorConfig, LoadInjector, RunState};
pub use ledger::{Interval, IntervalLedger};
pub use plan::{InjectionPlan, JobRecord, PlanReport, PlanRunner};
pub use ram::{RamLoadInjector, RamWorkload};
pub use registry::{from_json, InjectorRegistry, JobDescription, RAM_ALIASES, SSD_ALIASES};
pub use ssd::{SsdLoadInjector, SsdWorkload};
pub use workload::{BurstPacer, RunOutcome, Workload};

//! Variant registry: resolves a job description into a concrete injector
//!
//! Aliases are matched case-sensitively. An absent description, an unknown
//! or missing `type`, or malformed parameters all resolve to `None`; callers
//! decide whether that is fatal.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::InjectorSettings;
use crate::injector::{InjectorConfig, LoadInjector};
use crate::ram::RamLoadInjector;
use crate::ssd::SsdLoadInjector;

pub const SSD_ALIASES: [&str; 3] = ["SSD", "SSDUsage", "SolidStateDrive"];
pub const RAM_ALIASES: [&str; 3] = ["RAM", "RAMUsage", "Memory"];

/// Declarative job description as found in a plan file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub tag: String,

    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
}

fn default_duration_ms() -> u64 {
    InjectorConfig::default().duration_ms
}

impl JobDescription {
    pub fn new(kind: impl Into<String>, tag: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            kind: kind.into(),
            tag: tag.into(),
            duration_ms,
        }
    }

    /// Parse a JSON mapping. Returns `None` when `type` is missing or not a
    /// string, or when `duration_ms` is not a non-negative number.
    pub fn from_value(value: &Value) -> Option<Self> {
        let job = value.as_object()?;
        let kind = job.get("type")?.as_str()?.to_string();

        let tag = match job.get("tag") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(tag)) => tag.clone(),
            Some(other) => {
                warn!("Ignoring job '{}': tag must be a string, got {}", kind, other);
                return None;
            }
        };

        let duration_ms = match job.get("duration_ms") {
            None | Some(Value::Null) => default_duration_ms(),
            Some(raw) => match parse_duration_ms(raw) {
                Some(duration_ms) => duration_ms,
                None => {
                    warn!("Ignoring job '{}': invalid duration_ms {}", kind, raw);
                    return None;
                }
            },
        };

        Some(Self { kind, tag, duration_ms })
    }

    pub fn injector_config(&self) -> InjectorConfig {
        InjectorConfig::new(self.tag.clone(), self.duration_ms)
    }
}

/// Whole milliseconds; fractional values are rounded up
fn parse_duration_ms(raw: &Value) -> Option<u64> {
    if let Some(whole) = raw.as_u64() {
        return Some(whole);
    }
    let fractional = raw.as_f64()?;
    if !fractional.is_finite() || fractional < 0.0 || fractional > u64::MAX as f64 {
        return None;
    }
    Some(fractional.ceil() as u64)
}

/// Builds one variant from a resolved description
pub type Constructor = fn(&JobDescription, &InjectorSettings) -> Box<dyn LoadInjector>;

fn build_ssd(job: &JobDescription, settings: &InjectorSettings) -> Box<dyn LoadInjector> {
    Box::new(SsdLoadInjector::new(job.injector_config(), settings.clone()))
}

fn build_ram(job: &JobDescription, settings: &InjectorSettings) -> Box<dyn LoadInjector> {
    Box::new(RamLoadInjector::new(job.injector_config(), settings.clone()))
}

#[derive(Clone, Copy)]
struct Registration {
    variant: &'static str,
    constructor: Constructor,
}

/// Maps type aliases to variant constructors
#[derive(Clone)]
pub struct InjectorRegistry {
    settings: InjectorSettings,
    constructors: HashMap<String, Registration>,
}

impl Default for InjectorRegistry {
    fn default() -> Self {
        Self::with_builtin(InjectorSettings::default())
    }
}

impl InjectorRegistry {
    /// Registry with no variants
    pub fn new(settings: InjectorSettings) -> Self {
        Self {
            settings,
            constructors: HashMap::new(),
        }
    }

    /// Registry with the disk-like and memory-like variants
    pub fn with_builtin(settings: InjectorSettings) -> Self {
        let mut registry = Self::new(settings);
        registry.register("SSDLoadInjector", &SSD_ALIASES, build_ssd);
        registry.register("RAMLoadInjector", &RAM_ALIASES, build_ram);
        registry
    }

    /// Register a variant under a set of aliases, replacing earlier owners
    pub fn register(&mut self, variant: &'static str, aliases: &[&str], constructor: Constructor) {
        let registration = Registration { variant, constructor };
        for alias in aliases {
            if self.constructors.insert(alias.to_string(), registration).is_some() {
                debug!("Alias '{}' re-registered", alias);
            }
        }
    }

    pub fn settings(&self) -> &InjectorSettings {
        &self.settings
    }

    pub fn is_registered(&self, alias: &str) -> bool {
        self.constructors.contains_key(alias)
    }

    /// Registered aliases grouped by the variant they build, sorted
    pub fn aliases(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (alias, registration) in &self.constructors {
            grouped.entry(registration.variant.to_string()).or_default().push(alias.clone());
        }
        for aliases in grouped.values_mut() {
            aliases.sort();
        }
        grouped
    }

    pub fn create(&self, job: &JobDescription) -> Option<Box<dyn LoadInjector>> {
        match self.constructors.get(&job.kind) {
            Some(registration) => {
                let injector = (registration.constructor)(job, &self.settings);
                debug!("Resolved '{}' to {}", job.kind, injector.name());
                Some(injector)
            }
            None => {
                warn!("No injector registered for type '{}'", job.kind);
                None
            }
        }
    }

    pub fn create_from_description(&self, description: Option<&Value>) -> Option<Box<dyn LoadInjector>> {
        let description = description?;
        let job = JobDescription::from_value(description)?;
        self.create(&job)
    }
}

/// Resolve a description with the built-in variants and default settings
pub fn from_json(description: Option<&Value>) -> Option<Box<dyn LoadInjector>> {
    InjectorRegistry::default().create_from_description(description)
}

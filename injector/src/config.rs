//! Configuration management for the injector harness
//!
//! Settings are loaded from a TOML file, then overridden by `LOADINJECT_*`
//! environment variables, then validated.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Largest block a single burst may touch
const MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// Top-level configuration for the injection harness
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Settings shared by every injector built from a job description
    pub injector: InjectorSettings,

    /// Plan runner settings
    pub plan: PlanSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Tuning knobs for the built-in variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorSettings {
    /// Upper bound of each randomized pause in milliseconds
    pub max_pause_ms: u64,

    /// Bytes touched by a single read or write burst
    pub block_size: usize,

    /// Number of blocks in the scratch file or buffer
    pub scratch_blocks: usize,

    /// Directory for disk-like scratch files (system temp dir when unset)
    pub scratch_dir: Option<PathBuf>,

    /// Fixed RNG seed for reproducible pacing
    pub seed: Option<u64>,
}

/// Plan runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Pause between consecutive jobs in milliseconds
    pub cooldown_ms: u64,

    /// How often a running injector is polled for completion
    pub poll_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Emit JSON formatted log lines
    pub json: bool,
}

impl Default for InjectorSettings {
    fn default() -> Self {
        Self {
            max_pause_ms: 10,
            block_size: 4096,
            scratch_blocks: 256,
            scratch_dir: None,
            seed: None,
        }
    }
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            poll_interval_ms: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl InjectorSettings {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "injector.block_size".to_string(),
                value: self.block_size.to_string(),
            });
        }

        if self.scratch_blocks == 0 {
            return Err(ConfigError::InvalidValue {
                field: "injector.scratch_blocks".to_string(),
                value: "0".to_string(),
            });
        }

        if self.max_pause_ms > 1000 {
            return Err(ConfigError::InvalidValue {
                field: "injector.max_pause_ms".to_string(),
                value: self.max_pause_ms.to_string(),
            });
        }

        if let Some(dir) = &self.scratch_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::ValidationFailed {
                    reason: format!("scratch_dir is not a directory: {}", dir.display()),
                });
            }
        }

        Ok(())
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.to_string_lossy().to_string() })?;

        let config: HarnessConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError { reason: e.to_string() })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback order: file -> env -> defaults.
    /// A path that does not exist falls back to the defaults; callers that
    /// want to report it check the path themselves.
    pub fn load_with_fallback<P: AsRef<Path>>(config_path: Option<P>) -> ConfigResult<Self> {
        let mut config = HarnessConfig::default();

        if let Some(path) = config_path.filter(|path| path.as_ref().exists()) {
            config = HarnessConfig::from_file(path)?;
        }

        config.with_env_overrides()
    }

    /// Apply `LOADINJECT_*` environment variables on top of this configuration
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LOADINJECT_MAX_PAUSE_MS") {
            self.injector.max_pause_ms = parse_value("LOADINJECT_MAX_PAUSE_MS", value)?;
        }

        if let Some(value) = lookup("LOADINJECT_BLOCK_SIZE") {
            self.injector.block_size = parse_value("LOADINJECT_BLOCK_SIZE", value)?;
        }

        if let Some(value) = lookup("LOADINJECT_SCRATCH_DIR") {
            self.injector.scratch_dir = Some(PathBuf::from(value));
        }

        if let Some(value) = lookup("LOADINJECT_SEED") {
            self.injector.seed = Some(parse_value("LOADINJECT_SEED", value)?);
        }

        if let Some(value) = lookup("LOADINJECT_COOLDOWN_MS") {
            self.plan.cooldown_ms = parse_value("LOADINJECT_COOLDOWN_MS", value)?;
        }

        if let Some(value) = lookup("LOADINJECT_LOG_LEVEL") {
            self.logging.level = value;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.injector.validate()?;

        if self.plan.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "plan.poll_interval_ms".to_string(),
                value: "0".to_string(),
            });
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
            }),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("loadinject").join("harness.toml"))
            .ok_or_else(|| ConfigError::ValidationFailed {
                reason: "Unable to determine config directory".to_string(),
            })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::ValidationFailed {
                reason: format!("Unable to create config directory: {}", parent.display()),
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationFailed { reason: e.to_string() })?;

        fs::write(path, content)
            .map_err(|_| ConfigError::PermissionDenied { path: path.to_string_lossy().to_string() })?;

        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(field: &str, value: String) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value,
    })
}

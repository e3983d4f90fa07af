//! Error handling for the injector framework
//!
//! The injector lifecycle itself never surfaces these to callers: an
//! unresolvable job description yields `None`, a failed setup flips the
//! validity flag and a faulting work body is recorded on the instance.
//! [`WorkloadError`] is what setup and bursts return before that happens;
//! [`ConfigError`] and [`PlanError`] are returned to the caller as is.

use thiserror::Error;

/// Errors raised by a variant's setup or by one of its bursts
#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("Scratch file creation failed: {reason}")]
    ScratchFileFailed { reason: String },

    #[error("Buffer allocation failed: {size} bytes")]
    AllocationFailed { size: usize },

    #[error("Read burst failed: {reason}")]
    ReadFailed { reason: String },

    #[error("Write burst failed: {reason}")]
    WriteFailed { reason: String },

    #[error("Workload used before setup")]
    NotPrepared,
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration file permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },
}

/// Injection plan errors
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Plan file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid plan format: {reason}")]
    InvalidFormat { reason: String },

    #[error("Plan has no jobs")]
    Empty,
}

/// A specialized result type for workload operations
pub type WorkloadResult<T> = std::result::Result<T, WorkloadError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A specialized result type for plan operations
pub type PlanResult<T> = std::result::Result<T, PlanError>;

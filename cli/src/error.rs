use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] loadinject::ConfigError),

    #[error("Plan error: {0}")]
    Plan(#[from] loadinject::PlanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Invalid job description: {0}")]
    InvalidJob(String),

    #[error("No injector registered for type '{0}'")]
    UnknownInjector(String),

    #[error("Injection failed: {0}")]
    InjectionFailed(String),

    #[error("Configuration file already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Operation cancelled by user")]
    Cancelled,
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 1,
            CliError::Io(_) => 2,
            CliError::Plan(_) => 3,
            CliError::InvalidJob(_) => 4,
            CliError::UnknownInjector(_) => 5,
            CliError::InjectionFailed(_) => 6,
            CliError::Cancelled => 130, // Standard Unix signal for SIGINT
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Format error for user-friendly display
pub fn format_error(error: &CliError) -> String {
    match error {
        CliError::Config(e) => {
            format!("Configuration Error: {}\n\nTry running 'loadinjectctl config show' to check your configuration.", e)
        }
        CliError::UnknownInjector(kind) => {
            format!("Unknown Injector: '{}'\n\nRun 'loadinjectctl list' to see the registered types (names are case-sensitive).", kind)
        }
        CliError::Plan(e) => {
            format!("Plan Error: {}\n\nA plan is a JSON array of jobs, or an object with a \"jobs\" array.", e)
        }
        CliError::Cancelled => "Operation cancelled by user.".to_string(),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::UnknownInjector("Disk".to_string()).exit_code(), 5);
        assert_eq!(CliError::Cancelled.exit_code(), 130);
        assert_eq!(CliError::Plan(loadinject::PlanError::Empty).exit_code(), 3);
    }

    #[test]
    fn test_format_error() {
        let message = format_error(&CliError::UnknownInjector("Disk".to_string()));
        assert!(message.contains("loadinjectctl list"));

        let message = format_error(&CliError::InjectionFailed("boom".to_string()));
        assert_eq!(message, "Injection failed: boom");
    }
}

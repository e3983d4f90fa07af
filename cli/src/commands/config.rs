use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use loadinject::HarnessConfig;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration action
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration (file, then environment overrides)
    Show {
        /// Show configuration file path only
        #[arg(long)]
        path: bool,
    },

    /// Validate configuration
    Validate,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs, config_path: &Path, output: &OutputManager) -> Result<()> {
    match args.action {
        ConfigAction::Show { path } => {
            if path {
                println!("{}", config_path.display());
                return Ok(());
            }
            let config = HarnessConfig::load_with_fallback(Some(config_path))?;
            output.print_config(&config)
        }
        ConfigAction::Validate => {
            HarnessConfig::load_with_fallback(Some(config_path))?;
            output.print_success("Configuration is valid")
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                return Err(CliError::AlreadyExists {
                    path: config_path.display().to_string(),
                });
            }
            HarnessConfig::default().save_to_file(config_path)?;
            output.print_success(&format!("Wrote default configuration to {}", config_path.display()))
        }
    }
}

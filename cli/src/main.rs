use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;
mod output;

use commands::*;
use error::{CliError, Result};
use loadinject::HarnessConfig;
use output::{OutputFormat, OutputManager};

#[derive(Parser)]
#[command(name = "loadinjectctl")]
#[command(about = "LoadInject CLI - run synthetic disk and memory load injections")]
#[command(version)]
#[command(long_about = "
LoadInject CLI (loadinjectctl) resolves job descriptions into load injectors,
runs them for a bounded duration and reports when each injection was active.

Examples:
  loadinjectctl run --type SSD --duration-ms 2000        # Disk-like load for 2s
  loadinjectctl run --job '{\"type\":\"Memory\",\"tag\":\"t1\",\"duration_ms\":200}'
  loadinjectctl plan jobs.json --output report.json      # Run a plan, save intervals
  loadinjectctl list                                     # Show registered types
  loadinjectctl config init                              # Write default configuration
")]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "LOADINJECT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormatArg,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormatArg {
    Table,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single injection job
    Run(RunArgs),

    /// Run an injection plan from a JSON file
    Plan(PlanArgs),

    /// List registered injector types
    List,

    /// Manage harness configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_command(cli).await {
        eprintln!("{}", error::format_error(&e));
        process::exit(e.exit_code());
    }
}

async fn run_command(cli: Cli) -> Result<()> {
    let config_path = resolve_config_path(&cli)?;

    // config init must work even when the existing file is broken
    let config = match &cli.command {
        Commands::Config(_) => HarnessConfig::default(),
        _ => HarnessConfig::load_with_fallback(Some(&config_path))?,
    };

    init_logging(&cli, &config);
    debug!("Using configuration path {}", config_path.display());
    if !matches!(cli.command, Commands::Config(_)) && !config_path.exists() {
        warn!("Configuration file not found: {}, using defaults", config_path.display());
    }

    let colored = !cli.no_color && console::Term::stderr().features().colors_supported();
    let output = OutputManager::new(OutputFormat::from(cli.format), colored);

    match cli.command {
        Commands::Run(args) => commands::run::run(args, &config, &output).await,
        Commands::Plan(args) => commands::plan::run(args, &config, &output).await,
        Commands::List => commands::list::run(&config, &output),
        Commands::Config(args) => commands::config::run(args, &config_path, &output),
    }
}

fn resolve_config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => HarnessConfig::default_config_path().map_err(CliError::from),
    }
}

fn init_logging(cli: &Cli, config: &HarnessConfig) {
    let level = if cli.debug {
        "debug".to_string()
    } else if cli.verbose {
        "info".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else {
        config.logging.level.to_lowercase()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("loadinjectctl={level},loadinject={level}").into());

    if cli.json_logs || config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }

    info!("LoadInject CLI started");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert()
    }

    #[test]
    fn test_output_format_conversion() {
        assert_eq!(OutputFormat::from(OutputFormatArg::Table), OutputFormat::Table);
        assert_eq!(OutputFormat::from(OutputFormatArg::Json), OutputFormat::Json);
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["loadinjectctl", "run", "--type", "SSD", "--duration-ms", "500"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.kind.as_deref(), Some("SSD"));
                assert_eq!(args.duration_ms, 500);
                assert_eq!(args.tag, "");
            }
            _ => panic!("expected run"),
        }

        let cli = Cli::try_parse_from(["loadinjectctl", "--format", "json", "-v", "list"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormatArg::Json));
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_run_requires_type_or_job() {
        assert!(Cli::try_parse_from(["loadinjectctl", "run"]).is_err());
        assert!(Cli::try_parse_from(["loadinjectctl", "run", "--type", "RAM", "--job", "{}"]).is_err());
        assert!(Cli::try_parse_from(["loadinjectctl", "run", "--job", "{\"type\":\"RAM\"}"]).is_ok());
    }
}

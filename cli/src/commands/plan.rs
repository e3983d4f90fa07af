use crate::commands::shutdown_on_ctrl_c;
use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use loadinject::{HarnessConfig, InjectionPlan, InjectorRegistry, PlanRunner};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Plan file (JSON array of jobs, or {"jobs": [...], "cooldown_ms": N})
    pub file: PathBuf,

    /// Write the JSON report to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Pause between jobs in milliseconds (overrides plan and config)
    #[arg(long)]
    pub cooldown_ms: Option<u64>,
}

pub async fn run(args: PlanArgs, config: &HarnessConfig, output: &OutputManager) -> Result<()> {
    let mut plan = InjectionPlan::from_file(&args.file)?;
    if args.cooldown_ms.is_some() {
        plan.cooldown_ms = args.cooldown_ms;
    }
    info!("Loaded plan {} ({} jobs)", args.file.display(), plan.jobs.len());

    let registry = InjectorRegistry::with_builtin(config.injector.clone());
    let runner = PlanRunner::new(registry, config.plan.clone());
    let report = runner.run(&plan, shutdown_on_ctrl_c()).await;

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        output.print_success(&format!("Report written to {}", path.display()))?;
    }
    output.print_report(&report)?;

    let skipped = report.jobs.iter().filter(|job| job.skipped).count();
    if skipped > 0 {
        output.print_warning(&format!("{} job(s) did not resolve to an injector", skipped))?;
    }

    if report.aborted {
        return Err(CliError::Cancelled);
    }
    Ok(())
}

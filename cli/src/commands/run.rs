use crate::commands::shutdown_on_ctrl_c;
use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use loadinject::{HarnessConfig, InjectionPlan, InjectorRegistry, JobDescription, PlanRunner};
use serde_json::{json, Value};
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Injector type (SSD, SSDUsage, SolidStateDrive, RAM, RAMUsage, Memory)
    #[arg(long = "type", short = 't', required_unless_present = "job", conflicts_with = "job")]
    pub kind: Option<String>,

    /// Free-form tag shown in the injector name
    #[arg(long, default_value = "")]
    pub tag: String,

    /// Injection duration in milliseconds
    #[arg(long, short = 'd', default_value_t = 1000)]
    pub duration_ms: u64,

    /// Complete job description as JSON, e.g. '{"type":"RAM","duration_ms":500}'
    #[arg(long)]
    pub job: Option<String>,
}

impl RunArgs {
    fn description(&self) -> Result<Value> {
        match (&self.job, &self.kind) {
            (Some(raw), _) => Ok(serde_json::from_str(raw)?),
            (None, Some(kind)) => Ok(json!({
                "type": kind,
                "tag": self.tag,
                "duration_ms": self.duration_ms,
            })),
            (None, None) => Err(CliError::InvalidJob("either --type or --job is required".to_string())),
        }
    }
}

pub async fn run(args: RunArgs, config: &HarnessConfig, output: &OutputManager) -> Result<()> {
    let description = args.description()?;
    let job = JobDescription::from_value(&description)
        .ok_or_else(|| CliError::InvalidJob(description.to_string()))?;

    let registry = InjectorRegistry::with_builtin(config.injector.clone());
    if !registry.is_registered(&job.kind) {
        return Err(CliError::UnknownInjector(job.kind));
    }

    info!("Running single {} job for {}ms", job.kind, job.duration_ms);
    let runner = PlanRunner::new(registry, config.plan.clone());
    let plan = InjectionPlan::new(vec![description]);
    let report = runner.run(&plan, shutdown_on_ctrl_c()).await;

    output.print_report(&report)?;

    if report.aborted {
        return Err(CliError::Cancelled);
    }
    if let Some(failure) = report.jobs.iter().find_map(|job| job.failure.clone()) {
        return Err(CliError::InjectionFailed(failure));
    }

    output.print_success(&format!("Injected for {}ms", report.total_injected_ms()))?;
    Ok(())
}

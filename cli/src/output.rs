use crate::error::Result;
use chrono::{SecondsFormat, TimeZone, Utc};
use console::style;
use loadinject::{HarnessConfig, PlanReport};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
}

impl OutputManager {
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    pub fn print_report(&self, report: &PlanReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Table => {
                println!(
                    "{:<4} {:<36} {:<25} {:<25} {:>9}  {}",
                    "JOB", "INJECTOR", "START", "END", "DURATION", "STATUS"
                );
                for job in &report.jobs {
                    let name = job.name.as_deref().unwrap_or("-");
                    let status = if job.skipped {
                        "skipped".to_string()
                    } else if let Some(failure) = &job.failure {
                        format!("failed: {}", failure)
                    } else {
                        "ok".to_string()
                    };

                    if job.intervals.is_empty() {
                        println!("{:<4} {:<36} {:<25} {:<25} {:>9}  {}", job.index, name, "-", "-", "-", status);
                    }
                    for interval in &job.intervals {
                        println!(
                            "{:<4} {:<36} {:<25} {:<25} {:>9}  {}",
                            job.index,
                            name,
                            format_millis(interval.start),
                            format_millis(interval.end),
                            format!("{}ms", interval.duration_ms()),
                            status
                        );
                    }
                }
                if report.aborted {
                    self.print_warning("Plan aborted before all jobs ran")?;
                }
            }
        }
        Ok(())
    }

    pub fn print_aliases(&self, aliases: &BTreeMap<String, Vec<String>>) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(aliases)?);
            }
            OutputFormat::Table => {
                for (variant, names) in aliases {
                    println!("{:<20} {}", variant, names.join(", "));
                }
            }
        }
        Ok(())
    }

    pub fn print_config(&self, config: &HarnessConfig) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Table => print!("{}", toml::to_string_pretty(config)?),
        }
        Ok(())
    }

    pub fn print_success(&self, message: &str) -> Result<()> {
        if self.colored {
            eprintln!("{} {}", style("✓").green(), message);
        } else {
            eprintln!("✓ {}", message);
        }
        Ok(())
    }

    pub fn print_warning(&self, message: &str) -> Result<()> {
        if self.colored {
            eprintln!("{} {}", style("⚠").yellow(), message);
        } else {
            eprintln!("⚠ {}", message);
        }
        Ok(())
    }
}

fn format_millis(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}

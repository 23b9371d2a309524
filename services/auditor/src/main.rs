//! nomics-platform: audit an exchange data adapter

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use services_common::{AuditConfig, AuditError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use exchange_auditor::logging::init_tracing;
use exchange_auditor::report::{print_report, write_json_report};
use exchange_auditor::{AuditReport, AuditResult, AuditTarget, Orchestrator};

#[derive(Parser)]
#[command(name = "nomics-platform")]
#[command(about = "Conformance auditor for exchange data adapters", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./audit.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit an adapter at a URL, or start one from a command and audit it
    Audit {
        /// Base URL of a running adapter, or a command that starts one
        target: String,

        /// Path appended to http://localhost:<PORT> when auditing a command
        path_prefix: Option<String>,

        /// Write the results as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("\n{e:#}\n");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AuditConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Audit {
            target,
            path_prefix,
            report,
        } => {
            let audit_report = match AuditTarget::parse(&target, path_prefix.as_deref()) {
                Ok(parsed) => {
                    info!(%target, "Starting audit");
                    Orchestrator::new(config).run(parsed).await
                }
                Err(e) => {
                    let mut invalid = AuditReport::new();
                    invalid.push(AuditResult::fail_with(
                        true,
                        "Invalid audit target",
                        &AuditError::from(e),
                    ));
                    invalid
                }
            };

            print_report(&audit_report);
            if let Some(path) = report {
                write_json_report(&path, &target, &audit_report)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
            }
            Ok(ExitCode::from(audit_report.verdict().exit_code()))
        }
    }
}

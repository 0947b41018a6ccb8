//! Sync command - pull every remote branch that has a local clone

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use gitpuller_core::{CancelHandle, Config, PullOutcome, SyncReport};
use tokio::sync::mpsc;

use super::build_orchestrator;

/// Pull all matched branches, stashing local changes around each pull
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Sync these paths instead of the configured ones (repeatable)
    #[arg(short, long = "path", value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Print the report as JSON instead of progress lines
    #[arg(long)]
    json: bool,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let paths = if self.paths.is_empty() {
            config.paths().to_vec()
        } else {
            self.paths.clone()
        };

        if paths.is_empty() {
            bail!("No repository paths configured. Add one with `gitpuller paths add <PATH>`");
        }

        let orchestrator = build_orchestrator(config)?;

        if verbose {
            tracing::info!(
                paths = paths.len(),
                concurrency = config.sync.concurrency,
                remote = %config.sync.remote,
                "Starting sync"
            );
        }

        let cancel = CancelHandle::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Interrupted; waiting for running pulls to finish...");
                    cancel.cancel();
                }
            })
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<PullOutcome>();
        let printer = {
            let quiet = self.json;
            tokio::spawn(async move {
                while let Some(outcome) = rx.recv().await {
                    if !quiet {
                        print_outcome(&outcome);
                    }
                }
            })
        };

        // The sender is dropped when the run returns, which ends the printer.
        let result = orchestrator.sync_all_with(&paths, &cancel, Some(tx)).await;
        interrupt.abort();
        let _ = printer.await;
        let report = result?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_summary(&report);
        }

        if report.cancelled {
            bail!("Sync cancelled; {} pull(s) not started", report.not_started);
        }
        if report.failed() > 0 {
            bail!("{} of {} pull(s) failed", report.failed(), report.outcomes.len());
        }

        Ok(())
    }
}

fn print_outcome(outcome: &PullOutcome) {
    if outcome.success {
        let note = if outcome.stashed {
            " (local changes restored)"
        } else {
            ""
        };
        println!("✓ {}/{}{}", outcome.repository, outcome.branch, note);
    } else {
        println!(
            "✗ {}/{} [{}]: {}",
            outcome.repository,
            outcome.branch,
            outcome.stage_reached,
            outcome.error_message.as_deref().unwrap_or("unknown error")
        );
        if outcome.needs_manual_restore() {
            println!(
                "    local changes are still stashed in {}",
                outcome.path.display()
            );
        }
    }

    if let Some(ref warning) = outcome.warning {
        println!("    warning: {}", warning);
    }
}

fn print_summary(report: &SyncReport) {
    println!();
    println!(
        "{} succeeded, {} failed, {} without a local clone",
        report.succeeded(),
        report.failed(),
        report.unmatched
    );
    if report.not_started > 0 {
        println!("{} not started", report.not_started);
    }
}

//! Retry failed teardowns from a saved report.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use rigger_lifecycle::{CascadePolicy, Deleter, TeardownReport, TeardownSequencer};
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use crate::error::CliError;
use crate::output::{display_option, print_output, print_success, print_warning, OutputFormat};

use super::CommandContext;

/// Retry the failed entries of a saved teardown report.
///
/// Entries are retried newest-first, like the original teardown. The
/// report is written back with the new outcomes.
#[derive(Debug, Args)]
pub struct SweepCommand {
    /// Report written by a failed teardown.
    report: PathBuf,

    /// Maximum number of sweeps over the remaining failures.
    #[arg(long, default_value_t = 3)]
    passes: u32,

    /// Seconds to wait between passes.
    #[arg(long, default_value_t = 10)]
    interval_secs: u64,

    /// How "not found" answers are treated.
    #[arg(long, default_value_t = CascadePolicy::TolerateNotFound)]
    policy: CascadePolicy,
}

#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    #[tabled(rename = "Resource")]
    resource: String,

    #[tabled(rename = "Outcome")]
    outcome: String,

    #[tabled(rename = "Error", display = "display_option")]
    error: Option<String>,
}

impl SweepCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let mut report = TeardownReport::load(&self.report)
            .with_context(|| format!("Failed to load report {}", self.report.display()))?;
        let client = ctx.client()?;

        let remaining = sweep(
            &mut report,
            &client,
            self.policy,
            self.passes,
            Duration::from_secs(self.interval_secs),
        )
        .await;
        report.save(&self.report)?;

        let rows: Vec<EntryRow> = report
            .entries
            .iter()
            .map(|e| EntryRow {
                resource: e.reference.to_string(),
                outcome: e.outcome.to_string(),
                error: e.error.clone(),
            })
            .collect();
        print_output(&rows, ctx.format);

        if remaining > 0 {
            if ctx.format == OutputFormat::Table {
                print_warning(&format!(
                    "{remaining} of {} resources in '{}' still failing",
                    report.len(),
                    report.label
                ));
            }
            return Err(CliError::SweepIncomplete {
                remaining,
                report: self.report,
            }
            .into());
        }
        if ctx.format == OutputFormat::Table {
            print_success(&format!("All resources in '{}' are gone", report.label));
        }
        Ok(())
    }
}

/// Re-run the failed entries of `report` up to `passes` times.
///
/// Returns how many entries still failed afterwards.
async fn sweep(
    report: &mut TeardownReport,
    deleter: &dyn Deleter,
    policy: CascadePolicy,
    passes: u32,
    interval: Duration,
) -> usize {
    let sequencer = TeardownSequencer::new(policy);

    for pass in 1..=passes {
        if report.is_clean() {
            break;
        }
        if pass > 1 {
            tokio::time::sleep(interval).await;
        }

        let mut registry = report.retry_registry();
        let retry = match sequencer.run(&mut registry, deleter).await {
            Ok(retry) => retry,
            Err(e) => e.report,
        };
        report.merge_retry(&retry);
        info!(
            pass,
            retried = retry.len(),
            remaining = report.failed_count(),
            "Sweep pass finished"
        );
    }

    report.failed_count()
}

#[cfg(test)]
mod tests {
    use rigger_api::commands::CreateSshKeyPair;
    use rigger_lifecycle::Outcome;
    use rigger_testing::fake::FakeCloud;
    use rigger_testing::TestScope;

    use super::*;

    #[tokio::test]
    async fn test_sweep_clears_report_after_blocker_goes_away() {
        let cloud = FakeCloud::start().await.unwrap();
        let client = cloud.client().unwrap();
        let mut scope = TestScope::new("sweep", CascadePolicy::default());

        scope
            .create(&client, &CreateSshKeyPair::new("kp-held"))
            .await
            .unwrap();
        scope
            .create(&client, &CreateSshKeyPair::new("kp-free"))
            .await
            .unwrap();
        cloud.fail_delete("kp-held", "key is in use");

        let mut report = scope.teardown(&client).await.unwrap_err().report;
        assert_eq!(report.failed_count(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save(&path).unwrap();
        let mut report = TeardownReport::load(&path).unwrap();

        let remaining = sweep(
            &mut report,
            &client,
            CascadePolicy::default(),
            1,
            Duration::ZERO,
        )
        .await;
        assert_eq!(remaining, 1);

        cloud.clear_failures();
        let remaining = sweep(
            &mut report,
            &client,
            CascadePolicy::default(),
            3,
            Duration::ZERO,
        )
        .await;

        assert_eq!(remaining, 0);
        assert!(!cloud.exists("kp-held"));
        assert_eq!(report.count(Outcome::Deleted), 2);
        assert_eq!(
            cloud
                .delete_calls()
                .iter()
                .filter(|id| id.as_str() == "kp-free")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_sweep_of_clean_report_makes_no_calls() {
        let cloud = FakeCloud::start().await.unwrap();
        let client = cloud.client().unwrap();
        let mut report = TeardownReport::empty("clean");

        let remaining = sweep(
            &mut report,
            &client,
            CascadePolicy::Strict,
            3,
            Duration::ZERO,
        )
        .await;

        assert_eq!(remaining, 0);
        assert!(cloud.delete_calls().is_empty());
    }
}

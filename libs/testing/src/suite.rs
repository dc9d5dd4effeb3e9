//! Class-level and per-test scopes.
//!
//! A [`Suite`] owns the class scope for fixtures shared by every test.
//! Each test gets its own [`TestCase`] scope, torn down by
//! [`Suite::finish_test`] before the next one starts. The class scope is
//! torn down last by [`Suite::finish`].
//!
//! Teardown failures never change a test's verdict. They are logged as a
//! cleanup warning, collected, and optionally written as JSON reports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rigger_api::{Client, CreateSpec};
use rigger_id::{RemoteId, ResourceRef};
use rigger_lifecycle::{CascadePolicy, TeardownReport};
use tracing::{info, warn};

use crate::environment::TestEnvironment;
use crate::scope::TestScope;

/// Result of tearing one scope down.
#[derive(Debug, Clone)]
pub struct Cleanup {
    pub report: TeardownReport,
    /// Where the report was written, when it had failures and a report
    /// directory is configured.
    pub saved_to: Option<PathBuf>,
}

impl Cleanup {
    pub fn is_clean(&self) -> bool {
        self.report.is_clean()
    }
}

/// Scope of a single test.
#[derive(Debug)]
pub struct TestCase {
    name: String,
    scope: TestScope,
}

impl TestCase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &TestScope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut TestScope {
        &mut self.scope
    }

    pub async fn create<S: CreateSpec>(&mut self, client: &Client, spec: &S) -> Result<S::Output> {
        self.scope.create(client, spec).await
    }

    pub async fn create_under<S: CreateSpec>(
        &mut self,
        client: &Client,
        spec: &S,
        parent: &ResourceRef,
    ) -> Result<S::Output> {
        self.scope.create_under(client, spec, parent).await
    }

    pub fn forget(&mut self, id: &RemoteId) {
        self.scope.forget(id);
    }
}

impl Drop for TestCase {
    fn drop(&mut self) {
        if !self.scope.is_empty() {
            warn!(
                test = %self.name,
                tracked = self.scope.len(),
                "Test scope dropped without teardown, resources will leak"
            );
        }
    }
}

/// Summary of a whole suite's cleanup.
#[derive(Debug, Default)]
pub struct SuiteSummary {
    pub cleanups: Vec<Cleanup>,
}

impl SuiteSummary {
    pub fn failures(&self) -> impl Iterator<Item = &Cleanup> {
        self.cleanups.iter().filter(|c| !c.is_clean())
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Total number of handles that could not be deleted.
    pub fn failed_count(&self) -> usize {
        self.cleanups.iter().map(|c| c.report.failed_count()).sum()
    }
}

pub struct Suite {
    name: String,
    client: Client,
    policy: CascadePolicy,
    report_dir: Option<PathBuf>,
    class_scope: TestScope,
    summary: SuiteSummary,
}

impl Suite {
    pub fn new(name: impl Into<String>, client: Client) -> Self {
        let name = name.into();
        let policy = CascadePolicy::default();
        Self {
            class_scope: TestScope::new(format!("{name} (class)"), policy),
            name,
            client,
            policy,
            report_dir: None,
            summary: SuiteSummary::default(),
        }
    }

    /// Suite for `env`, using its endpoint, admin keys, policy and report dir.
    pub fn for_environment(name: impl Into<String>, env: &TestEnvironment) -> Result<Self> {
        let client = Client::new(env.client_config()?).context("Failed to build API client")?;
        let mut suite = Self::new(name, client).with_policy(env.cascade_policy);
        suite.report_dir = env.report_dir.clone();
        Ok(suite)
    }

    /// Policy for the class scope and every test scope begun afterwards.
    /// Shared fixtures created so far stay registered.
    #[must_use]
    pub fn with_policy(mut self, policy: CascadePolicy) -> Self {
        self.policy = policy;
        self.class_scope.set_policy(policy);
        self
    }

    #[must_use]
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Scope for fixtures shared by every test in the suite.
    pub fn class_scope(&mut self) -> &mut TestScope {
        &mut self.class_scope
    }

    /// Create a shared fixture in the class scope.
    pub async fn create_shared<S: CreateSpec>(&mut self, spec: &S) -> Result<S::Output> {
        self.class_scope.create(&self.client, spec).await
    }

    pub fn begin_test(&self, name: impl Into<String>) -> TestCase {
        let name = name.into();
        info!(suite = %self.name, test = %name, "Starting test");
        TestCase {
            scope: TestScope::new(format!("{}::{}", self.name, name), self.policy),
            name,
        }
    }

    /// Tear the test's scope down.
    pub async fn finish_test(&mut self, mut case: TestCase) -> Cleanup {
        let report = match case.scope.teardown(&self.client).await {
            Ok(report) => report,
            Err(e) => e.report,
        };
        self.record(report)
    }

    /// Tear the class scope down and return every cleanup result.
    pub async fn finish(mut self) -> SuiteSummary {
        let report = match self.class_scope.teardown(&self.client).await {
            Ok(report) => report,
            Err(e) => e.report,
        };
        self.record(report);

        if !self.summary.is_clean() {
            warn!(
                suite = %self.name,
                failed = self.summary.failed_count(),
                "Suite finished with cleanup failures"
            );
        }
        std::mem::take(&mut self.summary)
    }

    fn record(&mut self, report: TeardownReport) -> Cleanup {
        let saved_to = match (&self.report_dir, report.is_clean()) {
            (Some(dir), false) => match save_report(dir, &report) {
                Ok(path) => {
                    warn!(report = %path.display(), "Wrote cleanup report");
                    Some(path)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to write cleanup report");
                    None
                }
            },
            _ => None,
        };

        let cleanup = Cleanup { report, saved_to };
        self.summary.cleanups.push(cleanup.clone());
        cleanup
    }
}

/// Write `report` into `dir` under a name derived from its label.
pub fn save_report(dir: &Path, report: &TeardownReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

    let slug: String = report
        .label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let path = dir.join(format!(
        "{}-{}.json",
        slug.trim_matches('-'),
        Utc::now().format("%Y%m%dT%H%M%S%3f")
    ));
    report.save(&path)?;
    Ok(path)
}

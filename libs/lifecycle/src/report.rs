//! Teardown outcomes.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use rigger_id::ResourceRef;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ReportError;
use crate::handle::{DeleteAction, ResourceHandle};
use crate::registry::Registry;

/// Result of one attempted delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Deleted,
    Failed,
    /// Already removed by a parent delete; not counted as a failure.
    OrphanedByCascade,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Deleted => "deleted",
            Outcome::Failed => "failed",
            Outcome::OrphanedByCascade => "orphaned_by_cascade",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report line: which handle, what happened, and how to retry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownEntry {
    pub reference: ResourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub creation_order: u64,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub delete_action: DeleteAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceRef>,
}

impl TeardownEntry {
    pub(crate) fn from_handle(
        handle: &ResourceHandle,
        outcome: Outcome,
        error: Option<String>,
    ) -> Self {
        Self {
            reference: handle.reference().clone(),
            name: handle.name().map(str::to_string),
            creation_order: handle.creation_order(),
            outcome,
            error,
            delete_action: handle.delete_action().clone(),
            parent: handle.parent().cloned(),
        }
    }

    fn describe(&self) -> String {
        let kind = self.reference.kind.description();
        let id = &self.reference.id;
        let detail = self.error.as_deref().unwrap_or("unknown error");
        match &self.name {
            Some(name) => format!("{kind} {id} ({name}): {detail}"),
            None => format!("{kind} {id}: {detail}"),
        }
    }
}

/// Outcome of one teardown sweep, in the order handles were visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownReport {
    pub label: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<TeardownEntry>,
}

impl TeardownReport {
    pub fn empty(label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            label: label.into(),
            started_at: now,
            finished_at: now,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TeardownEntry> {
        self.entries
            .iter()
            .filter(|e| e.outcome == Outcome::Failed)
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }

    /// One-line summary naming every failed resource.
    pub fn failure_summary(&self) -> String {
        let failures: Vec<String> = self.failed().map(TeardownEntry::describe).collect();
        if failures.is_empty() {
            return format!("cleanup of '{}' completed without failures", self.label);
        }
        format!(
            "Warning: Exception during cleanup of '{}': {} of {} resources failed to delete: {}",
            self.label,
            failures.len(),
            self.entries.len(),
            failures.join("; ")
        )
    }

    /// Registry holding the failed entries again, ready for another sweep.
    ///
    /// Handles are appended in their original creation order, so the retry
    /// still runs newest-first.
    pub fn retry_registry(&self) -> Registry {
        let mut failed: Vec<&TeardownEntry> = self.failed().collect();
        failed.sort_by_key(|e| e.creation_order);

        let mut registry = Registry::new(format!("{} (retry)", self.label));
        for entry in failed {
            let handle = ResourceHandle::restore(
                entry.reference.clone(),
                entry.name.clone(),
                entry.creation_order,
                entry.delete_action.clone(),
                entry.parent.clone(),
            );
            if let Err(e) = registry.append(handle) {
                warn!(report = %self.label, error = %e, "Skipping repeated report entry");
            }
        }
        registry
    }

    /// Replace the entries of `self` with the results of a retry sweep.
    ///
    /// Every entry naming a retried resource takes the new outcome, so a
    /// repeated entry is settled along with the one that was retried.
    pub fn merge_retry(&mut self, retry: &TeardownReport) {
        for retried in &retry.entries {
            for entry in self
                .entries
                .iter_mut()
                .filter(|e| e.reference == retried.reference)
            {
                entry.outcome = retried.outcome;
                entry.error = retried.error.clone();
            }
        }
        self.finished_at = retry.finished_at;
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let contents = serde_json::to_string_pretty(self).map_err(|source| ReportError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, contents).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a report written by [`save`](TeardownReport::save).
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ReportError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

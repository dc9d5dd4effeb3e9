//! LIFO best-effort teardown.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rigger_id::ResourceRef;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HandleError, TeardownError};
use crate::handle::{Deleter, ResourceHandle};
use crate::registry::Registry;
use crate::report::{Outcome, TeardownEntry, TeardownReport};

/// How a "not found" answer to a delete is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Not found is a failure like any other.
    Strict,
    /// Not found means a parent delete already took the resource.
    #[default]
    TolerateNotFound,
    /// Like `TolerateNotFound`, and handles whose recorded parent chain
    /// reaches an already removed cascading resource are skipped without a
    /// remote call.
    TrackParents,
}

impl CascadePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            CascadePolicy::Strict => "strict",
            CascadePolicy::TolerateNotFound => "tolerate_not_found",
            CascadePolicy::TrackParents => "track_parents",
        }
    }

    fn tolerates_not_found(self) -> bool {
        !matches!(self, CascadePolicy::Strict)
    }
}

impl fmt::Display for CascadePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CascadePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(CascadePolicy::Strict),
            "tolerate_not_found" | "tolerate" => Ok(CascadePolicy::TolerateNotFound),
            "track_parents" | "track" => Ok(CascadePolicy::TrackParents),
            other => Err(format!(
                "unknown cascade policy '{other}' (expected strict, tolerate_not_found or track_parents)"
            )),
        }
    }
}

/// Drains a registry newest-first and deletes every handle.
///
/// A failing delete never stops the sweep. The sequencer does not retry;
/// failed entries stay in the report for a later sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeardownSequencer {
    policy: CascadePolicy,
}

impl TeardownSequencer {
    pub fn new(policy: CascadePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CascadePolicy {
        self.policy
    }

    /// Drain `registry` and attempt every delete.
    ///
    /// Returns the report when nothing failed, otherwise one aggregate
    /// [`TeardownError`] carrying the full report.
    pub async fn run(
        &self,
        registry: &mut Registry,
        deleter: &dyn Deleter,
    ) -> Result<TeardownReport, TeardownError> {
        let label = registry.label().to_string();
        let handles = registry.drain();
        let report = self.sweep(label, handles, deleter).await;

        if report.is_clean() {
            Ok(report)
        } else {
            warn!(
                scope = %report.label,
                failed = report.failed_count(),
                attempted = report.len(),
                "{}",
                report.failure_summary()
            );
            Err(TeardownError { report })
        }
    }

    async fn sweep(
        &self,
        label: String,
        handles: Vec<ResourceHandle>,
        deleter: &dyn Deleter,
    ) -> TeardownReport {
        let mut report = TeardownReport::empty(label);
        if handles.is_empty() {
            return report;
        }

        info!(scope = %report.label, count = handles.len(), policy = %self.policy, "Starting teardown");

        let parents: HashMap<ResourceRef, ResourceRef> = handles
            .iter()
            .filter_map(|h| h.parent().map(|p| (h.reference().clone(), p.clone())))
            .collect();
        let mut removed: HashSet<ResourceRef> = HashSet::new();

        for mut handle in handles {
            if self.policy == CascadePolicy::TrackParents {
                if let Some(ancestor) = removed_ancestor(handle.reference(), &parents, &removed) {
                    handle.mark_orphaned();
                    info!(
                        resource = %handle.reference(),
                        ancestor = %ancestor,
                        "Skipping delete, removed with parent"
                    );
                    let note = format!("removed with {ancestor}");
                    if handle.kind().cascades() {
                        removed.insert(handle.reference().clone());
                    }
                    report.entries.push(TeardownEntry::from_handle(
                        &handle,
                        Outcome::OrphanedByCascade,
                        Some(note),
                    ));
                    continue;
                }
            }

            let entry = match handle.delete(deleter).await {
                Ok(()) => {
                    info!(resource = %handle, "Deleted resource");
                    if handle.kind().cascades() {
                        removed.insert(handle.reference().clone());
                    }
                    TeardownEntry::from_handle(&handle, Outcome::Deleted, None)
                }
                Err(HandleError::Delete { source, .. })
                    if source.is_not_found() && self.policy.tolerates_not_found() =>
                {
                    info!(resource = %handle, "Resource already gone");
                    if handle.kind().cascades() {
                        removed.insert(handle.reference().clone());
                    }
                    TeardownEntry::from_handle(
                        &handle,
                        Outcome::OrphanedByCascade,
                        Some(source.to_string()),
                    )
                }
                Err(e) => {
                    let detail = match e.delete_error() {
                        Some(source) => source.to_string(),
                        None => e.to_string(),
                    };
                    warn!(resource = %handle, error = %detail, "Failed to delete resource");
                    TeardownEntry::from_handle(&handle, Outcome::Failed, Some(detail))
                }
            };
            report.entries.push(entry);
        }

        report.finished_at = Utc::now();
        report
    }
}

/// First ancestor of `reference` (walking recorded parents) that was removed.
fn removed_ancestor(
    reference: &ResourceRef,
    parents: &HashMap<ResourceRef, ResourceRef>,
    removed: &HashSet<ResourceRef>,
) -> Option<ResourceRef> {
    let mut current = parents.get(reference);
    // Bounded walk: a malformed parent cycle must not hang teardown.
    for _ in 0..=parents.len() {
        let parent = current?;
        if removed.contains(parent) {
            return Some(parent.clone());
        }
        current = parents.get(parent);
    }
    None
}

#[cfg(test)]
mod tests {
    use rigger_id::ResourceKind;
    use rstest::rstest;

    use super::*;
    use crate::error::DeleteError;
    use crate::handle::tests::{handle, ScriptedDeleter};

    fn registry_of(ids: &[&str]) -> Registry {
        let mut registry = Registry::new("test");
        for id in ids {
            registry.append(handle(ResourceKind::Volume, id)).unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_visits_in_reverse_creation_order() {
        let mut registry = registry_of(&["1", "2", "3", "4"]);
        let deleter = ScriptedDeleter::default();

        let report = TeardownSequencer::default()
            .run(&mut registry, &deleter)
            .await
            .unwrap();

        assert_eq!(deleter.call_ids(), vec!["4", "3", "2", "1"]);
        assert_eq!(report.count(Outcome::Deleted), 4);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_empty_registry_is_noop() {
        let mut registry = Registry::new("empty");
        let deleter = ScriptedDeleter::default();

        let report = TeardownSequencer::default()
            .run(&mut registry, &deleter)
            .await
            .unwrap();

        assert!(report.is_empty());
        assert!(deleter.call_ids().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_failures_attempt_everything() {
        let mut registry = registry_of(&["1", "2", "3", "4", "5"]);
        let deleter = ScriptedDeleter::failing(&[
            ("2", DeleteError::Failed("volume is attached".into())),
            ("4", DeleteError::Failed("snapshot in progress".into())),
        ]);

        let err = TeardownSequencer::default()
            .run(&mut registry, &deleter)
            .await
            .unwrap_err();

        assert_eq!(deleter.call_ids().len(), 5);
        assert_eq!(err.report.len(), 5);
        assert_eq!(err.report.failed_count(), 2);

        let message = err.to_string();
        assert!(message.contains("volume 2: volume is attached"));
        assert!(message.contains("volume 4: snapshot in progress"));
        assert!(!message.contains("volume 1"));

        let mut failed: Vec<_> = err.failed_ids().iter().map(|id| id.to_string()).collect();
        failed.sort();
        assert_eq!(failed, vec!["2", "4"]);
    }

    #[tokio::test]
    async fn test_redrain_after_sweep_is_empty() {
        let mut registry = registry_of(&["1", "2"]);
        let deleter = ScriptedDeleter::default();
        let sequencer = TeardownSequencer::default();

        sequencer.run(&mut registry, &deleter).await.unwrap();
        let second = sequencer.run(&mut registry, &deleter).await.unwrap();

        assert!(second.is_empty());
        assert_eq!(deleter.call_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_account_network_vm_with_network_failure() {
        let mut registry = Registry::new("scenario");
        registry.append(handle(ResourceKind::Account, "acc")).unwrap();
        registry.append(handle(ResourceKind::Network, "net")).unwrap();
        registry
            .append(handle(ResourceKind::VirtualMachine, "vm"))
            .unwrap();

        let deleter = ScriptedDeleter::failing(&[(
            "net",
            DeleteError::Failed("network has active VMs".into()),
        )]);

        let err = TeardownSequencer::default()
            .run(&mut registry, &deleter)
            .await
            .unwrap_err();

        assert_eq!(deleter.call_ids(), vec!["vm", "net", "acc"]);
        let outcomes: Vec<_> = err.report.entries.iter().map(|e| e.outcome).collect();
        assert_eq!(
            outcomes,
            vec![Outcome::Deleted, Outcome::Failed, Outcome::Deleted]
        );
    }

    #[rstest]
    #[case(CascadePolicy::Strict, Outcome::Failed)]
    #[case(CascadePolicy::TolerateNotFound, Outcome::OrphanedByCascade)]
    #[case(CascadePolicy::TrackParents, Outcome::OrphanedByCascade)]
    #[tokio::test]
    async fn test_not_found_per_policy(#[case] policy: CascadePolicy, #[case] expected: Outcome) {
        let mut registry = registry_of(&["gone"]);
        let deleter =
            ScriptedDeleter::failing(&[("gone", DeleteError::NotFound("no such volume".into()))]);

        let report = match TeardownSequencer::new(policy)
            .run(&mut registry, &deleter)
            .await
        {
            Ok(report) => report,
            Err(err) => err.report,
        };

        assert_eq!(report.entries[0].outcome, expected);
    }

    #[tokio::test]
    async fn test_track_parents_skips_cascaded_children() {
        // Registered out of creation order: the domain handle is newer than
        // the account it contains, so it is deleted first.
        let account = handle(ResourceKind::Account, "acc");
        let vm = handle(ResourceKind::VirtualMachine, "vm").with_parent(account.reference().clone());
        let domain = handle(ResourceKind::Domain, "dom");
        let account = account.with_parent(domain.reference().clone());

        let mut registry = Registry::new("cascade");
        registry.append(vm).unwrap();
        registry.append(account).unwrap();
        registry.append(domain).unwrap();

        let deleter = ScriptedDeleter::default();
        let report = TeardownSequencer::new(CascadePolicy::TrackParents)
            .run(&mut registry, &deleter)
            .await
            .unwrap();

        assert_eq!(deleter.call_ids(), vec!["dom"]);
        assert_eq!(report.count(Outcome::OrphanedByCascade), 2);
        assert!(report.entries[2]
            .error
            .as_deref()
            .unwrap()
            .contains("account:acc"));
    }

    #[tokio::test]
    async fn test_track_parents_keeps_deleting_after_failed_parent() {
        let domain = handle(ResourceKind::Domain, "dom");
        let account = handle(ResourceKind::Account, "acc").with_parent(domain.reference().clone());

        let mut registry = Registry::new("cascade");
        registry.append(account).unwrap();
        registry.append(domain).unwrap();

        let deleter =
            ScriptedDeleter::failing(&[("dom", DeleteError::Failed("domain busy".into()))]);
        let err = TeardownSequencer::new(CascadePolicy::TrackParents)
            .run(&mut registry, &deleter)
            .await
            .unwrap_err();

        assert_eq!(deleter.call_ids(), vec!["dom", "acc"]);
        assert_eq!(err.report.failed_count(), 1);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("strict".parse::<CascadePolicy>(), Ok(CascadePolicy::Strict));
        assert_eq!(
            "track-parents".parse::<CascadePolicy>(),
            Ok(CascadePolicy::TrackParents)
        );
        assert!("lenient".parse::<CascadePolicy>().is_err());
    }
}

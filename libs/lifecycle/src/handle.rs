//! Handles for remotely created resources.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rigger_id::{RemoteId, ResourceKind, ResourceRef};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DeleteError, HandleError};

/// Process-wide creation counter. Starts at 1 so 0 never appears in reports.
static CREATION_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_creation_order() -> u64 {
    CREATION_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// How to delete one resource: the remote command and its parameters.
///
/// Built by the API layer when the resource is created, so teardown never
/// has to know the per-kind delete conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAction {
    pub command: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl DeleteAction {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Issues remote deletes.
#[async_trait]
pub trait Deleter: Send + Sync {
    async fn delete(&self, target: &ResourceRef, action: &DeleteAction)
        -> Result<(), DeleteError>;
}

/// Lifecycle state of a handle.
///
/// `Created` is the only non-terminal state; there is no way back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleState {
    Created,
    Deleted,
    DeleteFailed,
    OrphanedByCascade,
}

impl HandleState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, HandleState::Created)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HandleState::Created => "created",
            HandleState::Deleted => "deleted",
            HandleState::DeleteFailed => "delete_failed",
            HandleState::OrphanedByCascade => "orphaned_by_cascade",
        }
    }
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local representative of one remotely created resource.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    reference: ResourceRef,
    name: Option<String>,
    creation_order: u64,
    delete_action: DeleteAction,
    parent: Option<ResourceRef>,
    attributes: serde_json::Value,
    created_at: DateTime<Utc>,
    state: HandleState,
}

impl ResourceHandle {
    /// Creates a handle for a resource the remote side just confirmed.
    pub fn new(kind: ResourceKind, remote_id: RemoteId, delete_action: DeleteAction) -> Self {
        Self {
            reference: ResourceRef::new(kind, remote_id),
            name: None,
            creation_order: next_creation_order(),
            delete_action,
            parent: None,
            attributes: serde_json::Value::Null,
            created_at: Utc::now(),
            state: HandleState::Created,
        }
    }

    /// Rebuilds a live handle from a persisted report entry.
    ///
    /// The original creation order is kept so a retried sweep still runs
    /// newest-first.
    pub(crate) fn restore(
        reference: ResourceRef,
        name: Option<String>,
        creation_order: u64,
        delete_action: DeleteAction,
        parent: Option<ResourceRef>,
    ) -> Self {
        Self {
            reference,
            name,
            creation_order,
            delete_action,
            parent,
            attributes: serde_json::Value::Null,
            created_at: Utc::now(),
            state: HandleState::Created,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Records the resource this one lives inside (domain of an account,
    /// account of a VM, ...). Only consulted by cascade-aware teardown.
    #[must_use]
    pub fn with_parent(mut self, parent: ResourceRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attaches a snapshot of the attributes returned by the create call.
    #[must_use]
    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.reference.kind
    }

    pub fn remote_id(&self) -> &RemoteId {
        &self.reference.id
    }

    pub fn reference(&self) -> &ResourceRef {
        &self.reference
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn creation_order(&self) -> u64 {
        self.creation_order
    }

    pub fn delete_action(&self) -> &DeleteAction {
        &self.delete_action
    }

    pub fn parent(&self) -> Option<&ResourceRef> {
        self.parent.as_ref()
    }

    pub fn attributes(&self) -> &serde_json::Value {
        &self.attributes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Decodes the attribute snapshot into a response DTO.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.attributes.clone())
    }

    /// Issues the remote delete for this handle.
    ///
    /// Delete is attempted at most once: a handle that already left
    /// `Created` is rejected locally without a remote call. A not-found
    /// response moves the handle to `OrphanedByCascade`, any other failure to
    /// `DeleteFailed`.
    pub async fn delete(&mut self, deleter: &dyn Deleter) -> Result<(), HandleError> {
        if self.state.is_terminal() {
            return Err(HandleError::NotDeletable {
                reference: self.reference.clone(),
                state: self.state,
            });
        }

        debug!(
            resource = %self.reference,
            command = %self.delete_action.command,
            "Deleting resource"
        );

        match deleter.delete(&self.reference, &self.delete_action).await {
            Ok(()) => {
                self.state = HandleState::Deleted;
                Ok(())
            }
            Err(source) => {
                self.state = if source.is_not_found() {
                    HandleState::OrphanedByCascade
                } else {
                    HandleState::DeleteFailed
                };
                Err(HandleError::Delete {
                    reference: self.reference.clone(),
                    source,
                })
            }
        }
    }

    /// Marks the handle as removed by a parent's cascade without a remote call.
    pub(crate) fn mark_orphaned(&mut self) {
        if !self.state.is_terminal() {
            self.state = HandleState::OrphanedByCascade;
        }
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(
                f,
                "{} {} ({})",
                self.reference.kind.description(),
                self.reference.id,
                name
            ),
            None => write!(
                f,
                "{} {}",
                self.reference.kind.description(),
                self.reference.id
            ),
        }
    }
}

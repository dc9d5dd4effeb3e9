//! Error types for registration, deletion and teardown.

use std::path::PathBuf;

use rigger_id::{RemoteId, ResourceRef};
use thiserror::Error;

use crate::handle::HandleState;
use crate::report::TeardownReport;

/// Registry input-contract violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A handle with this remote ID is already registered.
    #[error("{existing} is already registered in '{label}' (rejected {rejected})")]
    Duplicate {
        label: String,
        existing: ResourceRef,
        rejected: ResourceRef,
    },
}

/// Failure reported by a [`Deleter`](crate::Deleter) for one remote delete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeleteError {
    /// The remote object no longer exists.
    ///
    /// Usually the result of a parent delete cascading to this resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote delete failed for any other reason.
    #[error("{0}")]
    Failed(String),
}

impl DeleteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DeleteError::NotFound(_))
    }

    pub fn message(&self) -> &str {
        match self {
            DeleteError::NotFound(m) | DeleteError::Failed(m) => m,
        }
    }
}

/// Errors from operating on a single handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// Delete was already attempted for this handle.
    #[error("{reference} is {state} and cannot be deleted again")]
    NotDeletable {
        reference: ResourceRef,
        state: HandleState,
    },

    /// The remote delete call failed.
    #[error("failed to delete {reference}: {source}")]
    Delete {
        reference: ResourceRef,
        #[source]
        source: DeleteError,
    },
}

impl HandleError {
    /// Returns the underlying delete failure, if the remote call was made.
    pub fn delete_error(&self) -> Option<&DeleteError> {
        match self {
            HandleError::Delete { source, .. } => Some(source),
            HandleError::NotDeletable { .. } => None,
        }
    }
}

/// Aggregate failure raised after a full teardown sweep.
///
/// The sweep always runs to completion first; the complete report is kept
/// so callers can persist it and retry the failed entries later.
#[derive(Debug, Error)]
#[error("{}", .report.failure_summary())]
pub struct TeardownError {
    pub report: TeardownReport,
}

impl TeardownError {
    /// Remote IDs of the handles that could not be deleted.
    pub fn failed_ids(&self) -> Vec<&RemoteId> {
        self.report.failed().map(|e| &e.reference.id).collect()
    }
}

/// Errors reading or writing a persisted teardown report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to access report at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid report JSON at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

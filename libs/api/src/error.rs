//! Errors from remote calls.

use std::time::Duration;

use rigger_lifecycle::{DeleteError, ResourceHandle};
use thiserror::Error;

/// Error texts the control plane uses when the target object is gone.
const NOT_FOUND_TEXTS: &[&str] = &[
    "does not exist",
    "unable to find",
    "cannot find",
    "not found",
    "invalid parameter id value",
];

/// HTTP status the control plane uses for parameter errors, including
/// lookups of unknown IDs.
pub const PARAM_ERROR: u16 = 431;

/// A failed remote call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with an error body.
    #[error("{command} failed ({status}): {message}")]
    Api {
        command: String,
        status: u16,
        cs_error_code: Option<u32>,
        message: String,
    },

    /// An async job finished with `jobstatus` 2.
    #[error("{command} job {job_id} failed ({status}): {message}")]
    AsyncJobFailed {
        command: String,
        job_id: String,
        status: u16,
        message: String,
    },

    /// An async job did not finish in time.
    #[error("{command} job {job_id} did not finish after {elapsed:?}")]
    AsyncJobTimeout {
        command: String,
        job_id: String,
        elapsed: Duration,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response did not have the expected shape.
    #[error("unexpected response to {command}: {message}")]
    Decode { command: String, message: String },

    /// A create went through but its result could not be read. The handle
    /// deletes what was created.
    #[error("unexpected response to {command}: {message}")]
    CreatedUnreadable {
        command: String,
        message: String,
        handle: Box<ResourceHandle>,
    },

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A wait for remote state ran out of time.
    #[error("timed out after {elapsed:?} waiting for {what}")]
    WaitTimeout { what: String, elapsed: Duration },
}

impl ApiError {
    pub(crate) fn decode(command: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            command: command.to_string(),
            message: message.into(),
        }
    }

    /// Handle for a resource that exists remotely although the call failed.
    pub fn leaked_handle(&self) -> Option<&ResourceHandle> {
        match self {
            ApiError::CreatedUnreadable { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// HTTP-like status of the failure, when the server supplied one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::AsyncJobFailed { status, .. } => {
                Some(*status)
            }
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The server's error text, when there was one.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Api { message, .. } | ApiError::AsyncJobFailed { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    /// True when the error says the target object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self.status() {
            Some(404) => true,
            Some(PARAM_ERROR) | Some(530) => self
                .message()
                .map(|m| {
                    let m = m.to_lowercase();
                    NOT_FOUND_TEXTS.iter().any(|t| m.contains(t))
                })
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ApiError::AsyncJobTimeout { .. } | ApiError::WaitTimeout { .. }
        )
    }
}

impl From<ApiError> for DeleteError {
    fn from(err: ApiError) -> Self {
        if err.is_not_found() {
            DeleteError::NotFound(err.to_string())
        } else {
            DeleteError::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn api(status: u16, message: &str) -> ApiError {
        ApiError::Api {
            command: "deleteNetwork".to_string(),
            status,
            cs_error_code: Some(4350),
            message: message.to_string(),
        }
    }

    #[rstest]
    #[case(431, "Unable to find network by id", true)]
    #[case(431, "Network id=abc does not exist", true)]
    #[case(404, "whatever", true)]
    #[case(431, "Unable to execute API command due to invalid value", false)]
    #[case(530, "Failed to delete network: in use", false)]
    #[case(530, "Entity does not exist", true)]
    #[case(401, "unable to verify user credentials", false)]
    fn test_not_found_classification(
        #[case] status: u16,
        #[case] message: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(api(status, message).is_not_found(), expected);
    }

    #[test]
    fn test_into_delete_error() {
        let err: DeleteError = api(431, "Unable to find account").into();
        assert!(err.is_not_found());

        let err: DeleteError = api(530, "Account has running VMs").into();
        assert!(!err.is_not_found());
        assert!(err.message().contains("Account has running VMs"));
    }

    #[test]
    fn test_async_job_failure_not_found() {
        let err = ApiError::AsyncJobFailed {
            command: "destroyVirtualMachine".to_string(),
            job_id: "job-1".to_string(),
            status: 530,
            message: "Unable to find VM".to_string(),
        };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("job-1"));
    }
}

//! Error taxonomy for the administration workflow.
//!
//! Operator input errors are recovered inside `input` and never show up here.
//! Per-item action failures are collected into an `ActionOutcome` instead of
//! being raised.
use crate::context::SelectionError;
use thiserror::Error;

/// Startup configuration problems. Fatal before the workflow starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("login mode `{0}` is not supported")]
    UnsupportedLoginMode(String),
}

/// Failure of a single remote call.
///
/// Transport and rejection are kept apart for logging; callers treat both as
/// "the call failed".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("transport error calling {operation}: {detail}")]
    Transport {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation} rejected by platform: {detail}")]
    Rejected {
        operation: &'static str,
        detail: String,
    },
}

impl EndpointError {
    pub fn transport(operation: &'static str, detail: impl Into<String>) -> Self {
        EndpointError::Transport {
            operation,
            detail: detail.into(),
        }
    }

    pub fn rejected(operation: &'static str, detail: impl Into<String>) -> Self {
        EndpointError::Rejected {
            operation,
            detail: detail.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, EndpointError::Transport { .. })
    }
}

/// Operator console failures. Unlike malformed input these cannot be retried.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// End of input; the operator can no longer answer.
    #[error("operator input closed")]
    Closed,

    /// Reading or writing the terminal failed.
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end the current state and force the workflow into `Quit`.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("authentication failed: {0}")]
    Authentication(#[source] EndpointError),

    #[error("discovery of {what} failed: {source}")]
    Discovery {
        what: String,
        #[source]
        source: EndpointError,
    },

    #[error(transparent)]
    Console(#[from] ConsoleError),

    #[error("stale selection: {0}")]
    Selection(#[from] SelectionError),

    #[error("workflow invariant violated: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn discovery(what: impl Into<String>, source: EndpointError) -> Self {
        WorkflowError::Discovery {
            what: what.into(),
            source,
        }
    }
}

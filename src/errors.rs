// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure API and reconciliation error types.
//!
//! This module provides specialized error types for:
//! - Azure Resource Manager operations ([`AzureError`])
//! - Reconciliation outcomes that carry a requeue hint ([`ReconcileError`])
//!
//! [`AzureError`] classifies what the cloud said; [`ReconcileError`] tells the
//! outer controller what to do about it.

use std::time::Duration;
use thiserror::Error;

use crate::constants::{DEFAULT_RECONCILER_REQUEUE, TRANSIENT_ERROR_REQUEUE};

/// Errors returned by the Azure Resource Manager client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AzureError {
    /// The resource (or one of its parents) does not exist (HTTP 404).
    #[error("resource not found: {message}")]
    NotFound {
        /// Message reported by Azure
        message: String,
    },

    /// Azure answered with a non-success status code.
    #[error("HTTP {status} {code}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// ARM error code (e.g. `OperationNotAllowed`)
        code: String,
        /// Message reported by Azure
        message: String,
    },

    /// An asynchronous operation reached the `Failed` or `Canceled` state.
    #[error("operation {status}: {code}: {message}")]
    OperationFailed {
        /// Terminal status reported by the poller
        status: String,
        /// ARM error code
        code: String,
        /// Message reported by Azure
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The per-call deadline expired before a poller could be created.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// An access token could not be acquired.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A persisted resume token could not be parsed.
    #[error("invalid resume token: {0}")]
    InvalidResumeToken(String),

    /// A request or response body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AzureError {
    /// Create an API error from its parts.
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        if status == 404 {
            return Self::NotFound {
                message: message.into(),
            };
        }
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error with the given message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// HTTP status code associated with the error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for errors expected to clear without user action:
    /// throttling, server errors, transport failures and expired deadlines.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Transport(_) | Self::DeadlineExceeded => true,
            _ => false,
        }
    }

    /// Returns `true` when the credentials were rejected or lack permission.
    #[must_use]
    pub fn is_permission(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 401 || *status == 403,
            Self::Auth(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AzureError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::DeadlineExceeded;
        }
        if err.is_decode() {
            return Self::Serialization(err.to_string());
        }
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AzureError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error returned by a reconcile step, carrying what the outer loop should do next.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The step could not make progress now but is expected to later.
    #[error("{message}")]
    Transient {
        /// Human-readable explanation surfaced in conditions
        message: String,
        /// Suggested delay before the next pass
        requeue_after: Duration,
    },

    /// A long-running operation was started or resumed and is still running.
    #[error("{message}")]
    OperationNotDone {
        /// Human-readable explanation surfaced in conditions
        message: String,
        /// Suggested delay before the next pass
        requeue_after: Duration,
    },

    /// The step failed and will not succeed until the declarative input changes.
    #[error("{message}")]
    Terminal {
        /// Human-readable explanation surfaced in conditions
        message: String,
    },
}

impl ReconcileError {
    /// Create a transient error with an explicit requeue hint.
    pub fn transient(message: impl Into<String>, requeue_after: Duration) -> Self {
        Self::Transient {
            message: message.into(),
            requeue_after,
        }
    }

    /// Create a transient error with the standard 20 second hint.
    pub fn transient_default(message: impl Into<String>) -> Self {
        Self::transient(message, TRANSIENT_ERROR_REQUEUE)
    }

    /// Create an operation-not-done error.
    pub fn not_done(message: impl Into<String>, requeue_after: Duration) -> Self {
        Self::OperationNotDone {
            message: message.into(),
            requeue_after,
        }
    }

    /// Create a terminal error.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }

    /// Delay the outer controller should wait before the next pass.
    #[must_use]
    pub fn requeue_after(&self) -> Duration {
        match self {
            Self::Transient { requeue_after, .. } | Self::OperationNotDone { requeue_after, .. } => {
                *requeue_after
            }
            Self::Terminal { .. } => DEFAULT_RECONCILER_REQUEUE,
        }
    }

    /// Returns `true` for [`ReconcileError::Transient`].
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns `true` for [`ReconcileError::OperationNotDone`].
    #[must_use]
    pub fn is_operation_not_done(&self) -> bool {
        matches!(self, Self::OperationNotDone { .. })
    }

    /// Returns `true` for [`ReconcileError::Terminal`].
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }

    /// Wrap the message with a prefix, keeping the kind and requeue hint.
    #[must_use]
    pub fn with_context(self, prefix: &str) -> Self {
        match self {
            Self::Transient {
                message,
                requeue_after,
            } => Self::Transient {
                message: format!("{prefix}: {message}"),
                requeue_after,
            },
            Self::OperationNotDone {
                message,
                requeue_after,
            } => Self::OperationNotDone {
                message: format!("{prefix}: {message}"),
                requeue_after,
            },
            Self::Terminal { message } => Self::Terminal {
                message: format!("{prefix}: {message}"),
            },
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for Kubernetes resources.
//!
//! This module provides utility functions for creating and managing Kubernetes
//! status conditions following the standard conventions, plus the mapping from
//! a reconcile step's outcome to the condition it leaves behind.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (e.g., "Ready", "AgentPoolsReady")
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the condition changed
//!
//! # Example
//!
//! ```rust,no_run
//! use capz_aks::reconcilers::status::create_condition;
//!
//! let condition = create_condition(
//!     "ManagedClusterRunning",
//!     "True",
//!     "Succeeded",
//!     ""
//! );
//! ```

use crate::crd::{Condition, FutureType};
use crate::errors::ReconcileError;
use crate::status_reasons::{
    pending_reason, CONDITION_TYPE_READY, REASON_DELETED, REASON_DELETION_FAILED, REASON_FAILED, REASON_SUCCEEDED,
    REASON_TRANSIENT_FAILURE,
};
use chrono::Utc;

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Example
///
/// ```rust,no_run
/// # use capz_aks::reconcilers::status::create_condition;
/// let condition = create_condition(
///     "Ready",
///     "True",
///     "Succeeded",
///     "managed cluster is running"
/// );
/// assert_eq!(condition.r#type, "Ready");
/// assert_eq!(condition.status, "True");
/// ```
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// The `lastTransitionTime` is preserved when the status does not change.
///
/// **Important:** This function does NOT make any Kubernetes API calls. The
/// owning scope persists the conditions when the pass commits.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Copies `source_type` onto the `Ready` condition.
///
/// Nothing changes when `source_type` has not been written yet.
pub fn mirror_ready_condition(conditions: &mut Vec<Condition>, source_type: &str) {
    let Some(source) = find_condition(conditions, source_type).cloned() else {
        return;
    };
    update_condition_in_memory(
        conditions,
        CONDITION_TYPE_READY,
        &source.status,
        source.reason.as_deref().unwrap_or_default(),
        source.message.as_deref().unwrap_or_default(),
    );
}

/// Record the outcome of a create-or-update step on `condition_type`.
///
/// | Outcome | Status | Reason |
/// |---------|--------|--------|
/// | success | True | `Succeeded` |
/// | operation not done | False | `Creating` / `Updating` |
/// | transient | False | `TransientFailure` |
/// | terminal | False | `Failed` |
pub fn set_put_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    service: &str,
    outcome: Option<&ReconcileError>,
    creating: bool,
) {
    match outcome {
        None => update_condition_in_memory(conditions, condition_type, "True", REASON_SUCCEEDED, ""),
        Some(err @ ReconcileError::OperationNotDone { .. }) => update_condition_in_memory(
            conditions,
            condition_type,
            "False",
            pending_reason(FutureType::Put, creating),
            &err.to_string(),
        ),
        Some(err @ ReconcileError::Transient { .. }) => update_condition_in_memory(
            conditions,
            condition_type,
            "False",
            REASON_TRANSIENT_FAILURE,
            &err.to_string(),
        ),
        Some(err @ ReconcileError::Terminal { .. }) => update_condition_in_memory(
            conditions,
            condition_type,
            "False",
            REASON_FAILED,
            &format!("{service} failed to create or update. err: {err}"),
        ),
    }
}

/// Record the outcome of an update-only step; same table as [`set_put_condition`]
/// with `Updating` as the pending reason.
pub fn set_patch_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    service: &str,
    outcome: Option<&ReconcileError>,
) {
    match outcome {
        Some(err @ ReconcileError::Terminal { .. }) => update_condition_in_memory(
            conditions,
            condition_type,
            "False",
            REASON_FAILED,
            &format!("{service} failed to update. err: {err}"),
        ),
        other => set_put_condition(conditions, condition_type, service, other, false),
    }
}

/// Record the outcome of a delete step on `condition_type`.
///
/// | Outcome | Status | Reason |
/// |---------|--------|--------|
/// | success | False | `Deleted` |
/// | operation not done / transient | False | `Deleting` |
/// | terminal | False | `DeletionFailed` |
pub fn set_delete_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    service: &str,
    outcome: Option<&ReconcileError>,
) {
    match outcome {
        None => update_condition_in_memory(
            conditions,
            condition_type,
            "False",
            REASON_DELETED,
            &format!("{service} successfully deleted"),
        ),
        Some(err @ ReconcileError::Terminal { .. }) => update_condition_in_memory(
            conditions,
            condition_type,
            "False",
            REASON_DELETION_FAILED,
            &format!("{service} failed to delete. err: {err}"),
        ),
        Some(err) => update_condition_in_memory(
            conditions,
            condition_type,
            "False",
            pending_reason(FutureType::Delete, false),
            &err.to_string(),
        ),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;

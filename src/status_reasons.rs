// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition types and reasons for AKS resources.
//!
//! This module defines constants for condition types and reasons following
//! Kubernetes conventions. Reasons are programmatic identifiers in CamelCase
//! that explain why a condition has a particular status.
//!
//! # Condition Hierarchy
//!
//! - **`AzureManagedControlPlane`** → `ManagedClusterRunning` plus the encompassing `Ready`
//! - **`AzureManagedMachinePool`** → `AgentPoolsReady` plus the encompassing `Ready`
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: Creating
//!       message: "operation type PUT on Azure resource rg/c1 is not done. Object will be requeued after 15s"
//!     - type: ManagedClusterRunning
//!       status: "False"
//!       reason: Creating
//!       message: "operation type PUT on Azure resource rg/c1 is not done. Object will be requeued after 15s"
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// Encompassing condition for every resource.
pub const CONDITION_TYPE_READY: &str = "Ready";

/// The AKS managed cluster exists and its last PUT completed.
pub const CONDITION_TYPE_MANAGED_CLUSTER_RUNNING: &str = "ManagedClusterRunning";

/// The AKS agent pool exists and its last PUT completed.
pub const CONDITION_TYPE_AGENT_POOLS_READY: &str = "AgentPoolsReady";

// ============================================================================
// Operation Reasons
// ============================================================================

/// The cloud resource reached its desired state.
pub const REASON_SUCCEEDED: &str = "Succeeded";

/// A create (PUT without an observed resource) is in flight.
pub const REASON_CREATING: &str = "Creating";

/// An update (PUT or PATCH on an observed resource) is in flight or deferred.
pub const REASON_UPDATING: &str = "Updating";

/// A delete is in flight.
pub const REASON_DELETING: &str = "Deleting";

/// The resource was deleted from the cloud.
pub const REASON_DELETED: &str = "Deleted";

/// The operation failed with a terminal error; user action is required.
pub const REASON_FAILED: &str = "Failed";

/// The operation failed with an error that is expected to clear on its own.
pub const REASON_TRANSIENT_FAILURE: &str = "TransientFailure";

/// Deletion failed.
pub const REASON_DELETION_FAILED: &str = "DeletionFailed";

// ============================================================================
// Azure API Reasons
// ============================================================================

/// Azure rejected the request as malformed (400).
pub const REASON_AZURE_BAD_REQUEST: &str = "AzureBadRequest";

/// Credentials were rejected or lack permission (401/403).
pub const REASON_AZURE_AUTH_FAILED: &str = "AzureAuthorizationFailed";

/// The resource or one of its parents does not exist (404).
pub const REASON_AZURE_NOT_FOUND: &str = "AzureResourceNotFound";

/// A conflicting operation is already running on the resource (409).
pub const REASON_AZURE_CONFLICT: &str = "AzureConflict";

/// Azure is throttling requests (429).
pub const REASON_AZURE_THROTTLED: &str = "AzureThrottled";

/// Azure reported an internal error (5xx).
pub const REASON_AZURE_SERVER_ERROR: &str = "AzureServerError";

/// Azure returned an unexpected status.
pub const REASON_AZURE_UNEXPECTED: &str = "AzureUnexpectedError";

/// Returns the reason used while an operation of `kind` is pending.
///
/// `creating` distinguishes a first PUT from an update of an observed resource.
#[must_use]
pub fn pending_reason(kind: crate::lro::FutureType, creating: bool) -> &'static str {
    match kind {
        crate::lro::FutureType::Put if creating => REASON_CREATING,
        crate::lro::FutureType::Put => REASON_UPDATING,
        crate::lro::FutureType::Delete => REASON_DELETING,
    }
}

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;

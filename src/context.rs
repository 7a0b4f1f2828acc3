// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all controllers.
//!
//! Both controllers receive an `Arc<Context>` that contains:
//! - Kubernetes client
//! - The ARM connection and the Azure identity handed to each pass scope
//! - Call deadlines and requeue intervals

use kube::Client;
use std::time::Duration;

use crate::azure::arm::ArmConnection;
use crate::constants::{ERROR_REQUEUE, READY_REQUEUE};
use crate::scope::AzureIdentity;

/// Requeue intervals used by the outer controllers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requeue {
    /// Interval once a resource is ready.
    pub ready: Duration,
    /// Interval after an error the pass did not classify.
    pub error: Duration,
}

impl Default for Requeue {
    fn default() -> Self {
        Self {
            ready: READY_REQUEUE,
            error: ERROR_REQUEUE,
        }
    }
}

/// Shared context passed to all controllers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// ARM transport; services are built per pass from it
    pub arm: ArmConnection,

    /// Subscription and credential every scope carries
    pub identity: AzureIdentity,

    /// Deadline of each AKS create, update or delete call
    pub call_timeout: Duration,

    /// Requeue reported while an Azure operation is running
    pub operation_requeue: Duration,

    pub requeue: Requeue,
}

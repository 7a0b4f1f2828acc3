// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-pass reconciliation scopes.
//!
//! A scope is the single entry point for ambient data during one reconcile
//! pass: the declarative object, credentials, the long-running operation
//! store and the status writers. Every write is buffered in memory; the outer
//! reconciler flushes the scope to Kubernetes once the pass is over.
//!
//! - [`AzureIdentity`] - subscription and credential of a pass
//! - [`AzureScope`] - Azure access handed to the ARM clients
//! - [`FutureScope`] - store accessors and status writers used by the core
//! - [`SpecSource`] - enumerates the resource specs a service reconciles
//! - [`ManagedControlPlaneScope`] - scope of an `AzureManagedControlPlane` pass
//! - [`ManagedMachinePoolScope`] - scope of an `AzureManagedMachinePool` pass

pub mod managed_control_plane;
pub mod managed_machine_pool;

pub use managed_control_plane::ManagedControlPlaneScope;
pub use managed_machine_pool::{MachinePoolView, ManagedMachinePoolScope};

use std::fmt;
use std::sync::Arc;

use crate::azure::auth::TokenCredential;
use crate::crd::{Future, FutureType};
use crate::errors::ReconcileError;
use crate::spec::ResourceSpec;

/// Subscription and credential a pass talks to Azure with.
#[derive(Clone)]
pub struct AzureIdentity {
    subscription_id: String,
    credential: Arc<dyn TokenCredential>,
}

impl AzureIdentity {
    #[must_use]
    pub fn new(subscription_id: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            credential,
        }
    }

    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    #[must_use]
    pub fn credential(&self) -> Arc<dyn TokenCredential> {
        self.credential.clone()
    }
}

impl fmt::Debug for AzureIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureIdentity")
            .field("subscription_id", &self.subscription_id)
            .finish_non_exhaustive()
    }
}

/// Azure access carried by a scope. Services build their ARM clients from it.
pub trait AzureScope {
    fn identity(&self) -> &AzureIdentity;

    fn subscription_id(&self) -> &str {
        self.identity().subscription_id()
    }

    fn credential(&self) -> Arc<dyn TokenCredential> {
        self.identity().credential()
    }

    /// JSON merge patches applied to the parameters sent to Azure.
    fn patches(&self) -> &[String];
}

/// Long-running operation store plus status writers.
pub trait FutureScope: Send + Sync {
    /// Returns the stored operation for `(name, service, kind)`.
    fn get_long_running_operation_state(
        &self,
        name: &str,
        service: &str,
        kind: FutureType,
    ) -> Option<Future>;

    /// Stores `future`, replacing the record with the same key.
    fn set_long_running_operation_state(&mut self, future: Future);

    /// Removes the record for `(name, service, kind)`.
    fn delete_long_running_operation_state(&mut self, name: &str, service: &str, kind: FutureType);

    /// Records the outcome of a create-or-update on `condition_type`.
    fn update_put_status(
        &mut self,
        condition_type: &str,
        service: &str,
        outcome: Option<&ReconcileError>,
    );

    /// Records the outcome of an update-only step on `condition_type`.
    fn update_patch_status(
        &mut self,
        condition_type: &str,
        service: &str,
        outcome: Option<&ReconcileError>,
    );

    /// Records the outcome of a delete on `condition_type`.
    fn update_delete_status(
        &mut self,
        condition_type: &str,
        service: &str,
        outcome: Option<&ReconcileError>,
    );
}

/// A scope that can enumerate the specs of resource type `T`.
pub trait SpecSource<T>: FutureScope {
    /// Specs to reconcile this pass, in order.
    fn list_specs(&self) -> Vec<Box<dyn ResourceSpec<T>>>;
}

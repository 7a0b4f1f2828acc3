// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Scope of one `AzureManagedMachinePool` reconcile pass.

use std::collections::BTreeMap;

use super::{AzureIdentity, AzureScope, FutureScope, SpecSource};
use crate::azure::models::AgentPool;
use crate::crd::{AzureManagedMachinePool, AzureManagedMachinePoolStatus, Future, FutureType};
use crate::errors::ReconcileError;
use crate::labels::{REPLICAS_MANAGED_BY_ANNOTATION, REPLICAS_MANAGED_BY_AUTOSCALER};
use crate::lro;
use crate::reconcilers::status::{set_delete_condition, set_patch_condition, set_put_condition};
use crate::services::agentpools::AgentPoolSpec;
use crate::spec::{custom_headers_from_annotations, ResourceSpec};

/// The fields of a Cluster API `MachinePool` this provider reads and writes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MachinePoolView {
    pub name: String,
    pub namespace: String,
    pub replicas: Option<i32>,
    pub version: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

/// Buffered state of an `AzureManagedMachinePool` pass.
#[derive(Clone, Debug)]
pub struct ManagedMachinePoolScope {
    name: String,
    namespace: String,
    identity: AzureIdentity,
    spec: AgentPoolSpec,
    status: AzureManagedMachinePoolStatus,
    machine_pool: MachinePoolView,
    machine_pool_changed: bool,
}

impl ManagedMachinePoolScope {
    /// Builds the scope of `pool`, owned by `machine_pool`, in managed
    /// cluster `cluster` of `resource_group`.
    #[must_use]
    pub fn new(
        pool: &AzureManagedMachinePool,
        machine_pool: MachinePoolView,
        cluster: &str,
        resource_group: &str,
        identity: AzureIdentity,
    ) -> Self {
        let headers = pool
            .metadata
            .annotations
            .as_ref()
            .map(custom_headers_from_annotations)
            .unwrap_or_default();
        let spec = AgentPoolSpec::from_machine_pool(
            pool,
            machine_pool.replicas,
            machine_pool.version.clone(),
            cluster,
            resource_group,
        )
        .with_headers(headers);

        Self {
            name: pool.metadata.name.clone().unwrap_or_default(),
            namespace: pool.metadata.namespace.clone().unwrap_or_default(),
            identity,
            spec,
            status: pool.status.clone().unwrap_or_default(),
            machine_pool,
            machine_pool_changed: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn agent_pool_spec(&self) -> &AgentPoolSpec {
        &self.spec
    }

    #[must_use]
    pub fn status(&self) -> &AzureManagedMachinePoolStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut AzureManagedMachinePoolStatus {
        &mut self.status
    }

    #[must_use]
    pub fn machine_pool(&self) -> &MachinePoolView {
        &self.machine_pool
    }

    /// Returns `true` when the `MachinePool` needs to be patched.
    #[must_use]
    pub fn machine_pool_changed(&self) -> bool {
        self.machine_pool_changed
    }

    /// Sets or removes the `replicas-managed-by` annotation on the `MachinePool`.
    pub fn set_replicas_managed_by_autoscaler(&mut self, managed: bool) {
        let annotations = &mut self.machine_pool.annotations;
        let changed = if managed {
            annotations
                .insert(
                    REPLICAS_MANAGED_BY_ANNOTATION.to_string(),
                    REPLICAS_MANAGED_BY_AUTOSCALER.to_string(),
                )
                .as_deref()
                != Some(REPLICAS_MANAGED_BY_AUTOSCALER)
        } else {
            annotations.remove(REPLICAS_MANAGED_BY_ANNOTATION).is_some()
        };
        self.machine_pool_changed |= changed;
    }

    /// Overwrites the declared replica count of the `MachinePool`.
    pub fn set_machine_pool_replicas(&mut self, replicas: i32) {
        if self.machine_pool.replicas != Some(replicas) {
            self.machine_pool.replicas = Some(replicas);
            self.machine_pool_changed = true;
        }
    }

    /// Records what Azure reports for the agent pool.
    pub fn set_agent_pool_status(&mut self, replicas: Option<i32>, provisioning_state: Option<String>) {
        self.status.replicas = replicas.unwrap_or_default();
        self.status.provisioning_state = provisioning_state;
    }
}

impl AzureScope for ManagedMachinePoolScope {
    fn identity(&self) -> &AzureIdentity {
        &self.identity
    }

    fn patches(&self) -> &[String] {
        &self.spec.patches
    }
}

impl FutureScope for ManagedMachinePoolScope {
    fn get_long_running_operation_state(
        &self,
        name: &str,
        service: &str,
        kind: FutureType,
    ) -> Option<Future> {
        lro::get_long_running_operation_state(&self.status.long_running_operation_states, name, service, kind)
            .cloned()
    }

    fn set_long_running_operation_state(&mut self, future: Future) {
        lro::set_long_running_operation_state(&mut self.status.long_running_operation_states, future);
    }

    fn delete_long_running_operation_state(&mut self, name: &str, service: &str, kind: FutureType) {
        lro::delete_long_running_operation_state(
            &mut self.status.long_running_operation_states,
            name,
            service,
            kind,
        );
    }

    fn update_put_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
        let creating = !self.status.ready;
        set_put_condition(&mut self.status.conditions, condition_type, service, outcome, creating);
        if outcome.is_none() {
            self.status.ready = true;
        }
    }

    fn update_patch_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
        set_patch_condition(&mut self.status.conditions, condition_type, service, outcome);
    }

    fn update_delete_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
        set_delete_condition(&mut self.status.conditions, condition_type, service, outcome);
        if outcome.is_none() {
            self.status.ready = false;
        }
    }
}

impl SpecSource<AgentPool> for ManagedMachinePoolScope {
    fn list_specs(&self) -> Vec<Box<dyn ResourceSpec<AgentPool>>> {
        vec![Box::new(self.spec.clone())]
    }
}

#[cfg(test)]
#[path = "managed_machine_pool_tests.rs"]
mod managed_machine_pool_tests;

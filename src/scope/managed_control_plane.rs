// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Scope of one `AzureManagedControlPlane` reconcile pass.
//!
//! Besides the status, the scope buffers the API server endpoint and the
//! kubeconfigs Azure returned. The outer reconciler writes the endpoint into
//! `spec.controlPlaneEndpoint` and the kubeconfigs into Secrets.

use super::{AzureIdentity, AzureScope, FutureScope, SpecSource};
use crate::azure::models::ManagedCluster;
use crate::crd::{
    ApiEndpoint, AzureManagedControlPlane, AzureManagedControlPlaneStatus, Future, FutureType,
};
use crate::errors::ReconcileError;
use crate::lro;
use crate::reconcilers::status::{set_delete_condition, set_patch_condition, set_put_condition};
use crate::services::agentpools::AgentPoolSpec;
use crate::services::managedclusters::ManagedClusterSpec;
use crate::spec::{custom_headers_from_annotations, ResourceSpec};

/// Buffered state of an `AzureManagedControlPlane` pass.
#[derive(Clone, Debug)]
pub struct ManagedControlPlaneScope {
    name: String,
    namespace: String,
    identity: AzureIdentity,
    spec: ManagedClusterSpec,
    status: AzureManagedControlPlaneStatus,
    endpoint: Option<ApiEndpoint>,
    admin_kubeconfig: Option<Vec<u8>>,
    user_kubeconfig: Option<Vec<u8>>,
}

impl ManagedControlPlaneScope {
    /// Builds the scope of `control_plane`.
    ///
    /// `agent_pools` are the pools of the workload cluster; they are only
    /// sent to Azure when the managed cluster is first created.
    #[must_use]
    pub fn new(
        control_plane: &AzureManagedControlPlane,
        agent_pools: Vec<AgentPoolSpec>,
        identity: AzureIdentity,
    ) -> Self {
        let name = control_plane.metadata.name.clone().unwrap_or_default();
        let status = control_plane.status.clone().unwrap_or_default();
        let headers = control_plane
            .metadata
            .annotations
            .as_ref()
            .map(custom_headers_from_annotations)
            .unwrap_or_default();

        let spec = ManagedClusterSpec {
            name: name.clone(),
            resource_group: control_plane.spec.resource_group_name.clone(),
            control_plane: control_plane.spec.clone(),
            kubelet_identity: status.kubelet_identity.clone(),
            agent_pools,
            headers,
        };

        Self {
            name,
            namespace: control_plane.metadata.namespace.clone().unwrap_or_default(),
            identity,
            spec,
            endpoint: control_plane
                .spec
                .control_plane_endpoint
                .clone()
                .filter(|e| !e.is_zero()),
            status,
            admin_kubeconfig: None,
            user_kubeconfig: None,
        }
    }

    /// Name of the control plane object, also the managed cluster name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn resource_group(&self) -> &str {
        &self.spec.resource_group
    }

    #[must_use]
    pub fn managed_cluster_spec(&self) -> &ManagedClusterSpec {
        &self.spec
    }

    #[must_use]
    pub fn status(&self) -> &AzureManagedControlPlaneStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut AzureManagedControlPlaneStatus {
        &mut self.status
    }

    /// Returns `true` when local accounts, and with them the admin
    /// kubeconfig, are disabled.
    #[must_use]
    pub fn local_accounts_disabled(&self) -> bool {
        self.spec.control_plane.disable_local_accounts == Some(true)
    }

    /// Returns `true` when the cluster uses managed AAD.
    #[must_use]
    pub fn aad_managed(&self) -> bool {
        self.spec
            .control_plane
            .aad_profile
            .as_ref()
            .is_some_and(|aad| aad.managed)
    }

    #[must_use]
    pub fn control_plane_endpoint(&self) -> Option<&ApiEndpoint> {
        self.endpoint.as_ref()
    }

    pub fn set_control_plane_endpoint(&mut self, endpoint: ApiEndpoint) {
        self.endpoint = Some(endpoint);
    }

    #[must_use]
    pub fn admin_kubeconfig(&self) -> Option<&[u8]> {
        self.admin_kubeconfig.as_deref()
    }

    pub fn set_admin_kubeconfig(&mut self, kubeconfig: Vec<u8>) {
        self.admin_kubeconfig = Some(kubeconfig);
    }

    #[must_use]
    pub fn user_kubeconfig(&self) -> Option<&[u8]> {
        self.user_kubeconfig.as_deref()
    }

    pub fn set_user_kubeconfig(&mut self, kubeconfig: Vec<u8>) {
        self.user_kubeconfig = Some(kubeconfig);
    }

    /// Records the kubelet identity; later passes send it back to Azure.
    pub fn set_kubelet_identity(&mut self, identity: Option<String>) {
        self.spec.kubelet_identity.clone_from(&identity);
        self.status.kubelet_identity = identity;
    }

    pub fn set_oidc_issuer_url(&mut self, url: Option<String>) {
        self.status.oidc_issuer_url = url;
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.status.version = version;
    }

    pub fn set_auto_upgrade_version(&mut self, version: Option<String>) {
        self.status.auto_upgrade_version = version;
    }
}

impl AzureScope for ManagedControlPlaneScope {
    fn identity(&self) -> &AzureIdentity {
        &self.identity
    }

    fn patches(&self) -> &[String] {
        self.spec.control_plane.patches.as_deref().unwrap_or_default()
    }
}

impl FutureScope for ManagedControlPlaneScope {
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
        let creating = !self.status.initialized;
        set_put_condition(&mut self.status.conditions, condition_type, service, outcome, creating);
        if outcome.is_none() {
            self.status.ready = true;
            self.status.initialized = true;
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

impl SpecSource<ManagedCluster> for ManagedControlPlaneScope {
    fn list_specs(&self) -> Vec<Box<dyn ResourceSpec<ManagedCluster>>> {
        vec![Box::new(self.spec.clone())]
    }
}

#[cfg(test)]
#[path = "managed_control_plane_tests.rs"]
mod managed_control_plane_tests;

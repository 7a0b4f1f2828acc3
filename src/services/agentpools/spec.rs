// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired state of one AKS agent pool.

use std::collections::BTreeMap;

use crate::azure::models::{AgentPool, AgentPoolProperties, ManagedClusterAgentPoolProfile};
use crate::constants::{AKS_RESERVED_NODE_LABEL_PREFIX, AKS_RESERVED_TAG_PREFIX};
use crate::crd::AzureManagedMachinePool;
use crate::errors::ReconcileError;
use crate::spec::{apply_patches, is_terminal_state, merge_reserved, non_terminal_error, ResourceSpec};

/// Scale set type of every agent pool created by this provider.
const AGENT_POOL_TYPE: &str = "VirtualMachineScaleSets";

/// Parameters of one agent pool, built from an `AzureManagedMachinePool` and
/// its owning `MachinePool`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentPoolSpec {
    pub name: String,
    pub resource_group: String,
    pub cluster: String,
    pub version: Option<String>,
    pub sku: String,
    pub replicas: i32,
    pub mode: String,
    pub os_disk_size_gb: Option<i32>,
    pub os_disk_type: Option<String>,
    pub os_type: Option<String>,
    pub availability_zones: Option<Vec<String>>,
    pub node_labels: Option<BTreeMap<String, String>>,
    pub node_taints: Option<Vec<String>>,
    pub enable_auto_scaling: bool,
    pub min_count: Option<i32>,
    pub max_count: Option<i32>,
    pub max_pods: Option<i32>,
    pub vnet_subnet_id: Option<String>,
    pub enable_node_public_ip: Option<bool>,
    pub scale_set_priority: Option<String>,
    pub spot_max_price: Option<String>,
    pub kubelet_disk_type: Option<String>,
    pub additional_tags: Option<BTreeMap<String, String>>,
    pub patches: Vec<String>,
    pub headers: BTreeMap<String, String>,
}

impl AgentPoolSpec {
    /// Builds the spec of `pool` inside managed cluster `cluster`.
    ///
    /// `replicas` and `version` come from the owning `MachinePool`.
    #[must_use]
    pub fn from_machine_pool(
        pool: &AzureManagedMachinePool,
        replicas: Option<i32>,
        version: Option<String>,
        cluster: &str,
        resource_group: &str,
    ) -> Self {
        let spec = &pool.spec;
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| pool.metadata.name.clone().unwrap_or_default());
        let taints = spec
            .taints
            .as_ref()
            .map(|taints| taints.iter().map(|t| t.to_aks_string()).collect());

        Self {
            name,
            resource_group: resource_group.to_string(),
            cluster: cluster.to_string(),
            version,
            sku: spec.sku.clone(),
            replicas: replicas.unwrap_or(1),
            mode: spec.mode.as_str().to_string(),
            os_disk_size_gb: spec.os_disk_size_gb,
            os_disk_type: spec.os_disk_type.clone(),
            os_type: spec.os_type.clone(),
            availability_zones: spec.availability_zones.clone(),
            node_labels: spec.node_labels.clone(),
            node_taints: taints,
            enable_auto_scaling: spec.scaling.is_some(),
            min_count: spec.scaling.as_ref().map(|s| s.min_size),
            max_count: spec.scaling.as_ref().map(|s| s.max_size),
            max_pods: spec.max_pods,
            vnet_subnet_id: spec.vnet_subnet_id.clone(),
            enable_node_public_ip: spec.enable_node_public_ip,
            scale_set_priority: spec.scale_set_priority.clone(),
            spot_max_price: spec.spot_max_price.clone(),
            kubelet_disk_type: spec.kubelet_disk_type.clone(),
            additional_tags: spec.additional_tags.clone(),
            patches: spec.patches.clone().unwrap_or_default(),
            headers: BTreeMap::new(),
        }
    }

    /// Sets the custom request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    fn desired(&self) -> Result<AgentPool, ReconcileError> {
        let spot_max_price = self
            .spot_max_price
            .as_deref()
            .map(|price| {
                price.parse::<f64>().map_err(|e| {
                    ReconcileError::terminal(format!("invalid spotMaxPrice {price:?}: {e}"))
                })
            })
            .transpose()?;

        let pool = AgentPool {
            id: None,
            name: Some(self.name.clone()),
            properties: AgentPoolProperties {
                count: Some(self.replicas),
                vm_size: Some(self.sku.clone()),
                os_disk_size_gb: self.os_disk_size_gb,
                os_disk_type: self.os_disk_type.clone(),
                os_type: self.os_type.clone(),
                pool_type: Some(AGENT_POOL_TYPE.to_string()),
                mode: Some(self.mode.clone()),
                orchestrator_version: self
                    .version
                    .as_deref()
                    .map(|v| v.trim_start_matches('v').to_string()),
                availability_zones: self.availability_zones.clone(),
                node_labels: self.node_labels.clone(),
                node_taints: self.node_taints.clone(),
                enable_auto_scaling: Some(self.enable_auto_scaling),
                min_count: self.min_count,
                max_count: self.max_count,
                max_pods: self.max_pods,
                vnet_subnet_id: self.vnet_subnet_id.clone(),
                enable_node_public_ip: self.enable_node_public_ip,
                scale_set_priority: self.scale_set_priority.clone(),
                spot_max_price,
                kubelet_disk_type: self.kubelet_disk_type.clone(),
                tags: self.additional_tags.clone(),
                ..AgentPoolProperties::default()
            },
        };
        apply_patches(pool, &self.patches)
    }

    /// Profile embedded in a managed cluster create request.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceSpec::parameters`] with no existing pool.
    pub fn profile(&self) -> Result<ManagedClusterAgentPoolProfile, ReconcileError> {
        let pool = self.desired()?;
        Ok(ManagedClusterAgentPoolProfile {
            name: self.name.clone(),
            properties: pool.properties,
        })
    }
}

/// Fields of an agent pool that can change after creation.
#[derive(Debug, PartialEq)]
struct Updatable<'a> {
    count: Option<i32>,
    orchestrator_version: Option<&'a str>,
    mode: Option<&'a str>,
    enable_auto_scaling: bool,
    min_count: Option<i32>,
    max_count: Option<i32>,
    node_labels: Option<&'a BTreeMap<String, String>>,
    node_taints: Option<&'a [String]>,
    tags: Option<&'a BTreeMap<String, String>>,
}

impl<'a> Updatable<'a> {
    fn of(props: &'a AgentPoolProperties) -> Self {
        Self {
            count: props.count,
            orchestrator_version: props.orchestrator_version.as_deref(),
            mode: props.mode.as_deref(),
            enable_auto_scaling: props.autoscaling_enabled(),
            min_count: props.min_count,
            max_count: props.max_count,
            node_labels: props.node_labels.as_ref().filter(|m| !m.is_empty()),
            node_taints: props.node_taints.as_deref().filter(|t| !t.is_empty()),
            tags: props.tags.as_ref().filter(|m| !m.is_empty()),
        }
    }
}

impl ResourceSpec<AgentPool> for AgentPoolSpec {
    fn resource_name(&self) -> String {
        self.name.clone()
    }

    fn resource_group_name(&self) -> String {
        self.resource_group.clone()
    }

    fn owner_resource_name(&self) -> String {
        self.cluster.clone()
    }

    fn custom_headers(&self) -> BTreeMap<String, String> {
        self.headers.clone()
    }

    fn parameters(&self, existing: Option<&AgentPool>) -> Result<Option<AgentPool>, ReconcileError> {
        let mut desired = self.desired()?;
        let Some(observed) = existing else {
            return Ok(Some(desired));
        };
        let observed = &observed.properties;

        if !is_terminal_state(observed.provisioning_state.as_deref()) {
            return Err(non_terminal_error(
                "agent pool",
                observed.provisioning_state.as_deref().unwrap_or_default(),
            ));
        }

        let props = &mut desired.properties;
        if props.autoscaling_enabled() {
            props.count = observed.count;
        }
        if props.orchestrator_version.is_none() {
            props.orchestrator_version = observed.orchestrator_version.clone();
        }
        merge_reserved(
            observed.node_labels.as_ref(),
            &mut props.node_labels,
            AKS_RESERVED_NODE_LABEL_PREFIX,
        );
        merge_reserved(observed.tags.as_ref(), &mut props.tags, AKS_RESERVED_TAG_PREFIX);

        if Updatable::of(props) == Updatable::of(observed) {
            return Ok(None);
        }
        Ok(Some(desired))
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod spec_tests;

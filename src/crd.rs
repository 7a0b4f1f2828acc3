// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for AKS management.
//!
//! This module defines the Kubernetes Custom Resource Definitions through which
//! Cluster API asks this provider for a managed AKS cluster.
//!
//! # Resource Types
//!
//! - [`AzureManagedControlPlane`] - The AKS managed cluster (control plane plus
//!   the agent pools embedded at creation time)
//! - [`AzureManagedMachinePool`] - One AKS agent pool, reconciled independently
//!   once the managed cluster exists
//!
//! Both carry their in-flight Azure operations in
//! `status.longRunningOperationStates`, so a restarted controller resumes
//! polling instead of issuing the request again.
//!
//! # Example: Declaring a control plane
//!
//! ```rust,no_run
//! use capz_aks::crd::{AzureManagedControlPlaneSpec, AutoUpgradeProfile, UpgradeChannel};
//!
//! let spec = AzureManagedControlPlaneSpec {
//!     version: "v1.28.5".to_string(),
//!     resource_group_name: "rg".to_string(),
//!     location: "eastus".to_string(),
//!     auto_upgrade_profile: Some(AutoUpgradeProfile {
//!         upgrade_channel: Some(UpgradeChannel::Stable),
//!     }),
//!     ..Default::default()
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. Common types include: Ready, ManagedClusterRunning, AgentPoolsReady.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

// ============================================================================
// Long-running operation state
// ============================================================================

/// Kind of a long-running Azure operation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum FutureType {
    /// Create or update.
    #[serde(rename = "PUT")]
    Put,
    /// Delete.
    #[serde(rename = "DELETE")]
    Delete,
}

impl FutureType {
    /// Wire name of the operation, as used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for FutureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted handle to an in-flight Azure operation.
///
/// At most one entry exists per `(name, serviceName, type)`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Future {
    /// Kind of the operation.
    pub r#type: FutureType,

    /// Service that started the operation (e.g. `managedclusters`).
    pub service_name: String,

    /// Name of the Azure resource.
    pub name: String,

    /// Resource group of the Azure resource.
    pub resource_group: String,

    /// Base64-encoded resume token of the poller.
    pub data: String,
}

/// Network endpoint of the Kubernetes API server.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// Hostname of the API server.
    pub host: String,

    /// Port of the API server.
    pub port: i32,
}

impl ApiEndpoint {
    /// Returns `true` when no host has been recorded yet.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.host.is_empty()
    }
}

// ============================================================================
// AzureManagedControlPlane
// ============================================================================

/// AKS pricing tier.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AksSku {
    /// Tier of the managed cluster SKU: `Free`, `Standard` or `Premium`.
    pub tier: String,
}

/// Managed identity assigned to the control plane.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedControlPlaneIdentity {
    /// `SystemAssigned` or `UserAssigned`.
    #[serde(rename = "type")]
    pub identity_type: String,

    /// ARM ID of the user-assigned identity. Required when the type is `UserAssigned`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_assigned_identity_resource_id: Option<String>,
}

/// Azure Active Directory integration.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AadProfile {
    /// Enable the AKS-managed AAD integration.
    pub managed: bool,

    /// Enable Azure RBAC for Kubernetes authorization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_azure_rbac: Option<bool>,

    /// Object IDs of the AAD groups granted cluster-admin.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admin_group_object_ids: Vec<String>,
}

/// An AKS add-on.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddonProfile {
    /// Name of the add-on (e.g. `azurepolicy`).
    pub name: String,

    /// Whether the add-on is enabled.
    pub enabled: bool,

    /// Key-value configuration of the add-on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<BTreeMap<String, String>>,
}

/// Access profile of the managed cluster API server.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiServerAccessProfile {
    /// CIDRs allowed to reach the API server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_ip_ranges: Option<Vec<String>>,

    /// Create the cluster as a private cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_private_cluster: Option<bool>,

    /// Private DNS zone mode or ARM ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_dns_zone: Option<String>,

    /// Also publish a public FQDN for a private cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_private_cluster_public_fqdn: Option<bool>,
}

/// Parameters of the AKS cluster autoscaler.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalerProfile {
    /// Balance node groups with the same instance type and labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_similar_node_groups: Option<String>,

    /// Expander strategy: `least-waste`, `most-pods`, `priority` or `random`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expander: Option<String>,

    /// Maximum empty nodes deleted at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_empty_bulk_delete: Option<String>,

    /// Maximum node provisioning time before giving up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_node_provision_time: Option<String>,

    /// Autoscaler scan interval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_interval: Option<String>,

    /// Delay after scale-up before scale-down evaluation resumes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_down_delay_after_add: Option<String>,

    /// How long a node must be unneeded before it is removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_down_unneeded_time: Option<String>,

    /// Utilization below which a node may be removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_down_utilization_threshold: Option<String>,

    /// Never remove nodes running pods with local storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_nodes_with_local_storage: Option<String>,

    /// Never remove nodes running kube-system pods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_nodes_with_system_pods: Option<String>,
}

/// Auto-upgrade channel of the managed cluster.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum UpgradeChannel {
    /// Automatic upgrades are disabled.
    #[serde(rename = "none")]
    None,
    /// Upgrade to the latest patch of the current minor version.
    #[serde(rename = "patch")]
    Patch,
    /// Upgrade to the latest patch of minor version N-1.
    #[serde(rename = "stable")]
    Stable,
    /// Upgrade to the latest supported patch of the latest minor version.
    #[serde(rename = "rapid")]
    Rapid,
    /// Upgrade node images only.
    #[serde(rename = "node-image")]
    NodeImage,
}

impl UpgradeChannel {
    /// Wire name of the channel.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Patch => "patch",
            Self::Stable => "stable",
            Self::Rapid => "rapid",
            Self::NodeImage => "node-image",
        }
    }

    /// Returns `true` when AKS may advance the Kubernetes version on its own.
    #[must_use]
    pub fn advances_kubernetes_version(self) -> bool {
        matches!(self, Self::Patch | Self::Stable | Self::Rapid)
    }
}

/// Auto-upgrade configuration of the managed cluster.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AutoUpgradeProfile {
    /// Channel the cluster follows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_channel: Option<UpgradeChannel>,
}

/// Outbound HTTP proxy for cluster nodes.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HttpProxyConfig {
    /// HTTP proxy endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,

    /// HTTPS proxy endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,

    /// Destinations that bypass the proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<Vec<String>>,

    /// Additional CA certificate (base64 PEM) trusted for the proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trusted_ca: Option<String>,
}

/// Outbound load balancer configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerProfile {
    /// Number of AKS-managed outbound public IPs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_outbound_ips: Option<i32>,

    /// ARM IDs of user-provided outbound public IP prefixes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_ip_prefixes: Option<Vec<String>>,

    /// ARM IDs of user-provided outbound public IPs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_ips: Option<Vec<String>>,

    /// SNAT ports allocated per VM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated_outbound_ports: Option<i32>,

    /// Outbound flow idle timeout in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<i32>,
}

/// OIDC issuer configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OidcIssuerProfile {
    /// Enable the OIDC issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Security features of the managed cluster.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSecurityProfile {
    /// Enable workload identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_identity: Option<bool>,

    /// Enable the image cleaner with the given scan interval in hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_cleaner_interval_hours: Option<i32>,
}

/// `AzureManagedControlPlane` declares an AKS managed cluster.
///
/// # Example
///
/// ```yaml
/// apiVersion: infrastructure.cluster.x-k8s.io/v1beta1
/// kind: AzureManagedControlPlane
/// metadata:
///   name: c1
///   namespace: default
///   labels:
///     cluster.x-k8s.io/cluster-name: c1
/// spec:
///   version: v1.28.5
///   resourceGroupName: rg
///   location: eastus
///   serviceCidr: 10.0.0.0/16
///   autoUpgradeProfile:
///     upgradeChannel: stable
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureManagedControlPlane",
    namespaced,
    shortname = "amcp",
    doc = "AzureManagedControlPlane declares an AKS managed cluster. Its first create embeds the agent pools of every AzureManagedMachinePool of the cluster; afterwards each pool is reconciled on its own."
)]
#[kube(status = "AzureManagedControlPlaneStatus")]
#[serde(rename_all = "camelCase")]
pub struct AzureManagedControlPlaneSpec {
    /// Desired Kubernetes version (e.g. `v1.28.5`).
    pub version: String,

    /// Resource group holding the managed cluster.
    pub resource_group_name: String,

    /// Resource group AKS creates for the node resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_resource_group_name: Option<String>,

    /// Subscription of the managed cluster. Defaults to the controller subscription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    /// Azure region.
    pub location: String,

    /// Base64-encoded SSH public key installed on Linux nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,

    /// DNS prefix of the API server FQDN. Defaults to the cluster name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_prefix: Option<String>,

    /// IP of the cluster DNS service. Derived from `serviceCidr` when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_service_ip: Option<String>,

    /// Service CIDR of the cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_cidr: Option<String>,

    /// Pod CIDR of the cluster (overlay and kubenet only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<String>,

    /// Network plugin: `azure`, `kubenet` or `none`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_plugin: Option<String>,

    /// Network plugin mode (`overlay`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_plugin_mode: Option<String>,

    /// Network policy: `azure`, `calico` or `cilium`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_policy: Option<String>,

    /// Network dataplane: `azure` or `cilium`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_dataplane: Option<String>,

    /// Outbound routing method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_type: Option<String>,

    /// Load balancer SKU: `standard` or `basic`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_sku: Option<String>,

    /// Pricing tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<AksSku>,

    /// Control plane identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<ManagedControlPlaneIdentity>,

    /// ARM ID of the user-assigned kubelet identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubelet_user_assigned_identity: Option<String>,

    /// AAD integration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aad_profile: Option<AadProfile>,

    /// Add-ons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_profiles: Option<Vec<AddonProfile>>,

    /// API server access profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_server_access_profile: Option<ApiServerAccessProfile>,

    /// Cluster autoscaler parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scaler_profile: Option<AutoScalerProfile>,

    /// Auto-upgrade configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_upgrade_profile: Option<AutoUpgradeProfile>,

    /// Outbound HTTP proxy configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy_config: Option<HttpProxyConfig>,

    /// Outbound load balancer configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_profile: Option<LoadBalancerProfile>,

    /// OIDC issuer configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc_issuer_profile: Option<OidcIssuerProfile>,

    /// Security features.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_profile: Option<ManagedClusterSecurityProfile>,

    /// Disable local accounts; requires managed AAD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_local_accounts: Option<bool>,

    /// Extra tags on the managed cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_tags: Option<BTreeMap<String, String>>,

    /// JSON merge patches applied to the managed cluster parameters before they are sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patches: Option<Vec<String>>,

    /// API server endpoint, written by the controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<ApiEndpoint>,
}

/// `AzureManagedControlPlane` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureManagedControlPlaneStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// The managed cluster exists and its last operation succeeded.
    #[serde(default)]
    pub ready: bool,

    /// The API server is reachable (kubeconfig written).
    #[serde(default)]
    pub initialized: bool,

    /// In-flight Azure operations. Always serialized so a merge patch clears it.
    #[serde(default)]
    pub long_running_operation_states: Vec<Future>,

    // The fields below serialize as `null` when unset so a status merge
    // patch removes them.
    /// Kubernetes version currently running, as reported by AKS.
    #[serde(default)]
    pub version: Option<String>,

    /// Version AKS upgraded to on its own through the auto-upgrade channel.
    #[serde(default)]
    pub auto_upgrade_version: Option<String>,

    /// OIDC issuer URL of the cluster.
    #[serde(default)]
    pub oidc_issuer_url: Option<String>,

    /// ARM ID of the kubelet identity, as assigned by AKS.
    #[serde(default)]
    pub kubelet_identity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// ============================================================================
// AzureManagedMachinePool
// ============================================================================

/// Role of an agent pool.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
pub enum AgentPoolMode {
    /// Hosts critical system pods; every cluster needs at least one.
    System,
    /// Hosts application pods.
    #[default]
    User,
}

impl AgentPoolMode {
    /// Wire name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
        }
    }
}

/// Node taint applied to every node of the pool.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Taint {
    /// `NoSchedule`, `PreferNoSchedule` or `NoExecute`.
    pub effect: String,

    /// Taint key.
    pub key: String,

    /// Taint value.
    pub value: String,
}

impl Taint {
    /// AKS wire format: `key=value:Effect`.
    #[must_use]
    pub fn to_aks_string(&self) -> String {
        format!("{}={}:{}", self.key, self.value, self.effect)
    }
}

/// Autoscaler bounds of the pool.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedMachinePoolScaling {
    /// Minimum node count.
    pub min_size: i32,

    /// Maximum node count.
    pub max_size: i32,
}

/// `AzureManagedMachinePool` declares one AKS agent pool.
///
/// # Example
///
/// ```yaml
/// apiVersion: infrastructure.cluster.x-k8s.io/v1beta1
/// kind: AzureManagedMachinePool
/// metadata:
///   name: pool-a
///   namespace: default
///   labels:
///     cluster.x-k8s.io/cluster-name: c1
/// spec:
///   mode: System
///   sku: Standard_D2s_v3
///   scaling:
///     minSize: 1
///     maxSize: 5
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureManagedMachinePool",
    namespaced,
    shortname = "ammp",
    doc = "AzureManagedMachinePool declares one AKS agent pool. Replicas come from the owning Cluster API MachinePool unless the AKS autoscaler manages them."
)]
#[kube(status = "AzureManagedMachinePoolStatus")]
#[serde(rename_all = "camelCase")]
pub struct AzureManagedMachinePoolSpec {
    /// Name of the agent pool in AKS. Defaults to the object name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role of the pool.
    #[serde(default)]
    pub mode: AgentPoolMode,

    /// VM size of the nodes.
    pub sku: String,

    /// OS disk size in GB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_disk_size_gb: Option<i32>,

    /// OS disk type: `Managed` or `Ephemeral`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_disk_type: Option<String>,

    /// OS type: `Linux` or `Windows`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,

    /// Availability zones of the nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zones: Option<Vec<String>>,

    /// Kubernetes labels applied to every node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_labels: Option<BTreeMap<String, String>>,

    /// Taints applied to every node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taints: Option<Vec<Taint>>,

    /// Enables the AKS autoscaler with these bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ManagedMachinePoolScaling>,

    /// Maximum pods per node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<i32>,

    /// ARM ID of the subnet the nodes join.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnet_subnet_id: Option<String>,

    /// Assign a public IP to every node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_node_public_ip: Option<bool>,

    /// `Regular` or `Spot`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_set_priority: Option<String>,

    /// Maximum spot price; `-1` means the on-demand price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_max_price: Option<String>,

    /// `OS` or `Temporary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubelet_disk_type: Option<String>,

    /// Extra tags on the agent pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_tags: Option<BTreeMap<String, String>>,

    /// JSON merge patches applied to the agent pool parameters before they are sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patches: Option<Vec<String>>,
}

/// `AzureManagedMachinePool` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureManagedMachinePoolStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// The agent pool exists and its last operation succeeded.
    #[serde(default)]
    pub ready: bool,

    /// Node count reported by AKS.
    #[serde(default)]
    pub replicas: i32,

    /// Provisioning state reported by AKS. Serialized as `null` when unset.
    #[serde(default)]
    pub provisioning_state: Option<String>,

    /// In-flight Azure operations. Always serialized so a merge patch clears it.
    #[serde(default)]
    pub long_running_operation_states: Vec<Future>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure Resource Manager models for `Microsoft.ContainerService`.
//!
//! Only the fields this provider sets, diffs or reads back are modelled.
//! Unknown response fields are ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `Microsoft.ContainerService/managedClusters`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedCluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub location: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<ManagedClusterSku>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<ManagedClusterIdentity>,

    #[serde(default)]
    pub properties: ManagedClusterProperties,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSku {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterIdentity {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub identity_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_assigned_identities: Option<BTreeMap<String, UserAssignedIdentity>>,
}

/// A user-assigned identity reference. Requests send it as `{}` keyed by ARM ID.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignedIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_kubernetes_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,

    #[serde(rename = "privateFQDN", skip_serializing_if = "Option::is_none")]
    pub private_fqdn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_resource_group: Option<String>,

    #[serde(rename = "enableRBAC", skip_serializing_if = "Option::is_none")]
    pub enable_rbac: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_local_accounts: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_pool_profiles: Option<Vec<ManagedClusterAgentPoolProfile>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub linux_profile: Option<LinuxProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,

    #[serde(rename = "aadProfile", skip_serializing_if = "Option::is_none")]
    pub aad_profile: Option<ManagedClusterAadProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_profiles: Option<BTreeMap<String, ManagedClusterAddonProfile>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_server_access_profile: Option<ManagedClusterApiServerAccessProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scaler_profile: Option<ManagedClusterAutoScalerProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_upgrade_profile: Option<ManagedClusterAutoUpgradeProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy_config: Option<ManagedClusterHttpProxyConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_profile: Option<BTreeMap<String, UserAssignedIdentity>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc_issuer_profile: Option<ManagedClusterOidcIssuerProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_profile: Option<ManagedClusterSecurityProfile>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinuxProfile {
    pub admin_username: String,
    pub ssh: SshConfiguration,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SshConfiguration {
    pub public_keys: Vec<SshPublicKey>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SshPublicKey {
    pub key_data: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_plugin: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_plugin_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_policy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_dataplane: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_cidr: Option<String>,

    #[serde(rename = "dnsServiceIP", skip_serializing_if = "Option::is_none")]
    pub dns_service_ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_sku: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_profile: Option<ManagedClusterLoadBalancerProfile>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterLoadBalancerProfile {
    #[serde(rename = "managedOutboundIPs", skip_serializing_if = "Option::is_none")]
    pub managed_outbound_ips: Option<ManagedOutboundIps>,

    #[serde(rename = "outboundIPPrefixes", skip_serializing_if = "Option::is_none")]
    pub outbound_ip_prefixes: Option<OutboundIpPrefixes>,

    #[serde(rename = "outboundIPs", skip_serializing_if = "Option::is_none")]
    pub outbound_ips: Option<OutboundIps>,

    #[serde(rename = "effectiveOutboundIPs", skip_serializing_if = "Option::is_none")]
    pub effective_outbound_ips: Option<Vec<ResourceReference>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated_outbound_ports: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<i32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagedOutboundIps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundIpPrefixes {
    #[serde(rename = "publicIPPrefixes", default)]
    pub public_ip_prefixes: Vec<ResourceReference>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundIps {
    #[serde(rename = "publicIPs", default)]
    pub public_ips: Vec<ResourceReference>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceReference {
    pub id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAadProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed: Option<bool>,

    #[serde(rename = "enableAzureRBAC", skip_serializing_if = "Option::is_none")]
    pub enable_azure_rbac: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_group_object_ids: Option<Vec<String>>,

    #[serde(rename = "tenantID", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagedClusterAddonProfile {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterApiServerAccessProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_ip_ranges: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_private_cluster: Option<bool>,

    #[serde(rename = "privateDNSZone", skip_serializing_if = "Option::is_none")]
    pub private_dns_zone: Option<String>,

    #[serde(rename = "enablePrivateClusterPublicFQDN", skip_serializing_if = "Option::is_none")]
    pub enable_private_cluster_public_fqdn: Option<bool>,
}

/// Cluster autoscaler settings. ARM uses kebab-case keys here.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ManagedClusterAutoScalerProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_similar_node_groups: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expander: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_empty_bulk_delete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_node_provision_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_down_delay_after_add: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_down_unneeded_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_down_utilization_threshold: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_nodes_with_local_storage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_nodes_with_system_pods: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAutoUpgradeProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_channel: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterHttpProxyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trusted_ca: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterOidcIssuerProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(rename = "issuerURL", skip_serializing_if = "Option::is_none")]
    pub issuer_url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSecurityProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_identity: Option<EnabledFlag>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_cleaner: Option<ImageCleaner>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnabledFlag {
    pub enabled: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageCleaner {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<i32>,
}

/// Agent pool embedded in a managed cluster body.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ManagedClusterAgentPoolProfile {
    pub name: String,

    #[serde(flatten)]
    pub properties: AgentPoolProperties,
}

/// `Microsoft.ContainerService/managedClusters/agentPools`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentPool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub properties: AgentPoolProperties,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentPoolProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_size: Option<String>,

    #[serde(rename = "osDiskSizeGB", skip_serializing_if = "Option::is_none")]
    pub os_disk_size_gb: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_disk_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub pool_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub orchestrator_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_orchestrator_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_image_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zones: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_labels: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_taints: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_auto_scaling: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_count: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_count: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<i32>,

    #[serde(rename = "vnetSubnetID", skip_serializing_if = "Option::is_none")]
    pub vnet_subnet_id: Option<String>,

    #[serde(rename = "enableNodePublicIP", skip_serializing_if = "Option::is_none")]
    pub enable_node_public_ip: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_set_priority: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_max_price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubelet_disk_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

impl AgentPoolProperties {
    /// Returns `true` when the AKS autoscaler owns the node count.
    #[must_use]
    pub fn autoscaling_enabled(&self) -> bool {
        self.enable_auto_scaling.unwrap_or(false)
    }
}

/// Result of `listClusterAdminCredential` / `listClusterUserCredential`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialResults {
    #[serde(default)]
    pub kubeconfigs: Vec<CredentialResult>,
}

/// One kubeconfig; `value` is base64-encoded.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialResult {
    pub name: String,
    pub value: String,
}

/// Status resource returned by an `Azure-AsyncOperation` URL.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationStatus {
    #[serde(default)]
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

/// ARM error envelope: `{"error": {"code": ..., "message": ...}}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub message: String,
}

/// Minimal view of any ARM resource, used for body polling.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProvisioningView {
    #[serde(default)]
    pub properties: ProvisioningStateOnly,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProvisioningStateOnly {
    pub provisioning_state: Option<String>,
}

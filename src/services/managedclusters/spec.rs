// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired state of an AKS managed cluster.
//!
//! The managed cluster API treats agent pools as embedded children on create
//! and as independent siblings afterwards. A create therefore carries every
//! pool profile of the cluster; an update sends the observed profiles back
//! untouched so the agent pool service stays the only writer of pools.
//!
//! Only fields this provider manages take part in the diff. A field left
//! unset in the declaration ignores whatever Azure defaulted it to, with two
//! exceptions: authorized IP ranges are cleared explicitly when the
//! declaration drops them, and the Kubernetes version follows the cluster
//! when an auto-upgrade channel moved it ahead.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::azure::models::{
    EnabledFlag, ImageCleaner, LinuxProfile, ManagedCluster, ManagedClusterAadProfile,
    ManagedClusterAddonProfile, ManagedClusterApiServerAccessProfile,
    ManagedClusterAutoScalerProfile, ManagedClusterAutoUpgradeProfile,
    ManagedClusterHttpProxyConfig, ManagedClusterIdentity, ManagedClusterLoadBalancerProfile,
    ManagedClusterOidcIssuerProfile, ManagedClusterProperties, ManagedClusterSecurityProfile,
    ManagedClusterSku, ManagedOutboundIps, NetworkProfile, OutboundIpPrefixes, OutboundIps,
    ResourceReference, SshConfiguration, SshPublicKey, UserAssignedIdentity,
};
use crate::constants::{AKS_RESERVED_TAG_PREFIX, DNS_SERVICE_IP_LAST_OCTET, KUBELET_IDENTITY_KEY};
use crate::crd::{AzureManagedControlPlaneSpec, LoadBalancerProfile, UpgradeChannel};
use crate::errors::ReconcileError;
use crate::services::agentpools::AgentPoolSpec;
use crate::spec::{apply_patches, is_terminal_state, merge_reserved, non_terminal_error, ResourceSpec};

const SYSTEM_ASSIGNED: &str = "SystemAssigned";
const USER_ASSIGNED: &str = "UserAssigned";
const ADMIN_USERNAME: &str = "azureuser";
const SKU_NAME: &str = "Base";

/// Parameters of one managed cluster.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManagedClusterSpec {
    /// Name of the managed cluster in Azure.
    pub name: String,
    pub resource_group: String,
    pub control_plane: AzureManagedControlPlaneSpec,
    /// Kubelet identity Azure reported on an earlier pass.
    pub kubelet_identity: Option<String>,
    /// Pools embedded in the first create.
    pub agent_pools: Vec<AgentPoolSpec>,
    pub headers: BTreeMap<String, String>,
}

/// Parses `v1.26.6`, `1.26.6` or `1.26` into a comparable tuple.
#[must_use]
pub fn parse_kubernetes_version(version: &str) -> Option<(u64, u64, u64)> {
    let mut parts = version.trim().trim_start_matches('v').split('.');
    let mut next = |required: bool| -> Option<u64> {
        match parts.next() {
            Some(part) => {
                let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().ok()
            }
            None if required => None,
            None => Some(0),
        }
    };
    Some((next(true)?, next(true)?, next(false)?))
}

/// Returns `true` when `candidate` is a strictly higher version than `current`.
#[must_use]
pub fn is_newer_version(candidate: &str, current: &str) -> bool {
    match (parse_kubernetes_version(candidate), parse_kubernetes_version(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}

/// DNS service IP derived from a service CIDR: the network address with the
/// last octet set to 10.
///
/// # Errors
///
/// A terminal error when `cidr` is not an IPv4 CIDR.
pub fn dns_service_ip_from_cidr(cidr: &str) -> Result<String, ReconcileError> {
    let invalid = |reason: String| ReconcileError::terminal(format!("invalid service CIDR {cidr:?}: {reason}"));
    let (address, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| invalid("missing prefix length".to_string()))?;
    let address: Ipv4Addr = address.parse().map_err(|e| invalid(format!("{e}")))?;
    let prefix: u32 = prefix.parse().map_err(|e| invalid(format!("{e}")))?;
    if prefix > 32 {
        return Err(invalid(format!("prefix length {prefix} out of range")));
    }
    let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
    let mut octets = Ipv4Addr::from(u32::from(address) & mask).octets();
    octets[3] = DNS_SERVICE_IP_LAST_OCTET;
    Ok(Ipv4Addr::from(octets).to_string())
}

fn load_balancer_profile(profile: &LoadBalancerProfile) -> ManagedClusterLoadBalancerProfile {
    let references = |ids: &Vec<String>| -> Vec<ResourceReference> {
        ids.iter().map(|id| ResourceReference { id: id.clone() }).collect()
    };
    ManagedClusterLoadBalancerProfile {
        managed_outbound_ips: profile
            .managed_outbound_ips
            .map(|count| ManagedOutboundIps { count: Some(count) }),
        outbound_ip_prefixes: profile.outbound_ip_prefixes.as_ref().map(|ids| OutboundIpPrefixes {
            public_ip_prefixes: references(ids),
        }),
        outbound_ips: profile.outbound_ips.as_ref().map(|ids| OutboundIps {
            public_ips: references(ids),
        }),
        effective_outbound_ips: None,
        allocated_outbound_ports: profile.allocated_outbound_ports,
        idle_timeout_in_minutes: profile.idle_timeout_in_minutes,
    }
}

impl ManagedClusterSpec {
    fn upgrade_channel(&self) -> Option<UpgradeChannel> {
        self.control_plane
            .auto_upgrade_profile
            .as_ref()
            .and_then(|p| p.upgrade_channel)
    }

    fn identity(&self) -> Result<ManagedClusterIdentity, ReconcileError> {
        let Some(identity) = &self.control_plane.identity else {
            return Ok(ManagedClusterIdentity {
                identity_type: Some(SYSTEM_ASSIGNED.to_string()),
                ..ManagedClusterIdentity::default()
            });
        };
        if identity.identity_type != USER_ASSIGNED {
            return Ok(ManagedClusterIdentity {
                identity_type: Some(identity.identity_type.clone()),
                ..ManagedClusterIdentity::default()
            });
        }
        let Some(id) = identity
            .user_assigned_identity_resource_id
            .as_deref()
            .filter(|id| !id.is_empty())
        else {
            return Err(ReconcileError::terminal(
                "identity type is UserAssigned but no userAssignedIdentityResourceID is set",
            ));
        };
        Ok(ManagedClusterIdentity {
            identity_type: Some(USER_ASSIGNED.to_string()),
            user_assigned_identities: Some(BTreeMap::from([(
                id.to_string(),
                UserAssignedIdentity::default(),
            )])),
            ..ManagedClusterIdentity::default()
        })
    }

    fn linux_profile(&self) -> Result<Option<LinuxProfile>, ReconcileError> {
        let Some(encoded) = self
            .control_plane
            .ssh_public_key
            .as_deref()
            .filter(|k| !k.is_empty())
        else {
            return Ok(None);
        };
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| ReconcileError::terminal(format!("failed to decode sshPublicKey: {e}")))?;
        let key_data = String::from_utf8(decoded)
            .map_err(|e| ReconcileError::terminal(format!("failed to decode sshPublicKey: {e}")))?;
        Ok(Some(LinuxProfile {
            admin_username: ADMIN_USERNAME.to_string(),
            ssh: SshConfiguration {
                public_keys: vec![SshPublicKey { key_data }],
            },
        }))
    }

    fn network_profile(&self) -> Result<NetworkProfile, ReconcileError> {
        let cp = &self.control_plane;
        let dns_service_ip = match (
            cp.dns_service_ip.as_deref().filter(|ip| !ip.is_empty()),
            cp.service_cidr.as_deref().filter(|cidr| !cidr.is_empty()),
        ) {
            (Some(ip), _) => Some(ip.to_string()),
            (None, Some(cidr)) => Some(dns_service_ip_from_cidr(cidr)?),
            (None, None) => None,
        };
        Ok(NetworkProfile {
            network_plugin: cp.network_plugin.clone(),
            network_plugin_mode: cp.network_plugin_mode.clone(),
            network_policy: cp.network_policy.clone(),
            network_dataplane: cp.network_dataplane.clone(),
            pod_cidr: cp.pod_cidr.clone(),
            service_cidr: cp.service_cidr.clone(),
            dns_service_ip,
            outbound_type: cp.outbound_type.clone(),
            load_balancer_sku: cp.load_balancer_sku.clone(),
            load_balancer_profile: cp.load_balancer_profile.as_ref().map(load_balancer_profile),
        })
    }

    fn aad_profile(&self) -> Result<Option<ManagedClusterAadProfile>, ReconcileError> {
        let cp = &self.control_plane;
        let managed = cp.aad_profile.as_ref().is_some_and(|aad| aad.managed);
        if cp.disable_local_accounts == Some(true) && !managed {
            return Err(ReconcileError::terminal(
                "disableLocalAccounts can only be set when a managed AAD profile is enabled",
            ));
        }
        Ok(cp.aad_profile.as_ref().map(|aad| ManagedClusterAadProfile {
            managed: Some(aad.managed),
            enable_azure_rbac: aad.enable_azure_rbac,
            admin_group_object_ids: Some(aad.admin_group_object_ids.clone()),
            tenant_id: None,
        }))
    }

    fn desired(&self) -> Result<ManagedCluster, ReconcileError> {
        let cp = &self.control_plane;

        let kubelet_identity = cp
            .kubelet_user_assigned_identity
            .clone()
            .or_else(|| self.kubelet_identity.clone())
            .filter(|id| !id.is_empty());

        let properties = ManagedClusterProperties {
            kubernetes_version: Some(cp.version.trim_start_matches('v').to_string()),
            dns_prefix: Some(
                cp.dns_prefix
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| self.name.clone()),
            ),
            node_resource_group: cp.node_resource_group_name.clone(),
            enable_rbac: Some(true),
            disable_local_accounts: cp.disable_local_accounts,
            linux_profile: self.linux_profile()?,
            network_profile: Some(self.network_profile()?),
            aad_profile: self.aad_profile()?,
            addon_profiles: cp.addon_profiles.as_ref().map(|addons| {
                addons
                    .iter()
                    .map(|addon| {
                        (
                            addon.name.clone(),
                            ManagedClusterAddonProfile {
                                enabled: addon.enabled,
                                config: addon.config.clone(),
                            },
                        )
                    })
                    .collect()
            }),
            api_server_access_profile: cp.api_server_access_profile.as_ref().map(|p| {
                ManagedClusterApiServerAccessProfile {
                    authorized_ip_ranges: p.authorized_ip_ranges.clone(),
                    enable_private_cluster: p.enable_private_cluster,
                    private_dns_zone: p.private_dns_zone.clone(),
                    enable_private_cluster_public_fqdn: p.enable_private_cluster_public_fqdn,
                }
            }),
            auto_scaler_profile: cp.auto_scaler_profile.as_ref().map(|p| {
                ManagedClusterAutoScalerProfile {
                    balance_similar_node_groups: p.balance_similar_node_groups.clone(),
                    expander: p.expander.clone(),
                    max_empty_bulk_delete: p.max_empty_bulk_delete.clone(),
                    max_node_provision_time: p.max_node_provision_time.clone(),
                    scan_interval: p.scan_interval.clone(),
                    scale_down_delay_after_add: p.scale_down_delay_after_add.clone(),
                    scale_down_unneeded_time: p.scale_down_unneeded_time.clone(),
                    scale_down_utilization_threshold: p.scale_down_utilization_threshold.clone(),
                    skip_nodes_with_local_storage: p.skip_nodes_with_local_storage.clone(),
                    skip_nodes_with_system_pods: p.skip_nodes_with_system_pods.clone(),
                }
            }),
            auto_upgrade_profile: self.upgrade_channel().map(|channel| {
                ManagedClusterAutoUpgradeProfile {
                    upgrade_channel: Some(channel.as_str().to_string()),
                }
            }),
            http_proxy_config: cp.http_proxy_config.as_ref().map(|p| ManagedClusterHttpProxyConfig {
                http_proxy: p.http_proxy.clone(),
                https_proxy: p.https_proxy.clone(),
                no_proxy: p.no_proxy.clone(),
                trusted_ca: p.trusted_ca.clone(),
            }),
            identity_profile: kubelet_identity.map(|id| {
                BTreeMap::from([(
                    KUBELET_IDENTITY_KEY.to_string(),
                    UserAssignedIdentity {
                        resource_id: Some(id),
                        ..UserAssignedIdentity::default()
                    },
                )])
            }),
            oidc_issuer_profile: cp.oidc_issuer_profile.as_ref().map(|p| {
                ManagedClusterOidcIssuerProfile {
                    enabled: p.enabled,
                    issuer_url: None,
                }
            }),
            security_profile: cp.security_profile.as_ref().map(|p| ManagedClusterSecurityProfile {
                workload_identity: p.workload_identity.map(|enabled| EnabledFlag { enabled }),
                image_cleaner: p.image_cleaner_interval_hours.map(|hours| ImageCleaner {
                    enabled: true,
                    interval_hours: Some(hours),
                }),
            }),
            ..ManagedClusterProperties::default()
        };

        let cluster = ManagedCluster {
            id: None,
            name: Some(self.name.clone()),
            location: cp.location.clone(),
            tags: cp.additional_tags.clone(),
            sku: cp.sku.as_ref().map(|sku| ManagedClusterSku {
                name: Some(SKU_NAME.to_string()),
                tier: Some(sku.tier.clone()),
            }),
            identity: Some(self.identity()?),
            properties,
        };
        apply_patches(cluster, cp.patches.as_deref().unwrap_or_default())
    }

    /// Keeps the cluster at the version an auto-upgrade moved it to.
    fn pin_version(&self, desired: &mut ManagedCluster, observed: &ManagedCluster) {
        if !self
            .upgrade_channel()
            .is_some_and(UpgradeChannel::advances_kubernetes_version)
        {
            return;
        }
        let Some(current) = observed.properties.current_kubernetes_version.as_deref() else {
            return;
        };
        let wanted = desired.properties.kubernetes_version.as_deref().unwrap_or_default();
        if is_newer_version(current, wanted) {
            desired.properties.kubernetes_version = Some(current.trim_start_matches('v').to_string());
        }
    }
}

/// Returns the observed value only when the declaration manages the field.
fn managed<T: Clone>(desired: Option<&T>, observed: Option<&T>) -> Option<T> {
    desired.and(observed).cloned()
}

fn pick<T: Clone>(desired: &Option<T>, observed: &Option<T>) -> Option<T> {
    managed(desired.as_ref(), observed.as_ref())
}

fn project_auto_scaler(
    desired: &ManagedClusterAutoScalerProfile,
    observed: &ManagedClusterAutoScalerProfile,
) -> ManagedClusterAutoScalerProfile {
    ManagedClusterAutoScalerProfile {
        balance_similar_node_groups: pick(
            &desired.balance_similar_node_groups,
            &observed.balance_similar_node_groups,
        ),
        expander: pick(&desired.expander, &observed.expander),
        max_empty_bulk_delete: pick(&desired.max_empty_bulk_delete, &observed.max_empty_bulk_delete),
        max_node_provision_time: pick(
            &desired.max_node_provision_time,
            &observed.max_node_provision_time,
        ),
        scan_interval: pick(&desired.scan_interval, &observed.scan_interval),
        scale_down_delay_after_add: pick(
            &desired.scale_down_delay_after_add,
            &observed.scale_down_delay_after_add,
        ),
        scale_down_unneeded_time: pick(
            &desired.scale_down_unneeded_time,
            &observed.scale_down_unneeded_time,
        ),
        scale_down_utilization_threshold: pick(
            &desired.scale_down_utilization_threshold,
            &observed.scale_down_utilization_threshold,
        ),
        skip_nodes_with_local_storage: pick(
            &desired.skip_nodes_with_local_storage,
            &observed.skip_nodes_with_local_storage,
        ),
        skip_nodes_with_system_pods: pick(
            &desired.skip_nodes_with_system_pods,
            &observed.skip_nodes_with_system_pods,
        ),
    }
}

fn project_security(
    desired: &ManagedClusterSecurityProfile,
    observed: &ManagedClusterSecurityProfile,
) -> ManagedClusterSecurityProfile {
    ManagedClusterSecurityProfile {
        workload_identity: pick(&desired.workload_identity, &observed.workload_identity),
        image_cleaner: pick(&desired.image_cleaner, &observed.image_cleaner),
    }
}

fn non_empty<T: Clone>(list: Option<&Vec<T>>) -> Option<Vec<T>> {
    list.filter(|l| !l.is_empty()).cloned()
}

fn non_empty_map(map: Option<&BTreeMap<String, String>>) -> Option<BTreeMap<String, String>> {
    map.filter(|m| !m.is_empty()).cloned()
}

/// The updatable view of a managed cluster both sides are compared on.
#[derive(Debug, Default, PartialEq)]
struct Comparable {
    kubernetes_version: Option<String>,
    tags: Option<BTreeMap<String, String>>,
    sku_tier: Option<String>,
    identity_type: Option<String>,
    user_assigned_identities: Vec<String>,
    aad: Option<(Option<bool>, Option<bool>, Option<Vec<String>>)>,
    addons: Option<BTreeMap<String, (bool, Option<BTreeMap<String, String>>)>>,
    authorized_ip_ranges: Option<Option<Vec<String>>>,
    auto_scaler: Option<ManagedClusterAutoScalerProfile>,
    upgrade_channel: Option<String>,
    http_proxy: Option<ManagedClusterHttpProxyConfig>,
    load_balancer: Option<ManagedClusterLoadBalancerProfile>,
    oidc_enabled: Option<bool>,
    security: Option<ManagedClusterSecurityProfile>,
    disable_local_accounts: Option<bool>,
    kubelet_identity: Option<String>,
}

fn kubelet_identity(mc: &ManagedCluster) -> Option<&String> {
    mc.properties
        .identity_profile
        .as_ref()?
        .get(KUBELET_IDENTITY_KEY)?
        .resource_id
        .as_ref()
}

fn identity_parts(mc: &ManagedCluster) -> (Option<String>, Vec<String>) {
    let identity = mc.identity.as_ref();
    (
        identity.and_then(|i| i.identity_type.clone()),
        identity
            .and_then(|i| i.user_assigned_identities.as_ref())
            .map(|ids| ids.keys().map(|k| k.to_lowercase()).collect())
            .unwrap_or_default(),
    )
}

impl Comparable {
    fn desired(mc: &ManagedCluster) -> Self {
        let p = &mc.properties;
        let (identity_type, user_assigned_identities) = identity_parts(mc);
        Self {
            kubernetes_version: p
                .kubernetes_version
                .as_deref()
                .map(|v| v.trim_start_matches('v').to_string()),
            tags: non_empty_map(mc.tags.as_ref()),
            sku_tier: mc.sku.as_ref().and_then(|s| s.tier.clone()),
            identity_type,
            user_assigned_identities,
            aad: p.aad_profile.as_ref().map(|a| {
                (a.managed, a.enable_azure_rbac, non_empty(a.admin_group_object_ids.as_ref()))
            }),
            addons: p.addon_profiles.as_ref().map(|addons| {
                addons
                    .iter()
                    .map(|(name, a)| (name.to_lowercase(), (a.enabled, non_empty_map(a.config.as_ref()))))
                    .collect()
            }),
            authorized_ip_ranges: p
                .api_server_access_profile
                .as_ref()
                .map(|a| non_empty(a.authorized_ip_ranges.as_ref())),
            auto_scaler: p.auto_scaler_profile.clone(),
            upgrade_channel: p
                .auto_upgrade_profile
                .as_ref()
                .and_then(|a| a.upgrade_channel.clone()),
            http_proxy: p.http_proxy_config.clone(),
            load_balancer: p
                .network_profile
                .as_ref()
                .and_then(|n| n.load_balancer_profile.clone()),
            oidc_enabled: p.oidc_issuer_profile.as_ref().and_then(|o| o.enabled),
            security: p.security_profile.clone(),
            disable_local_accounts: p.disable_local_accounts,
            kubelet_identity: kubelet_identity(mc).cloned(),
        }
    }

    /// View of `observed` restricted to what `desired` manages.
    fn observed(observed: &ManagedCluster, desired: &Self) -> Self {
        let p = &observed.properties;
        let (identity_type, user_assigned_identities) = identity_parts(observed);
        let observed_addons = p.addon_profiles.as_ref();
        Self {
            kubernetes_version: managed(
                desired.kubernetes_version.as_ref(),
                p.kubernetes_version
                    .as_deref()
                    .map(|v| v.trim_start_matches('v').to_string())
                    .as_ref(),
            ),
            tags: non_empty_map(observed.tags.as_ref()),
            sku_tier: managed(
                desired.sku_tier.as_ref(),
                observed.sku.as_ref().and_then(|s| s.tier.as_ref()),
            ),
            identity_type,
            user_assigned_identities,
            aad: desired.aad.as_ref().and(p.aad_profile.as_ref()).map(|a| {
                (a.managed, a.enable_azure_rbac, non_empty(a.admin_group_object_ids.as_ref()))
            }),
            addons: desired.addons.as_ref().map(|wanted| {
                wanted
                    .keys()
                    .filter_map(|name| {
                        observed_addons
                            .and_then(|addons| {
                                addons.iter().find(|(k, _)| k.to_lowercase() == *name)
                            })
                            .map(|(_, a)| (name.clone(), (a.enabled, non_empty_map(a.config.as_ref()))))
                    })
                    .collect()
            }),
            authorized_ip_ranges: desired.authorized_ip_ranges.as_ref().map(|_| {
                non_empty(
                    p.api_server_access_profile
                        .as_ref()
                        .and_then(|a| a.authorized_ip_ranges.as_ref()),
                )
            }),
            auto_scaler: desired
                .auto_scaler
                .as_ref()
                .and_then(|wanted| p.auto_scaler_profile.as_ref().map(|o| project_auto_scaler(wanted, o))),
            upgrade_channel: managed(
                desired.upgrade_channel.as_ref(),
                p.auto_upgrade_profile
                    .as_ref()
                    .and_then(|a| a.upgrade_channel.as_ref()),
            ),
            http_proxy: managed(desired.http_proxy.as_ref(), p.http_proxy_config.as_ref()),
            load_balancer: desired.load_balancer.as_ref().and_then(|_| {
                p.network_profile
                    .as_ref()
                    .and_then(|n| n.load_balancer_profile.clone())
                    .map(|mut lb| {
                        lb.effective_outbound_ips = None;
                        lb
                    })
            }),
            oidc_enabled: managed(
                desired.oidc_enabled.as_ref(),
                p.oidc_issuer_profile.as_ref().and_then(|o| o.enabled.as_ref()),
            ),
            security: desired
                .security
                .as_ref()
                .and_then(|wanted| p.security_profile.as_ref().map(|o| project_security(wanted, o))),
            disable_local_accounts: managed(
                desired.disable_local_accounts.as_ref(),
                p.disable_local_accounts.as_ref(),
            ),
            kubelet_identity: managed(desired.kubelet_identity.as_ref(), kubelet_identity(observed)),
        }
    }
}

impl ResourceSpec<ManagedCluster> for ManagedClusterSpec {
    fn resource_name(&self) -> String {
        self.name.clone()
    }

    fn resource_group_name(&self) -> String {
        self.resource_group.clone()
    }

    fn owner_resource_name(&self) -> String {
        String::new()
    }

    fn custom_headers(&self) -> BTreeMap<String, String> {
        self.headers.clone()
    }

    fn parameters(
        &self,
        existing: Option<&ManagedCluster>,
    ) -> Result<Option<ManagedCluster>, ReconcileError> {
        let mut desired = self.desired()?;

        let Some(observed) = existing else {
            let profiles = self
                .agent_pools
                .iter()
                .map(AgentPoolSpec::profile)
                .collect::<Result<Vec<_>, _>>()?;
            desired.properties.agent_pool_profiles = Some(profiles);
            return Ok(Some(desired));
        };

        let state = observed.properties.provisioning_state.as_deref();
        if !is_terminal_state(state) {
            return Err(non_terminal_error("managed cluster", state.unwrap_or_default()));
        }

        self.pin_version(&mut desired, observed);

        let observed_ranges = observed
            .properties
            .api_server_access_profile
            .as_ref()
            .and_then(|a| a.authorized_ip_ranges.as_ref())
            .is_some_and(|ranges| !ranges.is_empty());
        let access = desired
            .properties
            .api_server_access_profile
            .get_or_insert_with(ManagedClusterApiServerAccessProfile::default);
        if observed_ranges && access.authorized_ip_ranges.is_none() {
            access.authorized_ip_ranges = Some(Vec::new());
        }
        if *access == ManagedClusterApiServerAccessProfile::default() {
            desired.properties.api_server_access_profile = None;
        }

        desired.properties.agent_pool_profiles = observed.properties.agent_pool_profiles.clone();
        merge_reserved(observed.tags.as_ref(), &mut desired.tags, AKS_RESERVED_TAG_PREFIX);

        let wanted = Comparable::desired(&desired);
        if wanted == Comparable::observed(observed, &wanted) {
            return Ok(None);
        }
        Ok(Some(desired))
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod spec_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Managed cluster service.
//!
//! Reconciles the AKS managed cluster behind an `AzureManagedControlPlane`.
//! Once the cluster is done, the hook copies what Azure computed back into
//! the scope: the API server endpoint, kubeconfigs, the kubelet identity,
//! the OIDC issuer URL and the running version.

pub mod client;
pub mod spec;

pub use client::{managed_cluster_path, ManagedClustersClient};
pub use spec::{dns_service_ip_from_cidr, is_newer_version, parse_kubernetes_version, ManagedClusterSpec};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::async_reconciler::AsyncReconciler;
use crate::azure::arm::ArmConnection;
use crate::azure::models::{ManagedCluster, ManagedClusterProperties};
use crate::azure::{CredentialsLister, ResourceClient};
use crate::constants::{API_SERVER_PORT, KUBELET_IDENTITY_KEY, MANAGED_CLUSTERS_SERVICE_NAME};
use crate::crd::ApiEndpoint;
use crate::errors::{AzureError, ReconcileError};
use crate::scope::{AzureScope, ManagedControlPlaneScope};
use crate::service::{PostCreateOrUpdateHook, Service};
use crate::status_reasons::CONDITION_TYPE_MANAGED_CLUSTER_RUNNING;

/// Managed cluster service over any client implementation.
pub type ManagedClusterService =
    Service<ManagedCluster, dyn ResourceClient<ManagedCluster>, ManagedControlPlaneScope>;

/// Builds the managed cluster service.
#[must_use]
pub fn new_service(
    client: Arc<dyn ResourceClient<ManagedCluster>>,
    credentials: Arc<dyn CredentialsLister>,
    timeout: Duration,
    requeue: Duration,
) -> ManagedClusterService {
    let reconciler = AsyncReconciler::new(client, CONDITION_TYPE_MANAGED_CLUSTER_RUNNING)
        .with_timeout(timeout)
        .with_requeue(requeue);
    Service::new(MANAGED_CLUSTERS_SERVICE_NAME, reconciler)
        .with_post_hook(ManagedClusterHook::new(credentials))
}

/// Builds the managed cluster service of one pass, talking to Azure with the
/// subscription and credential of `scope`.
#[must_use]
pub fn service_for_scope(
    connection: &ArmConnection,
    scope: &ManagedControlPlaneScope,
    timeout: Duration,
    requeue: Duration,
) -> ManagedClusterService {
    let client = Arc::new(ManagedClustersClient::new(
        connection.client(scope.credential()),
        scope.subscription_id(),
    ));
    new_service(client.clone(), client, timeout, requeue)
}

/// Host clients should use to reach the API server.
///
/// Private clusters without a public FQDN are reached through the private
/// FQDN.
#[must_use]
pub fn endpoint_host(properties: &ManagedClusterProperties) -> Option<String> {
    let private_only = properties
        .api_server_access_profile
        .as_ref()
        .is_some_and(|a| {
            a.enable_private_cluster == Some(true) && a.enable_private_cluster_public_fqdn != Some(true)
        });
    let host = if private_only {
        properties.private_fqdn.as_ref()
    } else {
        properties.fqdn.as_ref()
    };
    host.filter(|h| !h.is_empty()).cloned()
}

fn credentials_error(kind: &str, err: &AzureError) -> ReconcileError {
    let message = format!("failed to get {kind} kubeconfig of managed cluster: {err}");
    if err.is_transient() || err.is_not_found() {
        ReconcileError::transient_default(message)
    } else {
        ReconcileError::terminal(message)
    }
}

/// Copies cloud-computed managed cluster state into the control plane scope.
pub struct ManagedClusterHook {
    credentials: Arc<dyn CredentialsLister>,
}

impl ManagedClusterHook {
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialsLister>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl PostCreateOrUpdateHook<ManagedControlPlaneScope, ManagedCluster> for ManagedClusterHook {
    async fn run(
        &self,
        scope: &mut ManagedControlPlaneScope,
        cluster: &ManagedCluster,
    ) -> Result<(), ReconcileError> {
        let props = &cluster.properties;

        match endpoint_host(props) {
            Some(host) => scope.set_control_plane_endpoint(ApiEndpoint {
                host,
                port: API_SERVER_PORT,
            }),
            None => warn!(cluster = %scope.name(), "Managed cluster reports no API server FQDN yet"),
        }

        let current = props
            .current_kubernetes_version
            .clone()
            .or_else(|| props.kubernetes_version.clone());
        let declared = scope.managed_cluster_spec().control_plane.version.clone();
        let upgraded = current
            .as_deref()
            .filter(|v| is_newer_version(v, &declared))
            .map(str::to_string);
        if let Some(version) = &upgraded {
            debug!(cluster = %scope.name(), version = %version, "Cluster was auto-upgraded past the declared version");
        }
        scope.set_auto_upgrade_version(upgraded);
        scope.set_version(current);

        scope.set_oidc_issuer_url(
            props
                .oidc_issuer_profile
                .as_ref()
                .and_then(|o| o.issuer_url.clone()),
        );

        if let Some(identity) = props
            .identity_profile
            .as_ref()
            .and_then(|p| p.get(KUBELET_IDENTITY_KEY))
            .and_then(|i| i.resource_id.clone())
        {
            scope.set_kubelet_identity(Some(identity));
        }

        let resource_group = scope.resource_group().to_string();
        let name = scope.name().to_string();

        if !scope.local_accounts_disabled() {
            let kubeconfig = self
                .credentials
                .get_admin_kubeconfig(&resource_group, &name)
                .await
                .map_err(|e| credentials_error("admin", &e))?;
            scope.set_admin_kubeconfig(kubeconfig);
        }

        if scope.aad_managed() {
            let kubeconfig = self
                .credentials
                .get_user_kubeconfig(&resource_group, &name)
                .await
                .map_err(|e| credentials_error("user", &e))?;
            scope.set_user_kubeconfig(kubeconfig);
        }

        Ok(())
    }
}

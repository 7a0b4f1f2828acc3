// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! ARM client for `Microsoft.ContainerService/managedClusters`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::time::Duration;
use tracing::debug;

use crate::azure::arm::ArmClient;
use crate::azure::models::{CredentialResults, ManagedCluster};
use crate::azure::{AsyncOperation, Creator, CredentialsLister, Deleter, Getter};
use crate::constants::{CONTAINER_SERVICE_API_VERSION, CONTAINER_SERVICE_PROVIDER};
use crate::errors::AzureError;
use crate::spec::ResourceSpec;

/// ARM path of a managed cluster.
#[must_use]
pub fn managed_cluster_path(subscription_id: &str, resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/{CONTAINER_SERVICE_PROVIDER}/managedClusters/{name}"
    )
}

/// Managed clusters in one subscription.
#[derive(Clone)]
pub struct ManagedClustersClient {
    arm: ArmClient,
    subscription_id: String,
}

impl ManagedClustersClient {
    #[must_use]
    pub fn new(arm: ArmClient, subscription_id: impl Into<String>) -> Self {
        Self {
            arm,
            subscription_id: subscription_id.into(),
        }
    }

    fn url(&self, resource_group: &str, name: &str) -> String {
        self.arm.url(
            &managed_cluster_path(&self.subscription_id, resource_group, name),
            CONTAINER_SERVICE_API_VERSION,
        )
    }

    async fn list_credentials(
        &self,
        resource_group: &str,
        name: &str,
        action: &str,
    ) -> Result<Vec<u8>, AzureError> {
        let path = format!(
            "{}/{action}",
            managed_cluster_path(&self.subscription_id, resource_group, name)
        );
        let results: CredentialResults = self
            .arm
            .post(&self.arm.url(&path, CONTAINER_SERVICE_API_VERSION))
            .await?;
        let Some(kubeconfig) = results.kubeconfigs.into_iter().next() else {
            return Err(AzureError::Serialization(format!(
                "{action} returned no kubeconfig for {resource_group}/{name}"
            )));
        };
        debug!(cluster = %name, kubeconfig = %kubeconfig.name, "Fetched cluster credentials");
        BASE64
            .decode(kubeconfig.value.as_bytes())
            .map_err(|e| AzureError::Serialization(format!("invalid kubeconfig encoding: {e}")))
    }
}

#[async_trait]
impl Getter<ManagedCluster> for ManagedClustersClient {
    async fn get(&self, spec: &dyn ResourceSpec<ManagedCluster>) -> Result<ManagedCluster, AzureError> {
        self.arm
            .get(&self.url(&spec.resource_group_name(), &spec.resource_name()))
            .await
    }
}

#[async_trait]
impl Creator<ManagedCluster> for ManagedClustersClient {
    async fn create_or_update_async(
        &self,
        spec: &dyn ResourceSpec<ManagedCluster>,
        resume_token: Option<&str>,
        parameters: Option<ManagedCluster>,
        timeout: Duration,
    ) -> Result<AsyncOperation<ManagedCluster>, AzureError> {
        if let Some(token) = resume_token {
            return self.arm.resume_put(token, timeout).await;
        }
        let Some(parameters) = parameters else {
            return Err(AzureError::Serialization(
                "managed cluster parameters are required to start a PUT".to_string(),
            ));
        };
        let url = self.url(&spec.resource_group_name(), &spec.resource_name());
        self.arm
            .begin_put(&url, &parameters, &spec.custom_headers(), timeout)
            .await
    }
}

#[async_trait]
impl Deleter<ManagedCluster> for ManagedClustersClient {
    async fn delete_async(
        &self,
        spec: &dyn ResourceSpec<ManagedCluster>,
        resume_token: Option<&str>,
        timeout: Duration,
    ) -> Result<AsyncOperation<()>, AzureError> {
        if let Some(token) = resume_token {
            return self.arm.resume_delete(token, timeout).await;
        }
        let url = self.url(&spec.resource_group_name(), &spec.resource_name());
        self.arm.begin_delete(&url, timeout).await
    }
}

#[async_trait]
impl CredentialsLister for ManagedClustersClient {
    async fn get_admin_kubeconfig(
        &self,
        resource_group: &str,
        cluster: &str,
    ) -> Result<Vec<u8>, AzureError> {
        self.list_credentials(resource_group, cluster, "listClusterAdminCredential")
            .await
    }

    async fn get_user_kubeconfig(
        &self,
        resource_group: &str,
        cluster: &str,
    ) -> Result<Vec<u8>, AzureError> {
        self.list_credentials(resource_group, cluster, "listClusterUserCredential")
            .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;

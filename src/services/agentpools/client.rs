// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! ARM client for `Microsoft.ContainerService/managedClusters/agentPools`.

use async_trait::async_trait;
use std::time::Duration;

use crate::azure::arm::ArmClient;
use crate::azure::models::AgentPool;
use crate::azure::{AsyncOperation, Creator, Deleter, Getter};
use crate::constants::CONTAINER_SERVICE_API_VERSION;
use crate::errors::AzureError;
use crate::services::managedclusters::client::managed_cluster_path;
use crate::spec::ResourceSpec;

/// Agent pools of managed clusters in one subscription.
#[derive(Clone)]
pub struct AgentPoolsClient {
    arm: ArmClient,
    subscription_id: String,
}

impl AgentPoolsClient {
    #[must_use]
    pub fn new(arm: ArmClient, subscription_id: impl Into<String>) -> Self {
        Self {
            arm,
            subscription_id: subscription_id.into(),
        }
    }

    fn url(&self, spec: &dyn ResourceSpec<AgentPool>) -> String {
        let cluster = managed_cluster_path(
            &self.subscription_id,
            &spec.resource_group_name(),
            &spec.owner_resource_name(),
        );
        self.arm.url(
            &format!("{cluster}/agentPools/{}", spec.resource_name()),
            CONTAINER_SERVICE_API_VERSION,
        )
    }
}

#[async_trait]
impl Getter<AgentPool> for AgentPoolsClient {
    async fn get(&self, spec: &dyn ResourceSpec<AgentPool>) -> Result<AgentPool, AzureError> {
        self.arm.get(&self.url(spec)).await
    }
}

#[async_trait]
impl Creator<AgentPool> for AgentPoolsClient {
    async fn create_or_update_async(
        &self,
        spec: &dyn ResourceSpec<AgentPool>,
        resume_token: Option<&str>,
        parameters: Option<AgentPool>,
        timeout: Duration,
    ) -> Result<AsyncOperation<AgentPool>, AzureError> {
        if let Some(token) = resume_token {
            return self.arm.resume_put(token, timeout).await;
        }
        let Some(parameters) = parameters else {
            return Err(AzureError::Serialization(
                "agent pool parameters are required to start a PUT".to_string(),
            ));
        };
        self.arm
            .begin_put(&self.url(spec), &parameters, &spec.custom_headers(), timeout)
            .await
    }
}

#[async_trait]
impl Deleter<AgentPool> for AgentPoolsClient {
    async fn delete_async(
        &self,
        spec: &dyn ResourceSpec<AgentPool>,
        resume_token: Option<&str>,
        timeout: Duration,
    ) -> Result<AsyncOperation<()>, AzureError> {
        match resume_token {
            Some(token) => self.arm.resume_delete(token, timeout).await,
            None => self.arm.begin_delete(&self.url(spec), timeout).await,
        }
    }
}

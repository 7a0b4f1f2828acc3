// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory Azure fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use capz_aks::azure::models::{AgentPool, ManagedCluster};
use capz_aks::azure::{AsyncOperation, Creator, CredentialsLister, Deleter, Getter};
use capz_aks::errors::AzureError;
use capz_aks::spec::ResourceSpec;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Resources whose provisioning state the fake cloud sets on completion.
pub trait Provisioned: Clone + Send + Sync + 'static {
    fn set_provisioning_state(&mut self, state: &str);
}

impl Provisioned for AgentPool {
    fn set_provisioning_state(&mut self, state: &str) {
        self.properties.provisioning_state = Some(state.to_string());
    }
}

impl Provisioned for ManagedCluster {
    fn set_provisioning_state(&mut self, state: &str) {
        self.properties.provisioning_state = Some(state.to_string());
    }
}

/// One create-or-update call as seen by the cloud.
#[derive(Clone, Debug)]
pub struct PutCall<T> {
    pub name: String,
    pub resume_token: Option<String>,
    pub parameters: Option<T>,
}

/// Azure resource provider keeping resources in a map.
///
/// PUTs complete immediately unless the resume token they carry was
/// scripted with [`FakeCloud::keep_running`].
pub struct FakeCloud<T> {
    resources: Mutex<HashMap<String, T>>,
    running: Mutex<HashMap<String, String>>,
    puts: Mutex<Vec<PutCall<T>>>,
    deletes: Mutex<Vec<String>>,
}

impl<T: Provisioned> Default for FakeCloud<T> {
    fn default() -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
            running: Mutex::new(HashMap::new()),
            puts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Provisioned> FakeCloud<T> {
    /// Stores `resource` under `name` as if it had been created earlier.
    pub fn with_resource(self, name: &str, resource: T) -> Self {
        self.resources
            .lock()
            .unwrap()
            .insert(name.to_string(), resource);
        self
    }

    /// Resuming with `token` keeps the operation running and hands out `next`.
    pub fn keep_running(self, token: &str, next: &str) -> Self {
        self.running
            .lock()
            .unwrap()
            .insert(token.to_string(), next.to_string());
        self
    }

    pub fn puts(&self) -> Vec<PutCall<T>> {
        self.puts.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn resource(&self, name: &str) -> Option<T> {
        self.resources.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl<T: Provisioned> Getter<T> for FakeCloud<T> {
    async fn get(&self, spec: &dyn ResourceSpec<T>) -> Result<T, AzureError> {
        self.resource(&spec.resource_name())
            .ok_or_else(|| AzureError::not_found(format!("{} not found", spec.resource_name())))
    }
}

#[async_trait]
impl<T: Provisioned> Creator<T> for FakeCloud<T> {
    async fn create_or_update_async(
        &self,
        spec: &dyn ResourceSpec<T>,
        resume_token: Option<&str>,
        parameters: Option<T>,
        _timeout: Duration,
    ) -> Result<AsyncOperation<T>, AzureError> {
        let name = spec.resource_name();
        self.puts.lock().unwrap().push(PutCall {
            name: name.clone(),
            resume_token: resume_token.map(str::to_string),
            parameters: parameters.clone(),
        });

        if let Some(next) = resume_token.and_then(|t| self.running.lock().unwrap().get(t).cloned()) {
            return Ok(AsyncOperation::InProgress { resume_token: next });
        }

        let mut resources = self.resources.lock().unwrap();
        if let Some(mut resource) = parameters {
            resource.set_provisioning_state("Succeeded");
            resources.insert(name.clone(), resource);
        }
        resources
            .get(&name)
            .cloned()
            .map(AsyncOperation::Done)
            .ok_or_else(|| AzureError::not_found(format!("{name} not found")))
    }
}

#[async_trait]
impl<T: Provisioned> Deleter<T> for FakeCloud<T> {
    async fn delete_async(
        &self,
        spec: &dyn ResourceSpec<T>,
        _resume_token: Option<&str>,
        _timeout: Duration,
    ) -> Result<AsyncOperation<()>, AzureError> {
        let name = spec.resource_name();
        self.deletes.lock().unwrap().push(name.clone());
        match self.resources.lock().unwrap().remove(&name) {
            Some(_) => Ok(AsyncOperation::Done(())),
            None => Err(AzureError::not_found(format!("{name} not found"))),
        }
    }
}

/// Kubeconfig lister returning fixed bytes.
#[derive(Default)]
pub struct FakeCredentials;

#[async_trait]
impl CredentialsLister for FakeCredentials {
    async fn get_admin_kubeconfig(&self, _rg: &str, _cluster: &str) -> Result<Vec<u8>, AzureError> {
        Ok(b"admin-kubeconfig".to_vec())
    }

    async fn get_user_kubeconfig(&self, _rg: &str, _cluster: &str) -> Result<Vec<u8>, AzureError> {
        Ok(b"user-kubeconfig".to_vec())
    }
}

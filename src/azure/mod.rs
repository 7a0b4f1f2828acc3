// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure cloud API surface.
//!
//! The async reconciler talks to Azure only through the capability traits in
//! this module. Each resource kind wires in its own client (see
//! `services::managedclusters::client` and `services::agentpools::client`),
//! and tests substitute in-memory fakes.
//!
//! - [`auth`] - Azure AD bearer tokens
//! - [`arm`] - ARM REST client with resumable pollers
//! - [`models`] - `Microsoft.ContainerService` request/response models

pub mod arm;
pub mod auth;
pub mod models;

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::AzureError;
use crate::spec::ResourceSpec;

/// Result of starting or resuming a long-running operation.
#[derive(Clone, Debug, PartialEq)]
pub enum AsyncOperation<T> {
    /// The operation completed within the call deadline.
    Done(T),
    /// The deadline expired while the operation was still running.
    InProgress {
        /// Opaque token that resumes polling on a later pass.
        resume_token: String,
    },
}

/// Reads the current state of a resource.
#[async_trait]
pub trait Getter<T: Send + Sync + 'static>: Send + Sync {
    /// Returns the resource, or [`AzureError::NotFound`].
    async fn get(&self, spec: &dyn ResourceSpec<T>) -> Result<T, AzureError>;
}

/// Creates or updates a resource.
#[async_trait]
pub trait Creator<T: Send + Sync + 'static>: Getter<T> {
    /// Starts a PUT with `parameters`, or resumes the one identified by
    /// `resume_token`, and polls it until it completes or `timeout` expires.
    ///
    /// Returns [`AzureError::DeadlineExceeded`] when the deadline expires
    /// before the operation was accepted.
    async fn create_or_update_async(
        &self,
        spec: &dyn ResourceSpec<T>,
        resume_token: Option<&str>,
        parameters: Option<T>,
        timeout: Duration,
    ) -> Result<AsyncOperation<T>, AzureError>;
}

/// Deletes a resource.
#[async_trait]
pub trait Deleter<T: Send + Sync + 'static>: Send + Sync {
    /// Starts a DELETE, or resumes the one identified by `resume_token`.
    async fn delete_async(
        &self,
        spec: &dyn ResourceSpec<T>,
        resume_token: Option<&str>,
        timeout: Duration,
    ) -> Result<AsyncOperation<()>, AzureError>;
}

/// Full client capability set required by the async reconciler.
pub trait ResourceClient<T: Send + Sync + 'static>: Creator<T> + Deleter<T> {}

impl<T, C> ResourceClient<T> for C
where
    T: Send + Sync + 'static,
    C: Creator<T> + Deleter<T>,
{
}

/// Lists the kubeconfigs of a managed cluster.
#[async_trait]
pub trait CredentialsLister: Send + Sync {
    /// Admin kubeconfig bytes.
    async fn get_admin_kubeconfig(
        &self,
        resource_group: &str,
        cluster: &str,
    ) -> Result<Vec<u8>, AzureError>;

    /// User (AAD) kubeconfig bytes.
    async fn get_user_kubeconfig(
        &self,
        resource_group: &str,
        cluster: &str,
    ) -> Result<Vec<u8>, AzureError>;
}

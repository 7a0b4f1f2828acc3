// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration.
//!
//! Every flag can also be set through the environment, so the operator runs
//! unchanged from a Deployment manifest.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_AAD_AUTHORITY, DEFAULT_AKS_CALL_TIMEOUT, DEFAULT_ARM_ENDPOINT, DEFAULT_METRICS_ADDR,
    DEFAULT_RECONCILER_REQUEUE, DEFAULT_WORKER_THREADS, ERROR_REQUEUE, READY_REQUEUE,
};

/// Azure credentials selected from the configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    /// Service principal with a client secret.
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Federated token projected by Azure workload identity.
    WorkloadIdentity {
        tenant_id: String,
        client_id: String,
        token_file: PathBuf,
    },
}

/// Command-line and environment configuration.
#[derive(Clone, Debug, Parser)]
#[command(name = "capz-aks", version, about = "Azure AKS provider for Cluster API")]
pub struct Config {
    /// Subscription that owns the managed clusters.
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription_id: String,

    #[arg(long, env = "AZURE_TENANT_ID")]
    pub tenant_id: String,

    #[arg(long, env = "AZURE_CLIENT_ID")]
    pub client_id: String,

    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Federated token file; takes precedence over a client secret.
    #[arg(long, env = "AZURE_FEDERATED_TOKEN_FILE")]
    pub federated_token_file: Option<PathBuf>,

    #[arg(long, env = "AZURE_RESOURCE_MANAGER_ENDPOINT", default_value = DEFAULT_ARM_ENDPOINT)]
    pub arm_endpoint: String,

    #[arg(long, env = "AZURE_AUTHORITY_HOST", default_value = DEFAULT_AAD_AUTHORITY)]
    pub authority: String,

    /// Address the `/metrics` endpoint listens on.
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = DEFAULT_METRICS_ADDR)]
    pub metrics_addr: String,

    #[arg(long, env = "WORKER_THREADS", default_value_t = DEFAULT_WORKER_THREADS)]
    pub worker_threads: usize,

    /// Per-call deadline for AKS operations, in seconds.
    #[arg(long, env = "AKS_CALL_TIMEOUT_SECS", default_value_t = DEFAULT_AKS_CALL_TIMEOUT.as_secs())]
    pub aks_call_timeout_secs: u64,

    /// Requeue interval while an operation is pending, in seconds.
    #[arg(long, env = "RECONCILER_REQUEUE_SECS", default_value_t = DEFAULT_RECONCILER_REQUEUE.as_secs())]
    pub reconciler_requeue_secs: u64,

    /// Requeue interval once a resource is ready, in seconds.
    #[arg(long, env = "READY_REQUEUE_SECS", default_value_t = READY_REQUEUE.as_secs())]
    pub ready_requeue_secs: u64,

    /// Requeue interval after an unexpected error, in seconds.
    #[arg(long, env = "ERROR_REQUEUE_SECS", default_value_t = ERROR_REQUEUE.as_secs())]
    pub error_requeue_secs: u64,
}

impl Config {
    #[must_use]
    pub fn aks_call_timeout(&self) -> Duration {
        Duration::from_secs(self.aks_call_timeout_secs)
    }

    #[must_use]
    pub fn reconciler_requeue(&self) -> Duration {
        Duration::from_secs(self.reconciler_requeue_secs)
    }

    #[must_use]
    pub fn ready_requeue(&self) -> Duration {
        Duration::from_secs(self.ready_requeue_secs)
    }

    #[must_use]
    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    /// Picks workload identity when a token file is configured, else the
    /// client secret.
    ///
    /// # Errors
    ///
    /// Returns an error when neither is configured.
    pub fn credential_source(&self) -> anyhow::Result<CredentialSource> {
        if let Some(token_file) = &self.federated_token_file {
            return Ok(CredentialSource::WorkloadIdentity {
                tenant_id: self.tenant_id.clone(),
                client_id: self.client_id.clone(),
                token_file: token_file.clone(),
            });
        }
        match &self.client_secret {
            Some(secret) if !secret.is_empty() => Ok(CredentialSource::ClientSecret {
                tenant_id: self.tenant_id.clone(),
                client_id: self.client_id.clone(),
                client_secret: secret.clone(),
            }),
            _ => anyhow::bail!(
                "no Azure credentials configured: set AZURE_FEDERATED_TOKEN_FILE or AZURE_CLIENT_SECRET"
            ),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

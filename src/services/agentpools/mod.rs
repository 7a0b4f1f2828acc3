// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Agent pool service.
//!
//! One agent pool per `AzureManagedMachinePool`. After a successful pass the
//! hook hands replica ownership to the AKS autoscaler when it is enabled:
//! the owning `MachinePool` gets the `replicas-managed-by` annotation and its
//! replica count follows the pool.

pub mod client;
pub mod spec;

pub use client::AgentPoolsClient;
pub use spec::AgentPoolSpec;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::async_reconciler::AsyncReconciler;
use crate::azure::arm::ArmConnection;
use crate::azure::models::AgentPool;
use crate::azure::ResourceClient;
use crate::constants::AGENT_POOLS_SERVICE_NAME;
use crate::errors::ReconcileError;
use crate::scope::{AzureScope, ManagedMachinePoolScope};
use crate::service::{PostCreateOrUpdateHook, Service};
use crate::status_reasons::CONDITION_TYPE_AGENT_POOLS_READY;

/// Message used when the managed cluster of a pool does not exist yet.
pub const DEPENDENCY_NOT_READY_MESSAGE: &str = "agent pool dependent resource does not exist yet";

/// Agent pool service over any client implementation.
pub type AgentPoolService =
    Service<AgentPool, dyn ResourceClient<AgentPool>, ManagedMachinePoolScope>;

/// Builds the agent pool service.
#[must_use]
pub fn new_service(
    client: Arc<dyn ResourceClient<AgentPool>>,
    timeout: Duration,
    requeue: Duration,
) -> AgentPoolService {
    let reconciler = AsyncReconciler::new(client, CONDITION_TYPE_AGENT_POOLS_READY)
        .with_timeout(timeout)
        .with_requeue(requeue)
        .with_not_found_hint(DEPENDENCY_NOT_READY_MESSAGE);
    Service::new(AGENT_POOLS_SERVICE_NAME, reconciler).with_post_hook(AgentPoolHook)
}

/// Builds the agent pool service of one pass from the Azure access of `scope`.
#[must_use]
pub fn service_for_scope(
    connection: &ArmConnection,
    scope: &ManagedMachinePoolScope,
    timeout: Duration,
    requeue: Duration,
) -> AgentPoolService {
    let client = Arc::new(AgentPoolsClient::new(
        connection.client(scope.credential()),
        scope.subscription_id(),
    ));
    new_service(client, timeout, requeue)
}

/// Copies autoscaler ownership and observed counts back into the scope.
pub struct AgentPoolHook;

#[async_trait]
impl PostCreateOrUpdateHook<ManagedMachinePoolScope, AgentPool> for AgentPoolHook {
    async fn run(
        &self,
        scope: &mut ManagedMachinePoolScope,
        pool: &AgentPool,
    ) -> Result<(), ReconcileError> {
        let props = &pool.properties;
        if props.autoscaling_enabled() {
            scope.set_replicas_managed_by_autoscaler(true);
            if let Some(count) = props.count {
                debug!(pool = %scope.name(), count = count, "Replicas managed by the AKS autoscaler");
                scope.set_machine_pool_replicas(count);
            }
        } else {
            scope.set_replicas_managed_by_autoscaler(false);
        }
        scope.set_agent_pool_status(props.count, props.provisioning_state.clone());
        Ok(())
    }
}

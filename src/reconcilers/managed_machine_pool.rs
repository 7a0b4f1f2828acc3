// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `AzureManagedMachinePool` reconciliation.
//!
//! A pool is reconciled only once its control plane is initialized: the
//! first managed cluster create already carries every pool. After each pass
//! the owning `MachinePool` is patched when the autoscaler took over its
//! replica count.

use anyhow::Result;
use kube::api::{DynamicObject, ListParams, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::capi::{
    cluster_name, cluster_resource, is_cluster_paused, machine_pool_patch, machine_pool_resource,
    machine_pool_view, owner_machine_pool_name, requeue_action,
};
use super::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use super::retry::retry_api_call;
use super::status::mirror_ready_condition;
use crate::constants::TRANSIENT_ERROR_REQUEUE;
use crate::context::Context;
use crate::crd::{AzureManagedControlPlane, AzureManagedMachinePool};
use crate::labels::{CAPI_CLUSTER_NAME_LABEL, FINALIZER_MANAGED_MACHINE_POOL};
use crate::scope::{MachinePoolView, ManagedMachinePoolScope};
use crate::services::agentpools::{self, AgentPoolService};
use crate::status_reasons::CONDITION_TYPE_AGENT_POOLS_READY;

/// Reconciles an `AzureManagedMachinePool`.
///
/// # Errors
///
/// Returns an error when a Kubernetes API call fails. Azure failures are
/// recorded in status and mapped to the returned [`Action`].
pub async fn reconcile_managed_machine_pool(
    ctx: Arc<Context>,
    pool: AzureManagedMachinePool,
) -> Result<Action> {
    let client = &ctx.client;
    let name = pool.name_any();
    let namespace = pool.namespace().unwrap_or_default();

    if pool.metadata.deletion_timestamp.is_some() {
        return delete_managed_machine_pool(ctx, pool).await;
    }

    let Some(cluster) = cluster_name(&pool) else {
        warn!(
            namespace = %namespace,
            name = %name,
            label = CAPI_CLUSTER_NAME_LABEL,
            "Machine pool has no cluster label"
        );
        return Ok(Action::requeue(TRANSIENT_ERROR_REQUEUE));
    };

    let clusters: Api<DynamicObject> =
        Api::namespaced_with(client.clone(), &namespace, &cluster_resource());
    let paused = retry_api_call(|| async { clusters.get_opt(&cluster).await }, "get Cluster")
        .await?
        .as_ref()
        .is_some_and(is_cluster_paused);
    if paused {
        info!(namespace = %namespace, name = %name, cluster = %cluster, "Cluster is paused, skipping");
        return Ok(Action::await_change());
    }

    ensure_finalizer(client, &pool, FINALIZER_MANAGED_MACHINE_POOL).await?;

    let Some(machine_pool) = owner_machine_pool(client, &pool).await? else {
        info!(namespace = %namespace, name = %name, "Waiting for the owning MachinePool");
        return Ok(Action::requeue(TRANSIENT_ERROR_REQUEUE));
    };

    let control_plane = match find_control_plane(client, &namespace, &cluster).await? {
        Some(cp) if cp.status.as_ref().is_some_and(|s| s.initialized) => cp,
        _ => {
            info!(
                namespace = %namespace,
                name = %name,
                cluster = %cluster,
                "Waiting for the control plane to be initialized"
            );
            return Ok(Action::requeue(TRANSIENT_ERROR_REQUEUE));
        }
    };

    let mut scope = ManagedMachinePoolScope::new(
        &pool,
        machine_pool,
        &control_plane.name_any(),
        &control_plane.spec.resource_group_name,
        ctx.identity.clone(),
    );
    let outcome = agent_pool_service(&ctx, &scope).reconcile(&mut scope).await;
    flush_scope(client, &pool, &scope).await?;

    match &outcome {
        Ok(()) => debug!(namespace = %namespace, name = %name, "Agent pool reconciled"),
        Err(e) if e.is_terminal() => {
            warn!(namespace = %namespace, name = %name, error = %e, "Agent pool reconcile failed");
        }
        Err(e) => info!(
            namespace = %namespace,
            name = %name,
            reason = %e,
            requeue_after = ?e.requeue_after(),
            "Agent pool not ready yet"
        ),
    }

    Ok(requeue_action(&outcome, &ctx.requeue))
}

async fn delete_managed_machine_pool(
    ctx: Arc<Context>,
    pool: AzureManagedMachinePool,
) -> Result<Action> {
    if !has_finalizer(&pool, FINALIZER_MANAGED_MACHINE_POOL) {
        return Ok(Action::await_change());
    }

    let client = &ctx.client;
    let name = pool.name_any();
    let namespace = pool.namespace().unwrap_or_default();

    // Pools go away with their managed cluster.
    let control_plane = match cluster_name(&pool) {
        Some(cluster) => find_control_plane(client, &namespace, &cluster).await?,
        None => None,
    };
    let Some(control_plane) =
        control_plane.filter(|cp| cp.metadata.deletion_timestamp.is_none())
    else {
        info!(namespace = %namespace, name = %name, "Control plane is going away, releasing agent pool");
        remove_finalizer(client, &pool, FINALIZER_MANAGED_MACHINE_POOL).await?;
        return Ok(Action::await_change());
    };

    let machine_pool = owner_machine_pool(client, &pool).await?.unwrap_or_default();
    let mut scope = ManagedMachinePoolScope::new(
        &pool,
        machine_pool,
        &control_plane.name_any(),
        &control_plane.spec.resource_group_name,
        ctx.identity.clone(),
    );

    info!(namespace = %namespace, name = %name, "Deleting agent pool");
    match agent_pool_service(&ctx, &scope).delete(&mut scope).await {
        Ok(()) => {
            remove_finalizer(client, &pool, FINALIZER_MANAGED_MACHINE_POOL).await?;
            info!(namespace = %namespace, name = %name, "Agent pool deleted");
            Ok(Action::await_change())
        }
        Err(e) => {
            patch_status(client, &pool, &scope).await?;
            info!(namespace = %namespace, name = %name, reason = %e, "Agent pool deletion pending");
            if e.is_terminal() {
                Ok(Action::requeue(ctx.requeue.error))
            } else {
                Ok(Action::requeue(e.requeue_after()))
            }
        }
    }
}

fn agent_pool_service(ctx: &Context, scope: &ManagedMachinePoolScope) -> AgentPoolService {
    agentpools::service_for_scope(&ctx.arm, scope, ctx.call_timeout, ctx.operation_requeue)
}

async fn owner_machine_pool(
    client: &Client,
    pool: &AzureManagedMachinePool,
) -> Result<Option<MachinePoolView>> {
    let Some(owner) = owner_machine_pool_name(pool) else {
        return Ok(None);
    };
    let api: Api<DynamicObject> = Api::namespaced_with(
        client.clone(),
        &pool.namespace().unwrap_or_default(),
        &machine_pool_resource(),
    );
    let found = retry_api_call(|| async { api.get_opt(&owner).await }, "get MachinePool").await?;
    Ok(found.as_ref().map(machine_pool_view))
}

async fn find_control_plane(
    client: &Client,
    namespace: &str,
    cluster: &str,
) -> Result<Option<AzureManagedControlPlane>> {
    let api: Api<AzureManagedControlPlane> = Api::namespaced(client.clone(), namespace);
    let selector = format!("{CAPI_CLUSTER_NAME_LABEL}={cluster}");
    let params = ListParams::default().labels(&selector);
    let list = retry_api_call(
        || async { api.list(&params).await },
        "list AzureManagedControlPlanes",
    )
    .await?;
    Ok(list.items.into_iter().next())
}

async fn flush_scope(
    client: &Client,
    pool: &AzureManagedMachinePool,
    scope: &ManagedMachinePoolScope,
) -> Result<()> {
    patch_status(client, pool, scope).await?;

    if scope.machine_pool_changed() {
        let view = scope.machine_pool();
        let api: Api<DynamicObject> =
            Api::namespaced_with(client.clone(), &view.namespace, &machine_pool_resource());
        let patch = machine_pool_patch(view);
        retry_api_call(
            || async {
                api.patch(&view.name, &PatchParams::default(), &Patch::Merge(&patch))
                    .await
            },
            "patch MachinePool",
        )
        .await?;
        info!(
            namespace = %view.namespace,
            machine_pool = %view.name,
            replicas = ?view.replicas,
            "MachinePool updated from agent pool"
        );
    }

    Ok(())
}

async fn patch_status(
    client: &Client,
    pool: &AzureManagedMachinePool,
    scope: &ManagedMachinePoolScope,
) -> Result<()> {
    let mut status = scope.status().clone();
    mirror_ready_condition(&mut status.conditions, CONDITION_TYPE_AGENT_POOLS_READY);
    status.observed_generation = pool.metadata.generation;

    if pool.status.as_ref() == Some(&status) {
        return Ok(());
    }

    let api: Api<AzureManagedMachinePool> = Api::namespaced(client.clone(), scope.namespace());
    let patch = json!({ "status": status });
    retry_api_call(
        || async {
            api.patch_status(scope.name(), &PatchParams::default(), &Patch::Merge(&patch))
                .await
        },
        "patch AzureManagedMachinePool status",
    )
    .await?;
    Ok(())
}

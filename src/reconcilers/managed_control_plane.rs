// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `AzureManagedControlPlane` reconciliation.
//!
//! One pass builds a [`ManagedControlPlaneScope`], runs the managed cluster
//! service against it and flushes what the scope buffered:
//!
//! 1. Status (conditions, in-flight operations, versions, identities)
//! 2. `spec.controlPlaneEndpoint`
//! 3. Admin and user kubeconfig secrets, applied server-side
//!
//! Deletion is guarded by a finalizer that is only removed once the managed
//! cluster is gone in Azure.

use anyhow::{Context as _, Result};
use k8s_openapi::api::core::v1::Secret;
use kube::api::{DynamicObject, ListParams, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::capi::{
    cluster_name, cluster_resource, control_plane_owner_reference, is_cluster_paused,
    kubeconfig_secret, kubeconfig_secret_name, machine_pool_resource, machine_pool_view,
    owner_machine_pool_name, requeue_action,
};
use super::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use super::retry::retry_api_call;
use super::status::mirror_ready_condition;
use crate::constants::{
    ADMIN_KUBECONFIG_SECRET_SUFFIX, FIELD_MANAGER, TRANSIENT_ERROR_REQUEUE,
    USER_KUBECONFIG_SECRET_SUFFIX,
};
use crate::context::Context;
use crate::crd::{AzureManagedControlPlane, AzureManagedMachinePool};
use crate::errors::ReconcileError;
use crate::labels::{CAPI_CLUSTER_NAME_LABEL, FINALIZER_MANAGED_CONTROL_PLANE};
use crate::scope::ManagedControlPlaneScope;
use crate::services::agentpools::AgentPoolSpec;
use crate::services::managedclusters::{self, ManagedClusterService};
use crate::status_reasons::CONDITION_TYPE_MANAGED_CLUSTER_RUNNING;

/// Reconciles an `AzureManagedControlPlane`.
///
/// # Errors
///
/// Returns an error when a Kubernetes API call fails. Azure failures are
/// recorded in status and mapped to the returned [`Action`].
pub async fn reconcile_managed_control_plane(
    ctx: Arc<Context>,
    control_plane: AzureManagedControlPlane,
) -> Result<Action> {
    let client = &ctx.client;
    let name = control_plane.name_any();
    let namespace = control_plane.namespace().unwrap_or_default();
    let cluster = cluster_name(&control_plane).unwrap_or_else(|| name.clone());

    if control_plane.metadata.deletion_timestamp.is_some() {
        return delete_managed_control_plane(ctx, control_plane).await;
    }

    if cluster_paused(client, &namespace, &cluster).await? {
        info!(namespace = %namespace, name = %name, cluster = %cluster, "Cluster is paused, skipping");
        return Ok(Action::await_change());
    }

    ensure_finalizer(client, &control_plane, FINALIZER_MANAGED_CONTROL_PLANE).await?;

    let agent_pools = agent_pool_specs(client, &control_plane, &cluster).await?;
    let initialized = control_plane.status.as_ref().is_some_and(|s| s.initialized);
    if agent_pools.is_empty() && !initialized {
        info!(
            namespace = %namespace,
            name = %name,
            "Waiting for agent pools before creating the managed cluster"
        );
        return Ok(Action::requeue(TRANSIENT_ERROR_REQUEUE));
    }

    let mut scope =
        ManagedControlPlaneScope::new(&control_plane, agent_pools, ctx.identity.clone());
    let outcome = managed_cluster_service(&ctx, &scope).reconcile(&mut scope).await;
    flush_scope(client, &control_plane, &cluster, &scope).await?;

    match &outcome {
        Ok(()) => debug!(namespace = %namespace, name = %name, "Managed cluster reconciled"),
        Err(e) if e.is_terminal() => {
            warn!(namespace = %namespace, name = %name, error = %e, "Managed cluster reconcile failed");
        }
        Err(e) => info!(
            namespace = %namespace,
            name = %name,
            reason = %e,
            requeue_after = ?e.requeue_after(),
            "Managed cluster not ready yet"
        ),
    }

    Ok(requeue_action(&outcome, &ctx.requeue))
}

async fn delete_managed_control_plane(
    ctx: Arc<Context>,
    control_plane: AzureManagedControlPlane,
) -> Result<Action> {
    if !has_finalizer(&control_plane, FINALIZER_MANAGED_CONTROL_PLANE) {
        return Ok(Action::await_change());
    }

    let name = control_plane.name_any();
    let namespace = control_plane.namespace().unwrap_or_default();
    info!(namespace = %namespace, name = %name, "Deleting managed cluster");

    let mut scope =
        ManagedControlPlaneScope::new(&control_plane, Vec::new(), ctx.identity.clone());
    match managed_cluster_service(&ctx, &scope).delete(&mut scope).await {
        Ok(()) => {
            remove_finalizer(&ctx.client, &control_plane, FINALIZER_MANAGED_CONTROL_PLANE).await?;
            info!(namespace = %namespace, name = %name, "Managed cluster deleted");
            Ok(Action::await_change())
        }
        Err(e) => {
            patch_status(&ctx.client, &control_plane, &scope).await?;
            info!(namespace = %namespace, name = %name, reason = %e, "Managed cluster deletion pending");
            Ok(delete_action(&e, &ctx))
        }
    }
}

fn managed_cluster_service(ctx: &Context, scope: &ManagedControlPlaneScope) -> ManagedClusterService {
    managedclusters::service_for_scope(&ctx.arm, scope, ctx.call_timeout, ctx.operation_requeue)
}

/// Deletion never waits for a spec change; terminal failures retry on the
/// error interval.
fn delete_action(err: &ReconcileError, ctx: &Context) -> Action {
    if err.is_terminal() {
        Action::requeue(ctx.requeue.error)
    } else {
        Action::requeue(err.requeue_after())
    }
}

async fn cluster_paused(client: &Client, namespace: &str, cluster: &str) -> Result<bool> {
    let api: Api<DynamicObject> =
        Api::namespaced_with(client.clone(), namespace, &cluster_resource());
    let found = retry_api_call(|| async { api.get_opt(cluster).await }, "get Cluster").await?;
    Ok(found.as_ref().is_some_and(is_cluster_paused))
}

/// Specs of every agent pool of `cluster`, embedded on the first create.
async fn agent_pool_specs(
    client: &Client,
    control_plane: &AzureManagedControlPlane,
    cluster: &str,
) -> Result<Vec<AgentPoolSpec>> {
    let namespace = control_plane.namespace().unwrap_or_default();
    let pools_api: Api<AzureManagedMachinePool> = Api::namespaced(client.clone(), &namespace);
    let machine_pools: Api<DynamicObject> =
        Api::namespaced_with(client.clone(), &namespace, &machine_pool_resource());

    let selector = format!("{CAPI_CLUSTER_NAME_LABEL}={cluster}");
    let params = ListParams::default().labels(&selector);
    let pools = retry_api_call(|| async { pools_api.list(&params).await }, "list AzureManagedMachinePools")
        .await?;

    let mut specs = Vec::with_capacity(pools.items.len());
    for pool in &pools.items {
        let view = match owner_machine_pool_name(pool) {
            Some(owner) => retry_api_call(|| async { machine_pools.get_opt(&owner).await }, "get MachinePool")
                .await?
                .as_ref()
                .map(machine_pool_view),
            None => None,
        };
        let (replicas, version) = view.map_or((None, None), |v| (v.replicas, v.version));
        specs.push(AgentPoolSpec::from_machine_pool(
            pool,
            replicas,
            version,
            &control_plane.name_any(),
            &control_plane.spec.resource_group_name,
        ));
    }
    Ok(specs)
}

/// Writes everything `scope` buffered back to Kubernetes.
async fn flush_scope(
    client: &Client,
    control_plane: &AzureManagedControlPlane,
    cluster: &str,
    scope: &ManagedControlPlaneScope,
) -> Result<()> {
    patch_status(client, control_plane, scope).await?;

    let current = control_plane
        .spec
        .control_plane_endpoint
        .as_ref()
        .filter(|e| !e.is_zero());
    if let Some(endpoint) = scope.control_plane_endpoint() {
        if current != Some(endpoint) {
            let api: Api<AzureManagedControlPlane> =
                Api::namespaced(client.clone(), scope.namespace());
            let patch = json!({ "spec": { "controlPlaneEndpoint": endpoint } });
            retry_api_call(
                || async {
                    api.patch(scope.name(), &PatchParams::default(), &Patch::Merge(&patch))
                        .await
                },
                "patch AzureManagedControlPlane endpoint",
            )
            .await?;
            info!(
                namespace = %scope.namespace(),
                name = %scope.name(),
                host = %endpoint.host,
                "Control plane endpoint set"
            );
        }
    }

    let kubeconfigs = [
        (ADMIN_KUBECONFIG_SECRET_SUFFIX, scope.admin_kubeconfig()),
        (USER_KUBECONFIG_SECRET_SUFFIX, scope.user_kubeconfig()),
    ];
    let secrets: Api<Secret> = Api::namespaced(client.clone(), scope.namespace());
    for (suffix, kubeconfig) in kubeconfigs {
        let Some(kubeconfig) = kubeconfig else {
            continue;
        };
        let secret_name = kubeconfig_secret_name(cluster, suffix);
        let secret = kubeconfig_secret(
            &secret_name,
            scope.namespace(),
            cluster,
            control_plane_owner_reference(control_plane),
            kubeconfig,
        );
        let params = PatchParams::apply(FIELD_MANAGER).force();
        retry_api_call(
            || async { secrets.patch(&secret_name, &params, &Patch::Apply(&secret)).await },
            "apply kubeconfig Secret",
        )
        .await
        .with_context(|| format!("failed to write kubeconfig secret {secret_name}"))?;
        debug!(namespace = %scope.namespace(), secret = %secret_name, "Kubeconfig secret applied");
    }

    Ok(())
}

async fn patch_status(
    client: &Client,
    control_plane: &AzureManagedControlPlane,
    scope: &ManagedControlPlaneScope,
) -> Result<()> {
    let mut status = scope.status().clone();
    mirror_ready_condition(&mut status.conditions, CONDITION_TYPE_MANAGED_CLUSTER_RUNNING);
    status.observed_generation = control_plane.metadata.generation;

    if control_plane.status.as_ref() == Some(&status) {
        return Ok(());
    }

    let api: Api<AzureManagedControlPlane> = Api::namespaced(client.clone(), scope.namespace());
    let patch = json!({ "status": status });
    retry_api_call(
        || async {
            api.patch_status(scope.name(), &PatchParams::default(), &Patch::Merge(&patch))
                .await
        },
        "patch AzureManagedControlPlane status",
    )
    .await?;
    Ok(())
}

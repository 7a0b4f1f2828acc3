// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster API glue shared by both reconcilers.
//!
//! `MachinePool` and `Cluster` belong to Cluster API, so they are read and
//! patched as [`DynamicObject`]s. Everything here is pure; the reconcilers do
//! the I/O.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use serde_json::{json, Value};

use crate::constants::{
    API_GROUP_VERSION, CAPI_GROUP, CAPI_VERSION, KIND_AZURE_MANAGED_CONTROL_PLANE, KIND_CLUSTER,
    KIND_MACHINE_POOL, KUBECONFIG_SECRET_KEY,
};
use crate::context::Requeue;
use crate::crd::AzureManagedControlPlane;
use crate::errors::ReconcileError;
use crate::labels::{CAPI_CLUSTER_NAME_LABEL, REPLICAS_MANAGED_BY_ANNOTATION};
use crate::scope::MachinePoolView;

/// `ApiResource` of the Cluster API `MachinePool` kind.
#[must_use]
pub fn machine_pool_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(CAPI_GROUP, CAPI_VERSION, KIND_MACHINE_POOL))
}

/// `ApiResource` of the Cluster API `Cluster` kind.
#[must_use]
pub fn cluster_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(CAPI_GROUP, CAPI_VERSION, KIND_CLUSTER))
}

/// Name of the Cluster API cluster `resource` belongs to.
#[must_use]
pub fn cluster_name<K: Resource>(resource: &K) -> Option<String> {
    resource.labels().get(CAPI_CLUSTER_NAME_LABEL).cloned()
}

/// Name of the `MachinePool` that owns `resource`, if any.
#[must_use]
pub fn owner_machine_pool_name<K: Resource>(resource: &K) -> Option<String> {
    resource
        .owner_references()
        .iter()
        .find(|owner| {
            owner.kind == KIND_MACHINE_POOL
                && owner
                    .api_version
                    .split('/')
                    .next()
                    .is_some_and(|group| group == CAPI_GROUP)
        })
        .map(|owner| owner.name.clone())
}

/// Returns `true` when `spec.paused` is set on a Cluster API `Cluster`.
#[must_use]
pub fn is_cluster_paused(cluster: &DynamicObject) -> bool {
    cluster
        .data
        .pointer("/spec/paused")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Reads the fields of a `MachinePool` the agent pool depends on.
#[must_use]
pub fn machine_pool_view(machine_pool: &DynamicObject) -> MachinePoolView {
    let replicas = machine_pool
        .data
        .pointer("/spec/replicas")
        .and_then(Value::as_i64)
        .and_then(|r| i32::try_from(r).ok());
    let version = machine_pool
        .data
        .pointer("/spec/template/spec/version")
        .and_then(Value::as_str)
        .map(str::to_string);

    MachinePoolView {
        name: machine_pool.name_any(),
        namespace: machine_pool.namespace().unwrap_or_default(),
        replicas,
        version,
        annotations: machine_pool.annotations().clone(),
    }
}

/// Merge patch bringing a `MachinePool` in line with `view`.
///
/// The autoscaler annotation is removed with an explicit `null`.
#[must_use]
pub fn machine_pool_patch(view: &MachinePoolView) -> Value {
    let managed_by = view
        .annotations
        .get(REPLICAS_MANAGED_BY_ANNOTATION)
        .map_or(Value::Null, |v| Value::String(v.clone()));
    let mut patch = json!({
        "metadata": {
            "annotations": { REPLICAS_MANAGED_BY_ANNOTATION: managed_by }
        }
    });
    if let Some(replicas) = view.replicas {
        patch["spec"] = json!({ "replicas": replicas });
    }
    patch
}

/// Name of a kubeconfig secret: `<cluster>-<suffix>`.
#[must_use]
pub fn kubeconfig_secret_name(cluster: &str, suffix: &str) -> String {
    format!("{cluster}-{suffix}")
}

/// Owner reference pointing at `control_plane`.
#[must_use]
pub fn control_plane_owner_reference(control_plane: &AzureManagedControlPlane) -> OwnerReference {
    OwnerReference {
        api_version: API_GROUP_VERSION.to_string(),
        kind: KIND_AZURE_MANAGED_CONTROL_PLANE.to_string(),
        name: control_plane.name_any(),
        uid: control_plane.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Opaque secret holding `kubeconfig` under the `value` key.
#[must_use]
pub fn kubeconfig_secret(
    name: &str,
    namespace: &str,
    cluster: &str,
    owner: OwnerReference,
    kubeconfig: &[u8],
) -> Secret {
    let mut labels = BTreeMap::new();
    labels.insert(CAPI_CLUSTER_NAME_LABEL.to_string(), cluster.to_string());

    let mut data = BTreeMap::new();
    data.insert(
        KUBECONFIG_SECRET_KEY.to_string(),
        ByteString(kubeconfig.to_vec()),
    );

    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(data),
        ..Default::default()
    }
}

/// Maps the outcome of a service pass to the next controller action.
///
/// Terminal errors wait for the object to change; every other error
/// requeues after its own hint.
#[must_use]
pub fn requeue_action(outcome: &Result<(), ReconcileError>, requeue: &Requeue) -> Action {
    match outcome {
        Ok(()) => Action::requeue(requeue.ready),
        Err(e) if e.is_terminal() => Action::await_change(),
        Err(e) => Action::requeue(e.requeue_after()),
    }
}

#[cfg(test)]
#[path = "capi_tests.rs"]
mod capi_tests;

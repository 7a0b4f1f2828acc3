// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for namespaced custom resources.
//!
//! Each AKS kind carries a finalizer so the Azure resource behind it is
//! deleted before Kubernetes forgets the object. Both operations are
//! idempotent and patch only `metadata.finalizers`.
//!
//! # Example
//!
//! ```rust,ignore
//! use capz_aks::reconcilers::finalizers::{ensure_finalizer, remove_finalizer};
//! use capz_aks::labels::FINALIZER_MANAGED_CONTROL_PLANE;
//!
//! ensure_finalizer(&client, &control_plane, FINALIZER_MANAGED_CONTROL_PLANE).await?;
//! // ... delete the managed cluster ...
//! remove_finalizer(&client, &control_plane, FINALIZER_MANAGED_CONTROL_PLANE).await?;
//! ```

use anyhow::Result;
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::info;

/// Returns `true` when `finalizer` is present on `resource`.
#[must_use]
pub fn has_finalizer<T: Resource>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == finalizer))
}

/// Finalizer list with `finalizer` appended, or `None` when already present.
#[must_use]
pub fn with_finalizer(current: Option<&Vec<String>>, finalizer: &str) -> Option<Vec<String>> {
    let mut finalizers = current.cloned().unwrap_or_default();
    if finalizers.iter().any(|f| f == finalizer) {
        return None;
    }
    finalizers.push(finalizer.to_string());
    Some(finalizers)
}

/// Finalizer list without `finalizer`, or `None` when it was absent.
#[must_use]
pub fn without_finalizer(current: Option<&Vec<String>>, finalizer: &str) -> Option<Vec<String>> {
    let current = current?;
    if !current.iter().any(|f| f == finalizer) {
        return None;
    }
    Some(current.iter().filter(|f| *f != finalizer).cloned().collect())
}

async fn patch_finalizers<T>(client: &Client, resource: &T, finalizers: Vec<String>) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&resource.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Add a finalizer to a resource if not already present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn ensure_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if let Some(finalizers) = with_finalizer(resource.meta().finalizers.as_ref(), finalizer) {
        info!(
            kind = %T::kind(&()),
            namespace = %resource.namespace().unwrap_or_default(),
            name = %resource.name_any(),
            finalizer = %finalizer,
            "Adding finalizer"
        );
        patch_finalizers(client, resource, finalizers).await?;
    }
    Ok(())
}

/// Remove a finalizer from a resource if present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn remove_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if let Some(finalizers) = without_finalizer(resource.meta().finalizers.as_ref(), finalizer) {
        info!(
            kind = %T::kind(&()),
            namespace = %resource.namespace().unwrap_or_default(),
            name = %resource.name_any(),
            finalizer = %finalizer,
            "Removing finalizer"
        );
        patch_finalizers(client, resource, finalizers).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource spec contract.
//!
//! A [`ResourceSpec`] names one Azure resource and computes the parameters to
//! send for it, given what Azure currently reports. The async reconciler only
//! ever talks to specs through this trait, so every resource kind plugs its
//! own identity and diffing rules into the same state machine.
//!
//! # Contract of [`ResourceSpec::parameters`]
//!
//! - `existing == None`: return the complete desired body.
//! - `existing == Some(observed)`:
//!   1. a non-terminal provisioning state is a transient error (20s) naming
//!      the state; no call is made;
//!   2. both sides are normalized and compared; no difference yields `Ok(None)`;
//!   3. autoscaled counts follow the observed count;
//!   4. system-reserved keys from `observed` are merged into the result.
//!
//! The result is an owned value; nothing in it borrows from `existing`.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;

use crate::constants::TERMINAL_PROVISIONING_STATES;
use crate::errors::ReconcileError;
use crate::labels::CUSTOM_HEADER_ANNOTATION_PREFIX;

/// Identity of an Azure resource as seen by the reconciler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    /// Resource group.
    pub group: String,
    /// Parent resource name (empty for top-level resources).
    pub owner: String,
    /// Resource name.
    pub name: String,
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// Desired state of one Azure resource of type `T`.
pub trait ResourceSpec<T>: Send + Sync {
    /// Name of the resource in Azure.
    fn resource_name(&self) -> String;

    /// Resource group holding the resource.
    fn resource_group_name(&self) -> String;

    /// Name of the parent resource, empty for top-level resources.
    fn owner_resource_name(&self) -> String;

    /// Identity used for store keys and messages.
    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity {
            group: self.resource_group_name(),
            owner: self.owner_resource_name(),
            name: self.resource_name(),
        }
    }

    /// Extra HTTP headers sent with create and update calls.
    fn custom_headers(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Computes the body to send, or `Ok(None)` when `existing` already matches.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::Transient`] when `existing` is in a non-terminal state;
    /// [`ReconcileError::Terminal`] when the declared input is invalid.
    fn parameters(&self, existing: Option<&T>) -> Result<Option<T>, ReconcileError>;
}

/// Returns `true` when Azure will accept a new operation on a resource in `state`.
///
/// A missing state is treated as terminal.
#[must_use]
pub fn is_terminal_state(state: Option<&str>) -> bool {
    state.is_none_or(|s| TERMINAL_PROVISIONING_STATES.contains(&s))
}

/// Transient error returned when an update is requested while Azure is still
/// working on the resource.
#[must_use]
pub fn non_terminal_error(kind: &str, state: &str) -> ReconcileError {
    ReconcileError::transient_default(format!(
        "Unable to update existing {kind} in non-terminal state. {kind} must be in one of the following provisioning states: {}. Actual state: {state}",
        terminal_states_list()
    ))
}

fn terminal_states_list() -> String {
    match TERMINAL_PROVISIONING_STATES.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, or {last}", rest.join(", ")),
        Some((last, _)) => (*last).to_string(),
        None => String::new(),
    }
}

/// Copies keys starting with `prefix` from `observed` into `desired`.
///
/// Keys already present in `desired` win. `desired` is created when it is
/// `None` and there is something to merge.
pub fn merge_reserved(
    observed: Option<&BTreeMap<String, String>>,
    desired: &mut Option<BTreeMap<String, String>>,
    prefix: &str,
) {
    let Some(observed) = observed else {
        return;
    };
    for (key, value) in observed.iter().filter(|(k, _)| k.starts_with(prefix)) {
        desired
            .get_or_insert_with(BTreeMap::new)
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

/// Applies JSON merge patches (RFC 7386), in order, to `desired`.
///
/// # Errors
///
/// Returns a terminal error when a patch is not valid JSON or the patched
/// document no longer deserializes into `T`.
pub fn apply_patches<T>(desired: T, patches: &[String]) -> Result<T, ReconcileError>
where
    T: Serialize + DeserializeOwned,
{
    if patches.is_empty() {
        return Ok(desired);
    }
    let mut doc = serde_json::to_value(&desired)
        .map_err(|e| ReconcileError::terminal(format!("failed to serialize parameters: {e}")))?;
    for (i, raw) in patches.iter().enumerate() {
        let patch: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| ReconcileError::terminal(format!("failed to parse patch {i}: {e}")))?;
        json_patch::merge(&mut doc, &patch);
    }
    serde_json::from_value(doc)
        .map_err(|e| ReconcileError::terminal(format!("failed to apply patches: {e}")))
}

/// Extracts custom request headers from annotations.
///
/// `infrastructure.cluster.x-k8s.io/custom-header-Foo: bar` becomes `Foo: bar`.
#[must_use]
pub fn custom_headers_from_annotations(
    annotations: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    annotations
        .iter()
        .filter_map(|(k, v)| {
            k.strip_prefix(CUSTOM_HEADER_ANNOTATION_PREFIX)
                .filter(|name| !name.is_empty())
                .map(|name| (name.to_string(), v.clone()))
        })
        .collect()
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod spec_tests;

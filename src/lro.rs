// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Long-running operation store.
//!
//! In-flight Azure operations are persisted as [`Future`] records in the parent
//! object's `status.longRunningOperationStates`. A record holds the poller's
//! resume token, base64-encoded, so the next pass (possibly in a restarted
//! process) resumes polling instead of issuing the request again.
//!
//! The store is keyed by `(name, service_name, type)`; at most one record
//! exists per key.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::errors::AzureError;

pub use crate::crd::{Future, FutureType};

/// Returns the record for `(name, service, kind)`, if any.
#[must_use]
pub fn get_long_running_operation_state<'a>(
    futures: &'a [Future],
    name: &str,
    service: &str,
    kind: FutureType,
) -> Option<&'a Future> {
    futures
        .iter()
        .find(|f| f.name == name && f.service_name == service && f.r#type == kind)
}

/// Stores `future`, replacing any record with the same key.
pub fn set_long_running_operation_state(futures: &mut Vec<Future>, future: Future) {
    if let Some(existing) = futures.iter_mut().find(|f| {
        f.name == future.name && f.service_name == future.service_name && f.r#type == future.r#type
    }) {
        *existing = future;
        return;
    }
    futures.push(future);
}

/// Removes the record for `(name, service, kind)`. Missing records are ignored.
pub fn delete_long_running_operation_state(
    futures: &mut Vec<Future>,
    name: &str,
    service: &str,
    kind: FutureType,
) {
    futures.retain(|f| !(f.name == name && f.service_name == service && f.r#type == kind));
}

/// Encodes a poller resume token for storage in [`Future::data`].
#[must_use]
pub fn encode_resume_token(token: &str) -> String {
    STANDARD.encode(token.as_bytes())
}

/// Decodes [`Future::data`] back into a resume token.
///
/// # Errors
///
/// Returns [`AzureError::InvalidResumeToken`] when the data is not valid
/// base64 or not UTF-8.
pub fn decode_resume_token(data: &str) -> Result<String, AzureError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| AzureError::InvalidResumeToken(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AzureError::InvalidResumeToken(e.to_string()))
}

/// Builds a [`Future`] for an operation whose poller returned `token`.
#[must_use]
pub fn new_future(
    kind: FutureType,
    service: &str,
    name: &str,
    resource_group: &str,
    token: &str,
) -> Future {
    Future {
        r#type: kind,
        service_name: service.to_string(),
        name: name.to_string(),
        resource_group: resource_group.to_string(),
        data: encode_resume_token(token),
    }
}

#[cfg(test)]
#[path = "lro_tests.rs"]
mod lro_tests;

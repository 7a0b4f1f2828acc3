// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP error code mapping to failure reasons.
//!
//! This module maps HTTP status codes and errors returned by Azure Resource
//! Manager to short, condition-style reasons. The reconciler records them as
//! the `reason` label of the Azure error metrics; conditions carry the full
//! error message instead.
//!
//! # Usage
//!
//! ```rust
//! use capz_aks::http_errors::map_http_error_to_reason;
//!
//! let (reason, message) = map_http_error_to_reason(404);
//! assert_eq!(reason, "AzureResourceNotFound");
//!
//! let (reason, message) = map_http_error_to_reason(429);
//! assert_eq!(reason, "AzureThrottled");
//! ```

use crate::errors::AzureError;
use crate::status_reasons::{
    REASON_AZURE_AUTH_FAILED, REASON_AZURE_BAD_REQUEST, REASON_AZURE_CONFLICT,
    REASON_AZURE_NOT_FOUND, REASON_AZURE_SERVER_ERROR, REASON_AZURE_THROTTLED,
    REASON_AZURE_UNEXPECTED, REASON_FAILED, REASON_TRANSIENT_FAILURE,
};

/// Map an ARM HTTP status code to a condition reason and message.
///
/// # HTTP Code Mapping
///
/// | HTTP Code | Reason | Meaning |
/// |-----------|--------|---------|
/// | 400 | `AzureBadRequest` | Invalid request body or parameters |
/// | 401 | `AzureAuthorizationFailed` | Token missing or expired |
/// | 403 | `AzureAuthorizationFailed` | Identity lacks permission |
/// | 404 | `AzureResourceNotFound` | Resource or parent not found |
/// | 409 | `AzureConflict` | Another operation is in progress |
/// | 429 | `AzureThrottled` | Subscription or tenant throttled |
/// | 5xx | `AzureServerError` | Azure internal error |
/// | Other | `AzureUnexpectedError` | Unexpected status |
#[must_use]
pub fn map_http_error_to_reason(status_code: u16) -> (&'static str, String) {
    match status_code {
        400 => (
            REASON_AZURE_BAD_REQUEST,
            "Azure rejected the request (400)".into(),
        ),
        401 => (
            REASON_AZURE_AUTH_FAILED,
            "Azure authentication required (401)".into(),
        ),
        403 => (
            REASON_AZURE_AUTH_FAILED,
            "Azure authorization failed (403)".into(),
        ),
        404 => (
            REASON_AZURE_NOT_FOUND,
            "Azure resource not found (404)".into(),
        ),
        409 => (
            REASON_AZURE_CONFLICT,
            "Conflicting Azure operation in progress (409)".into(),
        ),
        429 => (
            REASON_AZURE_THROTTLED,
            "Azure request throttled (429)".into(),
        ),
        500..=599 => (
            REASON_AZURE_SERVER_ERROR,
            format!("Azure internal error ({status_code})"),
        ),
        _ => (
            REASON_AZURE_UNEXPECTED,
            format!("Unexpected HTTP status from Azure ({status_code})"),
        ),
    }
}

/// Map an [`AzureError`] to a condition reason.
///
/// Errors with an HTTP status use [`map_http_error_to_reason`]; the rest are
/// split by whether they are expected to clear on their own.
#[must_use]
pub fn map_azure_error_to_reason(err: &AzureError) -> &'static str {
    if let Some(status) = err.status_code() {
        return map_http_error_to_reason(status).0;
    }
    match err {
        AzureError::Auth(_) => REASON_AZURE_AUTH_FAILED,
        e if e.is_transient() => REASON_TRANSIENT_FAILURE,
        _ => REASON_FAILED,
    }
}

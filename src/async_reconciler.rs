// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Async reconciler: the per-resource create/update/delete state machine.
//!
//! Every pass consults the long-running operation store first. An in-flight
//! operation is resumed from its token and never re-issued; otherwise the
//! current resource is read, the spec computes the parameters to send, and a
//! call is started only when there is a difference. A call that outlives its
//! deadline leaves its resume token in the store for the next pass.
//!
//! There is no retry inside the reconciler; the controller's requeue is the
//! retry source.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::azure::{AsyncOperation, ResourceClient};
use crate::constants::{DEFAULT_AZURE_CALL_TIMEOUT, DEFAULT_RECONCILER_REQUEUE};
use crate::errors::{AzureError, ReconcileError};
use crate::http_errors::map_azure_error_to_reason;
use crate::lro::{decode_resume_token, new_future, FutureType};
use crate::metrics;
use crate::scope::FutureScope;
use crate::spec::{ResourceIdentity, ResourceSpec};

/// Message surfaced when a stored resume token cannot be used.
pub const DECODE_FAILURE_MESSAGE: &str =
    "could not decode future data, resetting long-running operation state";

/// Outcome of one reconcile step for one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome<T> {
    /// Nothing left to do; carries the resource as Azure reports it, if known.
    Done(Option<T>),
    /// An operation is running in Azure; its token is in the store.
    InProgress {
        requeue_after: Duration,
        message: String,
    },
    /// The step could not make progress now.
    TransientFail {
        requeue_after: Duration,
        error: ReconcileError,
    },
    /// The step failed and needs a change of the declared input.
    PermanentFail(ReconcileError),
}

impl<T> ReconcileOutcome<T> {
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// The error carried by a non-`Done` outcome.
    #[must_use]
    pub fn error(&self) -> Option<ReconcileError> {
        match self {
            Self::Done(_) => None,
            Self::InProgress {
                requeue_after,
                message,
            } => Some(ReconcileError::not_done(message.clone(), *requeue_after)),
            Self::TransientFail { error, .. } | Self::PermanentFail(error) => Some(error.clone()),
        }
    }

    /// Converts the outcome into the `Result` shape used by the outer controller.
    ///
    /// # Errors
    ///
    /// Every non-`Done` outcome becomes the matching [`ReconcileError`].
    pub fn into_result(self) -> Result<Option<T>, ReconcileError> {
        match self {
            Self::Done(result) => Ok(result),
            Self::InProgress {
                requeue_after,
                message,
            } => Err(ReconcileError::not_done(message, requeue_after)),
            Self::TransientFail { error, .. } | Self::PermanentFail(error) => Err(error),
        }
    }
}

/// Formats a requeue delay the way it appears in condition messages (`15s`).
fn format_requeue(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

/// Drives one Azure resource type through create, update and delete.
///
/// `C` is the client capability set for `T`; each resource kind wires in its
/// own client.
pub struct AsyncReconciler<T, C: ?Sized> {
    client: Arc<C>,
    condition_type: String,
    timeout: Duration,
    requeue: Duration,
    not_found_hint: Option<String>,
    _resource: PhantomData<fn() -> T>,
}

impl<T, C> AsyncReconciler<T, C>
where
    T: Send + Sync + 'static,
    C: ResourceClient<T> + ?Sized,
{
    /// Creates a reconciler writing its pending state to `condition_type`.
    #[must_use]
    pub fn new(client: Arc<C>, condition_type: impl Into<String>) -> Self {
        Self {
            client,
            condition_type: condition_type.into(),
            timeout: DEFAULT_AZURE_CALL_TIMEOUT,
            requeue: DEFAULT_RECONCILER_REQUEUE,
            not_found_hint: None,
            _resource: PhantomData,
        }
    }

    /// Sets the deadline of each create, update or delete call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the requeue delay reported while an operation is running.
    #[must_use]
    pub fn with_requeue(mut self, requeue: Duration) -> Self {
        self.requeue = requeue;
        self
    }

    /// A `NotFound` on the create path means a parent is missing; report it
    /// as a transient failure with `hint` as the message.
    #[must_use]
    pub fn with_not_found_hint(mut self, hint: impl Into<String>) -> Self {
        self.not_found_hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn condition_type(&self) -> &str {
        &self.condition_type
    }

    #[must_use]
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Creates or updates the resource described by `spec`.
    pub async fn create_or_update_resource<S>(
        &self,
        scope: &mut S,
        spec: &dyn ResourceSpec<T>,
        service: &str,
    ) -> ReconcileOutcome<T>
    where
        S: FutureScope + ?Sized,
    {
        let id = spec.identity();

        if let Some(future) =
            scope.get_long_running_operation_state(&id.name, service, FutureType::Put)
        {
            let Ok(token) = decode_resume_token(&future.data) else {
                return self.reset_undecodable(scope, &id, service, FutureType::Put);
            };
            debug!(
                service = %service,
                resource = %id,
                "Resuming in-flight PUT operation"
            );
            metrics::record_operation_resumed(service, FutureType::Put.as_str());
            let result = self
                .client
                .create_or_update_async(spec, Some(&token), None, self.timeout)
                .await;
            return self.handle_put_result(scope, &id, service, result, true, false);
        }

        let existing = match self.client.get(spec).await {
            Ok(resource) => Some(resource),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                let message =
                    format!("failed to get existing resource {id} (service: {service}): {e}");
                metrics::record_azure_error(service, map_azure_error_to_reason(&e));
                if e.is_transient() {
                    return self.transient_put(scope, service, ReconcileError::transient(message, self.requeue));
                }
                return ReconcileOutcome::PermanentFail(ReconcileError::terminal(message));
            }
        };

        let parameters = match spec.parameters(existing.as_ref()) {
            Ok(parameters) => parameters,
            Err(e) => {
                let prefix =
                    format!("failed to get desired parameters for resource {id} (service: {service})");
                if e.is_transient() {
                    let error = e.with_context(&prefix);
                    scope.update_patch_status(&self.condition_type, service, Some(&error));
                    return ReconcileOutcome::TransientFail {
                        requeue_after: error.requeue_after(),
                        error,
                    };
                }
                return ReconcileOutcome::PermanentFail(ReconcileError::terminal(format!(
                    "{prefix}: {e}"
                )));
            }
        };

        let Some(parameters) = parameters else {
            debug!(service = %service, resource = %id, "Resource is up to date");
            return ReconcileOutcome::Done(existing);
        };

        let creating = existing.is_none();
        info!(
            service = %service,
            resource = %id,
            creating = creating,
            "Creating or updating Azure resource"
        );
        let result = self
            .client
            .create_or_update_async(spec, None, Some(parameters), self.timeout)
            .await;
        self.handle_put_result(scope, &id, service, result, false, creating)
    }

    /// Deletes the resource described by `spec`.
    pub async fn delete_resource<S>(
        &self,
        scope: &mut S,
        spec: &dyn ResourceSpec<T>,
        service: &str,
    ) -> ReconcileOutcome<()>
    where
        S: FutureScope + ?Sized,
    {
        let id = spec.identity();

        let (token, resuming) =
            match scope.get_long_running_operation_state(&id.name, service, FutureType::Delete) {
                Some(future) => match decode_resume_token(&future.data) {
                    Ok(token) => (Some(token), true),
                    Err(_) => {
                        return self.reset_undecodable(scope, &id, service, FutureType::Delete)
                    }
                },
                None => (None, false),
            };

        if resuming {
            debug!(service = %service, resource = %id, "Resuming in-flight DELETE operation");
            metrics::record_operation_resumed(service, FutureType::Delete.as_str());
        } else {
            info!(service = %service, resource = %id, "Deleting Azure resource");
        }

        let result = self
            .client
            .delete_async(spec, token.as_deref(), self.timeout)
            .await;

        match result {
            Ok(AsyncOperation::Done(())) => {
                scope.delete_long_running_operation_state(&id.name, service, FutureType::Delete);
                metrics::record_azure_operation(service, FutureType::Delete.as_str(), "succeeded");
                ReconcileOutcome::Done(None)
            }
            Ok(AsyncOperation::InProgress { resume_token }) => {
                scope.set_long_running_operation_state(new_future(
                    FutureType::Delete,
                    service,
                    &id.name,
                    &id.group,
                    &resume_token,
                ));
                metrics::record_azure_operation(service, FutureType::Delete.as_str(), "in_progress");
                let error = self.not_done(&id, FutureType::Delete);
                scope.update_delete_status(&self.condition_type, service, Some(&error));
                ReconcileOutcome::InProgress {
                    requeue_after: self.requeue,
                    message: error.to_string(),
                }
            }
            Err(e) if e.is_not_found() => {
                if resuming {
                    scope.delete_long_running_operation_state(&id.name, service, FutureType::Delete);
                }
                debug!(service = %service, resource = %id, "Resource already deleted");
                ReconcileOutcome::Done(None)
            }
            Err(AzureError::InvalidResumeToken(_)) => {
                self.reset_undecodable(scope, &id, service, FutureType::Delete)
            }
            Err(e) => {
                let message = format!("failed to delete resource {id} (service: {service}): {e}");
                metrics::record_azure_error(service, map_azure_error_to_reason(&e));
                if e.is_transient() {
                    let error = ReconcileError::transient(message, self.requeue);
                    scope.update_delete_status(&self.condition_type, service, Some(&error));
                    return self.transient_outcome(error, resuming);
                }
                scope.delete_long_running_operation_state(&id.name, service, FutureType::Delete);
                ReconcileOutcome::PermanentFail(ReconcileError::terminal(message))
            }
        }
    }

    fn handle_put_result<S>(
        &self,
        scope: &mut S,
        id: &ResourceIdentity,
        service: &str,
        result: Result<AsyncOperation<T>, AzureError>,
        resuming: bool,
        creating: bool,
    ) -> ReconcileOutcome<T>
    where
        S: FutureScope + ?Sized,
    {
        match result {
            Ok(AsyncOperation::Done(resource)) => {
                scope.delete_long_running_operation_state(&id.name, service, FutureType::Put);
                metrics::record_azure_operation(service, FutureType::Put.as_str(), "succeeded");
                ReconcileOutcome::Done(Some(resource))
            }
            Ok(AsyncOperation::InProgress { resume_token }) => {
                scope.set_long_running_operation_state(new_future(
                    FutureType::Put,
                    service,
                    &id.name,
                    &id.group,
                    &resume_token,
                ));
                metrics::record_azure_operation(service, FutureType::Put.as_str(), "in_progress");
                let error = self.not_done(id, FutureType::Put);
                scope.update_put_status(&self.condition_type, service, Some(&error));
                ReconcileOutcome::InProgress {
                    requeue_after: self.requeue,
                    message: error.to_string(),
                }
            }
            Err(AzureError::InvalidResumeToken(_)) => {
                self.reset_undecodable(scope, id, service, FutureType::Put)
            }
            Err(e) if e.is_not_found() && !resuming && self.not_found_hint.is_some() => {
                let hint = self.not_found_hint.clone().unwrap_or_default();
                debug!(service = %service, resource = %id, error = %e, "Dependent resource not found");
                self.transient_put(scope, service, ReconcileError::transient_default(hint))
            }
            Err(e) => {
                let message =
                    format!("failed to create or update resource {id} (service: {service}): {e}");
                metrics::record_azure_error(service, map_azure_error_to_reason(&e));
                if e.is_transient() {
                    // The stored poller, if any, stays so the next pass resumes it.
                    warn!(service = %service, resource = %id, creating = creating, error = %e, "Transient Azure error");
                    let error = ReconcileError::transient(message, self.requeue);
                    scope.update_put_status(&self.condition_type, service, Some(&error));
                    return self.transient_outcome(error, resuming);
                }
                scope.delete_long_running_operation_state(&id.name, service, FutureType::Put);
                metrics::record_azure_operation(service, FutureType::Put.as_str(), "failed");
                ReconcileOutcome::PermanentFail(ReconcileError::terminal(message))
            }
        }
    }

    fn not_done(&self, id: &ResourceIdentity, kind: FutureType) -> ReconcileError {
        ReconcileError::not_done(
            format!(
                "operation type {kind} on Azure resource {id} is not done. Object will be requeued after {}",
                format_requeue(self.requeue)
            ),
            self.requeue,
        )
    }

    fn transient_put<S, R>(&self, scope: &mut S, service: &str, error: ReconcileError) -> ReconcileOutcome<R>
    where
        S: FutureScope + ?Sized,
    {
        scope.update_put_status(&self.condition_type, service, Some(&error));
        ReconcileOutcome::TransientFail {
            requeue_after: error.requeue_after(),
            error,
        }
    }

    /// A transient cloud error with an operation in flight still counts as
    /// in progress: the stored token is kept for the next pass.
    fn transient_outcome<R>(&self, error: ReconcileError, resuming: bool) -> ReconcileOutcome<R> {
        if resuming {
            ReconcileOutcome::InProgress {
                requeue_after: self.requeue,
                message: error.to_string(),
            }
        } else {
            ReconcileOutcome::TransientFail {
                requeue_after: self.requeue,
                error,
            }
        }
    }

    fn reset_undecodable<S, R>(
        &self,
        scope: &mut S,
        id: &ResourceIdentity,
        service: &str,
        kind: FutureType,
    ) -> ReconcileOutcome<R>
    where
        S: FutureScope + ?Sized,
    {
        warn!(service = %service, resource = %id, kind = %kind, "{DECODE_FAILURE_MESSAGE}");
        scope.delete_long_running_operation_state(&id.name, service, kind);
        ReconcileOutcome::PermanentFail(ReconcileError::terminal(DECODE_FAILURE_MESSAGE))
    }
}

#[cfg(test)]
#[path = "async_reconciler_tests.rs"]
mod async_reconciler_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service shell: runs every spec a scope enumerates through the async
//! reconciler and reports the aggregate result on one condition.
//!
//! A pass stops at the first spec that is not done. When every spec is done
//! the optional [`PostCreateOrUpdateHook`] copies cloud-observed data back
//! into the scope.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::async_reconciler::{AsyncReconciler, ReconcileOutcome};
use crate::azure::ResourceClient;
use crate::errors::ReconcileError;
use crate::scope::SpecSource;

/// Propagates the state Azure reports for a resource back into the scope.
#[async_trait]
pub trait PostCreateOrUpdateHook<S: ?Sized, T>: Send + Sync {
    /// Called once per successful pass with the last reconciled resource.
    async fn run(&self, scope: &mut S, resource: &T) -> Result<(), ReconcileError>;
}

/// One Azure resource kind, reconciled through [`AsyncReconciler`].
pub struct Service<T, C: ?Sized, S: ?Sized> {
    name: String,
    reconciler: AsyncReconciler<T, C>,
    post_hook: Option<Box<dyn PostCreateOrUpdateHook<S, T>>>,
}

impl<T, C, S> Service<T, C, S>
where
    T: Send + Sync + 'static,
    C: ResourceClient<T> + ?Sized,
    S: SpecSource<T> + ?Sized,
{
    /// Creates a service named `name` (also the LRO store's service key).
    #[must_use]
    pub fn new(name: impl Into<String>, reconciler: AsyncReconciler<T, C>) -> Self {
        Self {
            name: name.into(),
            reconciler,
            post_hook: None,
        }
    }

    #[must_use]
    pub fn with_post_hook(mut self, hook: impl PostCreateOrUpdateHook<S, T> + 'static) -> Self {
        self.post_hook = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn reconciler(&self) -> &AsyncReconciler<T, C> {
        &self.reconciler
    }

    /// Creates or updates every resource the scope enumerates.
    ///
    /// # Errors
    ///
    /// The error of the first spec that is not done, or of the post hook.
    /// The readiness condition has already been written when this returns.
    pub async fn reconcile(&self, scope: &mut S) -> Result<(), ReconcileError> {
        let condition_type = self.reconciler.condition_type().to_string();
        let specs = scope.list_specs();
        let mut last = None;

        for spec in &specs {
            match self
                .reconciler
                .create_or_update_resource(scope, spec.as_ref(), &self.name)
                .await
            {
                ReconcileOutcome::Done(result) => {
                    if result.is_some() {
                        last = result;
                    }
                }
                outcome => {
                    let error = outcome.error().unwrap_or_else(|| {
                        ReconcileError::terminal(format!("{} reconcile did not complete", self.name))
                    });
                    scope.update_put_status(&condition_type, &self.name, Some(&error));
                    return Err(error);
                }
            }
        }

        if let (Some(hook), Some(resource)) = (&self.post_hook, last.as_ref()) {
            debug!(service = %self.name, "Running post create-or-update hook");
            if let Err(error) = hook.run(scope, resource).await {
                scope.update_put_status(&condition_type, &self.name, Some(&error));
                return Err(error);
            }
        }

        scope.update_put_status(&condition_type, &self.name, None);
        Ok(())
    }

    /// Deletes every resource the scope enumerates.
    ///
    /// # Errors
    ///
    /// The error of the first spec whose deletion is not complete.
    pub async fn delete(&self, scope: &mut S) -> Result<(), ReconcileError> {
        let condition_type = self.reconciler.condition_type().to_string();
        let specs = scope.list_specs();

        for spec in &specs {
            match self
                .reconciler
                .delete_resource(scope, spec.as_ref(), &self.name)
                .await
            {
                ReconcileOutcome::Done(_) => {}
                outcome => {
                    let error = outcome.error().unwrap_or_else(|| {
                        ReconcileError::terminal(format!("{} delete did not complete", self.name))
                    });
                    scope.update_delete_status(&condition_type, &self.name, Some(&error));
                    return Err(error);
                }
            }
        }

        info!(service = %self.name, count = specs.len(), "Azure resources deleted");
        scope.update_delete_status(&condition_type, &self.name, None);
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;

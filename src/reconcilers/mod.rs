// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation controllers for the AKS infrastructure kinds.
//!
//! Each reconciler turns one custom resource into a pass of its Azure
//! service and writes the buffered scope back to the cluster.
//!
//! # Reconciliation Architecture
//!
//! 1. **Guard** - Deletion timestamp, paused cluster, finalizer
//! 2. **Scope** - Build the per-pass scope from the CR and its Cluster API owners
//! 3. **Service** - Run the Azure service (create, update, resume or delete)
//! 4. **Flush** - Patch status, owners and secrets from the scope
//! 5. **Requeue** - Map the outcome to a controller [`Action`](kube::runtime::controller::Action)
//!
//! # Available Reconcilers
//!
//! - [`reconcile_managed_control_plane`] - AKS managed cluster behind an `AzureManagedControlPlane`
//! - [`reconcile_managed_machine_pool`] - AKS agent pool behind an `AzureManagedMachinePool`
//!
//! # Example: Using a Reconciler
//!
//! ```rust,no_run
//! use capz_aks::context::Context;
//! use capz_aks::crd::AzureManagedControlPlane;
//! use capz_aks::reconcilers::reconcile_managed_control_plane;
//! use std::sync::Arc;
//!
//! async fn reconcile(ctx: Arc<Context>, cp: AzureManagedControlPlane) -> anyhow::Result<()> {
//!     let action = reconcile_managed_control_plane(ctx, cp).await?;
//!     println!("next: {action:?}");
//!     Ok(())
//! }
//! ```

pub mod capi;
pub mod finalizers;
pub mod managed_control_plane;
pub mod managed_machine_pool;
pub mod retry;
pub mod status;

pub use managed_control_plane::reconcile_managed_control_plane;
pub use managed_machine_pool::reconcile_managed_machine_pool;

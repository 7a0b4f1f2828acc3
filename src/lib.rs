// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # capz-aks - Azure AKS provider for Kubernetes Cluster API
//!
//! capz-aks reconciles `AzureManagedControlPlane` and `AzureManagedMachinePool`
//! resources into AKS managed clusters and agent pools. Azure operations can
//! take many minutes; the provider never blocks on them. Each pass starts or
//! resumes an operation under a short deadline, persists its resume token in
//! the resource status and requeues.
//!
//! ## Overview
//!
//! - Resource specs turn a declaration plus the observed Azure state into
//!   the parameters to send, or nothing when the resource is up to date
//! - The async reconciler drives create, update and delete through
//!   resumable long-running operations
//! - Services run the specs of a scope in order and report conditions
//! - Outer controllers flush scopes back to Kubernetes
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`spec`] - The resource spec contract and its helpers
//! - [`lro`] - Long-running operation store
//! - [`async_reconciler`] - Create, update and delete with resume tokens
//! - [`service`] - Runs the specs of a scope
//! - [`services`] - Managed cluster and agent pool services
//! - [`scope`] - Per-pass scopes
//! - [`azure`] - ARM REST client, pollers and credentials
//! - [`reconcilers`] - Kubernetes controllers
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use capz_aks::azure::auth::StaticTokenCredential;
//! use capz_aks::crd::{AzureManagedControlPlane, AzureManagedControlPlaneSpec};
//! use capz_aks::scope::{AzureIdentity, ManagedControlPlaneScope};
//!
//! let cp = AzureManagedControlPlane::new(
//!     "workload",
//!     AzureManagedControlPlaneSpec {
//!         version: "v1.28.5".to_string(),
//!         resource_group_name: "workload-rg".to_string(),
//!         location: "eastus".to_string(),
//!         ..Default::default()
//!     },
//! );
//! let identity = AzureIdentity::new(
//!     "00000000-0000-0000-0000-000000000000",
//!     Arc::new(StaticTokenCredential::new("token")),
//! );
//! let scope = ManagedControlPlaneScope::new(&cp, Vec::new(), identity);
//! assert_eq!(scope.resource_group(), "workload-rg");
//! ```

pub mod async_reconciler;
pub mod azure;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod http_errors;
pub mod labels;
pub mod lro;
pub mod metrics;
pub mod reconcilers;
pub mod scope;
pub mod service;
pub mod services;
pub mod spec;
pub mod status_reasons;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! This module defines the Cluster API labels the provider reads and the
//! provider-specific annotations and finalizers it writes.

// ============================================================================
// Cluster API Labels
// ============================================================================

/// Label carrying the name of the owning Cluster API `Cluster`
pub const CAPI_CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";

// ============================================================================
// Cluster API Annotations
// ============================================================================

/// Annotation on a `MachinePool` telling Cluster API that an external
/// autoscaler owns the replica count
pub const REPLICAS_MANAGED_BY_ANNOTATION: &str = "cluster.x-k8s.io/replicas-managed-by";

/// Value written to [`REPLICAS_MANAGED_BY_ANNOTATION`] when the AKS autoscaler is enabled
pub const REPLICAS_MANAGED_BY_AUTOSCALER: &str = "true";

// ============================================================================
// Provider Annotations
// ============================================================================

/// Annotation prefix for custom HTTP headers sent with Azure API requests.
///
/// `infrastructure.cluster.x-k8s.io/custom-header-EnableAzureDiskFileCSIDriver: "true"`
/// sends the header `EnableAzureDiskFileCSIDriver: true`.
pub const CUSTOM_HEADER_ANNOTATION_PREFIX: &str = "infrastructure.cluster.x-k8s.io/custom-header-";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer for `AzureManagedControlPlane` resources
pub const FINALIZER_MANAGED_CONTROL_PLANE: &str =
    "azuremanagedcontrolplane.infrastructure.cluster.x-k8s.io";

/// Finalizer for `AzureManagedMachinePool` resources
pub const FINALIZER_MANAGED_MACHINE_POOL: &str =
    "azuremanagedmachinepool.infrastructure.cluster.x-k8s.io";

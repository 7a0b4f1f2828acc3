// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the AKS provider.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

use std::time::Duration;

// ============================================================================
// API Constants
// ============================================================================

/// API group for the infrastructure CRDs served by this provider
pub const API_GROUP: &str = "infrastructure.cluster.x-k8s.io";

/// API version for the infrastructure CRDs
pub const API_VERSION: &str = "v1beta1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "infrastructure.cluster.x-k8s.io/v1beta1";

/// Kind name for `AzureManagedControlPlane` resource
pub const KIND_AZURE_MANAGED_CONTROL_PLANE: &str = "AzureManagedControlPlane";

/// Kind name for `AzureManagedMachinePool` resource
pub const KIND_AZURE_MANAGED_MACHINE_POOL: &str = "AzureManagedMachinePool";

/// Cluster API core group
pub const CAPI_GROUP: &str = "cluster.x-k8s.io";

/// Cluster API core version
pub const CAPI_VERSION: &str = "v1beta1";

/// Kind name for the Cluster API `MachinePool` resource
pub const KIND_MACHINE_POOL: &str = "MachinePool";

/// Kind name for the Cluster API `Cluster` resource
pub const KIND_CLUSTER: &str = "Cluster";

/// Field manager used for server-side apply patches
pub const FIELD_MANAGER: &str = "capz-aks";

// ============================================================================
// Azure Resource Manager Constants
// ============================================================================

/// Default Azure Resource Manager endpoint (public cloud)
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// Default Azure Active Directory authority (public cloud)
pub const DEFAULT_AAD_AUTHORITY: &str = "https://login.microsoftonline.com";

/// OAuth scope requested for ARM access tokens
pub const ARM_TOKEN_SCOPE: &str = "https://management.azure.com/.default";

/// API version used for `Microsoft.ContainerService` managed clusters and agent pools
pub const CONTAINER_SERVICE_API_VERSION: &str = "2024-02-01";

/// Resource provider namespace for AKS
pub const CONTAINER_SERVICE_PROVIDER: &str = "Microsoft.ContainerService";

/// Service name recorded in long-running operation state for managed clusters
pub const MANAGED_CLUSTERS_SERVICE_NAME: &str = "managedclusters";

/// Service name recorded in long-running operation state for agent pools
pub const AGENT_POOLS_SERVICE_NAME: &str = "agentpools";

/// Identity profile key under which AKS reports the kubelet identity
pub const KUBELET_IDENTITY_KEY: &str = "kubeletidentity";

/// Port of every AKS API server endpoint
pub const API_SERVER_PORT: i32 = 443;

/// Last octet applied to the service CIDR network address to derive the DNS service IP
pub const DNS_SERVICE_IP_LAST_OCTET: u8 = 10;

/// Suffix of the secret holding the admin kubeconfig
pub const ADMIN_KUBECONFIG_SECRET_SUFFIX: &str = "aso-kubeconfig";

/// Suffix of the secret holding the AAD user kubeconfig
pub const USER_KUBECONFIG_SECRET_SUFFIX: &str = "user-aso-kubeconfig";

/// Data key of the kubeconfig secrets
pub const KUBECONFIG_SECRET_KEY: &str = "value";

/// Prefix of AKS system-reserved node labels
pub const AKS_RESERVED_NODE_LABEL_PREFIX: &str = "kubernetes.azure.com/";

/// Prefix of AKS system-reserved tags
pub const AKS_RESERVED_TAG_PREFIX: &str = "aks-managed-";

// ============================================================================
// Provisioning States
// ============================================================================

/// Terminal provisioning state reported on success
pub const PROVISIONING_STATE_SUCCEEDED: &str = "Succeeded";

/// Terminal provisioning state reported on failure
pub const PROVISIONING_STATE_FAILED: &str = "Failed";

/// Terminal provisioning state reported on cancellation
pub const PROVISIONING_STATE_CANCELED: &str = "Canceled";

/// All terminal provisioning states, in the order used in user-facing messages
pub const TERMINAL_PROVISIONING_STATES: [&str; 3] = [
    PROVISIONING_STATE_CANCELED,
    PROVISIONING_STATE_FAILED,
    PROVISIONING_STATE_SUCCEEDED,
];

// ============================================================================
// Timing Constants
// ============================================================================

/// Default requeue interval after an operation was started but is not finished
pub const DEFAULT_RECONCILER_REQUEUE: Duration = Duration::from_secs(15);

/// Requeue hint carried by transient errors (non-terminal state, missing dependency)
pub const TRANSIENT_ERROR_REQUEUE: Duration = Duration::from_secs(20);

/// Per-call deadline for individual Azure resource operations
pub const DEFAULT_AZURE_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-call deadline for AKS managed cluster operations
pub const DEFAULT_AKS_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between polls of an in-flight Azure operation when the service sends no `Retry-After`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Requeue interval for resources that are fully reconciled
pub const READY_REQUEUE: Duration = Duration::from_secs(300);

/// Requeue interval applied by the controller error policy
pub const ERROR_REQUEUE: Duration = Duration::from_secs(30);

/// Access tokens are refreshed this long before they expire
pub const TOKEN_REFRESH_SKEW: Duration = Duration::from_secs(300);

// ============================================================================
// Runtime Constants
// ============================================================================

/// Default number of Tokio worker threads
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Default bind address for the metrics server
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8080";

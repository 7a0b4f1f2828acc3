// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the AKS provider.
//!
//! All metrics carry the `capz_aks_` namespace prefix.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Outer controller passes and their outcomes
//! - **Azure Operation Metrics** - Long-running operations started, resumed and finished
//! - **Error Metrics** - Azure errors by condition reason
//!
//! # Example
//!
//! ```rust,no_run
//! use capz_aks::metrics::{record_azure_operation, record_reconciliation_success};
//!
//! record_azure_operation("managedclusters", "PUT", "succeeded");
//! record_reconciliation_success("AzureManagedControlPlane", std::time::Duration::from_secs(1));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "capz_aks";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry, exposed on `/metrics`.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind reconciled (e.g., `AzureManagedControlPlane`)
/// - `status`: Outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `resource_type`: Kind reconciled
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of requeues
///
/// Labels:
/// - `resource_type`: Kind reconciled
/// - `reason`: `transient`, `operation_pending` or `terminal`
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requeues_total"),
        "Total number of requeue operations by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Azure Operation Metrics
// ============================================================================

/// Total number of Azure operation outcomes seen by the reconciler
///
/// Labels:
/// - `service`: Service name (e.g., `managedclusters`, `agentpools`)
/// - `operation`: `PUT` or `DELETE`
/// - `outcome`: `succeeded`, `failed`, or `in_progress` when a call
///   outlived its deadline and left a resume token
pub static AZURE_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_azure_operations_total"),
        "Total number of Azure operations by service, operation and outcome",
    );
    let counter = CounterVec::new(opts, &["service", "operation", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of long-running operations resumed from a stored token
///
/// Labels:
/// - `service`: Service name
/// - `operation`: `PUT` or `DELETE`
pub static AZURE_OPERATIONS_RESUMED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_azure_operations_resumed_total"),
        "Total number of long-running operations resumed from a stored resume token",
    );
    let counter = CounterVec::new(opts, &["service", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of Azure errors by service and condition reason
///
/// Labels:
/// - `service`: Service name
/// - `reason`: Condition reason (e.g., `AzureThrottled`, `AzureBadRequest`)
pub static AZURE_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_azure_errors_total"),
        "Total number of Azure errors by service and reason",
    );
    let counter = CounterVec::new(opts, &["service", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
///
/// # Arguments
/// * `resource_type` - The kind reconciled
/// * `duration` - Duration of the reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `resource_type` - The kind reconciled
/// * `duration` - Duration of the reconciliation before failure
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a reconciliation requeue
///
/// # Arguments
/// * `resource_type` - The kind reconciled
/// * `reason` - Reason for requeue
pub fn record_reconciliation_requeue(resource_type: &str, reason: &str) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "requeue"])
        .inc();
    REQUEUE_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Record the outcome of an Azure operation
pub fn record_azure_operation(service: &str, operation: &str, outcome: &str) {
    AZURE_OPERATIONS_TOTAL
        .with_label_values(&[service, operation, outcome])
        .inc();
}

/// Record that a stored long-running operation was resumed
pub fn record_operation_resumed(service: &str, operation: &str) {
    AZURE_OPERATIONS_RESUMED_TOTAL
        .with_label_values(&[service, operation])
        .inc();
}

/// Record an Azure error under its condition reason
pub fn record_azure_error(service: &str, reason: &str) {
    AZURE_ERRORS_TOTAL
        .with_label_values(&[service, reason])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

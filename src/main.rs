// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use capz_aks::{
    azure::{
        arm::ArmConnection,
        auth::{ClientSecretCredential, TokenCredential, WorkloadIdentityCredential},
    },
    config::{Config, CredentialSource},
    constants::{KIND_AZURE_MANAGED_CONTROL_PLANE, KIND_AZURE_MANAGED_MACHINE_POOL},
    context::{Context, Requeue},
    crd::{AzureManagedControlPlane, AzureManagedMachinePool},
    metrics,
    reconcilers::{reconcile_managed_control_plane, reconcile_managed_machine_pool},
    scope::AzureIdentity,
};
use clap::Parser;
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    let config = Config::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name("capz-aks-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<()> {
    // Respects RUST_LOG (default info) and RUST_LOG_FORMAT=json|text
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting AKS provider controller");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let ctx = Arc::new(build_context(client.clone(), &config)?);

    info!("Starting all controllers");

    // Controllers should never exit - if one does, log it and exit the process
    tokio::select! {
        result = run_control_plane_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: AzureManagedControlPlane controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("AzureManagedControlPlane controller exited unexpectedly without error")
        }
        result = run_machine_pool_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: AzureManagedMachinePool controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("AzureManagedMachinePool controller exited unexpectedly without error")
        }
        result = run_metrics_server(config.metrics_addr.clone()) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping controllers");
            Ok(())
        }
    }
}

/// Wires the ARM connection and the Azure identity from the configuration.
fn build_context(client: Client, config: &Config) -> Result<Context> {
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let credential: Arc<dyn TokenCredential> = match config.credential_source()? {
        CredentialSource::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
        } => {
            info!(client_id = %client_id, "Using client secret credentials");
            Arc::new(ClientSecretCredential::new(
                http.clone(),
                config.authority.clone(),
                tenant_id,
                client_id,
                client_secret,
            ))
        }
        CredentialSource::WorkloadIdentity {
            tenant_id,
            client_id,
            token_file,
        } => {
            info!(client_id = %client_id, token_file = %token_file.display(), "Using workload identity credentials");
            Arc::new(WorkloadIdentityCredential::new(
                http.clone(),
                config.authority.clone(),
                tenant_id,
                client_id,
                token_file,
            ))
        }
    };

    Ok(Context {
        client,
        arm: ArmConnection::new(http, config.arm_endpoint.clone()),
        identity: AzureIdentity::new(config.subscription_id.clone(), credential),
        call_timeout: config.aks_call_timeout(),
        operation_requeue: config.reconciler_requeue(),
        requeue: Requeue {
            ready: config.ready_requeue(),
            error: config.error_requeue(),
        },
    })
}

/// Run the `AzureManagedControlPlane` controller
async fn run_control_plane_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting AzureManagedControlPlane controller");

    let api = Api::<AzureManagedControlPlane>::all(client);

    Controller::new(api, watcher::Config::default())
        .run(reconcile_control_plane_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Run the `AzureManagedMachinePool` controller
async fn run_machine_pool_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting AzureManagedMachinePool controller");

    let api = Api::<AzureManagedMachinePool>::all(client);

    Controller::new(api, watcher::Config::default())
        .run(reconcile_machine_pool_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Serve `/metrics` in the Prometheus text format
async fn run_metrics_server(addr: String) -> Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind metrics server to {addr}"))?;
    info!(addr = %addr, "Metrics server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Reconcile wrapper for `AzureManagedControlPlane`
async fn reconcile_control_plane_wrapper(
    control_plane: Arc<AzureManagedControlPlane>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    match reconcile_managed_control_plane(ctx, (*control_plane).clone()).await {
        Ok(action) => {
            debug!(
                "Reconciled AzureManagedControlPlane: {}",
                control_plane.name_any()
            );
            metrics::record_reconciliation_success(KIND_AZURE_MANAGED_CONTROL_PLANE, start.elapsed());
            Ok(action)
        }
        Err(e) => {
            error!("Failed to reconcile AzureManagedControlPlane: {:#}", e);
            metrics::record_reconciliation_error(KIND_AZURE_MANAGED_CONTROL_PLANE, start.elapsed());
            Err(e.into())
        }
    }
}

/// Reconcile wrapper for `AzureManagedMachinePool`
async fn reconcile_machine_pool_wrapper(
    pool: Arc<AzureManagedMachinePool>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    match reconcile_managed_machine_pool(ctx, (*pool).clone()).await {
        Ok(action) => {
            debug!("Reconciled AzureManagedMachinePool: {}", pool.name_any());
            metrics::record_reconciliation_success(KIND_AZURE_MANAGED_MACHINE_POOL, start.elapsed());
            Ok(action)
        }
        Err(e) => {
            error!("Failed to reconcile AzureManagedMachinePool: {:#}", e);
            metrics::record_reconciliation_error(KIND_AZURE_MANAGED_MACHINE_POOL, start.elapsed());
            Err(e.into())
        }
    }
}

/// Error policy for both controllers
fn error_policy<K: kube::Resource<DynamicType = ()>>(
    _resource: Arc<K>,
    _err: &ReconcileError,
    ctx: Arc<Context>,
) -> Action {
    metrics::record_reconciliation_requeue(&K::kind(&()), "error");
    Action::requeue(ctx.requeue.error)
}

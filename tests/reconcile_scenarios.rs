// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end reconcile passes against an in-memory Azure.
//!
//! These tests drive the managed cluster and agent pool services through the
//! public API, with real scopes and fake cloud clients.
//!
//! Run with: cargo test --test reconcile_scenarios

mod common;

use capz_aks::azure::auth::StaticTokenCredential;
use capz_aks::azure::models::{AgentPool, ManagedCluster};
use capz_aks::azure::{CredentialsLister, ResourceClient};
use capz_aks::crd::{
    AgentPoolMode, AutoUpgradeProfile, AzureManagedControlPlane, AzureManagedControlPlaneSpec,
    AzureManagedMachinePool, AzureManagedMachinePoolSpec, AzureManagedMachinePoolStatus,
    FutureType, ManagedMachinePoolScaling, UpgradeChannel,
};
use capz_aks::labels::REPLICAS_MANAGED_BY_ANNOTATION;
use capz_aks::lro::{decode_resume_token, get_long_running_operation_state, new_future};
use capz_aks::reconcilers::status::find_condition;
use capz_aks::scope::{AzureIdentity, FutureScope, MachinePoolView, ManagedControlPlaneScope, ManagedMachinePoolScope};
use capz_aks::services::agentpools::{self, AgentPoolService, AgentPoolSpec};
use capz_aks::services::managedclusters::{self, ManagedClusterService};
use capz_aks::spec::ResourceSpec;
use common::{FakeCloud, FakeCredentials};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);
const REQUEUE: Duration = Duration::from_secs(15);

// ============================================================================
// Helpers
// ============================================================================

fn identity() -> AzureIdentity {
    AzureIdentity::new("sub", Arc::new(StaticTokenCredential::new("test-token")))
}

fn machine_pool(name: &str, mode: AgentPoolMode, autoscale: bool) -> AzureManagedMachinePool {
    let mut pool = AzureManagedMachinePool::new(
        name,
        AzureManagedMachinePoolSpec {
            mode,
            sku: "Standard_D2s".into(),
            scaling: autoscale.then_some(ManagedMachinePoolScaling {
                min_size: 1,
                max_size: 10,
            }),
            ..AzureManagedMachinePoolSpec::default()
        },
    );
    pool.metadata.namespace = Some("default".into());
    pool
}

fn machine_pool_view(replicas: i32, annotations: BTreeMap<String, String>) -> MachinePoolView {
    MachinePoolView {
        name: "mp-a".into(),
        namespace: "default".into(),
        replicas: Some(replicas),
        version: None,
        annotations,
    }
}

fn pool_scope(
    pool: &AzureManagedMachinePool,
    replicas: i32,
    annotations: BTreeMap<String, String>,
) -> ManagedMachinePoolScope {
    ManagedMachinePoolScope::new(pool, machine_pool_view(replicas, annotations), "c1", "rg", identity())
}

fn pool_service(cloud: Arc<FakeCloud<AgentPool>>) -> AgentPoolService {
    let client: Arc<dyn ResourceClient<AgentPool>> = cloud;
    agentpools::new_service(client, TIMEOUT, REQUEUE)
}

fn control_plane(version: &str, channel: Option<UpgradeChannel>) -> AzureManagedControlPlane {
    let mut cp = AzureManagedControlPlane::new(
        "c1",
        AzureManagedControlPlaneSpec {
            version: version.into(),
            resource_group_name: "rg".into(),
            location: "eastus".into(),
            auto_upgrade_profile: channel.map(|c| AutoUpgradeProfile {
                upgrade_channel: Some(c),
            }),
            ..AzureManagedControlPlaneSpec::default()
        },
    );
    cp.metadata.namespace = Some("default".into());
    cp
}

fn pool_specs() -> Vec<AgentPoolSpec> {
    vec![
        AgentPoolSpec::from_machine_pool(
            &machine_pool("pool0", AgentPoolMode::System, false),
            Some(1),
            None,
            "c1",
            "rg",
        ),
        AgentPoolSpec::from_machine_pool(
            &machine_pool("pool1", AgentPoolMode::User, true),
            Some(3),
            None,
            "c1",
            "rg",
        ),
    ]
}

fn cluster_service(cloud: Arc<FakeCloud<ManagedCluster>>) -> ManagedClusterService {
    let client: Arc<dyn ResourceClient<ManagedCluster>> = cloud;
    let credentials: Arc<dyn CredentialsLister> = Arc::new(FakeCredentials);
    managedclusters::new_service(client, credentials, TIMEOUT, REQUEUE)
}

// ============================================================================
// Agent pools
// ============================================================================

#[tokio::test]
async fn test_create_agent_pool_without_autoscaler() {
    let cloud = Arc::new(FakeCloud::<AgentPool>::default());
    let service = pool_service(cloud.clone());
    let pool = machine_pool("pool-a", AgentPoolMode::User, false);
    let mut scope = pool_scope(
        &pool,
        2,
        BTreeMap::from([(REPLICAS_MANAGED_BY_ANNOTATION.to_string(), "true".to_string())]),
    );

    service.reconcile(&mut scope).await.unwrap();

    let puts = cloud.puts();
    assert_eq!(puts.len(), 1);
    let sent = puts[0].parameters.as_ref().unwrap();
    assert_eq!(sent.properties.count, Some(2));
    assert_eq!(sent.properties.enable_auto_scaling, Some(false));
    assert_eq!(sent.properties.vm_size.as_deref(), Some("Standard_D2s"));

    assert!(!scope
        .machine_pool()
        .annotations
        .contains_key(REPLICAS_MANAGED_BY_ANNOTATION));
    assert!(scope.machine_pool_changed());
    assert!(scope.status().ready);
    assert!(scope.status().long_running_operation_states.is_empty());
}

#[tokio::test]
async fn test_update_declined_while_pool_is_deleting() {
    let pool = machine_pool("pool-a", AgentPoolMode::User, false);
    let mut observed = AgentPoolSpec::from_machine_pool(&pool, Some(2), None, "c1", "rg")
        .parameters(None)
        .unwrap()
        .unwrap();
    observed.properties.provisioning_state = Some("Deleting".into());

    let cloud = Arc::new(FakeCloud::default().with_resource("pool-a", observed));
    let service = pool_service(cloud.clone());
    let mut scope = pool_scope(&pool, 2, BTreeMap::new());

    let err = service.reconcile(&mut scope).await.unwrap_err();

    assert!(cloud.puts().is_empty());
    assert!(err.is_transient());
    assert_eq!(err.requeue_after(), Duration::from_secs(20));
    assert!(err.to_string().contains("Deleting"));
}

#[tokio::test]
async fn test_autoscaler_count_drift_is_not_an_update() {
    let pool = machine_pool("pool-a", AgentPoolMode::User, true);
    let mut observed = AgentPoolSpec::from_machine_pool(&pool, Some(1), None, "c1", "rg")
        .parameters(None)
        .unwrap()
        .unwrap();
    observed.properties.count = Some(5);
    observed.properties.provisioning_state = Some("Succeeded".into());

    let cloud = Arc::new(FakeCloud::default().with_resource("pool-a", observed));
    let service = pool_service(cloud.clone());
    let mut scope = pool_scope(&pool, 1, BTreeMap::new());

    service.reconcile(&mut scope).await.unwrap();

    assert!(cloud.puts().is_empty());
    assert_eq!(scope.machine_pool().replicas, Some(5));
    assert_eq!(
        scope
            .machine_pool()
            .annotations
            .get(REPLICAS_MANAGED_BY_ANNOTATION)
            .map(String::as_str),
        Some("true")
    );
}

#[tokio::test]
async fn test_in_flight_put_is_resumed() {
    let cloud = Arc::new(FakeCloud::<AgentPool>::default().keep_running("tok1", "tok2"));
    let service = pool_service(cloud.clone());
    let pool = machine_pool("pool-a", AgentPoolMode::User, false);
    let mut scope = pool_scope(&pool, 2, BTreeMap::new());
    scope.set_long_running_operation_state(new_future(
        FutureType::Put,
        "agentpools",
        "pool-a",
        "rg",
        "tok1",
    ));

    let err = service.reconcile(&mut scope).await.unwrap_err();

    let puts = cloud.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].resume_token.as_deref(), Some("tok1"));
    assert!(puts[0].parameters.is_none());

    assert!(err.is_operation_not_done());
    assert_eq!(err.requeue_after(), REQUEUE);

    let future = scope
        .get_long_running_operation_state("pool-a", "agentpools", FutureType::Put)
        .unwrap();
    assert_eq!(decode_resume_token(&future.data).unwrap(), "tok2");

    let condition = find_condition(&scope.status().conditions, "AgentPoolsReady").unwrap();
    assert_eq!(condition.status, "False");
    assert_eq!(
        condition.message.as_deref(),
        Some("operation type PUT on Azure resource rg/pool-a is not done. Object will be requeued after 15s")
    );
}

#[tokio::test]
async fn test_operation_state_survives_status_round_trip() {
    let pool = machine_pool("pool-a", AgentPoolMode::User, false);
    let mut scope = pool_scope(&pool, 2, BTreeMap::new());
    scope.set_long_running_operation_state(new_future(
        FutureType::Delete,
        "agentpools",
        "pool-a",
        "rg",
        "opaque-token",
    ));

    let json = serde_json::to_string(scope.status()).unwrap();
    let status: AzureManagedMachinePoolStatus = serde_json::from_str(&json).unwrap();

    let future = get_long_running_operation_state(
        &status.long_running_operation_states,
        "pool-a",
        "agentpools",
        FutureType::Delete,
    )
    .unwrap();
    assert_eq!(future.r#type, FutureType::Delete);
    assert_eq!(future.service_name, "agentpools");
    assert_eq!(future.name, "pool-a");
    assert_eq!(future.resource_group, "rg");
    assert_eq!(decode_resume_token(&future.data).unwrap(), "opaque-token");
}

#[tokio::test]
async fn test_deleting_missing_pool_succeeds() {
    let cloud = Arc::new(FakeCloud::<AgentPool>::default());
    let service = pool_service(cloud.clone());
    let pool = machine_pool("pool-a", AgentPoolMode::User, false);
    let mut scope = pool_scope(&pool, 2, BTreeMap::new());
    let before = scope.status().long_running_operation_states.clone();

    service.delete(&mut scope).await.unwrap();

    assert_eq!(cloud.deletes(), vec!["pool-a".to_string()]);
    assert_eq!(scope.status().long_running_operation_states, before);
}

// ============================================================================
// Managed clusters
// ============================================================================

#[tokio::test]
async fn test_cluster_create_embeds_pools_and_update_does_not() {
    let cloud = Arc::new(FakeCloud::<ManagedCluster>::default());
    let service = cluster_service(cloud.clone());
    let mut cp = control_plane("v1.28.5", None);

    let mut scope = ManagedControlPlaneScope::new(&cp, pool_specs(), identity());
    service.reconcile(&mut scope).await.unwrap();

    let puts = cloud.puts();
    assert_eq!(puts.len(), 1);
    let profiles = puts[0]
        .parameters
        .as_ref()
        .and_then(|c| c.properties.agent_pool_profiles.clone())
        .unwrap();
    let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["pool0", "pool1"]);
    assert!(scope.status().ready);
    assert!(scope.status().initialized);
    assert_eq!(scope.admin_kubeconfig(), Some(&b"admin-kubeconfig"[..]));

    // Later passes carry the status forward and never resend the pools.
    cp.status = Some(scope.status().clone());
    let mut scope = ManagedControlPlaneScope::new(&cp, pool_specs(), identity());
    let observed = cloud.resource("c1").unwrap();
    let desired = scope
        .managed_cluster_spec()
        .parameters(Some(&observed))
        .unwrap();
    assert!(desired.is_none());

    service.reconcile(&mut scope).await.unwrap();
    assert_eq!(cloud.puts().len(), 1);
}

#[tokio::test]
async fn test_auto_upgraded_version_is_never_downgraded() {
    let cp = control_plane("v1.22.0", Some(UpgradeChannel::Stable));
    let scope = ManagedControlPlaneScope::new(&cp, Vec::new(), identity());
    let mut observed = scope
        .managed_cluster_spec()
        .parameters(None)
        .unwrap()
        .unwrap();
    observed.properties.kubernetes_version = Some("1.26.6".into());
    observed.properties.current_kubernetes_version = Some("1.26.6".into());
    observed.properties.provisioning_state = Some("Succeeded".into());

    let cloud = Arc::new(FakeCloud::default().with_resource("c1", observed));
    let service = cluster_service(cloud.clone());

    for declared in ["v1.22.0", "v1.22.99"] {
        let cp = control_plane(declared, Some(UpgradeChannel::Stable));
        let mut scope = ManagedControlPlaneScope::new(&cp, Vec::new(), identity());

        service.reconcile(&mut scope).await.unwrap();

        assert!(cloud.puts().is_empty(), "declared {declared} must not trigger a PUT");
        assert_eq!(scope.status().version.as_deref(), Some("1.26.6"));
        assert_eq!(scope.status().auto_upgrade_version.as_deref(), Some("1.26.6"));
    }
}

#[tokio::test]
async fn test_cluster_delete_removes_resource() {
    let cloud = Arc::new(FakeCloud::<ManagedCluster>::default());
    let service = cluster_service(cloud.clone());
    let cp = control_plane("v1.28.5", None);

    let mut scope = ManagedControlPlaneScope::new(&cp, pool_specs(), identity());
    service.reconcile(&mut scope).await.unwrap();
    assert!(cloud.resource("c1").is_some());

    let mut scope = ManagedControlPlaneScope::new(&cp, Vec::new(), identity());
    service.delete(&mut scope).await.unwrap();

    assert!(cloud.resource("c1").is_none());
    assert!(!scope.status().ready);
}

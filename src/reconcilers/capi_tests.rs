// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `capi.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::crd::{AzureManagedMachinePool, AzureManagedMachinePoolSpec};
    use crate::errors::ReconcileError;
    use crate::labels::REPLICAS_MANAGED_BY_AUTOSCALER;
    use std::time::Duration;

    fn machine_pool(data: Value) -> DynamicObject {
        let mut obj = DynamicObject::new("mp0", &machine_pool_resource()).within("default");
        obj.data = data;
        obj
    }

    #[test]
    fn test_machine_pool_view_reads_replicas_and_version() {
        let mut obj = machine_pool(json!({
            "spec": {
                "replicas": 3,
                "template": { "spec": { "version": "v1.28.5" } }
            }
        }));
        obj.metadata.annotations = Some(BTreeMap::from([(
            REPLICAS_MANAGED_BY_ANNOTATION.to_string(),
            REPLICAS_MANAGED_BY_AUTOSCALER.to_string(),
        )]));

        let view = machine_pool_view(&obj);
        assert_eq!(view.name, "mp0");
        assert_eq!(view.namespace, "default");
        assert_eq!(view.replicas, Some(3));
        assert_eq!(view.version.as_deref(), Some("v1.28.5"));
        assert!(view.annotations.contains_key(REPLICAS_MANAGED_BY_ANNOTATION));
    }

    #[test]
    fn test_machine_pool_view_without_spec() {
        let view = machine_pool_view(&machine_pool(json!({})));
        assert_eq!(view.replicas, None);
        assert_eq!(view.version, None);
    }

    #[test]
    fn test_machine_pool_patch_sets_annotation_and_replicas() {
        let view = MachinePoolView {
            replicas: Some(5),
            annotations: BTreeMap::from([(
                REPLICAS_MANAGED_BY_ANNOTATION.to_string(),
                REPLICAS_MANAGED_BY_AUTOSCALER.to_string(),
            )]),
            ..Default::default()
        };

        assert_eq!(
            machine_pool_patch(&view),
            json!({
                "metadata": { "annotations": { REPLICAS_MANAGED_BY_ANNOTATION: "true" } },
                "spec": { "replicas": 5 }
            })
        );
    }

    #[test]
    fn test_machine_pool_patch_clears_annotation() {
        let view = MachinePoolView::default();
        assert_eq!(
            machine_pool_patch(&view),
            json!({ "metadata": { "annotations": { REPLICAS_MANAGED_BY_ANNOTATION: null } } })
        );
    }

    #[test]
    fn test_owner_machine_pool_name() {
        let mut pool = AzureManagedMachinePool::new("pool0", AzureManagedMachinePoolSpec::default());
        assert_eq!(owner_machine_pool_name(&pool), None);

        pool.metadata.owner_references = Some(vec![
            OwnerReference {
                api_version: "apps/v1".into(),
                kind: KIND_MACHINE_POOL.into(),
                name: "wrong-group".into(),
                ..Default::default()
            },
            OwnerReference {
                api_version: "cluster.x-k8s.io/v1beta1".into(),
                kind: KIND_MACHINE_POOL.into(),
                name: "mp0".into(),
                ..Default::default()
            },
        ]);
        assert_eq!(owner_machine_pool_name(&pool).as_deref(), Some("mp0"));
    }

    #[test]
    fn test_cluster_name_and_paused() {
        let mut pool = AzureManagedMachinePool::new("pool0", AzureManagedMachinePoolSpec::default());
        assert_eq!(cluster_name(&pool), None);
        pool.metadata.labels = Some(BTreeMap::from([(
            CAPI_CLUSTER_NAME_LABEL.to_string(),
            "workload".to_string(),
        )]));
        assert_eq!(cluster_name(&pool).as_deref(), Some("workload"));

        let mut cluster = DynamicObject::new("workload", &cluster_resource());
        assert!(!is_cluster_paused(&cluster));
        cluster.data = json!({ "spec": { "paused": true } });
        assert!(is_cluster_paused(&cluster));
    }

    #[test]
    fn test_kubeconfig_secret() {
        let cp = AzureManagedControlPlane::new("c1", Default::default());
        let name = kubeconfig_secret_name("workload", "aso-kubeconfig");
        let secret = kubeconfig_secret(
            &name,
            "default",
            "workload",
            control_plane_owner_reference(&cp),
            b"apiVersion: v1",
        );

        assert_eq!(secret.metadata.name.as_deref(), Some("workload-aso-kubeconfig"));
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
        let data = secret.data.unwrap();
        assert_eq!(data["value"].0, b"apiVersion: v1".to_vec());
        let owner = &secret.metadata.owner_references.unwrap()[0];
        assert_eq!(owner.kind, KIND_AZURE_MANAGED_CONTROL_PLANE);
        assert_eq!(owner.controller, Some(true));
    }

    #[test]
    fn test_requeue_action() {
        let requeue = Requeue::default();

        assert_eq!(requeue_action(&Ok(()), &requeue), Action::requeue(requeue.ready));
        assert_eq!(
            requeue_action(&Err(ReconcileError::terminal("bad spec")), &requeue),
            Action::await_change()
        );
        assert_eq!(
            requeue_action(
                &Err(ReconcileError::not_done("pending", Duration::from_secs(15))),
                &requeue
            ),
            Action::requeue(Duration::from_secs(15))
        );
    }
}

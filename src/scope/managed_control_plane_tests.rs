// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `managed_control_plane.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::azure::auth::StaticTokenCredential;
    use crate::scope::AzureIdentity;
    use std::sync::Arc;
    use crate::crd::{AadProfile, AzureManagedControlPlaneSpec};
    use crate::reconcilers::status::find_condition;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn identity() -> AzureIdentity {
        AzureIdentity::new("sub", Arc::new(StaticTokenCredential::new("test-token")))
    }

    fn control_plane() -> AzureManagedControlPlane {
        let mut cp = AzureManagedControlPlane::new(
            "c1",
            AzureManagedControlPlaneSpec {
                version: "v1.28.5".into(),
                resource_group_name: "rg".into(),
                location: "eastus".into(),
                ..AzureManagedControlPlaneSpec::default()
            },
        );
        cp.metadata.namespace = Some("default".into());
        cp.metadata.annotations = Some(BTreeMap::from([(
            "infrastructure.cluster.x-k8s.io/custom-header-AKSHTTPCustomFeatures".to_string(),
            "Microsoft.ContainerService/Foo".to_string(),
        )]));
        cp
    }

    #[test]
    fn test_spec_built_from_control_plane() {
        let scope = ManagedControlPlaneScope::new(&control_plane(), Vec::new(), identity());
        let spec = scope.managed_cluster_spec();

        assert_eq!(scope.name(), "c1");
        assert_eq!(scope.namespace(), "default");
        assert_eq!(scope.resource_group(), "rg");
        assert_eq!(spec.identity().to_string(), "rg/c1");
        assert_eq!(
            spec.custom_headers().get("AKSHTTPCustomFeatures").map(String::as_str),
            Some("Microsoft.ContainerService/Foo")
        );
        assert_eq!(scope.list_specs().len(), 1);
        assert!(scope.control_plane_endpoint().is_none());
    }

    #[test]
    fn test_kubelet_identity_flows_into_next_spec() {
        let mut scope = ManagedControlPlaneScope::new(&control_plane(), Vec::new(), identity());
        scope.set_kubelet_identity(Some("/identities/kubelet".into()));

        assert_eq!(scope.status().kubelet_identity.as_deref(), Some("/identities/kubelet"));
        assert_eq!(
            scope.managed_cluster_spec().kubelet_identity.as_deref(),
            Some("/identities/kubelet")
        );
    }

    #[test]
    fn test_credential_flags() {
        let mut cp = control_plane();
        let scope = ManagedControlPlaneScope::new(&cp, Vec::new(), identity());
        assert!(!scope.local_accounts_disabled());
        assert!(!scope.aad_managed());

        cp.spec.disable_local_accounts = Some(true);
        cp.spec.aad_profile = Some(AadProfile {
            managed: true,
            ..AadProfile::default()
        });
        let scope = ManagedControlPlaneScope::new(&cp, Vec::new(), identity());
        assert!(scope.local_accounts_disabled());
        assert!(scope.aad_managed());
    }

    #[test]
    fn test_put_status_tracks_initialization() {
        let mut scope = ManagedControlPlaneScope::new(&control_plane(), Vec::new(), identity());
        let pending = ReconcileError::not_done("pending", Duration::from_secs(15));

        scope.update_put_status("ManagedClusterRunning", "managedclusters", Some(&pending));
        let condition = find_condition(&scope.status().conditions, "ManagedClusterRunning").unwrap();
        assert_eq!(condition.reason.as_deref(), Some("Creating"));
        assert!(!scope.status().initialized);

        scope.update_put_status("ManagedClusterRunning", "managedclusters", None);
        assert!(scope.status().ready);
        assert!(scope.status().initialized);

        scope.update_put_status("ManagedClusterRunning", "managedclusters", Some(&pending));
        let condition = find_condition(&scope.status().conditions, "ManagedClusterRunning").unwrap();
        assert_eq!(condition.reason.as_deref(), Some("Updating"));

        scope.update_delete_status("ManagedClusterRunning", "managedclusters", None);
        assert!(!scope.status().ready);
    }

    #[test]
    fn test_buffers_endpoint_and_kubeconfigs() {
        let mut scope = ManagedControlPlaneScope::new(&control_plane(), Vec::new(), identity());
        scope.set_control_plane_endpoint(ApiEndpoint {
            host: "c1.hcp.eastus.azmk8s.io".into(),
            port: 443,
        });
        scope.set_admin_kubeconfig(b"admin".to_vec());
        scope.set_user_kubeconfig(b"user".to_vec());

        assert_eq!(scope.control_plane_endpoint().unwrap().port, 443);
        assert_eq!(scope.admin_kubeconfig(), Some(&b"admin"[..]));
        assert_eq!(scope.user_kubeconfig(), Some(&b"user"[..]));
    }

    #[test]
    fn test_carries_azure_identity_and_patches() {
        let mut cp = control_plane();
        cp.spec.patches = Some(vec![r#"{"tags":{"team":"aks"}}"#.to_string()]);
        let scope = ManagedControlPlaneScope::new(&cp, Vec::new(), identity());

        assert_eq!(scope.subscription_id(), "sub");
        assert_eq!(scope.patches(), [r#"{"tags":{"team":"aks"}}"#.to_string()]);
        assert!(format!("{:?}", scope.identity()).contains("sub"));
    }
}

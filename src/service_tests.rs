// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `service.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::azure::{AsyncOperation, Creator, Deleter, Getter};
    use crate::crd::{Condition, Future, FutureType};
    use crate::errors::AzureError;
    use crate::lro;
    use crate::reconcilers::status::{find_condition, set_delete_condition, set_put_condition};
    use crate::scope::FutureScope;
    use crate::spec::ResourceSpec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const SVC: &str = "agentpools";
    const CONDITION: &str = "AgentPoolsReady";

    #[derive(Clone, Debug, PartialEq)]
    struct Pool {
        name: String,
    }

    struct NamedSpec(&'static str);

    impl ResourceSpec<Pool> for NamedSpec {
        fn resource_name(&self) -> String {
            self.0.to_string()
        }
        fn resource_group_name(&self) -> String {
            "rg".into()
        }
        fn owner_resource_name(&self) -> String {
            "c1".into()
        }
        fn parameters(&self, _existing: Option<&Pool>) -> Result<Option<Pool>, ReconcileError> {
            Ok(Some(Pool {
                name: self.0.to_string(),
            }))
        }
    }

    #[derive(Default)]
    struct ScriptedClient {
        puts: Mutex<HashMap<String, Result<AsyncOperation<Pool>, AzureError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn script(self, name: &str, result: Result<AsyncOperation<Pool>, AzureError>) -> Self {
            self.puts.lock().unwrap().insert(name.to_string(), result);
            self
        }
    }

    #[async_trait]
    impl Getter<Pool> for ScriptedClient {
        async fn get(&self, _spec: &dyn ResourceSpec<Pool>) -> Result<Pool, AzureError> {
            Err(AzureError::not_found("missing"))
        }
    }

    #[async_trait]
    impl Creator<Pool> for ScriptedClient {
        async fn create_or_update_async(
            &self,
            spec: &dyn ResourceSpec<Pool>,
            _resume_token: Option<&str>,
            parameters: Option<Pool>,
            _timeout: Duration,
        ) -> Result<AsyncOperation<Pool>, AzureError> {
            let name = spec.resource_name();
            self.calls.lock().unwrap().push(format!("put {name}"));
            self.puts
                .lock()
                .unwrap()
                .remove(&name)
                .unwrap_or_else(|| Ok(AsyncOperation::Done(parameters.unwrap_or(Pool { name }))))
        }
    }

    #[async_trait]
    impl Deleter<Pool> for ScriptedClient {
        async fn delete_async(
            &self,
            spec: &dyn ResourceSpec<Pool>,
            _resume_token: Option<&str>,
            _timeout: Duration,
        ) -> Result<AsyncOperation<()>, AzureError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete {}", spec.resource_name()));
            Ok(AsyncOperation::Done(()))
        }
    }

    #[derive(Default)]
    struct ListScope {
        names: Vec<&'static str>,
        futures: Vec<Future>,
        conditions: Vec<Condition>,
        observed: Vec<String>,
    }

    impl FutureScope for ListScope {
        fn get_long_running_operation_state(&self, name: &str, service: &str, kind: FutureType) -> Option<Future> {
            lro::get_long_running_operation_state(&self.futures, name, service, kind).cloned()
        }
        fn set_long_running_operation_state(&mut self, future: Future) {
            lro::set_long_running_operation_state(&mut self.futures, future);
        }
        fn delete_long_running_operation_state(&mut self, name: &str, service: &str, kind: FutureType) {
            lro::delete_long_running_operation_state(&mut self.futures, name, service, kind);
        }
        fn update_put_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
            set_put_condition(&mut self.conditions, condition_type, service, outcome, true);
        }
        fn update_patch_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
            set_put_condition(&mut self.conditions, condition_type, service, outcome, false);
        }
        fn update_delete_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
            set_delete_condition(&mut self.conditions, condition_type, service, outcome);
        }
    }

    impl SpecSource<Pool> for ListScope {
        fn list_specs(&self) -> Vec<Box<dyn ResourceSpec<Pool>>> {
            self.names
                .iter()
                .map(|n| Box::new(NamedSpec(*n)) as Box<dyn ResourceSpec<Pool>>)
                .collect()
        }
    }

    struct RecordHook {
        fail: bool,
    }

    #[async_trait]
    impl PostCreateOrUpdateHook<ListScope, Pool> for RecordHook {
        async fn run(&self, scope: &mut ListScope, resource: &Pool) -> Result<(), ReconcileError> {
            if self.fail {
                return Err(ReconcileError::transient_default("credentials not ready"));
            }
            scope.observed.push(resource.name.clone());
            Ok(())
        }
    }

    fn service(client: ScriptedClient, fail_hook: bool) -> (Arc<ScriptedClient>, Service<Pool, ScriptedClient, ListScope>) {
        let client = Arc::new(client);
        let service = Service::new(SVC, AsyncReconciler::new(client.clone(), CONDITION))
            .with_post_hook(RecordHook { fail: fail_hook });
        (client, service)
    }

    fn scope(names: &[&'static str]) -> ListScope {
        ListScope {
            names: names.to_vec(),
            ..ListScope::default()
        }
    }

    #[tokio::test]
    async fn test_reconcile_runs_every_spec_then_hook_with_last_result() {
        let (client, service) = service(ScriptedClient::default(), false);
        let mut scope = scope(&["pool-a", "pool-b"]);

        service.reconcile(&mut scope).await.unwrap();

        assert_eq!(*client.calls.lock().unwrap(), vec!["put pool-a", "put pool-b"]);
        assert_eq!(scope.observed, vec!["pool-b".to_string()]);
        let condition = find_condition(&scope.conditions, CONDITION).unwrap();
        assert_eq!(condition.status, "True");
        assert_eq!(condition.reason.as_deref(), Some("Succeeded"));
    }

    #[tokio::test]
    async fn test_reconcile_stops_at_first_pending_spec() {
        let client = ScriptedClient::default().script(
            "pool-a",
            Ok(AsyncOperation::InProgress {
                resume_token: "tok".into(),
            }),
        );
        let (client, service) = service(client, false);
        let mut scope = scope(&["pool-a", "pool-b"]);

        let err = service.reconcile(&mut scope).await.unwrap_err();

        assert!(err.is_operation_not_done());
        assert_eq!(*client.calls.lock().unwrap(), vec!["put pool-a"]);
        assert!(scope.observed.is_empty());
        assert_eq!(scope.futures.len(), 1);
        assert_eq!(
            find_condition(&scope.conditions, CONDITION).unwrap().reason.as_deref(),
            Some("Creating")
        );
    }

    #[tokio::test]
    async fn test_reconcile_terminal_failure_sets_failed_condition() {
        let client = ScriptedClient::default().script(
            "pool-a",
            Err(AzureError::api(400, "InvalidParameter", "bad sku")),
        );
        let (_client, service) = service(client, false);
        let mut scope = scope(&["pool-a"]);

        let err = service.reconcile(&mut scope).await.unwrap_err();

        assert!(err.is_terminal());
        let condition = find_condition(&scope.conditions, CONDITION).unwrap();
        assert_eq!(condition.reason.as_deref(), Some("Failed"));
        assert!(condition
            .message
            .as_deref()
            .unwrap()
            .starts_with("agentpools failed to create or update. err: failed to create or update resource rg/pool-a"));
    }

    #[tokio::test]
    async fn test_hook_failure_is_reported() {
        let (_client, service) = service(ScriptedClient::default(), true);
        let mut scope = scope(&["pool-a"]);

        let err = service.reconcile(&mut scope).await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(
            find_condition(&scope.conditions, CONDITION).unwrap().reason.as_deref(),
            Some("TransientFailure")
        );
    }

    #[tokio::test]
    async fn test_empty_spec_list_is_ready() {
        let (client, service) = service(ScriptedClient::default(), false);
        let mut scope = scope(&[]);

        service.reconcile(&mut scope).await.unwrap();

        assert!(client.calls.lock().unwrap().is_empty());
        assert!(scope.observed.is_empty());
        assert_eq!(find_condition(&scope.conditions, CONDITION).unwrap().status, "True");
    }

    #[tokio::test]
    async fn test_delete_runs_every_spec_without_hook() {
        let (client, service) = service(ScriptedClient::default(), true);
        let mut scope = scope(&["pool-a", "pool-b"]);

        service.delete(&mut scope).await.unwrap();

        assert_eq!(
            *client.calls.lock().unwrap(),
            vec!["delete pool-a", "delete pool-b"]
        );
        let condition = find_condition(&scope.conditions, CONDITION).unwrap();
        assert_eq!(condition.reason.as_deref(), Some("Deleted"));
        assert_eq!(service.name(), SVC);
    }
}

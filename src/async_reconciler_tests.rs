// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `async_reconciler.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::azure::{Creator, Deleter, Getter};
    use crate::crd::{Condition, Future};
    use crate::lro::{
        delete_long_running_operation_state, encode_resume_token,
        get_long_running_operation_state, set_long_running_operation_state,
    };
    use crate::reconcilers::status::{
        find_condition, set_delete_condition, set_patch_condition, set_put_condition,
    };
    use crate::spec::{is_terminal_state, non_terminal_error};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const SVC: &str = "agentpools";
    const CONDITION: &str = "AgentPoolsReady";

    #[derive(Clone, Debug, PartialEq)]
    struct Pool {
        state: Option<String>,
        count: i32,
    }

    fn pool(state: &str, count: i32) -> Pool {
        Pool {
            state: Some(state.to_string()),
            count,
        }
    }

    struct PoolSpec {
        count: i32,
        invalid: bool,
    }

    fn spec(count: i32) -> PoolSpec {
        PoolSpec {
            count,
            invalid: false,
        }
    }

    impl ResourceSpec<Pool> for PoolSpec {
        fn resource_name(&self) -> String {
            "pool-a".into()
        }
        fn resource_group_name(&self) -> String {
            "rg".into()
        }
        fn owner_resource_name(&self) -> String {
            "c1".into()
        }
        fn parameters(&self, existing: Option<&Pool>) -> Result<Option<Pool>, ReconcileError> {
            if self.invalid {
                return Err(ReconcileError::terminal("invalid count"));
            }
            match existing {
                None => Ok(Some(Pool {
                    state: None,
                    count: self.count,
                })),
                Some(observed) if !is_terminal_state(observed.state.as_deref()) => Err(
                    non_terminal_error("agent pool", observed.state.as_deref().unwrap_or_default()),
                ),
                Some(observed) if observed.count == self.count => Ok(None),
                Some(_) => Ok(Some(Pool {
                    state: None,
                    count: self.count,
                })),
            }
        }
    }

    struct FakeClient {
        get_result: Mutex<Result<Pool, AzureError>>,
        put_results: Mutex<VecDeque<Result<AsyncOperation<Pool>, AzureError>>>,
        delete_results: Mutex<VecDeque<Result<AsyncOperation<()>, AzureError>>>,
        put_calls: Mutex<Vec<(Option<String>, Option<Pool>)>>,
        delete_calls: Mutex<Vec<Option<String>>>,
        get_calls: Mutex<usize>,
    }

    impl FakeClient {
        fn new(get_result: Result<Pool, AzureError>) -> Arc<Self> {
            Arc::new(Self {
                get_result: Mutex::new(get_result),
                put_results: Mutex::new(VecDeque::new()),
                delete_results: Mutex::new(VecDeque::new()),
                put_calls: Mutex::new(Vec::new()),
                delete_calls: Mutex::new(Vec::new()),
                get_calls: Mutex::new(0),
            })
        }

        fn on_put(&self, result: Result<AsyncOperation<Pool>, AzureError>) {
            self.put_results.lock().unwrap().push_back(result);
        }

        fn on_delete(&self, result: Result<AsyncOperation<()>, AzureError>) {
            self.delete_results.lock().unwrap().push_back(result);
        }

        fn put_calls(&self) -> Vec<(Option<String>, Option<Pool>)> {
            self.put_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Getter<Pool> for FakeClient {
        async fn get(&self, _spec: &dyn ResourceSpec<Pool>) -> Result<Pool, AzureError> {
            *self.get_calls.lock().unwrap() += 1;
            self.get_result.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Creator<Pool> for FakeClient {
        async fn create_or_update_async(
            &self,
            _spec: &dyn ResourceSpec<Pool>,
            resume_token: Option<&str>,
            parameters: Option<Pool>,
            _timeout: Duration,
        ) -> Result<AsyncOperation<Pool>, AzureError> {
            self.put_calls
                .lock()
                .unwrap()
                .push((resume_token.map(str::to_string), parameters.clone()));
            self.put_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(AsyncOperation::Done(parameters.unwrap_or(pool("Succeeded", 0)))))
        }
    }

    #[async_trait]
    impl Deleter<Pool> for FakeClient {
        async fn delete_async(
            &self,
            _spec: &dyn ResourceSpec<Pool>,
            resume_token: Option<&str>,
            _timeout: Duration,
        ) -> Result<AsyncOperation<()>, AzureError> {
            self.delete_calls
                .lock()
                .unwrap()
                .push(resume_token.map(str::to_string));
            self.delete_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(AsyncOperation::Done(())))
        }
    }

    #[derive(Default)]
    struct FakeScope {
        futures: Vec<Future>,
        conditions: Vec<Condition>,
        patch_updates: usize,
    }

    impl FutureScope for FakeScope {
        fn get_long_running_operation_state(
            &self,
            name: &str,
            service: &str,
            kind: FutureType,
        ) -> Option<Future> {
            get_long_running_operation_state(&self.futures, name, service, kind).cloned()
        }
        fn set_long_running_operation_state(&mut self, future: Future) {
            set_long_running_operation_state(&mut self.futures, future);
        }
        fn delete_long_running_operation_state(&mut self, name: &str, service: &str, kind: FutureType) {
            delete_long_running_operation_state(&mut self.futures, name, service, kind);
        }
        fn update_put_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
            set_put_condition(&mut self.conditions, condition_type, service, outcome, true);
        }
        fn update_patch_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
            self.patch_updates += 1;
            set_patch_condition(&mut self.conditions, condition_type, service, outcome);
        }
        fn update_delete_status(&mut self, condition_type: &str, service: &str, outcome: Option<&ReconcileError>) {
            set_delete_condition(&mut self.conditions, condition_type, service, outcome);
        }
    }

    fn reconciler(client: &Arc<FakeClient>) -> AsyncReconciler<Pool, FakeClient> {
        AsyncReconciler::new(client.clone(), CONDITION)
    }

    fn stored_token(scope: &FakeScope, kind: FutureType) -> Option<String> {
        get_long_running_operation_state(&scope.futures, "pool-a", SVC, kind)
            .map(|f| decode_resume_token(&f.data).unwrap())
    }

    #[tokio::test]
    async fn test_create_when_not_found() {
        let client = FakeClient::new(Err(AzureError::not_found("missing")));
        client.on_put(Ok(AsyncOperation::Done(pool("Succeeded", 2))));
        let mut scope = FakeScope::default();

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(outcome, ReconcileOutcome::Done(Some(pool("Succeeded", 2))));
        let calls = client.put_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, None);
        assert_eq!(calls[0].1.as_ref().unwrap().count, 2);
        assert!(scope.futures.is_empty());
    }

    #[tokio::test]
    async fn test_up_to_date_resource_is_not_updated() {
        let client = FakeClient::new(Ok(pool("Succeeded", 2)));
        let mut scope = FakeScope::default();

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(outcome, ReconcileOutcome::Done(Some(pool("Succeeded", 2))));
        assert!(client.put_calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_terminal_state_declines_update() {
        let client = FakeClient::new(Ok(pool("Deleting", 1)));
        let mut scope = FakeScope::default();

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(3), SVC)
            .await;

        let ReconcileOutcome::TransientFail { requeue_after, error } = outcome else {
            panic!("expected a transient failure, got {outcome:?}");
        };
        assert_eq!(requeue_after, Duration::from_secs(20));
        assert!(error.to_string().contains("Deleting"));
        assert!(error
            .to_string()
            .starts_with("failed to get desired parameters for resource rg/pool-a (service: agentpools)"));
        assert!(client.put_calls().is_empty());
        assert_eq!(scope.patch_updates, 1);
        assert_eq!(
            find_condition(&scope.conditions, CONDITION).unwrap().reason.as_deref(),
            Some("TransientFailure")
        );
    }

    #[tokio::test]
    async fn test_parameter_error_is_permanent() {
        let client = FakeClient::new(Err(AzureError::not_found("missing")));
        let mut scope = FakeScope::default();
        let spec = PoolSpec {
            count: 1,
            invalid: true,
        };

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec, SVC)
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::PermanentFail(ReconcileError::terminal(
                "failed to get desired parameters for resource rg/pool-a (service: agentpools): invalid count"
            ))
        );
        assert!(client.put_calls().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_stores_token_and_reports_in_progress() {
        let client = FakeClient::new(Err(AzureError::not_found("missing")));
        client.on_put(Ok(AsyncOperation::InProgress {
            resume_token: "tok1".into(),
        }));
        let mut scope = FakeScope::default();

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::InProgress {
                requeue_after: Duration::from_secs(15),
                message: "operation type PUT on Azure resource rg/pool-a is not done. Object will be requeued after 15s".into(),
            }
        );
        assert_eq!(stored_token(&scope, FutureType::Put).as_deref(), Some("tok1"));
        let condition = find_condition(&scope.conditions, CONDITION).unwrap();
        assert_eq!(condition.reason.as_deref(), Some("Creating"));
    }

    #[tokio::test]
    async fn test_resume_uses_stored_token_without_reading_resource() {
        let client = FakeClient::new(Ok(pool("Succeeded", 9)));
        client.on_put(Ok(AsyncOperation::InProgress {
            resume_token: "tok2".into(),
        }));
        let mut scope = FakeScope::default();
        scope.set_long_running_operation_state(new_future(FutureType::Put, SVC, "pool-a", "rg", "tok1"));

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert!(matches!(outcome, ReconcileOutcome::InProgress { .. }));
        assert_eq!(client.put_calls(), vec![(Some("tok1".to_string()), None)]);
        assert_eq!(*client.get_calls.lock().unwrap(), 0);
        assert_eq!(scope.futures.len(), 1);
        assert_eq!(stored_token(&scope, FutureType::Put).as_deref(), Some("tok2"));
    }

    #[tokio::test]
    async fn test_resume_completion_clears_store() {
        let client = FakeClient::new(Ok(pool("Succeeded", 2)));
        client.on_put(Ok(AsyncOperation::Done(pool("Succeeded", 2))));
        let mut scope = FakeScope::default();
        scope.set_long_running_operation_state(new_future(FutureType::Put, SVC, "pool-a", "rg", "tok1"));

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert!(outcome.is_done());
        assert!(scope.futures.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_token_resets_store() {
        let client = FakeClient::new(Ok(pool("Succeeded", 2)));
        let mut scope = FakeScope::default();
        scope.futures.push(Future {
            r#type: FutureType::Put,
            service_name: SVC.into(),
            name: "pool-a".into(),
            resource_group: "rg".into(),
            data: "***not base64***".into(),
        });

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::PermanentFail(ReconcileError::terminal(DECODE_FAILURE_MESSAGE))
        );
        assert!(scope.futures.is_empty());
        assert!(client.put_calls().is_empty());
    }

    #[tokio::test]
    async fn test_token_rejected_by_client_resets_store() {
        let client = FakeClient::new(Ok(pool("Succeeded", 2)));
        client.on_put(Err(AzureError::InvalidResumeToken("bad json".into())));
        let mut scope = FakeScope::default();
        scope.set_long_running_operation_state(new_future(FutureType::Put, SVC, "pool-a", "rg", "garbage"));

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(outcome.error().unwrap().to_string(), DECODE_FAILURE_MESSAGE);
        assert!(scope.futures.is_empty());
    }

    #[tokio::test]
    async fn test_transient_error_while_resuming_keeps_operation() {
        let client = FakeClient::new(Ok(pool("Succeeded", 2)));
        client.on_put(Err(AzureError::DeadlineExceeded));
        let mut scope = FakeScope::default();
        scope.set_long_running_operation_state(new_future(FutureType::Put, SVC, "pool-a", "rg", "tok1"));

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        let ReconcileOutcome::InProgress { requeue_after, message } = outcome else {
            panic!("expected the operation to stay in progress, got {outcome:?}");
        };
        assert_eq!(requeue_after, Duration::from_secs(15));
        assert!(message.starts_with("failed to create or update resource rg/pool-a (service: agentpools): "));
        assert_eq!(stored_token(&scope, FutureType::Put).as_deref(), Some("tok1"));
        assert_eq!(
            find_condition(&scope.conditions, CONDITION).unwrap().reason.as_deref(),
            Some("TransientFailure")
        );
    }

    #[tokio::test]
    async fn test_transient_error_while_resuming_delete_keeps_operation() {
        let client = FakeClient::new(Ok(pool("Succeeded", 2)));
        client.on_delete(Err(AzureError::api(429, "TooManyRequests", "slow down")));
        let mut scope = FakeScope::default();
        scope.set_long_running_operation_state(new_future(FutureType::Delete, SVC, "pool-a", "rg", "del1"));

        let outcome = reconciler(&client)
            .delete_resource(&mut scope, &spec(2), SVC)
            .await;

        assert!(matches!(
            outcome,
            ReconcileOutcome::InProgress { requeue_after, .. } if requeue_after == Duration::from_secs(15)
        ));
        assert_eq!(stored_token(&scope, FutureType::Delete).as_deref(), Some("del1"));
    }

    #[tokio::test]
    async fn test_transient_error_uses_configured_requeue() {
        let client = FakeClient::new(Err(AzureError::api(500, "InternalServerError", "oops")));
        let mut scope = FakeScope::default();

        let outcome = reconciler(&client)
            .with_requeue(Duration::from_secs(7))
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert!(matches!(
            outcome,
            ReconcileOutcome::TransientFail { requeue_after, ref error }
                if requeue_after == Duration::from_secs(7) && error.requeue_after() == Duration::from_secs(7)
        ));
    }

    #[tokio::test]
    async fn test_create_failure_is_permanent_and_clears_store() {
        let client = FakeClient::new(Ok(pool("Succeeded", 1)));
        client.on_put(Err(AzureError::api(400, "InvalidParameter", "bad vm size")));
        let mut scope = FakeScope::default();

        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::PermanentFail(ReconcileError::terminal(
                "failed to create or update resource rg/pool-a (service: agentpools): HTTP 400 InvalidParameter: bad vm size"
            ))
        );
        assert!(scope.futures.is_empty());
    }

    #[tokio::test]
    async fn test_missing_parent_uses_dependency_hint() {
        let client = FakeClient::new(Err(AzureError::not_found("missing")));
        client.on_put(Err(AzureError::not_found("managed cluster c1 not found")));
        let mut scope = FakeScope::default();

        let outcome = reconciler(&client)
            .with_not_found_hint("agent pool dependent resource does not exist yet")
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::TransientFail {
                requeue_after: Duration::from_secs(20),
                error: ReconcileError::transient_default(
                    "agent pool dependent resource does not exist yet"
                ),
            }
        );
    }

    #[tokio::test]
    async fn test_get_failures_are_classified() {
        let client = FakeClient::new(Err(AzureError::api(503, "ServiceUnavailable", "busy")));
        let mut scope = FakeScope::default();
        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;
        let ReconcileOutcome::TransientFail { requeue_after, error } = outcome else {
            panic!("expected a transient failure");
        };
        assert_eq!(requeue_after, Duration::from_secs(15));
        assert_eq!(error.requeue_after(), Duration::from_secs(15));
        assert!(error
            .to_string()
            .starts_with("failed to get existing resource rg/pool-a (service: agentpools): "));

        let client = FakeClient::new(Err(AzureError::api(403, "AuthorizationFailed", "denied")));
        let outcome = reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), SVC)
            .await;
        assert!(matches!(outcome, ReconcileOutcome::PermanentFail(_)));
        assert!(client.put_calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_missing_resource_is_idempotent() {
        let client = FakeClient::new(Err(AzureError::not_found("missing")));
        client.on_delete(Err(AzureError::not_found("missing")));
        let mut scope = FakeScope::default();
        scope.set_long_running_operation_state(new_future(FutureType::Put, SVC, "pool-a", "rg", "unrelated"));
        let before = scope.futures.clone();

        let outcome = reconciler(&client)
            .delete_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(outcome, ReconcileOutcome::Done(None));
        assert_eq!(scope.futures, before);
    }

    #[tokio::test]
    async fn test_delete_in_progress_then_resumed() {
        let client = FakeClient::new(Ok(pool("Succeeded", 2)));
        client.on_delete(Ok(AsyncOperation::InProgress {
            resume_token: "del1".into(),
        }));
        client.on_delete(Ok(AsyncOperation::Done(())));
        let mut scope = FakeScope::default();
        let reconciler = reconciler(&client);

        let outcome = reconciler.delete_resource(&mut scope, &spec(2), SVC).await;
        assert_eq!(
            outcome,
            ReconcileOutcome::InProgress {
                requeue_after: Duration::from_secs(15),
                message: "operation type DELETE on Azure resource rg/pool-a is not done. Object will be requeued after 15s".into(),
            }
        );
        assert_eq!(stored_token(&scope, FutureType::Delete).as_deref(), Some("del1"));
        assert_eq!(
            find_condition(&scope.conditions, CONDITION).unwrap().reason.as_deref(),
            Some("Deleting")
        );

        let outcome = reconciler.delete_resource(&mut scope, &spec(2), SVC).await;
        assert_eq!(outcome, ReconcileOutcome::Done(None));
        assert_eq!(
            *client.delete_calls.lock().unwrap(),
            vec![None, Some("del1".to_string())]
        );
        assert!(scope.futures.is_empty());
    }

    #[tokio::test]
    async fn test_delete_undecodable_token() {
        let client = FakeClient::new(Ok(pool("Succeeded", 2)));
        let mut scope = FakeScope::default();
        scope.futures.push(Future {
            r#type: FutureType::Delete,
            service_name: SVC.into(),
            name: "pool-a".into(),
            resource_group: "rg".into(),
            data: "%%%".into(),
        });

        let outcome = reconciler(&client)
            .delete_resource(&mut scope, &spec(2), SVC)
            .await;

        assert_eq!(outcome.error().unwrap().to_string(), DECODE_FAILURE_MESSAGE);
        assert!(scope.futures.is_empty());
        assert!(client.delete_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_into_result() {
        let outcome: ReconcileOutcome<Pool> = ReconcileOutcome::InProgress {
            requeue_after: Duration::from_secs(15),
            message: "pending".into(),
        };
        let err = outcome.into_result().unwrap_err();
        assert!(err.is_operation_not_done());
        assert_eq!(err.requeue_after(), Duration::from_secs(15));

        let outcome: ReconcileOutcome<Pool> = ReconcileOutcome::Done(None);
        assert_eq!(outcome.into_result().unwrap(), None);

        assert_eq!(encode_resume_token("x"), "eA==");
    }

    #[tokio::test]
    async fn test_operation_metrics_count_in_progress_and_error_reasons() {
        const METRIC_SVC: &str = "metricspools";
        let in_progress = || {
            metrics::AZURE_OPERATIONS_TOTAL
                .with_label_values(&[METRIC_SVC, "PUT", "in_progress"])
                .get()
        };
        let before = in_progress();

        let client = FakeClient::new(Err(AzureError::not_found("missing")));
        client.on_put(Ok(AsyncOperation::InProgress {
            resume_token: "tok1".into(),
        }));
        let mut scope = FakeScope::default();
        reconciler(&client)
            .create_or_update_resource(&mut scope, &spec(2), METRIC_SVC)
            .await;
        assert!((in_progress() - before - 1.0).abs() < f64::EPSILON);

        let throttled = AzureError::api(429, "TooManyRequests", "slow down");
        let reason = map_azure_error_to_reason(&throttled);
        let errors = || {
            metrics::AZURE_ERRORS_TOTAL
                .with_label_values(&[METRIC_SVC, reason])
                .get()
        };
        let before = errors();
        let client = FakeClient::new(Err(throttled.clone()));
        reconciler(&client)
            .create_or_update_resource(&mut FakeScope::default(), &spec(2), METRIC_SVC)
            .await;
        assert!((errors() - before - 1.0).abs() < f64::EPSILON);
    }
}

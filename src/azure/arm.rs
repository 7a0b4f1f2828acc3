// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure Resource Manager REST client.
//!
//! Long-running PUT and DELETE requests follow the ARM async pattern:
//!
//! 1. `Azure-AsyncOperation` header: poll the operation status resource
//! 2. `Location` header on 202: poll until the URL stops answering 202
//! 3. neither: poll the resource itself until `provisioningState` is terminal
//!    (or, for DELETE, until it is gone)
//!
//! Polling runs until the caller's deadline. When the deadline expires the
//! poller is returned as a resume token (a JSON [`PollerState`]) so a later
//! pass, possibly in a new process, continues where this one stopped.

use reqwest::{header::HeaderMap, Client as HttpClient, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::auth::TokenCredential;
use super::models::{ErrorDetail, ErrorResponse, OperationStatus, ProvisioningView};
use super::AsyncOperation;
use crate::constants::{
    ARM_TOKEN_SCOPE, DEFAULT_POLL_INTERVAL, PROVISIONING_STATE_CANCELED,
    PROVISIONING_STATE_FAILED, PROVISIONING_STATE_SUCCEEDED,
};
use crate::errors::AzureError;
use crate::reconcilers::retry::{arm_backoff, is_retryable_http_status, retry_arm_call};

/// How a poller learns that its operation finished.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PollingMethod {
    AsyncOperation,
    Location,
    Body,
}

/// Serialized form of an in-flight poller; this is the resume token.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollerState {
    pub method: String,
    pub resource_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polling_url: Option<String>,
    pub polling_method: PollingMethod,
}

impl PollerState {
    fn new(method: &Method, resource_url: &str, polling_url: Option<String>, polling_method: PollingMethod) -> Self {
        Self {
            method: method.as_str().to_string(),
            resource_url: resource_url.to_string(),
            polling_url,
            polling_method,
        }
    }

    fn is_delete(&self) -> bool {
        self.method == Method::DELETE.as_str()
    }

    /// Serializes the poller into a resume token.
    ///
    /// # Errors
    ///
    /// Returns [`AzureError::Serialization`] if the state cannot be encoded.
    pub fn to_token(&self) -> Result<String, AzureError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a resume token produced by [`PollerState::to_token`].
    ///
    /// # Errors
    ///
    /// Returns [`AzureError::InvalidResumeToken`] when the token is not a
    /// poller for `expected` requests.
    pub fn from_token(token: &str, expected: &Method) -> Result<Self, AzureError> {
        let state: Self = serde_json::from_str(token)
            .map_err(|e| AzureError::InvalidResumeToken(e.to_string()))?;
        if state.method != expected.as_str() {
            return Err(AzureError::InvalidResumeToken(format!(
                "token is for a {} operation, expected {expected}",
                state.method
            )));
        }
        Ok(state)
    }
}

struct ArmResponse {
    status: u16,
    async_operation: Option<String>,
    location: Option<String>,
    body: String,
}

impl ArmResponse {
    fn json<T: DeserializeOwned>(&self) -> Result<T, AzureError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    fn provisioning_state(&self) -> Option<String> {
        serde_json::from_str::<ProvisioningView>(&self.body)
            .ok()
            .and_then(|v| v.properties.provisioning_state)
    }
}

enum Started {
    Done(Option<String>),
    Poll(PollerState),
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn operation_failed(status: &str, detail: Option<ErrorDetail>) -> AzureError {
    let detail = detail.unwrap_or_default();
    AzureError::OperationFailed {
        status: status.to_string(),
        code: detail.code,
        message: detail.message,
    }
}

/// Transport and endpoint shared by the ARM clients of every pass.
///
/// The credential is not part of the connection: each pass builds its
/// clients with the credential its scope carries.
#[derive(Clone, Debug)]
pub struct ArmConnection {
    http: HttpClient,
    endpoint: String,
}

impl ArmConnection {
    #[must_use]
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// ARM client authenticating with `credential`.
    #[must_use]
    pub fn client(&self, credential: Arc<dyn TokenCredential>) -> ArmClient {
        ArmClient::new(self.http.clone(), self.endpoint.clone(), credential)
    }
}

/// REST client for Azure Resource Manager.
#[derive(Clone)]
pub struct ArmClient {
    http: HttpClient,
    endpoint: String,
    credential: Arc<dyn TokenCredential>,
    poll_interval: Duration,
    max_retry_time: Option<Duration>,
}

impl ArmClient {
    #[must_use]
    pub fn new(
        http: HttpClient,
        endpoint: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credential,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_retry_time: None,
        }
    }

    /// Sets the delay between two polls of a long-running operation.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Caps the time spent retrying a single transient request failure.
    #[must_use]
    pub fn with_max_retry_time(mut self, max: Duration) -> Self {
        self.max_retry_time = Some(max);
        self
    }

    /// Absolute URL of `path` (starting with `/subscriptions/...`).
    #[must_use]
    pub fn url(&self, path: &str, api_version: &str) -> String {
        format!("{}{path}?api-version={api_version}", self.endpoint)
    }

    /// GET a resource.
    ///
    /// # Errors
    ///
    /// [`AzureError::NotFound`] for 404, [`AzureError::Api`] for other failures.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, AzureError> {
        self.request(Method::GET, url, None, &BTreeMap::new())
            .await?
            .json()
    }

    /// POST an action without a body (e.g. `listClusterAdminCredential`).
    ///
    /// # Errors
    ///
    /// Returns the classified ARM error.
    pub async fn post<T: DeserializeOwned>(&self, url: &str) -> Result<T, AzureError> {
        self.request(Method::POST, url, None, &BTreeMap::new())
            .await?
            .json()
    }

    /// Starts a PUT and polls it until it finishes or `timeout` expires.
    ///
    /// # Errors
    ///
    /// [`AzureError::DeadlineExceeded`] when the request itself did not
    /// complete in time; otherwise the classified ARM error.
    pub async fn begin_put<B, T>(
        &self,
        url: &str,
        body: &B,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<AsyncOperation<T>, AzureError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let deadline = Instant::now() + timeout;
        let body = serde_json::to_value(body)?;
        let started = tokio::time::timeout_at(
            deadline,
            self.start(Method::PUT, url, Some(&body), headers),
        )
        .await
        .map_err(|_| AzureError::DeadlineExceeded)??;

        match started {
            Started::Done(Some(body)) if !body.trim().is_empty() => {
                Ok(AsyncOperation::Done(serde_json::from_str(&body)?))
            }
            Started::Done(_) => Ok(AsyncOperation::Done(self.get(url).await?)),
            Started::Poll(state) => self.finish_put(state, deadline).await,
        }
    }

    /// Resumes a PUT poller from its resume token.
    ///
    /// # Errors
    ///
    /// [`AzureError::InvalidResumeToken`] for an unusable token; otherwise the
    /// classified ARM error.
    pub async fn resume_put<T: DeserializeOwned>(
        &self,
        token: &str,
        timeout: Duration,
    ) -> Result<AsyncOperation<T>, AzureError> {
        let state = PollerState::from_token(token, &Method::PUT)?;
        self.finish_put(state, Instant::now() + timeout).await
    }

    /// Starts a DELETE and polls it until it finishes or `timeout` expires.
    ///
    /// # Errors
    ///
    /// [`AzureError::NotFound`] when the resource does not exist; otherwise as
    /// [`ArmClient::begin_put`].
    pub async fn begin_delete(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<AsyncOperation<()>, AzureError> {
        let deadline = Instant::now() + timeout;
        let started = tokio::time::timeout_at(
            deadline,
            self.start(Method::DELETE, url, None, &BTreeMap::new()),
        )
        .await
        .map_err(|_| AzureError::DeadlineExceeded)??;

        match started {
            Started::Done(_) => Ok(AsyncOperation::Done(())),
            Started::Poll(state) => self.finish_delete(state, deadline).await,
        }
    }

    /// Resumes a DELETE poller from its resume token.
    ///
    /// # Errors
    ///
    /// As [`ArmClient::resume_put`].
    pub async fn resume_delete(
        &self,
        token: &str,
        timeout: Duration,
    ) -> Result<AsyncOperation<()>, AzureError> {
        let state = PollerState::from_token(token, &Method::DELETE)?;
        self.finish_delete(state, Instant::now() + timeout).await
    }

    async fn finish_put<T: DeserializeOwned>(
        &self,
        state: PollerState,
        deadline: Instant,
    ) -> Result<AsyncOperation<T>, AzureError> {
        if let Some(resume_token) = self.poll_until(&state, deadline).await? {
            return Ok(AsyncOperation::InProgress { resume_token });
        }
        Ok(AsyncOperation::Done(self.get(&state.resource_url).await?))
    }

    async fn finish_delete(
        &self,
        state: PollerState,
        deadline: Instant,
    ) -> Result<AsyncOperation<()>, AzureError> {
        match self.poll_until(&state, deadline).await? {
            Some(resume_token) => Ok(AsyncOperation::InProgress { resume_token }),
            None => Ok(AsyncOperation::Done(())),
        }
    }

    /// Polls until done (`None`) or until `deadline` (`Some(resume_token)`).
    async fn poll_until(
        &self,
        state: &PollerState,
        deadline: Instant,
    ) -> Result<Option<String>, AzureError> {
        match tokio::time::timeout_at(deadline, self.poll_until_done(state)).await {
            Ok(result) => result.map(|()| None),
            Err(_) => {
                debug!(
                    method = %state.method,
                    url = %state.resource_url,
                    "Deadline reached while polling, returning resume token"
                );
                state.to_token().map(Some)
            }
        }
    }

    async fn start(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        headers: &BTreeMap<String, String>,
    ) -> Result<Started, AzureError> {
        let response = self.request(method.clone(), url, body, headers).await?;

        if let Some(operation) = response.async_operation.clone() {
            return Ok(Started::Poll(PollerState::new(
                &method,
                url,
                Some(operation),
                PollingMethod::AsyncOperation,
            )));
        }
        if response.status == 202 {
            return Ok(Started::Poll(match response.location.clone() {
                Some(location) => {
                    PollerState::new(&method, url, Some(location), PollingMethod::Location)
                }
                None => PollerState::new(&method, url, None, PollingMethod::Body),
            }));
        }
        if method == Method::DELETE {
            return Ok(Started::Done(None));
        }

        match response.provisioning_state().as_deref() {
            None | Some(PROVISIONING_STATE_SUCCEEDED) => Ok(Started::Done(Some(response.body))),
            Some(state @ (PROVISIONING_STATE_FAILED | PROVISIONING_STATE_CANCELED)) => {
                Err(operation_failed(state, None))
            }
            Some(_) => Ok(Started::Poll(PollerState::new(
                &method,
                url,
                None,
                PollingMethod::Body,
            ))),
        }
    }

    async fn poll_until_done(&self, state: &PollerState) -> Result<(), AzureError> {
        let no_headers = BTreeMap::new();
        loop {
            match state.polling_method {
                PollingMethod::AsyncOperation => {
                    let url = state.polling_url.as_deref().unwrap_or(&state.resource_url);
                    let status: OperationStatus = self
                        .request(Method::GET, url, None, &no_headers)
                        .await?
                        .json()?;
                    match status.status.as_str() {
                        PROVISIONING_STATE_SUCCEEDED => return Ok(()),
                        PROVISIONING_STATE_FAILED | PROVISIONING_STATE_CANCELED => {
                            return Err(operation_failed(&status.status, status.error));
                        }
                        _ => {}
                    }
                }
                PollingMethod::Location => {
                    let url = state.polling_url.as_deref().unwrap_or(&state.resource_url);
                    match self.request(Method::GET, url, None, &no_headers).await {
                        Ok(r) if r.status == 202 => {}
                        Ok(_) => return Ok(()),
                        Err(e) if e.is_not_found() && state.is_delete() => return Ok(()),
                        Err(e) => return Err(e),
                    }
                }
                PollingMethod::Body => {
                    match self
                        .request(Method::GET, &state.resource_url, None, &no_headers)
                        .await
                    {
                        Err(e) if e.is_not_found() && state.is_delete() => return Ok(()),
                        Err(e) => return Err(e),
                        Ok(r) => match r.provisioning_state().as_deref() {
                            Some(s @ (PROVISIONING_STATE_FAILED | PROVISIONING_STATE_CANCELED)) => {
                                return Err(operation_failed(s, None));
                            }
                            None | Some(PROVISIONING_STATE_SUCCEEDED) if !state.is_delete() => {
                                return Ok(());
                            }
                            _ => {}
                        },
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        headers: &BTreeMap<String, String>,
    ) -> Result<ArmResponse, AzureError> {
        let operation = format!("{method} {url}");
        retry_arm_call(
            || self.request_internal(method.clone(), url, body, headers),
            arm_backoff(self.max_retry_time),
            &operation,
        )
        .await
    }

    async fn request_internal(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        headers: &BTreeMap<String, String>,
    ) -> Result<ArmResponse, AzureError> {
        let token = self.credential.get_token(ARM_TOKEN_SCOPE).await?;

        debug!(method = %method, url = %url, "ARM request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&token.token);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let async_operation = header_value(response.headers(), "azure-asyncoperation");
        let location = header_value(response.headers(), "location");
        let text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or_else(|_| ErrorDetail {
                    code: status.canonical_reason().unwrap_or_default().to_string(),
                    message: text.clone(),
                });
            if is_retryable_http_status(status) {
                warn!(method = %method, url = %url, status = %status, code = %detail.code, "Retryable ARM error");
            } else {
                debug!(method = %method, url = %url, status = %status, code = %detail.code, "ARM request failed");
            }
            return Err(AzureError::api(status.as_u16(), detail.code, detail.message));
        }

        Ok(ArmResponse {
            status: status.as_u16(),
            async_operation,
            location,
            body: text,
        })
    }
}

#[cfg(test)]
#[path = "arm_tests.rs"]
mod arm_tests;

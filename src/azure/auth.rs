// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure AD token acquisition.
//!
//! Two credentials are supported, both using the OAuth2 client-credentials
//! flow against `{authority}/{tenant}/oauth2/v2.0/token`:
//!
//! - [`ClientSecretCredential`] - service principal with a client secret
//! - [`WorkloadIdentityCredential`] - federated token file projected into the pod
//!
//! Tokens are cached until [`TOKEN_REFRESH_SKEW`] before they expire.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

use crate::constants::TOKEN_REFRESH_SKEW;
use crate::errors::AzureError;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// A bearer token and its expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let skew = chrono::Duration::from_std(TOKEN_REFRESH_SKEW).unwrap_or_default();
        now + skew < self.expires_on
    }
}

/// Source of ARM bearer tokens.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Returns a token valid for `scope`.
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AzureError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Default)]
struct TokenCache {
    token: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    async fn cached(&self) -> Option<AccessToken> {
        self.token
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_fresh(Utc::now()))
            .cloned()
    }

    async fn store(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }
}

async fn request_token(
    http: &HttpClient,
    authority: &str,
    tenant_id: &str,
    form: &[(&str, &str)],
) -> Result<AccessToken, AzureError> {
    let url = format!(
        "{}/{tenant_id}/oauth2/v2.0/token",
        authority.trim_end_matches('/')
    );
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form)
        .finish();

    let response = http
        .post(&url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await
        .map_err(|e| AzureError::Auth(format!("token request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(AzureError::Auth(format!(
            "token endpoint returned {status}: {text}"
        )));
    }

    let parsed: TokenResponse = response
        .json()
        .await
        .map_err(|e| AzureError::Auth(format!("invalid token response: {e}")))?;

    debug!(tenant_id = %tenant_id, expires_in = parsed.expires_in, "Acquired Azure AD token");

    Ok(AccessToken {
        token: parsed.access_token,
        expires_on: Utc::now() + chrono::Duration::seconds(parsed.expires_in),
    })
}

/// Service principal authenticated with a client secret.
pub struct ClientSecretCredential {
    http: HttpClient,
    authority: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    cache: TokenCache,
}

impl ClientSecretCredential {
    #[must_use]
    pub fn new(
        http: HttpClient,
        authority: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            authority: authority.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cache: TokenCache::default(),
        }
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AzureError> {
        if let Some(token) = self.cache.cached().await {
            return Ok(token);
        }
        let token = request_token(
            &self.http,
            &self.authority,
            &self.tenant_id,
            &[
                ("grant_type", "client_credentials"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("scope", scope),
            ],
        )
        .await?;
        self.cache.store(token.clone()).await;
        Ok(token)
    }
}

/// Workload identity: exchanges the projected service-account token for an AAD token.
pub struct WorkloadIdentityCredential {
    http: HttpClient,
    authority: String,
    tenant_id: String,
    client_id: String,
    token_file: PathBuf,
    cache: TokenCache,
}

impl WorkloadIdentityCredential {
    #[must_use]
    pub fn new(
        http: HttpClient,
        authority: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        token_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            http,
            authority: authority.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            token_file: token_file.into(),
            cache: TokenCache::default(),
        }
    }
}

#[async_trait]
impl TokenCredential for WorkloadIdentityCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AzureError> {
        if let Some(token) = self.cache.cached().await {
            return Ok(token);
        }
        // The file is rotated by the kubelet; read it on every exchange.
        let assertion = tokio::fs::read_to_string(&self.token_file)
            .await
            .map_err(|e| {
                AzureError::Auth(format!(
                    "failed to read federated token file {}: {e}",
                    self.token_file.display()
                ))
            })?;
        let token = request_token(
            &self.http,
            &self.authority,
            &self.tenant_id,
            &[
                ("grant_type", "client_credentials"),
                ("client_id", &self.client_id),
                ("client_assertion_type", CLIENT_ASSERTION_TYPE),
                ("client_assertion", assertion.trim()),
                ("scope", scope),
            ],
        )
        .await?;
        self.cache.store(token.clone()).await;
        Ok(token)
    }
}

/// Fixed token, for local development against a proxy and for tests.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken, AzureError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: DateTime::<Utc>::MAX_UTC,
        })
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;

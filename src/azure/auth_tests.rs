// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `auth.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_body(token: &str) -> serde_json::Value {
        serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3600,
            "access_token": token,
        })
    }

    #[test]
    fn test_token_freshness_honours_skew() {
        let now = Utc::now();
        let soon = AccessToken {
            token: "t".into(),
            expires_on: now + chrono::Duration::seconds(60),
        };
        assert!(!soon.is_fresh(now));

        let later = AccessToken {
            token: "t".into(),
            expires_on: now + chrono::Duration::seconds(3600),
        };
        assert!(later.is_fresh(now));
    }

    #[tokio::test]
    async fn test_client_secret_credential_caches_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc")))
            .expect(1)
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new(
            reqwest::Client::new(),
            server.uri(),
            "tenant-1",
            "client-1",
            "s3cret",
        );

        let first = credential.get_token("https://management.azure.com/.default").await.unwrap();
        let second = credential.get_token("https://management.azure.com/.default").await.unwrap();
        assert_eq!(first.token, "abc");
        assert_eq!(second.token, "abc");
    }

    #[tokio::test]
    async fn test_client_secret_credential_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let credential =
            ClientSecretCredential::new(reqwest::Client::new(), server.uri(), "t", "c", "wrong");
        let err = credential.get_token("scope").await.unwrap_err();
        assert!(err.is_permission());
        assert!(err.to_string().contains("invalid_client"));
    }

    #[tokio::test]
    async fn test_workload_identity_sends_assertion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("client_assertion=projected-jwt"))
            .and(body_string_contains("client_assertion_type=urn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("wi-token")))
            .mount(&server)
            .await;

        let file = std::env::temp_dir().join(format!(
            "capz-aks-federated-token-{}",
            std::process::id()
        ));
        std::fs::write(&file, "projected-jwt\n").unwrap();

        let credential = WorkloadIdentityCredential::new(
            reqwest::Client::new(),
            server.uri(),
            "tenant-1",
            "client-1",
            &file,
        );
        let token = credential.get_token("scope").await.unwrap();
        assert_eq!(token.token, "wi-token");

        let _ = std::fs::remove_file(&file);
    }

    #[tokio::test]
    async fn test_workload_identity_missing_file() {
        let credential = WorkloadIdentityCredential::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1",
            "t",
            "c",
            "/nonexistent/federated-token",
        );
        let err = credential.get_token("scope").await.unwrap_err();
        assert!(matches!(err, AzureError::Auth(_)));
    }

    #[tokio::test]
    async fn test_static_credential() {
        let token = StaticTokenCredential::new("fixed").get_token("any").await.unwrap();
        assert_eq!(token.token, "fixed");
    }
}

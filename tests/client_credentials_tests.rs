mod auth_support;

use chrono::{Duration, Utc};
use entra_auth::{AuthConfig, AuthError, AuthMethod, ClientCredentialsFlow};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::client_credentials_config;

const TOKEN_PATH: &str = "/tenant-1/oauth2/v2.0/token";

#[tokio::test]
async fn acquire_returns_a_buffered_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("client_secret=client-secret-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "app-only-token",
            "token_type": "Bearer",
            "expires_in": 3599,
            "scope": "https://graph.microsoft.com/.default"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now();
    let token = ClientCredentialsFlow::new(client_credentials_config(&server.uri()))
        .acquire()
        .await
        .expect("acquire app-only token");

    assert_eq!(token.access_token, "app-only-token");
    assert_eq!(token.expires_in, 3599);
    // expires_at = acquisition + expires_in - 300s safety buffer
    let lower = before + Duration::seconds(3599 - 300 - 5);
    let upper = Utc::now() + Duration::seconds(3599 - 300);
    assert!(token.expires_at >= lower && token.expires_at <= upper);
    assert!(token.is_valid());
}

#[tokio::test]
async fn acquire_with_missing_secret_issues_no_request() {
    let server = MockServer::start().await;
    let config = AuthConfig::new(AuthMethod::ClientCredentials, "tenant-1", "client-1")
        .with_authority(server.uri());

    let result = ClientCredentialsFlow::new(config).acquire().await;

    match result {
        Err(AuthError::MissingConfig(fields)) => assert_eq!(fields, "CLIENT_SECRET"),
        other => panic!("expected MissingConfig, got {other:?}"),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn acquire_names_every_missing_field() {
    let config = AuthConfig::new(AuthMethod::ClientCredentials, "", "");

    let result = ClientCredentialsFlow::new(config).acquire().await;

    match result {
        Err(AuthError::MissingConfig(fields)) => {
            assert_eq!(fields, "TENANT_ID, CLIENT_ID, CLIENT_SECRET");
        }
        other => panic!("expected MissingConfig, got {other:?}"),
    }
}

#[tokio::test]
async fn acquire_rejects_a_success_body_that_is_not_a_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy login</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = ClientCredentialsFlow::new(client_credentials_config(&server.uri()))
        .acquire()
        .await;

    match result {
        Err(AuthError::InvalidResponse(message)) => {
            assert!(message.contains("token payload"));
        }
        other => panic!("expected InvalidResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn acquire_surfaces_server_failures_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = ClientCredentialsFlow::new(client_credentials_config(&server.uri()))
        .acquire()
        .await;

    match result {
        Err(AuthError::Server { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("AADSTS7000215"));
        }
        other => panic!("expected Server, got {other:?}"),
    }
}

//! Integration tests for the OAuth client against a mocked token endpoint.
#![cfg(feature = "platform")]

use moodmix_common::auth::{ClientAuthMethod, OAuthClient, OAuthClientError, OAuthConfig};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, auth: ClientAuthMethod) -> OAuthConfig {
    OAuthConfig::new(
        format!("{}/authorize", server.uri()),
        format!("{}/api/token", server.uri()),
        "client-abc",
        "http://localhost:3000/api/auth/spotify/callback",
        vec!["user-read-email".to_string()],
    )
    .with_client_secret(Some("s3cret".to_string()), auth)
}

/// Exchanges a code and checks the form body sent to the token endpoint.
///
/// # Test Steps
/// 1. Mount a token endpoint expecting the authorization-code form fields
/// 2. Exchange a code with a known verifier
/// 3. Verify the parsed token response
#[tokio::test(flavor = "multi_thread")]
async fn exchange_code_posts_pkce_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains("code_verifier=verifier-123"))
        .and(body_string_contains("client_id=client-abc"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "scope": "user-read-email"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuthClient::new(config(&server, ClientAuthMethod::RequestBody));
    let token = client.exchange_code("auth-code", "verifier-123").await.unwrap();

    assert_eq!(token.access_token, "a");
    assert_eq!(token.refresh_token.as_deref(), Some("r"));
    assert_eq!(token.expires_in, 3600);
}

/// Confidential clients using Basic auth keep the secret out of the body.
#[tokio::test(flavor = "multi_thread")]
async fn basic_auth_client_sends_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header_exists("authorization"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuthClient::new(config(&server, ClientAuthMethod::BasicHeader));
    let token = client.exchange_code("code", "verifier").await.unwrap();

    assert!(token.refresh_token.is_none());
    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(!body.contains("client_secret"));
}

/// Non-2xx responses carry the provider's error description.
#[tokio::test(flavor = "multi_thread")]
async fn error_response_surfaces_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code"
        })))
        .mount(&server)
        .await;

    let client = OAuthClient::new(config(&server, ClientAuthMethod::RequestBody));
    let err = client.exchange_code("stale", "verifier").await.unwrap_err();

    assert!(matches!(err, OAuthClientError::OAuthError(_)));
    assert_eq!(err.provider_message(), "Invalid authorization code");
}

/// A 2xx body missing required fields fails schema validation.
#[tokio::test(flavor = "multi_thread")]
async fn malformed_success_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "a" })))
        .mount(&server)
        .await;

    let client = OAuthClient::new(config(&server, ClientAuthMethod::RequestBody));
    let err = client.exchange_code("code", "verifier").await.unwrap_err();

    assert!(matches!(err, OAuthClientError::ParseError(_)));
}

/// Refresh posts `grant_type=refresh_token` and tolerates a missing
/// replacement refresh token.
#[tokio::test(flavor = "multi_thread")]
async fn refresh_posts_refresh_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user-read-email"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuthClient::new(config(&server, ClientAuthMethod::RequestBody));
    let token = client.refresh_access_token("old-refresh").await.unwrap();

    assert_eq!(token.access_token, "fresh");
    assert!(token.refresh_token.is_none());
}

/// Plain-text failures fall back to the HTTP status variant.
#[tokio::test(flavor = "multi_thread")]
async fn unstructured_failure_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client = OAuthClient::new(config(&server, ClientAuthMethod::RequestBody));
    let err = client.refresh_access_token("r").await.unwrap_err();

    assert!(matches!(err, OAuthClientError::HttpStatus { status: 503, .. }));
    assert_eq!(err.provider_message(), "upstream unavailable");
}

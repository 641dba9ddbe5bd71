use std::time::Duration;

use moodmix_domain::constants::HTTP_TIMEOUT_SECS;
use moodmix_domain::MoodmixError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client for provider APIs with retry and timeout support.
///
/// Token endpoint calls do not go through here: a code can only be
/// exchanged once, so those requests are never retried.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns [`MoodmixError::Network`] if the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, MoodmixError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// Server errors and transport failures are retried with exponential
    /// backoff; any other response is returned as-is.
    ///
    /// # Errors
    /// Returns the mapped transport error once all attempts are spent.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, MoodmixError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                MoodmixError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder.build().map_err(|err| MoodmixError::from(InfraError::from(err)))?;

            let method = request.method().clone();
            let path = request.url().path().to_string();
            debug!(attempt = attempt + 1, %method, path, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, path, %status, "received HTTP response");

                    if status.is_server_error() && attempt + 1 < attempts {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, path, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(InfraError::from(err).into());
                }
            }
        }

        Err(MoodmixError::Internal("http client exhausted retries without producing a result".into()))
    }

    /// Authorized GET decoded as JSON.
    ///
    /// # Errors
    /// - [`MoodmixError::Network`] for transport failures and 5xx/429
    /// - [`MoodmixError::Auth`] for 401/403
    /// - [`MoodmixError::InvalidInput`] when the body does not match `T`
    pub async fn get_json<T>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MoodmixError>
    where
        T: DeserializeOwned,
    {
        let response =
            self.send(self.request(Method::GET, url).bearer_auth(access_token).query(query)).await?;
        decode_json(url, response).await
    }

    /// Authorized JSON POST decoded as JSON.
    ///
    /// Sent once: creating a playlist or appending items is not idempotent,
    /// so failed attempts are not replayed.
    ///
    /// # Errors
    /// As [`HttpClient::get_json`].
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, MoodmixError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, url)
            .bearer_auth(access_token)
            .query(query)
            .json(body)
            .build()
            .map_err(InfraError::from)?;
        debug!(method = %Method::POST, path = request.url().path(), "sending HTTP request");

        let response = self.client.execute(request).await.map_err(InfraError::from)?;
        debug!(method = %Method::POST, status = %response.status(), "received HTTP response");
        decode_json(url, response).await
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = u32::try_from(retry_number.saturating_sub(1).min(8)).unwrap_or(8);
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: Some(concat!("moodmix/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl HttpClientBuilder {
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub const fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns [`MoodmixError::Network`] if the reqwest client cannot be
    /// built.
    pub fn build(self) -> Result<HttpClient, MoodmixError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(InfraError::from)?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

async fn decode_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, MoodmixError> {
    let response = response.error_for_status().map_err(InfraError::from)?;
    let body = response.text().await.map_err(InfraError::from)?;
    serde_json::from_str(&body)
        .map_err(|err| MoodmixError::InvalidInput(format!("unexpected response from {url}: {err}")))
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::StatusCode;
    use serde::Deserialize;
    use wiremock::matchers::{body_json, header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .base_backoff(Duration::from_millis(10))
            .max_attempts(3)
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn retries_on_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{addr}");

        let client = HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(2)
            .build()
            .expect("http client");

        let result = client.send(client.request(Method::GET, &url)).await;
        match result {
            Err(MoodmixError::Network(msg)) => {
                assert!(msg.to_lowercase().contains("http"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[derive(Debug, Deserialize)]
    struct Echo {
        value: String,
    }

    #[tokio::test]
    async fn get_json_sends_bearer_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param("part", "snippet"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": "ok"})))
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let echo: Echo =
            client.get_json(&server.uri(), "tok", &[("part", "snippet")]).await.unwrap();

        assert_eq!(echo.value, "ok");
    }

    #[tokio::test]
    async fn get_json_maps_unauthorized_and_bad_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer expired"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let unauthorized = client.get_json::<Echo>(&server.uri(), "expired", &[]).await;
        let malformed = client.get_json::<Echo>(&server.uri(), "tok", &[]).await;

        assert!(matches!(unauthorized, Err(MoodmixError::Auth(_))));
        assert!(matches!(malformed, Err(MoodmixError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn post_json_sends_body_once_without_retrying() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(serde_json::json!({"value": "in"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"value": "out"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let created: Echo = client
            .post_json(&server.uri(), "tok", &[], &serde_json::json!({"value": "in"}))
            .await
            .unwrap();
        let failed = client
            .post_json::<_, Echo>(&server.uri(), "flaky", &[], &serde_json::json!({}))
            .await;

        assert_eq!(created.value, "out");
        assert!(matches!(failed, Err(MoodmixError::Network(_))));
    }
}

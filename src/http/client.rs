//! HTTP client with per-attempt timeouts and bounded retries.

use log::{debug, warn};
use reqwest::{
    Client, Method,
    header::{ACCEPT, AUTHORIZATION, CONNECTION, HeaderMap, HeaderValue, InvalidHeaderValue},
};
use serde::Serialize;
use std::time::Duration;

use super::retry::{RequestError, RetryPolicy};

/// Everything needed to issue the same request again on every attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// A POST request carrying `body` as JSON.
    pub fn post_json<T: Serialize>(url: &str, body: &T) -> serde_json::Result<Self> {
        Ok(Self {
            method: Method::POST,
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: Some(serde_json::to_value(body)?),
        })
    }

    /// Adds an `Authorization: Bearer` header marked as sensitive.
    pub fn bearer_auth(mut self, token: &str) -> Result<Self, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }
}

/// HTTP client that retries every failed attempt within a [`RetryPolicy`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Sends `request` until it succeeds or the policy's attempt budget is spent,
    /// returning the body of the first successful response.
    ///
    /// A non-2xx status or an empty 2xx body counts as a failed attempt. Between
    /// attempts the client sleeps for [`RetryPolicy::backoff_delay`]; there is no
    /// sleep after the last one. The last failure is returned as is.
    #[tracing::instrument(skip(self, request, policy), fields(url = %request.url))]
    pub async fn attempt(
        &self,
        request: &ApiRequest,
        policy: &RetryPolicy,
    ) -> Result<Vec<u8>, RequestError> {
        let budget = policy.attempts();
        let mut attempt = 0;

        loop {
            debug!(
                "{} {} (attempt {}/{})",
                request.method,
                request.url,
                attempt + 1,
                budget
            );

            let error = match self.attempt_once(request, policy.attempt_timeout).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            if attempt + 1 >= budget {
                warn!("attempt {}/{} failed ({}), giving up", attempt + 1, budget, error);
                return Err(error);
            }
            if !policy.is_retryable(&error) {
                warn!(
                    "attempt {}/{} failed ({}), not retryable",
                    attempt + 1,
                    budget,
                    error
                );
                return Err(error);
            }

            let delay = policy.backoff_delay(attempt);
            warn!(
                "attempt {}/{} failed ({}), retrying in {}ms...",
                attempt + 1,
                budget,
                error,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Single attempt without retry. Dropping the call on timeout aborts the connection.
    async fn attempt_once(
        &self,
        request: &ApiRequest,
        timeout: Duration,
    ) -> Result<Vec<u8>, RequestError> {
        let mut headers = request.headers.clone();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let call = async {
            let response = builder.send().await.map_err(RequestError::Transport)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RequestError::Status { status, body });
            }

            let body = response.bytes().await.map_err(RequestError::Transport)?;
            if body.is_empty() {
                return Err(RequestError::EmptyBody(status));
            }
            debug!("Received {} bytes", body.len());
            Ok(body.to_vec())
        };

        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| RequestError::AttemptTimeout(timeout))?
    }
}

//! HTTP client for the Ahrefs API v3.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};

use ahrefs_core::{
    parse_header_count, ResponseMeta, BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY,
    DEFAULT_TIMEOUT_SECS, HEADER_RATE_LIMIT_REMAINING, HEADER_UNITS_CONSUMED, USER_AGENT,
};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{classify, RequestError};

/// Normalize a base URL by removing trailing slashes.
fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Query parameters of a request.
///
/// Keys are kept sorted so encoded URLs are deterministic, and a key may
/// carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, Vec<String>>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to a single value, replacing previous values
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), vec![value.to_string()]);
        self
    }

    /// Set `key` only when a non-empty value is given
    pub fn set_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value.map(|value| value.to_string()) {
            Some(value) if !value.is_empty() => self.set(key, value),
            _ => self,
        }
    }

    /// Add another value for `key`
    pub fn append(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.entry(key.into()).or_default().push(value.to_string());
        self
    }

    /// First value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All key/value pairs in key order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(key, values)| {
                values
                    .iter()
                    .map(move |value| (key.as_str(), value.as_str()))
            })
    }
}

/// A single API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Endpoint path relative to the base URL, e.g. `/site-explorer/backlinks`
    pub endpoint: String,
    pub params: Params,
}

impl Request {
    pub fn get(endpoint: impl Into<String>, params: Params) -> Self {
        Self {
            method: Method::GET,
            endpoint: endpoint.into(),
            params,
        }
    }

    pub fn post(endpoint: impl Into<String>, params: Params) -> Self {
        Self {
            method: Method::POST,
            endpoint: endpoint.into(),
            params,
        }
    }

    /// Full URL of the request against `base_url`, query form-encoded
    pub fn url(&self, base_url: &str) -> Result<Url, RequestError> {
        let raw = format!("{}{}", normalize_url(base_url), self.endpoint);
        let mut url = Url::parse(&raw)
            .map_err(|e| RequestError::InvalidEndpoint(format!("{raw}: {e}")))?;
        if !self.params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in self.params.pairs() {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// A successful (or classified failed) API response
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Raw response body
    pub body: Vec<u8>,
    pub meta: ResponseMeta,
}

impl Response {
    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Connection settings for [`AhrefsClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff; attempt `n` waits `n * retry_delay`
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

/// HTTP client for the Ahrefs API.
///
/// Every request is authenticated with the configured API key and goes
/// through the same retry policy:
/// - transport failures, 429 and 5xx responses are retried with linear
///   backoff (`retry_delay * attempt`)
/// - any other error status fails immediately
/// - after `max_retries` retries the last failure is returned wrapped in
///   [`RequestError::Exhausted`]
///
/// # Examples
///
/// ```no_run
/// use ahrefs_cli::client::{AhrefsClient, ClientConfig, Params};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = AhrefsClient::new(ClientConfig::new("my-api-key"))?;
/// let params = Params::new().set("target", "ahrefs.com").set("mode", "domain");
/// let response = client.get("/site-explorer/domain-rating", params).await?;
/// println!("{} ms", response.meta.response_time_ms);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AhrefsClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl AhrefsClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingApiKey`] when the key is empty, before
    /// anything touches the network.
    pub fn new(config: ClientConfig) -> Result<Self, RequestError> {
        if config.api_key.trim().is_empty() {
            return Err(RequestError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(RequestError::Setup)?;

        Ok(Self {
            client,
            api_key: config.api_key,
            base_url: normalize_url(&config.base_url),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET request
    pub async fn get(&self, endpoint: &str, params: Params) -> Result<Response, RequestError> {
        self.execute(&Request::get(endpoint, params)).await
    }

    /// Issue a POST request
    pub async fn post(&self, endpoint: &str, params: Params) -> Result<Response, RequestError> {
        self.execute(&Request::post(endpoint, params)).await
    }

    /// Execute a request with the retry policy
    pub async fn execute(&self, request: &Request) -> Result<Response, RequestError> {
        self.execute_until(request, std::future::pending()).await
    }

    /// Execute a request, giving up as soon as `cancel` completes.
    ///
    /// Cancellation interrupts both in-flight attempts and backoff waits.
    pub async fn execute_until<C>(
        &self,
        request: &Request,
        cancel: C,
    ) -> Result<Response, RequestError>
    where
        C: Future<Output = ()>,
    {
        let url = request.url(&self.base_url)?;
        tokio::pin!(cancel);

        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                let backoff = self.retry_delay * attempt;
                debug!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Backing off before retry"
                );
                tokio::select! {
                    () = tokio::time::sleep(backoff) => {}
                    () = &mut cancel => return Err(RequestError::Cancelled),
                }
            }

            let outcome = tokio::select! {
                outcome = self.attempt(&request.method, &url) => outcome,
                () = &mut cancel => return Err(RequestError::Cancelled),
            };

            let error = match outcome {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(error);
            }
            if attempt >= self.max_retries {
                return Err(RequestError::Exhausted {
                    retries: self.max_retries,
                    last: Box::new(error),
                });
            }

            warn!(attempt, error = %error, "Request attempt failed");
            attempt += 1;
        }
    }

    async fn attempt(&self, method: &Method, url: &Url) -> Result<Response, RequestError> {
        let started = Instant::now();
        debug!(%method, %url, "Sending request");

        let response = self
            .client
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(RequestError::Transport)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(RequestError::Body)?.to_vec();

        let meta = ResponseMeta {
            response_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            units_consumed: header_count(&headers, HEADER_UNITS_CONSUMED),
            rate_limit_remaining: header_count(&headers, HEADER_RATE_LIMIT_REMAINING),
        };
        debug!(
            status = status.as_u16(),
            elapsed_ms = meta.response_time_ms,
            units = ?meta.units_consumed,
            "Received response"
        );

        let response = Response {
            status,
            headers,
            body,
            meta,
        };

        if status.is_client_error() || status.is_server_error() {
            let error = classify(status.as_u16(), &response.body);
            return Err(RequestError::Api {
                error,
                response: Box::new(response),
            });
        }

        Ok(response)
    }
}

fn header_count(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_header_count)
}

//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building HTTP clients with the configured user agent, timeouts and proxy
//! - Attaching the bearer token when one is configured
//! - Classifying responses as success, transient or non-retryable
//! - Retrying transient failures with exponential backoff
//!
//! A single request is made through the [`Transport`] trait; [`Fetcher`]
//! layers the retry policy on top so the retry logic can be exercised with a
//! scripted transport.

use crate::config::Config;
use crate::crawler::retry::{RetryDecision, RetryPolicy, RetryState};
use async_trait::async_trait;
use reqwest::{Client, Proxy, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Outcome of one failed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Connection error, timeout, 5xx or 429; worth retrying
    Transient(String),

    /// Any other non-success status; retrying will not help
    Rejected { status: u16 },
}

/// Why a fetch gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Every attempt failed transiently
    Transient { reason: String },

    /// The server refused the request (4xx other than 429)
    NonRetryable { status: u16 },
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient { reason } => write!(f, "transient failure ({})", reason),
            Self::NonRetryable { status } => write!(f, "non-retryable HTTP {}", status),
        }
    }
}

/// Terminal fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} after {attempts_made} attempt(s) for {url}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
    pub attempts_made: u32,
}

/// Successfully fetched page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: String,

    /// Attempts used, including the successful one
    pub attempts: u32,

    /// When the successful attempt was sent
    pub last_attempt_at: Instant,
}

/// A single HTTP GET, with no retries
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, auth_token: Option<&str>) -> Result<String, AttemptError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The scraper configuration (user agent, timeouts, proxy)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (e.g. invalid proxy)
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.scraper.user_agent.clone())
        .timeout(Duration::from_secs(config.fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(config.fetch.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.fetch.proxy {
        tracing::info!("Using proxy: {}", proxy);
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Maps a response status to an attempt error, `None` for success
pub fn classify_status(status: StatusCode) -> Option<AttemptError> {
    if status.is_success() {
        None
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Some(AttemptError::Transient(format!("HTTP {}", status.as_u16())))
    } else {
        Some(AttemptError::Rejected {
            status: status.as_u16(),
        })
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, auth_token: Option<&str>) -> Result<String, AttemptError> {
        let mut request = self.client.get(url);
        if let Some(token) = auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(describe_error)?;

        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }

        response.text().await.map_err(describe_error)
    }
}

fn describe_error(e: reqwest::Error) -> AttemptError {
    let reason = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection error: {}", e)
    } else {
        e.to_string()
    };
    AttemptError::Transient(reason)
}

/// Fetches pages through a transport, retrying transient failures
pub struct Fetcher {
    transport: Box<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Builds a fetcher over a reqwest client configured from `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        Ok(Self::new(
            Box::new(HttpTransport::new(client)),
            RetryPolicy::from_config(&config.fetch),
        ))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL with retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return body |
    /// | 4xx except 429 | Fail immediately, non-retryable |
    /// | 429, 5xx | Retry with backoff |
    /// | Timeout, connection error | Retry with backoff |
    ///
    /// At most `max_attempts` requests are made. There is no backoff sleep
    /// after the final attempt.
    pub async fn fetch(&self, url: &str, auth_token: Option<&str>) -> Result<FetchedPage, FetchError> {
        let mut state = RetryState::new(self.policy);

        loop {
            let attempt = state.begin_attempt();
            let sent_at = Instant::now();

            match self.transport.get(url, auth_token).await {
                Ok(body) => {
                    tracing::debug!("Fetched {} on attempt {}", url, attempt);
                    return Ok(FetchedPage {
                        body,
                        attempts: attempt,
                        last_attempt_at: sent_at,
                    });
                }
                Err(AttemptError::Rejected { status }) => {
                    if status == 401 || status == 403 {
                        tracing::error!("Authentication failed for {}: HTTP {}", url, status);
                    }
                    return Err(FetchError {
                        url: url.to_string(),
                        kind: FetchErrorKind::NonRetryable { status },
                        attempts_made: attempt,
                    });
                }
                Err(AttemptError::Transient(reason)) => match state.on_transient_failure() {
                    RetryDecision::Retry { after } => {
                        tracing::warn!(
                            "Attempt {}/{} failed for {}: {}. Retrying in {:?}",
                            attempt,
                            state.max_attempts(),
                            url,
                            reason,
                            after
                        );
                        tokio::time::sleep(after).await;
                    }
                    RetryDecision::GiveUp => {
                        tracing::error!(
                            "All {} attempts failed for {}: {}",
                            attempt,
                            url,
                            reason
                        );
                        return Err(FetchError {
                            url: url.to_string(),
                            kind: FetchErrorKind::Transient { reason },
                            attempts_made: attempt,
                        });
                    }
                },
            }
        }
    }
}

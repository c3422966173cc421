//! HTTP transport for the registry endpoint

use super::error::RegistryError;
use super::request::LookupRequest;
use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Duration;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Result of one registry call: markup on success, a typed failure otherwise
pub type LookupOutcome = std::result::Result<String, RegistryError>;

/// Anything that can answer registry requests
///
/// The page and the scraper only talk to this trait, so tests and demo
/// mode can swap in their own endpoint.
pub trait RegistryTransport: Send + Sync {
    fn post(&self, request: LookupRequest) -> BoxFuture<'static, LookupOutcome>;
}

pub type SharedTransport = Arc<dyn RegistryTransport>;

/// Connection settings for [`RegistryClient`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
}

/// reqwest-backed registry client
#[derive(Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RegistryClient {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        tracing::debug!("Registry client targeting {}", settings.endpoint);

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Form-encoded POST for `request`, with the charset stated explicitly
    fn build_request(&self, request: &LookupRequest) -> reqwest::Result<reqwest::Request> {
        let mut built = self
            .client
            .post(&self.endpoint)
            .form(&request.form())
            .build()?;
        built
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        Ok(built)
    }

    /// Send one form-encoded POST and read the markup back
    pub async fn fetch(&self, request: &LookupRequest) -> LookupOutcome {
        tracing::debug!("POST {} ({})", self.endpoint, request);

        let response = self.client.execute(self.build_request(request)?).await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            tracing::debug!("{} -> {} bytes", request, body.len());
            Ok(body)
        } else {
            tracing::warn!("{} -> HTTP {}", request, status.as_u16());
            Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl RegistryTransport for RegistryClient {
    fn post(&self, request: LookupRequest) -> BoxFuture<'static, LookupOutcome> {
        let client = self.clone();
        async move { client.fetch(&request).await }.boxed()
    }
}

/// Retry settings for bulk fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            pause: Duration::from_secs(1),
        }
    }
}

/// Post `request`, retrying retryable failures per `policy`
pub async fn post_with_retry(
    transport: &dyn RegistryTransport,
    request: LookupRequest,
    policy: RetryPolicy,
) -> LookupOutcome {
    let mut attempt = 1;
    loop {
        match transport.post(request.clone()).await {
            Ok(body) => return Ok(body),
            Err(e) if attempt < policy.attempts && e.is_retryable() => {
                tracing::debug!(
                    "{} failed (attempt {}/{}): {}",
                    request,
                    attempt,
                    policy.attempts,
                    e
                );
                tokio::time::sleep(policy.pause).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

//! HTTP client utilities.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;

use crate::sources::SourceError;

/// Spaces outbound requests at least `delay` apart
///
/// One pacer is shared by every source so the delay holds across databases,
/// not just within one.
#[derive(Clone)]
pub struct Pacer {
    delay: Duration,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl Pacer {
    /// Create a pacer; a zero delay disables pacing
    pub fn new(delay: Duration) -> Self {
        let limiter = Quota::with_period(delay).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { delay, limiter }
    }

    /// A pacer that never waits
    pub fn disabled() -> Self {
        Self {
            delay: Duration::ZERO,
            limiter: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until the next request may start
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("delay", &self.delay)
            .field("enabled", &self.limiter.is_some())
            .finish()
    }
}

/// Shared HTTP client with sensible defaults and request pacing
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    pacer: Pacer,
}

impl HttpClient {
    /// Default user agent, `citation-checker/<version>`
    pub fn default_user_agent() -> String {
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
    }

    /// User agent carrying a contact address for polite-pool access
    pub fn polite_user_agent(email: &str) -> String {
        format!("{} (mailto:{})", Self::default_user_agent(), email)
    }

    /// Create a new HTTP client with the default user agent and the given pacer
    pub fn new(pacer: Pacer) -> Result<Self, SourceError> {
        Self::with_user_agent(&Self::default_user_agent(), Duration::from_secs(10), pacer)
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(
        user_agent: &str,
        connect_timeout: Duration,
        pacer: Pacer,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            pacer,
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Start a GET request; send it with [`HttpClient::send`] so it is paced
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Wait for the pacer, then send the request
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, SourceError> {
        self.pacer.wait().await;
        Ok(request.send().await?)
    }
}

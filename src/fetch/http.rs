// src/fetch/http.rs
// =============================================================================
// Fetches URLs over HTTP with reqwest.
//
// Key behaviour:
// - Plain GET, bounded timeout (5s, or 10s through a proxy)
// - Optional forward proxy, validated when the config was built
// - Follows up to 5 redirects, like a browser would
// - Every HTTP response becomes a Resource, found only on exactly 200
// - DNS / connect / timeout failures become ScanError::Transport
//
// One client is built per fetcher and shared by all workers; reqwest's
// Client is a cheap handle around a connection pool, so no locking needed.
//
// Rust concepts:
// - Builder pattern: Client::builder() collects options before build()
// - map_err: turns reqwest's error type into our ScanError
// - #[async_trait]: lets the Fetcher trait have async methods
// =============================================================================

use super::Fetcher;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::resource::Resource;
use async_trait::async_trait;
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher using the timeout and proxy from the scan config
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        Self::with_timeout(config.request_timeout(), config.proxy())
    }

    /// Creates a fetcher with an explicit timeout (primarily for tests)
    pub fn with_timeout(timeout: Duration, proxy: Option<&Url>) -> Result<Self, ScanError> {
        // The timeout covers the whole request, body included
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5));

        // Proxy::all routes both http and https targets through the proxy
        if let Some(proxy_url) = proxy {
            info!("Setting up transport with proxy server at address: {}", proxy_url);
            let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                ScanError::Config(format!("invalid proxy address '{}': {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ScanError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Resource, ScanError> {
        debug!("Fetching {}", url);

        // send() resolves as soon as the headers arrive; the body stays on
        // the connection until the Resource's Body is read or dropped
        match self.client.get(url.clone()).send().await {
            // Any status code is a response: 404 and 500 are not errors here
            Ok(response) => {
                debug!("{} answered {}", url, response.status());
                Ok(Resource::from_response(url.as_str(), response))
            }
            // No response at all: classify it (timeout, dns, connect, other)
            Err(e) => {
                let error = ScanError::transport(url.as_str(), e);
                warn!("{}", error);
                Err(error)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is Client built once instead of per request?
//    - Building a client sets up TLS and a connection pool
//    - Reusing it lets requests to the same host share connections
//
// 2. Why does fetch() take &self and not &mut self?
//    - Client::get only needs a shared reference
//    - so many workers can call fetch() at the same time through an Arc
//
// 3. What does url.clone() cost?
//    - One String copy; reqwest's get() wants an owned IntoUrl value
// -----------------------------------------------------------------------------

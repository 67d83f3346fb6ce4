//! Short-hash lookup service client.
//!
//! ### Protocol
//!
//! - **Request**: `GET <lookup_url>?prefixes=<short hashes joined with '/'>`, URL-encoded.
//! - **Response**: `204` when nothing matched, otherwise a text body with one
//!   `listName:count:FULLHASH` line per match.
//! - Every HTTP status is surfaced as a [`LookupResponse`]; only transport
//!   failures (DNS, connect, timeout) are errors.

pub mod error;

pub use error::LookupError;

use reqwest::{Url, header};
use sbguard_core::config::AppConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default lookup endpoint.
const DEFAULT_LOOKUP_URL: &str = "https://sb.adtidy.org/safebrowsing-lookup-short-hash.html";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "sbguard/0.1";

/// Lookup client configuration.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub lookup_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for LookupConfig {
    fn from(config: &AppConfig) -> Self {
        Self { lookup_url: config.lookup_url.clone(), timeout: config.timeout(), user_agent: config.user_agent.clone() }
    }
}

/// Raw answer of the lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResponse {
    pub status: u16,
    pub body: String,
}

impl LookupResponse {
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    pub fn is_no_content(&self) -> bool {
        self.status == 204
    }
}

/// Backend queried with short hash prefixes.
#[async_trait::async_trait]
pub trait SafebrowsingLookup: Send + Sync {
    async fn lookup(&self, short_hashes: &[String]) -> Result<LookupResponse, LookupError>;
}

/// HTTP client for the lookup service.
#[derive(Debug, Clone)]
pub struct LookupClient {
    http: reqwest::Client,
    lookup_url: Url,
}

impl LookupClient {
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        let lookup_url = Url::parse(&config.lookup_url).map_err(|e| LookupError::InvalidUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| LookupError::Network(Arc::new(e)))?;

        Ok(Self { http, lookup_url })
    }

    /// URL queried for `short_hashes`.
    pub fn request_url(&self, short_hashes: &[String]) -> Url {
        let mut url = self.lookup_url.clone();
        url.query_pairs_mut().append_pair("prefixes", &short_hashes.join("/"));
        url
    }
}

#[async_trait::async_trait]
impl SafebrowsingLookup for LookupClient {
    async fn lookup(&self, short_hashes: &[String]) -> Result<LookupResponse, LookupError> {
        let start = Instant::now();
        let url = self.request_url(short_hashes);

        tracing::debug!(prefixes = short_hashes.len(), "querying safebrowsing lookup service");

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(status, bytes = body.len(), "lookup completed in {:?}", start.elapsed());

        Ok(LookupResponse { status, body })
    }
}

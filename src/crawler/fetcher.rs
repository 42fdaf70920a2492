//! Fetch capability and its HTTP implementation
//!
//! The crawl engine only ever talks to the [`Fetcher`] trait. This module
//! defines that trait, the page/error types it traffics in, and
//! [`HttpFetcher`], which performs a real GET and pulls links out of the HTML.

use crate::config::{Config, HttpConfig, UserAgentConfig};
use crate::crawler::parser::parse_html;
use crate::url::LinkMode;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Content and outbound links of one fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    /// Page body
    pub content: String,

    /// Absolute, normalized URLs found on the page
    pub links: Vec<String>,
}

impl FetchedPage {
    pub fn new(content: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            content: content.into(),
            links,
        }
    }
}

/// Why a fetch produced no page
///
/// A fetch error ends the task that hit it and nothing else: it is logged,
/// recorded against the URL, and never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("fetch of {url} failed with status: {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("not found: {url}")]
    NotFound { url: String },
}

impl FetchError {
    /// The URL the failed fetch was for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::Body { url, .. }
            | Self::NotFound { url } => url,
        }
    }

    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            Self::Timeout { url }
        } else if err.is_connect() {
            Self::Connect {
                url,
                message: err.to_string(),
            }
        } else {
            Self::Transport {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Retrieves a page and the links on it
///
/// Implementations must be shareable across tasks; the engine calls `fetch`
/// from many tasks at once and never more than once per URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        (**self).fetch(url).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use fanout_crawler::config::{HttpConfig, UserAgentConfig};
/// use fanout_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(http.timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .redirect(Policy::limited(http.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a real HTTP client
///
/// Non-2xx responses are errors. Links are only extracted from HTML bodies
/// (or bodies with no Content-Type at all); other bodies are kept as content
/// with no outbound links. Relative links resolve against the final URL after
/// redirects.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    link_mode: LinkMode,
}

impl HttpFetcher {
    /// Builds a fetcher from the `[user-agent]`, `[http]` and `[crawler]` sections
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, &config.http)?;
        Ok(Self::with_client(client, config.crawler.link_mode))
    }

    pub fn with_client(client: Client, link_mode: LinkMode) -> Self {
        Self { client, link_mode }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !content_type.is_empty() && !content_type.contains("html") {
            tracing::debug!("{} is {}, not following links", url, content_type);
            return Ok(FetchedPage::new(body, Vec::new()));
        }

        let parsed = parse_html(&body, &final_url, self.link_mode);
        if let Some(title) = &parsed.title {
            tracing::trace!("{} has title {:?}", url, title);
        }

        Ok(FetchedPage::new(body, parsed.links))
    }
}

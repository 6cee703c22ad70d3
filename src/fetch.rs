//! Document Fetching
//!
//! One GET per call through a shared `reqwest` client. No retries, no
//! caching. The client is built once from `ImportConfig` and only ever read
//! afterwards, so it is safe to share across concurrent calls.

use crate::config::ImportConfig;
use crate::error::{error_chain, require, ImportError, Result};
use reqwest::redirect::{Attempt, Policy};
use reqwest::Client;
use url::Url;

/// Validate a caller-supplied URL: non-blank, parseable, http(s) only
pub fn parse_url(raw: &str) -> Result<Url> {
    let raw = require(raw, "URL is required")?;
    let url = Url::parse(raw).map_err(|e| ImportError::invalid_argument(format!("Invalid URL - {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ImportError::invalid_argument("URL must start with http or https")),
    }
}

/// Follow redirects while the scheme stays the same, up to `max_redirects`
fn redirect_policy(max_redirects: usize) -> Policy {
    Policy::custom(move |attempt: Attempt<'_>| {
        let hops = attempt.previous().len();
        let same_scheme = attempt
            .previous()
            .last()
            .is_some_and(|previous| previous.scheme() == attempt.url().scheme());

        if hops > max_redirects {
            attempt.error(format!("too many redirects (limit {})", max_redirects))
        } else if !same_scheme {
            attempt.error("redirect changed the URL scheme")
        } else {
            attempt.follow()
        }
    })
}

/// Shared HTTP transport
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        let client = Client::builder()
            .min_tls_version(config.min_tls_version.into())
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(redirect_policy(config.max_redirects))
            .build()
            .map_err(|e| ImportError::Fetch(error_chain(&e)))?;
        Ok(Fetcher { client })
    }

    /// GET `url` and return the body as text. Non-success statuses fail.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let url = parse_url(url)?;
        tracing::debug!(%url, "fetching document");

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        tracing::debug!(bytes = body.len(), "fetched document");
        Ok(body)
    }
}

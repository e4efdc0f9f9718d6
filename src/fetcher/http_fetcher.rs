use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::Client;
use url::Url;

use crate::app::{Result, ScourError};
use crate::config::FetchConfig;
use crate::fetcher::{FetchResult, FetchStatus, Fetcher};

pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(Policy::limited(config.max_redirects))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,*/*;q=0.8",
            ),
        );
        if let Ok(value) = HeaderValue::from_str(&self.config.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        headers
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

/// Reject anything that isn't an absolute http(s) URL before touching the network.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ScourError::UnsupportedScheme(other.to_string())),
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, extra_headers: Option<HeaderMap>) -> Result<FetchResult> {
        let parsed = validate_url(url)?;

        let mut headers = self.default_headers();
        if let Some(extra) = extra_headers {
            for (name, value) in extra.iter() {
                headers.insert(name.clone(), value.clone());
            }
        }

        let response = match self.client.get(parsed.clone()).headers(headers).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::debug!(url, "Fetch timed out");
                return Ok(FetchResult {
                    status: FetchStatus::Timeout,
                    body: None,
                    final_url: parsed.to_string(),
                    status_code: None,
                });
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "Fetch failed before a response arrived");
                return Ok(FetchResult {
                    status: FetchStatus::NetworkError,
                    body: None,
                    final_url: parsed.to_string(),
                    status_code: None,
                });
            }
        };

        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let status = if response.status().is_client_error() || response.status().is_server_error() {
            FetchStatus::HttpError
        } else {
            FetchStatus::Ok
        };

        let body = match response.text().await {
            Ok(text) => Some(text),
            Err(e) if e.is_timeout() => {
                return Ok(FetchResult {
                    status: FetchStatus::Timeout,
                    body: None,
                    final_url,
                    status_code: Some(status_code),
                });
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "Failed to read response body");
                None
            }
        };

        Ok(FetchResult {
            status,
            body,
            final_url,
            status_code: Some(status_code),
        })
    }
}

mod http_fetcher;

pub use http_fetcher::{validate_url, HttpFetcher};

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::app::Result;

/// How a fetch attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Body retrieved with a non-error status.
    Ok,
    /// The request exceeded its time budget.
    Timeout,
    /// The server answered with status >= 400.
    HttpError,
    /// Connection, TLS, or protocol failure before a response arrived.
    NetworkError,
}

/// Result of a single fetch. Created per call, consumed by the extractor.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: FetchStatus,
    /// Response body, present only on [`FetchStatus::Ok`] and sometimes
    /// on [`FetchStatus::HttpError`] (error pages still carry HTML).
    pub body: Option<String>,
    /// The URL actually reached after HTTP-level redirects. Use this, not
    /// the requested URL, for resolving relative links.
    pub final_url: String,
    pub status_code: Option<u16>,
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}

/// A single lightweight retrieval of a URL.
///
/// Implementations must fail fast on malformed input without touching the
/// network, and must map timeouts and transport failures to typed statuses
/// rather than letting raw errors cross the boundary. Retry policy belongs
/// to the orchestrator, not here.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, extra_headers: Option<HeaderMap>) -> Result<FetchResult>;
}

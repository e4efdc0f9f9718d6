use serde::{Deserialize, Serialize};

/// How a wrapped aggregator URL was unwrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMethod {
    /// Embedded URL recovered from the base64url token, no network call.
    TokenDecode,
    /// Final URL after following HTTP-level redirects.
    HttpRedirect,
    /// `<meta http-equiv="refresh">` target on an interstitial page.
    MetaRefresh,
    /// Single outbound anchor on a consent/continue page.
    AnchorScrape,
    /// Nothing worked; `resolved_url` equals the original.
    Unresolved,
}

/// Outcome of unwrapping an aggregator URL.
///
/// Invariant: `resolved_url` is never an aggregator-internal URL when
/// `method` is anything other than [`ResolveMethod::Unresolved`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectResolution {
    pub original_url: String,
    pub resolved_url: String,
    pub method: ResolveMethod,
}

impl RedirectResolution {
    pub fn unresolved(url: &str) -> Self {
        Self {
            original_url: url.to_string(),
            resolved_url: url.to_string(),
            method: ResolveMethod::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.method != ResolveMethod::Unresolved
    }
}

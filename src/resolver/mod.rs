//! Aggregator redirect resolution.
//!
//! News-aggregator links (notably Google News) wrap the real article URL
//! behind an opaque base64url token or a consent interstitial, and are not
//! directly fetchable as articles. Resolution tries the free option first:
//! decode the token locally and scan it for an embedded URL. Only when that
//! fails does it probe the network, checking the final redirect URL, then a
//! meta-refresh tag, then a lone outbound anchor on a consent page.

use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use scraper::{Html, Selector};
use url::Url;

use crate::app::Result;
use crate::domain::{RedirectResolution, ResolveMethod};
use crate::fetcher::Fetcher;

/// Hosts that wrap or obfuscate the true article URL.
const AGGREGATOR_HOSTS: &[&str] = &["news.google.com", "consent.google.com"];

/// The opaque token segment of a Google News article URL.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:rss/)?articles/([A-Za-z0-9_-]{20,})").expect("valid regex"));

/// An http(s) URL embedded in decoded token bytes.
static EMBEDDED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[A-Za-z0-9\-._~:/?#@!$&'()*+,;=%]+"#).expect("valid regex")
});

static META_REFRESH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[http-equiv]").expect("valid selector"));
static ANCHORS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// True for URL shapes that need unwrapping before extraction.
pub fn is_aggregator_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    is_aggregator(&parsed)
}

fn is_aggregator(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| AGGREGATOR_HOSTS.contains(&host))
}

/// Decode the token segment of an aggregator URL and scan it for an
/// embedded article URL. Free: no network call.
pub fn decode_aggregator_token(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !is_aggregator(&parsed) {
        return None;
    }

    let token = TOKEN
        .captures(parsed.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())?;

    let decoded = URL_SAFE_NO_PAD.decode(token.trim_end_matches('=')).ok()?;
    let haystack = String::from_utf8_lossy(&decoded);

    EMBEDDED_URL
        .find_iter(&haystack)
        .map(|m| m.as_str())
        .find(|candidate| {
            Url::parse(candidate).is_ok_and(|u| !is_aggregator(&u) && u.host_str().is_some())
        })
        .map(String::from)
}

/// Target of a `<meta http-equiv="refresh" content="0; url=...">` tag,
/// resolved against `base_url`.
fn meta_refresh_target(doc: &Html, base_url: &Url) -> Option<Url> {
    doc.select(&META_REFRESH)
        .filter(|el| {
            el.value()
                .attr("http-equiv")
                .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
        })
        .filter_map(|el| el.value().attr("content"))
        .filter_map(|content| {
            let (_, raw) = content.split_once("url=").or_else(|| content.split_once("URL="))?;
            let raw = raw.trim().trim_matches(|c| c == '\'' || c == '"');
            base_url.join(raw).ok()
        })
        .next()
}

/// The lone outbound link on a consent/continue interstitial. Only trusted
/// when exactly one distinct external destination exists on the page.
fn single_external_anchor(doc: &Html, base_url: &Url) -> Option<Url> {
    let mut targets = HashSet::new();
    for anchor in doc.select(&ANCHORS) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(target) = base_url.join(href) else {
            continue;
        };
        if !matches!(target.scheme(), "http" | "https") || is_aggregator(&target) {
            continue;
        }
        if target.host_str() == base_url.host_str() {
            continue;
        }
        targets.insert(target);
    }

    if targets.len() == 1 {
        targets.into_iter().next()
    } else {
        None
    }
}

/// Unwraps obfuscated aggregator URLs into the canonical article URL.
pub struct RedirectResolver {
    fetcher: Arc<dyn Fetcher>,
}

impl RedirectResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve without touching the network. Succeeds only when the token
    /// itself contains the article URL.
    pub fn resolve_local(&self, url: &str) -> RedirectResolution {
        match decode_aggregator_token(url) {
            Some(resolved) => RedirectResolution {
                original_url: url.to_string(),
                resolved_url: resolved,
                method: ResolveMethod::TokenDecode,
            },
            None => RedirectResolution::unresolved(url),
        }
    }

    /// Full resolution: local decode first, then a network probe of the
    /// aggregator URL. Never errors on network trouble; anything that can't
    /// be unwrapped comes back [`ResolveMethod::Unresolved`] with the
    /// original URL, and callers may still try direct extraction on it.
    pub async fn resolve(&self, url: &str) -> Result<RedirectResolution> {
        let local = self.resolve_local(url);
        if local.is_resolved() {
            tracing::debug!(url, resolved = %local.resolved_url, "Resolved from token, no network call");
            return Ok(local);
        }

        // Consent cookie up front skips the interstitial on most
        // European-routed requests.
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("CONSENT=YES+"));

        let fetched = match self.fetcher.fetch(url, Some(headers)).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::debug!(url, error = %e, "Probe fetch failed, leaving unresolved");
                return Ok(RedirectResolution::unresolved(url));
            }
        };

        let Ok(final_url) = Url::parse(&fetched.final_url) else {
            return Ok(RedirectResolution::unresolved(url));
        };

        if !is_aggregator(&final_url) {
            return Ok(RedirectResolution {
                original_url: url.to_string(),
                resolved_url: final_url.to_string(),
                method: ResolveMethod::HttpRedirect,
            });
        }

        let Some(body) = fetched.body else {
            return Ok(RedirectResolution::unresolved(url));
        };
        let doc = Html::parse_document(&body);

        if let Some(target) = meta_refresh_target(&doc, &final_url).filter(|t| !is_aggregator(t)) {
            return Ok(RedirectResolution {
                original_url: url.to_string(),
                resolved_url: target.to_string(),
                method: ResolveMethod::MetaRefresh,
            });
        }

        if let Some(target) = single_external_anchor(&doc, &final_url) {
            return Ok(RedirectResolution {
                original_url: url.to_string(),
                resolved_url: target.to_string(),
                method: ResolveMethod::AnchorScrape,
            });
        }

        Ok(RedirectResolution::unresolved(url))
    }
}

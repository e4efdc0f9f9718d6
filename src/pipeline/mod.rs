//! The tiered orchestrator.
//!
//! One extraction request moves through a fixed sequence: resolve the URL
//! if it's aggregator-wrapped, fetch and extract statically, and only when
//! static extraction definitively comes up short, render in a browser and
//! extract again. Each tier reports a tagged outcome and the orchestrator
//! switches on the tag, so the escalation policy is ordinary visible
//! control flow, testable with stub tiers.
//!
//! At most one static attempt and one rendered attempt per request; there
//! is no same-tier retry, because re-running a browser render on a page
//! that just failed is the most expensive way to fail twice.

use std::sync::Arc;

use url::Url;

use crate::app::{Result, ScourError};
use crate::config::Config;
use crate::domain::{Article, ExtractionTier};
use crate::extractor::StaticExtractor;
use crate::fetcher::{validate_url, FetchStatus, Fetcher};
use crate::renderer::Renderer;
use crate::resolver::{is_aggregator_url, RedirectResolver};

/// What a tier attempt decided.
#[derive(Debug)]
pub enum TierOutcome {
    /// Accepted article; stop here.
    Done(Article),
    /// This tier can't produce an article but a more expensive one might.
    Escalate(&'static str),
    /// No tier can help (page missing, access denied, bad input).
    Fatal(ScourError),
}

/// Coordinates resolver, fetcher, extractor, and renderer for one URL at a
/// time. No shared mutable state: concurrent requests each get their own
/// fetch, their own page, and their own article accumulator.
pub struct Pipeline {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    renderer: Option<Arc<dyn Renderer>>,
    resolver: RedirectResolver,
    extractor: StaticExtractor,
}

impl Pipeline {
    /// `renderer` is optional: without one (Chrome missing, static-only
    /// mode) insufficiency at the static tier is terminal instead of
    /// escalating.
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        renderer: Option<Arc<dyn Renderer>>,
    ) -> Self {
        let resolver = RedirectResolver::new(fetcher.clone());
        let extractor = StaticExtractor::new(config.extract.clone());
        Self {
            config,
            fetcher,
            renderer,
            resolver,
            extractor,
        }
    }

    /// Extract an article from `url`, escalating through tiers as needed.
    ///
    /// The whole request is bounded by [`Config::request_budget`] so a
    /// pathological page can't consume unbounded wall-clock time even when
    /// both tiers run.
    pub async fn scrape_article(&self, url: &str) -> Result<Article> {
        validate_url(url)?;

        let budget = self.config.request_budget();
        match tokio::time::timeout(budget, self.run(url)).await {
            Ok(result) => result,
            Err(_) => Err(ScourError::Timeout {
                phase: "request",
                secs: budget.as_secs(),
            }),
        }
    }

    async fn run(&self, url: &str) -> Result<Article> {
        let target = if is_aggregator_url(url) {
            let resolution = self.resolver.resolve(url).await?;
            if resolution.is_resolved() {
                tracing::info!(
                    original = url,
                    resolved = %resolution.resolved_url,
                    method = ?resolution.method,
                    "Unwrapped aggregator URL"
                );
                resolution.resolved_url
            } else {
                // Soft failure: direct extraction on the wrapper is a last
                // resort that occasionally works.
                tracing::warn!(url, "Could not unwrap aggregator URL, trying it directly");
                resolution.resolved_url
            }
        } else {
            url.to_string()
        };

        match self.static_tier(&target).await {
            TierOutcome::Done(article) => Ok(article),
            TierOutcome::Fatal(e) => Err(e),
            TierOutcome::Escalate(reason) => {
                let Some(renderer) = &self.renderer else {
                    return Err(ScourError::Extraction {
                        url: target,
                        tier: "static",
                        reason: format!("{reason}; no renderer available"),
                    });
                };
                tracing::info!(url = %target, reason, "Escalating to rendered tier");
                self.rendered_tier(renderer.as_ref(), &target).await
            }
        }
    }

    /// Cheapest tier: plain fetch plus static extraction.
    ///
    /// Fetch timeouts and pre-response network failures escalate (a real
    /// browser often gets past what a bare client can't). An HTTP status
    /// >= 400 is fatal without escalating: the page is missing or access
    /// is denied, and rendering the same URL would not change that.
    async fn static_tier(&self, url: &str) -> TierOutcome {
        let fetched = match self.fetcher.fetch(url, None).await {
            Ok(fetched) => fetched,
            Err(e) => return TierOutcome::Fatal(e),
        };

        match fetched.status {
            FetchStatus::Timeout => TierOutcome::Escalate("static fetch timed out"),
            FetchStatus::NetworkError => {
                TierOutcome::Escalate("static fetch failed before a response")
            }
            FetchStatus::HttpError => TierOutcome::Fatal(ScourError::HttpStatus {
                status: fetched.status_code.unwrap_or(0),
                url: url.to_string(),
            }),
            FetchStatus::Ok => {
                let Some(body) = fetched.body else {
                    return TierOutcome::Escalate("response body was unreadable");
                };
                let base = match Url::parse(&fetched.final_url) {
                    Ok(base) => base,
                    Err(e) => return TierOutcome::Fatal(e.into()),
                };
                match self.extractor.extract(&body, &base, ExtractionTier::Static) {
                    Ok(article) => TierOutcome::Done(article),
                    Err(ScourError::InsufficientContent { .. }) => {
                        TierOutcome::Escalate("static extraction yielded insufficient content")
                    }
                    Err(e) => TierOutcome::Fatal(e),
                }
            }
        }
    }

    /// Last tier: rendered DOM through the same extractor. Failure here is
    /// final and reported with the tier attached.
    async fn rendered_tier(&self, renderer: &dyn Renderer, url: &str) -> Result<Article> {
        let rendered = renderer
            .render(url)
            .await
            .map_err(|e| ScourError::Extraction {
                url: url.to_string(),
                tier: "rendered",
                reason: e.to_string(),
            })?;

        let Some(body) = rendered.body else {
            return Err(ScourError::Extraction {
                url: url.to_string(),
                tier: "rendered",
                reason: "renderer produced no DOM".into(),
            });
        };
        let base = Url::parse(&rendered.final_url)?;

        self.extractor
            .extract(&body, &base, ExtractionTier::Rendered)
            .map_err(|e| ScourError::Extraction {
                url: url.to_string(),
                tier: "rendered",
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::fetcher::FetchResult;

    fn article_html(paragraphs: usize) -> String {
        format!(
            "<html><head><title>Test Story</title></head><body><article>{}</article></body></html>",
            "<p>A reasonably long paragraph of article body text for testing.</p>"
                .repeat(paragraphs)
        )
    }

    fn ok_response(url: &str, body: &str) -> FetchResult {
        FetchResult {
            status: FetchStatus::Ok,
            body: Some(body.to_string()),
            final_url: url.to_string(),
            status_code: Some(200),
        }
    }

    struct StubFetcher {
        responses: HashMap<String, FetchResult>,
        fallback: FetchResult,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn with_fallback(fallback: FetchResult) -> Self {
            Self {
                responses: HashMap::new(),
                fallback,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str, _extra: Option<HeaderMap>) -> Result<FetchResult> {
            self.calls.lock().unwrap().push(url.to_string());
            Ok(self
                .responses
                .get(url)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()))
        }
    }

    struct StubRenderer {
        response: FetchResult,
        calls: Mutex<usize>,
    }

    impl StubRenderer {
        fn new(response: FetchResult) -> Self {
            Self {
                response,
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn render(&self, _url: &str) -> Result<FetchResult> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.response.clone())
        }
    }

    /// Fetcher that never answers within any sane budget.
    struct SlowFetcher;

    #[async_trait]
    impl Fetcher for SlowFetcher {
        async fn fetch(&self, url: &str, _extra: Option<HeaderMap>) -> Result<FetchResult> {
            tokio::time::sleep(Duration::from_secs(86_400)).await;
            Ok(ok_response(url, ""))
        }
    }

    /// Sets its flag when dropped, whether the owning future completed or
    /// was cancelled. Mirrors how the Chrome renderer guards its page.
    struct TeardownFlag(Arc<AtomicBool>);

    impl Drop for TeardownFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Renderer that acquires a guarded resource and then hangs, so a
    /// request-budget expiry cancels it mid-render.
    struct HangingRenderer {
        torn_down: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Renderer for HangingRenderer {
        async fn render(&self, url: &str) -> Result<FetchResult> {
            let _guard = TeardownFlag(self.torn_down.clone());
            tokio::time::sleep(Duration::from_secs(86_400)).await;
            Ok(ok_response(url, &article_html(10)))
        }
    }

    /// Renderer that fails outright (browser crash, navigation abort).
    struct FailingRenderer;

    #[async_trait]
    impl Renderer for FailingRenderer {
        async fn render(&self, _url: &str) -> Result<FetchResult> {
            Err(ScourError::Render("browser crashed".into()))
        }
    }

    const URL: &str = "https://example.com/story";

    #[tokio::test]
    async fn test_static_friendly_page_never_renders() {
        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            &article_html(10),
        )));
        let renderer = Arc::new(StubRenderer::new(ok_response(URL, &article_html(10))));
        let pipeline = Pipeline::new(Config::default(), fetcher, Some(renderer.clone()));

        let article = pipeline.scrape_article(URL).await.unwrap();

        assert_eq!(article.extraction_tier, ExtractionTier::Static);
        assert_eq!(article.title, "Test Story");
        assert_eq!(renderer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_static_content_escalates() {
        // 50-ish characters statically, a full article when rendered
        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            "<html><head><title>Test Story</title></head><body><article><p>Fifty characters of shell page text.</p></article></body></html>",
        )));
        let renderer = Arc::new(StubRenderer::new(ok_response(URL, &article_html(10))));
        let pipeline = Pipeline::new(Config::default(), fetcher, Some(renderer.clone()));

        let article = pipeline.scrape_article(URL).await.unwrap();

        assert_eq!(article.extraction_tier, ExtractionTier::Rendered);
        assert_eq!(renderer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_http_404_fails_without_rendering() {
        let fetcher = Arc::new(StubFetcher::with_fallback(FetchResult {
            status: FetchStatus::HttpError,
            body: Some("<html>not found</html>".into()),
            final_url: URL.into(),
            status_code: Some(404),
        }));
        let renderer = Arc::new(StubRenderer::new(ok_response(URL, &article_html(10))));
        let pipeline = Pipeline::new(Config::default(), fetcher, Some(renderer.clone()));

        let result = pipeline.scrape_article(URL).await;

        assert!(matches!(
            result,
            Err(ScourError::HttpStatus { status: 404, .. })
        ));
        assert_eq!(renderer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_static_timeout_escalates() {
        let fetcher = Arc::new(StubFetcher::with_fallback(FetchResult {
            status: FetchStatus::Timeout,
            body: None,
            final_url: URL.into(),
            status_code: None,
        }));
        let renderer = Arc::new(StubRenderer::new(ok_response(URL, &article_html(10))));
        let pipeline = Pipeline::new(Config::default(), fetcher, Some(renderer.clone()));

        let article = pipeline.scrape_article(URL).await.unwrap();

        assert_eq!(article.extraction_tier, ExtractionTier::Rendered);
    }

    #[tokio::test]
    async fn test_no_renderer_makes_insufficiency_terminal() {
        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            "<html><head><title>T</title></head><body><article><p>tiny</p></article></body></html>",
        )));
        let pipeline = Pipeline::new(Config::default(), fetcher, None);

        let result = pipeline.scrape_article(URL).await;

        assert!(matches!(
            result,
            Err(ScourError::Extraction { tier: "static", .. })
        ));
    }

    #[tokio::test]
    async fn test_rendered_insufficiency_is_terminal_with_tier() {
        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            "<html><head><title>T</title></head><body><p>thin shell</p></body></html>",
        )));
        let renderer = Arc::new(StubRenderer::new(ok_response(
            URL,
            "<html><head><title>T</title></head><body><p>still thin</p></body></html>",
        )));
        let pipeline = Pipeline::new(Config::default(), fetcher, Some(renderer));

        let result = pipeline.scrape_article(URL).await;

        assert!(matches!(
            result,
            Err(ScourError::Extraction { tier: "rendered", .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_any_fetch() {
        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            &article_html(10),
        )));
        let pipeline = Pipeline::new(Config::default(), fetcher.clone(), None);

        let result = pipeline.scrape_article("not a url").await;

        assert!(matches!(result, Err(ScourError::InvalidUrl(_))));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_aggregator_url_resolved_before_fetch() {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;

        let token = URL_SAFE_NO_PAD.encode(b" https://example.com/story ".as_slice());
        let wrapped = format!("https://news.google.com/rss/articles/{token}");

        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            &article_html(10),
        )));
        let pipeline = Pipeline::new(Config::default(), fetcher.clone(), None);

        let article = pipeline.scrape_article(&wrapped).await.unwrap();

        assert_eq!(article.extraction_tier, ExtractionTier::Static);
        // The decoded article URL is fetched, never the aggregator wrapper
        assert_eq!(fetcher.calls(), vec![URL.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_expiry_times_out_request() {
        let pipeline = Pipeline::new(Config::default(), Arc::new(SlowFetcher), None);

        let result = pipeline.scrape_article(URL).await;

        assert!(matches!(
            result,
            Err(ScourError::Timeout {
                phase: "request",
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_expiry_mid_render_still_tears_down() {
        // Thin static page forces escalation into the hanging renderer
        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            "<html><head><title>T</title></head><body><article><p>thin</p></article></body></html>",
        )));
        let torn_down = Arc::new(AtomicBool::new(false));
        let renderer = Arc::new(HangingRenderer {
            torn_down: torn_down.clone(),
        });
        let pipeline = Pipeline::new(Config::default(), fetcher, Some(renderer));

        let result = pipeline.scrape_article(URL).await;

        assert!(matches!(
            result,
            Err(ScourError::Timeout {
                phase: "request",
                ..
            })
        ));
        // Cancelling the render future must still release its resources
        assert!(torn_down.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_render_failure_reported_with_tier() {
        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            "<html><head><title>T</title></head><body><article><p>thin</p></article></body></html>",
        )));
        let pipeline = Pipeline::new(Config::default(), fetcher, Some(Arc::new(FailingRenderer)));

        let result = pipeline.scrape_article(URL).await;

        match result {
            Err(ScourError::Extraction { tier, reason, .. }) => {
                assert_eq!(tier, "rendered");
                assert!(reason.contains("browser crashed"));
            }
            other => panic!("expected a rendered-tier extraction error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_same_url_twice_is_stable() {
        let fetcher = Arc::new(StubFetcher::with_fallback(ok_response(
            URL,
            &article_html(10),
        )));
        let pipeline = Pipeline::new(Config::default(), fetcher, None);

        let first = pipeline.scrape_article(URL).await.unwrap();
        let second = pipeline.scrape_article(URL).await.unwrap();

        assert_eq!(first.title, second.title);
        assert_eq!(first.extraction_tier, second.extraction_tier);
    }
}

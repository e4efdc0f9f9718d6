use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::{Mutex, Semaphore};

use crate::app::{Result, ScourError};
use crate::config::RenderConfig;
use crate::fetcher::{validate_url, FetchResult, FetchStatus};
use crate::renderer::Renderer;

/// Masks the obvious automation fingerprints before any page script runs:
/// `navigator.webdriver`, an empty plugin list, and a bare language list
/// are the three checks trivial bot detectors reach for first.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', {
    get: () => [{ name: 'Chrome PDF Plugin' }, { name: 'Chrome PDF Viewer' }, { name: 'Native Client' }],
});
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
window.chrome = window.chrome || { runtime: {} };
"#;

/// Headless-Chrome renderer using chromiumoxide.
///
/// One browser process per renderer; each call gets its own isolated page,
/// capped by a semaphore so concurrent requests can't launch unbounded
/// browser work.
pub struct ChromeRenderer {
    browser: Arc<Mutex<Browser>>,
    config: RenderConfig,
    semaphore: Arc<Semaphore>,
}

impl ChromeRenderer {
    /// Launch a browser with the given configuration.
    pub async fn new(config: RenderConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScourError::Render(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            ScourError::Render(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Drive the CDP connection for the lifetime of the browser
        tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let semaphore = Arc::new(Semaphore::new(config.max_concurrency));

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            config,
            semaphore,
        })
    }

    pub async fn with_defaults() -> Result<Self> {
        Self::new(RenderConfig::default()).await
    }

    /// Shut the browser process down. Pages created by in-flight renders
    /// are closed by their own calls; this tears down the process itself.
    pub async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!("Browser wait after close failed: {}", e);
        }
    }

    async fn new_page(&self) -> Result<Page> {
        let browser = self.browser.lock().await;
        browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScourError::Render(format!("Failed to create page: {}", e)))
    }

    /// Navigate and serialize the DOM. Runs with the page already created
    /// so the caller can guarantee teardown whatever happens here.
    async fn render_on_page(&self, page: &Page, url: &str) -> Result<FetchResult> {
        if let Some(ref ua) = self.config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| ScourError::Render(format!("Failed to set user agent: {}", e)))?;
        }

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(|e| ScourError::Render(format!("Failed to install stealth script: {}", e)))?;

        // Phase one: navigation up to the configured timeout. On expiry we
        // keep going with whatever DOM exists; partial content still beats
        // none, and the extractor's content gate decides what's usable.
        let navigation = async {
            page.goto(url)
                .await
                .map_err(|e| ScourError::Render(format!("Navigation failed: {}", e)))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| ScourError::Render(format!("Load never completed: {}", e)))?;
            Ok::<(), ScourError>(())
        };

        match tokio::time::timeout(self.config.timeout(), navigation).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::debug!(url, "Navigation timed out, using partial DOM");
            }
        }

        // Phase two: settle window for client-side rendering and JS
        // redirects that only fire after the load event.
        tokio::time::sleep(self.config.settle()).await;

        let html = page
            .content()
            .await
            .map_err(|e| ScourError::Render(format!("Failed to read rendered DOM: {}", e)))?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(FetchResult {
            status: FetchStatus::Ok,
            body: Some(html),
            final_url,
            status_code: None,
        })
    }
}

/// Owns a page for the duration of one render and guarantees it is closed
/// on every exit path, cancellation included. The orchestrator's request
/// budget cancels by dropping the render future, which can land between
/// page creation and the in-line close; `Drop` cannot await, so on that
/// path the close is handed to the runtime instead.
struct PageGuard {
    page: Option<Page>,
    url: String,
}

impl PageGuard {
    fn new(page: Page, url: &str) -> Self {
        Self {
            page: Some(page),
            url: url.to_string(),
        }
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::warn!(url = %self.url, "Failed to close page: {}", e);
            }
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        let url = std::mem::take(&mut self.url);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = page.close().await {
                    tracing::warn!(url, "Failed to close page after cancellation: {}", e);
                }
            });
        }
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<FetchResult> {
        validate_url(url)?;

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ScourError::Render(format!("Semaphore error: {}", e)))?;

        let page = self.new_page().await?;
        let guard = PageGuard::new(page.clone(), url);

        // Page teardown must happen on every exit path, timeout and error
        // included, or browser handles leak under sustained load. Errors
        // return through the in-line close below; cancellation goes through
        // the guard's Drop.
        let result = self.render_on_page(&page, url).await;
        guard.close().await;

        result
    }
}

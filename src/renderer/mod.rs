mod chrome;

pub use chrome::ChromeRenderer;

use async_trait::async_trait;

use crate::app::Result;
use crate::fetcher::FetchResult;

/// The expensive fallback tier: load a URL in a real browser engine so
/// client-side JavaScript runs before the DOM is read.
///
/// Implementations must bound their concurrency (browser pages are the
/// scarce resource in this pipeline) and release all browser resources on
/// every exit path, including timeouts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `url` and return the serialized post-JS DOM as a
    /// [`FetchResult`]. A navigation timeout yields whatever DOM state
    /// exists at expiry rather than an error; the static extractor's
    /// content gate is the final quality filter.
    async fn render(&self, url: &str) -> Result<FetchResult>;
}

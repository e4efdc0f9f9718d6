//! Static article extraction: readability-style heuristics over HTML
//! as received, without executing any JavaScript.
//!
//! The extractor is synchronous and CPU-bound; all I/O happens in the
//! fetcher or renderer that produced the HTML.

mod metadata;
mod score;

pub use score::{select_content, text_stats, TextStats};

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::app::{Result, ScourError};
use crate::config::ExtractConfig;
use crate::domain::{Article, ExtractionTier};

static PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h2, h3, li, blockquote, pre").expect("valid selector"));

pub struct StaticExtractor {
    config: ExtractConfig,
}

impl StaticExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Extract an [`Article`] from `html`, or fail with
    /// [`ScourError::InsufficientContent`] when the page yields less than
    /// the configured minimum of body text. That error is the signal the
    /// orchestrator uses to escalate to the next tier.
    ///
    /// `base_url` must be the URL the HTML was actually served from (after
    /// redirects) so relative image links resolve correctly.
    pub fn extract(&self, html: &str, base_url: &Url, tier: ExtractionTier) -> Result<Article> {
        let doc = Html::parse_document(html);

        let title = metadata::extract_title(&doc, base_url);
        let content = score::select_content(&doc, &self.config)
            .map(|container| self.body_text(container))
            .unwrap_or_default();

        // The threshold is in characters, not bytes; multibyte-heavy pages
        // must not slip past the gate on byte length alone.
        let content_chars = content.chars().count();
        if content_chars < self.config.min_content_length || title.is_empty() {
            return Err(ScourError::InsufficientContent {
                got: content_chars,
                min: self.config.min_content_length,
            });
        }

        tracing::debug!(
            url = %base_url,
            chars = content_chars,
            %tier,
            "Extracted article content"
        );

        Ok(Article::new(title, content, tier)
            .with_images(metadata::extract_images(&doc, base_url))
            .with_metadata(metadata::extract_metadata(&doc)))
    }

    /// Assemble body text from the winning container: its block elements
    /// in order, falling back to the container's raw text when the page
    /// doesn't use paragraph markup.
    fn body_text(&self, container: ElementRef<'_>) -> String {
        let mut blocks = Vec::new();
        for block in container.select(&PARAGRAPHS) {
            if block.ancestors().any(|node| {
                ElementRef::wrap(node).is_some_and(|el| score::is_boilerplate(&el))
            }) {
                continue;
            }
            let text = metadata::normalize(&block.text().collect::<String>());
            if !text.is_empty() {
                blocks.push(text);
            }
        }

        if blocks.is_empty() {
            metadata::normalize(&container.text().collect::<String>())
        } else {
            blocks.join("\n\n")
        }
    }
}

impl Default for StaticExtractor {
    fn default() -> Self {
        Self::new(ExtractConfig::default())
    }
}

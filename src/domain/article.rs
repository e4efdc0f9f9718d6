use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of characters of body text used for the derived excerpt.
pub const EXCERPT_CHARS: usize = 300;

/// Which extraction strategy produced an [`Article`].
///
/// Callers use this for quality/cost auditing: rendering is materially
/// more expensive than a static fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionTier {
    /// Plain HTTP fetch + DOM heuristics, no JavaScript executed.
    Static,
    /// Headless-browser rendered DOM.
    Rendered,
}

impl ExtractionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionTier::Static => "static",
            ExtractionTier::Rendered => "rendered",
        }
    }
}

impl std::fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort metadata pulled from meta tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub published_at: Option<DateTime<Utc>>,
    pub site_name: Option<String>,
}

/// The pipeline's output artifact: one cleanly extracted article.
///
/// Created once per extraction attempt and immutable after return.
/// Nothing is persisted; the value lives for a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Best-guess headline; non-empty on success.
    pub title: String,
    /// Extracted body text, paragraphs joined with blank lines.
    pub content: String,
    /// First [`EXCERPT_CHARS`] characters of `content`.
    pub excerpt: String,
    /// Candidate image URLs in document order, absolute, deduplicated.
    pub images: Vec<String>,
    /// Which tier produced this result.
    pub extraction_tier: ExtractionTier,
    pub metadata: ArticleMetadata,
}

impl Article {
    pub fn new(title: String, content: String, tier: ExtractionTier) -> Self {
        let excerpt = make_excerpt(&content);
        Self {
            title,
            content,
            excerpt,
            images: Vec::new(),
            extraction_tier: tier,
            metadata: ArticleMetadata::default(),
        }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_metadata(mut self, metadata: ArticleMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Take the first [`EXCERPT_CHARS`] characters on a char boundary.
fn make_excerpt(content: &str) -> String {
    content.chars().take(EXCERPT_CHARS).collect()
}

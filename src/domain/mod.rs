mod article;
mod resolution;

pub use article::{Article, ArticleMetadata, ExtractionTier, EXCERPT_CHARS};
pub use resolution::{RedirectResolution, ResolveMethod};

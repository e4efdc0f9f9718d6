//! Title, image, and meta-tag extraction from a parsed document.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::domain::ArticleMetadata;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").expect("valid selector"));
static TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("valid selector"));
static META: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[content]").expect("valid selector"));

/// Look up a `<meta>` tag by its `property` or `name` attribute.
fn meta_content<'a>(doc: &'a Html, key: &str) -> Option<&'a str> {
    doc.select(&META).find_map(|el| {
        let matches = el.value().attr("property") == Some(key)
            || el.value().attr("name") == Some(key);
        if matches {
            el.value().attr("content").map(str::trim).filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

/// Best-guess headline: `<title>`, then `og:title`, then the first `<h1>`,
/// then the last URL path segment de-slugged.
pub fn extract_title(doc: &Html, base_url: &Url) -> String {
    let from_tag = doc
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|t| normalize(&t))
        .filter(|t| !t.is_empty());
    if let Some(title) = from_tag {
        return title;
    }

    if let Some(title) = meta_content(doc, "og:title") {
        return normalize(title);
    }

    let from_h1 = doc
        .select(&H1)
        .next()
        .map(|el| normalize(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());
    if let Some(title) = from_h1 {
        return title;
    }

    title_from_path(base_url)
}

fn title_from_path(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| segment.replace(['-', '_'], " ").trim().to_string())
        .unwrap_or_default()
}

/// Collect `og:image` and `<img src>` URLs, absolute and deduplicated,
/// in document order. Relative sources resolve against `base_url`.
pub fn extract_images(doc: &Html, base_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    let og_images = doc
        .select(&META)
        .filter(|el| el.value().attr("property") == Some("og:image"))
        .filter_map(|el| el.value().attr("content"));
    let img_tags = doc.select(&IMG).filter_map(|el| el.value().attr("src"));

    for src in og_images.chain(img_tags) {
        let src = src.trim();
        if src.is_empty() || src.starts_with("data:") {
            continue;
        }
        let Ok(absolute) = base_url.join(src) else {
            continue;
        };
        if !matches!(absolute.scheme(), "http" | "https") {
            continue;
        }
        let absolute = absolute.to_string();
        if seen.insert(absolute.clone()) {
            images.push(absolute);
        }
    }

    images
}

/// Published date and site name, best-effort.
pub fn extract_metadata(doc: &Html) -> ArticleMetadata {
    let published_at = meta_content(doc, "article:published_time")
        .or_else(|| meta_content(doc, "date"))
        .or_else(|| {
            doc.select(&TIME)
                .next()
                .and_then(|el| el.value().attr("datetime"))
        })
        .and_then(parse_date);

    let site_name = meta_content(doc, "og:site_name").map(String::from);

    ArticleMetadata {
        published_at,
        site_name,
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/news/some-story").unwrap()
    }

    #[test]
    fn test_title_prefers_title_tag() {
        let doc = Html::parse_document(
            r#"<html><head><title>Tag Title</title>
               <meta property="og:title" content="OG Title"></head>
               <body><h1>Heading</h1></body></html>"#,
        );
        assert_eq!(extract_title(&doc, &base()), "Tag Title");
    }

    #[test]
    fn test_title_falls_back_to_og_title() {
        let doc = Html::parse_document(
            r#"<html><head><title>   </title>
               <meta property="og:title" content="Example Article"></head>
               <body><h1>Heading</h1></body></html>"#,
        );
        assert_eq!(extract_title(&doc, &base()), "Example Article");
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let doc = Html::parse_document("<html><body><h1>The Heading</h1></body></html>");
        assert_eq!(extract_title(&doc, &base()), "The Heading");
    }

    #[test]
    fn test_title_falls_back_to_url_path() {
        let doc = Html::parse_document("<html><body></body></html>");
        assert_eq!(extract_title(&doc, &base()), "some story");
    }

    #[test]
    fn test_images_resolved_and_deduplicated() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:image" content="https://example.com/hero.jpg"></head>
               <body>
                 <img src="/hero.jpg">
                 <img src="inline.png">
                 <img src="https://example.com/hero.jpg">
                 <img src="data:image/png;base64,AAAA">
               </body></html>"#,
        );
        let images = extract_images(&doc, &base());
        assert_eq!(
            images,
            vec![
                "https://example.com/hero.jpg".to_string(),
                "https://example.com/news/inline.png".to_string(),
            ]
        );
    }

    #[test]
    fn test_published_date_parsed() {
        let doc = Html::parse_document(
            r#"<html><head>
               <meta property="article:published_time" content="2024-03-01T12:30:00Z">
               <meta property="og:site_name" content="Example News">
               </head><body></body></html>"#,
        );
        let metadata = extract_metadata(&doc);
        assert_eq!(metadata.site_name.as_deref(), Some("Example News"));
        let published = metadata.published_at.unwrap();
        assert_eq!(published.to_rfc3339(), "2024-03-01T12:30:00+00:00");
    }

    #[test]
    fn test_missing_metadata_is_none() {
        let doc = Html::parse_document("<html><body></body></html>");
        let metadata = extract_metadata(&doc);
        assert!(metadata.published_at.is_none());
        assert!(metadata.site_name.is_none());
    }
}

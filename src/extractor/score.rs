//! Content-density scoring.
//!
//! Every block-level candidate container is scored as
//! `text_length - link_text * link_penalty - boilerplate_penalty`,
//! and the highest-scoring container is taken as the article body.
//! Text inside navigation, chrome, and obviously-boilerplate subtrees
//! contributes nothing, so a page's nav bar can never outscore its article.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::ExtractConfig;

/// Tags considered as candidate article containers.
static CANDIDATES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article, main, section, div, td").expect("valid selector"));

/// Tags whose subtrees never count as content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "form", "button", "nav", "aside",
    "header", "footer", "select", "option",
];

/// class/id fragments that mark a subtree as boilerplate.
static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)comment|sidebar|footer|header|menu|navbar|breadcrumb|share|social|widget|promo|advert|sponsor|related|cookie|consent|subscribe|newsletter|popup|banner",
    )
    .expect("valid regex")
});

/// Character counts for a subtree, split into total and link-enclosed text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextStats {
    pub total: usize,
    pub linked: usize,
}

pub fn is_skip_tag(name: &str) -> bool {
    SKIP_TAGS.contains(&name)
}

pub fn is_boilerplate(el: &ElementRef) -> bool {
    let name = el.value().name();
    if is_skip_tag(name) {
        return true;
    }
    let class = el.value().attr("class").unwrap_or("");
    let id = el.value().attr("id").unwrap_or("");
    BOILERPLATE.is_match(class) || BOILERPLATE.is_match(id)
}

/// Count visible text under `el`, skipping boilerplate subtrees.
///
/// The element itself is not filtered; penalizing a boilerplate-classed
/// candidate is the scorer's job, not the counter's.
pub fn text_stats(el: ElementRef) -> TextStats {
    let mut stats = TextStats::default();
    let in_link = el.value().name() == "a";
    walk_children(el, in_link, &mut stats);
    stats
}

fn walk_children(el: ElementRef<'_>, in_link: bool, stats: &mut TextStats) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            let len = text.split_whitespace().map(str::len).sum::<usize>();
            stats.total += len;
            if in_link {
                stats.linked += len;
            }
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if is_boilerplate(&child_el) {
                continue;
            }
            let in_link = in_link || child_el.value().name() == "a";
            walk_children(child_el, in_link, stats);
        }
    }
}

fn depth(el: &ElementRef) -> usize {
    el.ancestors().count()
}

fn score(el: &ElementRef, stats: TextStats, config: &ExtractConfig) -> f32 {
    let mut score = stats.total as f32 - stats.linked as f32 * config.link_density_penalty;
    let class = el.value().attr("class").unwrap_or("");
    let id = el.value().attr("id").unwrap_or("");
    if BOILERPLATE.is_match(class) || BOILERPLATE.is_match(id) {
        score -= config.boilerplate_penalty;
    }
    score
}

/// Pick the highest-scoring candidate container in the document.
///
/// Ties go to the shallower element, preferring central wrappers over
/// deeply nested fragments with the same effective text.
pub fn select_content<'a>(doc: &'a Html, config: &ExtractConfig) -> Option<ElementRef<'a>> {
    let mut best: Option<(f32, usize, ElementRef<'a>)> = None;

    for candidate in doc.select(&CANDIDATES) {
        let stats = text_stats(candidate);
        if stats.total == 0 {
            continue;
        }
        let score = score(&candidate, stats, config);
        let depth = depth(&candidate);

        let better = match &best {
            None => true,
            Some((best_score, best_depth, _)) => {
                score > *best_score || (score == *best_score && depth < *best_depth)
            }
        };
        if better {
            best = Some((score, depth, candidate));
        }
    }

    best.map(|(_, _, el)| el)
}

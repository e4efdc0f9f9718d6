//! # scour
//!
//! Tiered article extraction for arbitrary, adversarial web pages.
//!
//! ## Architecture
//!
//! ```text
//! URL → [Resolver if aggregator] → Fetcher → Static Extractor
//!                                     ↓ insufficient?
//!                                  Renderer → Static Extractor → Article
//! ```
//!
//! One request walks a fixed escalation path: unwrap aggregator redirects,
//! try a cheap HTTP fetch with readability heuristics, and only when that
//! definitively fails, render the page in headless Chrome and extract
//! again. The winning tier is recorded on the [`Article`](domain::Article)
//! so callers can track how often they pay for a browser.
//!
//! ## Quick Start
//!
//! ```bash
//! # Extract an article
//! scour scrape https://example.com/some-story
//!
//! # Unwrap a Google News link without extracting
//! scour resolve https://news.google.com/rss/articles/CBMi...
//!
//! # Machine-readable output
//! scour scrape --json https://example.com/some-story
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires together config, fetcher,
/// optional browser renderer, and the pipeline.
pub mod app;

/// Command-line interface using clap.
///
/// - `scrape <url>` - Run the full extraction pipeline
/// - `resolve <url>` - Unwrap an aggregator URL
/// - `config-path` - Show where configuration lives
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/scour/config.toml`, with per-tier sections for
/// fetching, extraction scoring, and rendering.
pub mod config;

/// Core domain models.
///
/// - [`Article`](domain::Article): the extraction output artifact
/// - [`ExtractionTier`](domain::ExtractionTier): which strategy won
/// - [`RedirectResolution`](domain::RedirectResolution): unwrapped URLs
pub mod domain;

/// Readability-style static extraction.
///
/// Content-density scoring over candidate containers, title preference
/// chains, image collection. Pure CPU work over HTML as received.
pub mod extractor;

/// Lightweight HTTP retrieval.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for page fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
///   with browser-like headers and typed failure statuses
pub mod fetcher;

/// The tiered orchestrator: the state machine that decides when to
/// escalate from static extraction to browser rendering.
pub mod pipeline;

/// Headless-browser rendering via chromiumoxide, with stealth
/// countermeasures and bounded page concurrency.
pub mod renderer;

/// Aggregator redirect resolution: token decoding and network probing
/// for Google-News-style wrapped URLs.
pub mod resolver;

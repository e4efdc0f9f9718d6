use std::sync::Arc;

use crate::app::{AppContext, Result, ScourError};
use crate::config::Config;
use crate::domain::Article;
use crate::fetcher::HttpFetcher;
use crate::resolver::RedirectResolver;

pub async fn scrape(config: Config, url: &str, json: bool, static_only: bool) -> Result<()> {
    let ctx = AppContext::new(config, static_only).await?;

    let result = ctx.pipeline.scrape_article(url).await;
    ctx.shutdown().await;

    let article = result?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&article)
                .map_err(|e| ScourError::Config(format!("Failed to serialize article: {}", e)))?
        );
    } else {
        print_article(&article);
    }

    Ok(())
}

fn print_article(article: &Article) {
    println!("{}", article.title);
    println!("tier: {}", article.extraction_tier);
    if let Some(site) = &article.metadata.site_name {
        println!("site: {}", site);
    }
    if let Some(published) = &article.metadata.published_at {
        println!("published: {}", published.format("%Y-%m-%d %H:%M UTC"));
    }
    if !article.images.is_empty() {
        println!("images: {}", article.images.len());
        for image in &article.images {
            println!("  {}", image);
        }
    }
    println!();
    println!("{}", article.content);
}

pub async fn resolve(config: Config, url: &str, offline: bool) -> Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone()));
    let resolver = RedirectResolver::new(fetcher);

    let resolution = if offline {
        resolver.resolve_local(url)
    } else {
        resolver.resolve(url).await?
    };

    if resolution.is_resolved() {
        println!("{}", resolution.resolved_url);
        println!("method: {:?}", resolution.method);
    } else {
        println!("Could not resolve: {}", url);
    }

    Ok(())
}

pub fn config_path() -> Result<()> {
    let path = Config::default_config_path()
        .map_err(|e| ScourError::Config(e.to_string()))?;
    println!("{}", path.display());
    Ok(())
}

use std::sync::Arc;

use crate::app::Result;
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::pipeline::Pipeline;
use crate::renderer::{ChromeRenderer, Renderer};

pub struct AppContext {
    pub config: Config,
    pub pipeline: Pipeline,
    chrome: Option<Arc<ChromeRenderer>>,
}

impl AppContext {
    /// Wire up the pipeline. Launching Chrome can fail on hosts without a
    /// browser installed; that degrades to static-only extraction rather
    /// than failing the whole context.
    pub async fn new(config: Config, static_only: bool) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config.fetch.clone()));

        let chrome = if static_only {
            None
        } else {
            match ChromeRenderer::new(config.render.clone()).await {
                Ok(renderer) => Some(Arc::new(renderer)),
                Err(e) => {
                    tracing::warn!("Running static-only, browser unavailable: {}", e);
                    None
                }
            }
        };

        let renderer = chrome
            .clone()
            .map(|chrome| chrome as Arc<dyn Renderer>);
        let pipeline = Pipeline::new(config.clone(), fetcher, renderer);

        Ok(Self {
            config,
            pipeline,
            chrome,
        })
    }

    /// Tear down the browser process, if one was launched.
    pub async fn shutdown(&self) {
        if let Some(chrome) = &self.chrome {
            chrome.shutdown().await;
        }
    }
}

//! Flipkart adapter: prices and availability populate client-side, so the
//! page goes through the headless renderer before extraction.

use async_trait::async_trait;
use std::sync::Arc;

use crate::adapters::{scrape_rendered, SourceAdapter};
use crate::config::ScraperConfig;
use crate::models::ScrapedProduct;
use crate::proxy::ProxyRotator;
use crate::rules::Retailer;
use crate::scraper::PageRenderer;
use crate::utils::error::Result;

pub struct FlipkartAdapter {
    renderer: PageRenderer,
    rotator: Arc<ProxyRotator>,
    config: ScraperConfig,
}

impl FlipkartAdapter {
    pub fn new(renderer: PageRenderer, rotator: Arc<ProxyRotator>, config: ScraperConfig) -> Self {
        Self {
            renderer,
            rotator,
            config,
        }
    }
}

#[async_trait]
impl SourceAdapter for FlipkartAdapter {
    fn retailer(&self) -> Retailer {
        Retailer::Flipkart
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedProduct> {
        scrape_rendered(
            &self.renderer,
            &self.rotator,
            Retailer::Flipkart,
            url,
            &self.config.fallback_currency,
        )
        .await
    }
}

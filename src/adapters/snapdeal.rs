//! Snapdeal adapter: rendered-DOM source, same flow as Flipkart with its own
//! ruleset.

use async_trait::async_trait;
use std::sync::Arc;

use crate::adapters::{scrape_rendered, SourceAdapter};
use crate::config::ScraperConfig;
use crate::models::ScrapedProduct;
use crate::proxy::ProxyRotator;
use crate::rules::Retailer;
use crate::scraper::PageRenderer;
use crate::utils::error::Result;

pub struct SnapdealAdapter {
    renderer: PageRenderer,
    rotator: Arc<ProxyRotator>,
    config: ScraperConfig,
}

impl SnapdealAdapter {
    pub fn new(renderer: PageRenderer, rotator: Arc<ProxyRotator>, config: ScraperConfig) -> Self {
        Self {
            renderer,
            rotator,
            config,
        }
    }
}

#[async_trait]
impl SourceAdapter for SnapdealAdapter {
    fn retailer(&self) -> Retailer {
        Retailer::Snapdeal
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedProduct> {
        scrape_rendered(
            &self.renderer,
            &self.rotator,
            Retailer::Snapdeal,
            url,
            &self.config.fallback_currency,
        )
        .await
    }
}

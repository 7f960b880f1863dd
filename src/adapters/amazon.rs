//! Amazon adapter: static HTML over the rotated proxy, no rendering needed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::debug;

use crate::adapters::{build_record, SourceAdapter};
use crate::config::ScraperConfig;
use crate::models::ScrapedProduct;
use crate::proxy::{ProxyRotator, ProxySession};
use crate::rules::Retailer;
use crate::utils::error::{AppError, Result};

pub struct AmazonAdapter {
    rotator: Arc<ProxyRotator>,
    config: ScraperConfig,
}

impl AmazonAdapter {
    pub fn new(rotator: Arc<ProxyRotator>, config: ScraperConfig) -> Self {
        Self { rotator, config }
    }

    fn client(&self, session: Option<&ProxySession>) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.config.user_agent.clone())
            .timeout(Duration::from_secs(self.config.navigation_timeout_secs))
            // Rotating proxies terminate TLS with their own certificates
            .danger_accept_invalid_certs(true);

        if let Some(session) = session {
            let proxy = reqwest::Proxy::all(session.server_url())
                .map_err(|e| AppError::InvalidInput(format!("bad proxy endpoint: {e}")))?
                .basic_auth(&session.username, &session.password);
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| AppError::InvalidInput(format!("http client build failed: {e}")))
    }
}

#[async_trait]
impl SourceAdapter for AmazonAdapter {
    fn retailer(&self) -> Retailer {
        Retailer::Amazon
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedProduct> {
        // One egress session per scrape attempt, shared across retries
        let session = self.rotator.session();
        let client = self.client(session.as_ref())?;

        let strategy = FixedInterval::from_millis(self.config.retry_backoff_ms)
            .take(self.config.navigation_retries.saturating_sub(1) as usize);

        let body = Retry::spawn(strategy, || async {
            debug!(url, "fetching product page");
            let response = client.get(url).send().await?;
            response.error_for_status()?.text().await
        })
        .await
        .map_err(|e| AppError::FetchFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        build_record(&body, Retailer::Amazon, url, &self.config.fallback_currency)
    }
}

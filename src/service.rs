//! Scrape-and-store and subscription entrypoints.
//!
//! Within one call the steps are strictly sequential: fetch, extract, merge,
//! persist, notify. Concurrent calls for the same URL are not serialized;
//! the last writer's full history wins (accepted V1 behavior).

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};
use url::Url;

use crate::adapters::{AmazonAdapter, FlipkartAdapter, SnapdealAdapter, SourceAdapter};
use crate::config::AppConfig;
use crate::merge;
use crate::models::{ProductRecord, ScrapedProduct};
use crate::notify::{render_welcome, Notifier};
use crate::proxy::ProxyRotator;
use crate::repository::Repository;
use crate::rules::Retailer;
use crate::scraper::PageRenderer;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeOutcome {
    /// Appended and the welcome notification went out.
    Subscribed,
    /// Already tracking; no side effect, nothing sent.
    AlreadySubscribed,
    /// Appended and persisted, but the welcome notification failed. The
    /// subscription stands; delivery is at-least-once, not atomic.
    SubscribedNotifyFailed(String),
}

impl SubscribeOutcome {
    pub fn message(&self) -> String {
        match self {
            SubscribeOutcome::Subscribed => {
                "Email added and notification sent successfully".to_string()
            }
            SubscribeOutcome::AlreadySubscribed => {
                "Email already tracking this product".to_string()
            }
            SubscribeOutcome::SubscribedNotifyFailed(reason) => {
                format!("Email added, but the welcome notification failed: {reason}")
            }
        }
    }
}

pub struct ProductService {
    config: AppConfig,
    repository: Arc<dyn Repository>,
    notifier: Arc<dyn Notifier>,
    rotator: Arc<ProxyRotator>,
    renderer: PageRenderer,
}

impl ProductService {
    pub fn new(
        config: AppConfig,
        repository: Arc<dyn Repository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let rotator = Arc::new(ProxyRotator::new(&config.proxy));
        let renderer = PageRenderer::new(config.scraper.clone());
        Self {
            config,
            repository,
            notifier,
            rotator,
            renderer,
        }
    }

    pub fn rotator(&self) -> &ProxyRotator {
        &self.rotator
    }

    fn adapter_for(&self, retailer: Retailer) -> Box<dyn SourceAdapter> {
        let scraper = self.config.scraper.clone();
        match retailer {
            Retailer::Amazon => Box::new(AmazonAdapter::new(self.rotator.clone(), scraper)),
            Retailer::Flipkart => Box::new(FlipkartAdapter::new(
                self.renderer.clone(),
                self.rotator.clone(),
                scraper,
            )),
            Retailer::Snapdeal => Box::new(SnapdealAdapter::new(
                self.renderer.clone(),
                self.rotator.clone(),
                scraper,
            )),
        }
    }

    /// Scrape one product URL, merge against the stored record for the same
    /// URL, persist, and return the canonical record.
    pub async fn scrape_and_store(&self, url: &str) -> Result<ProductRecord> {
        if url.trim().is_empty() {
            return Err(AppError::InvalidInput("product URL is required".to_string()));
        }
        Url::parse(url).map_err(|_| AppError::InvalidInput(format!("not a valid URL: {url}")))?;

        let retailer = Retailer::from_url(url)
            .ok_or_else(|| AppError::InvalidInput(format!("no source adapter for {url}")))?;

        info!(url, source = retailer.name(), "scraping product");
        let scraped = self.adapter_for(retailer).scrape(url).await?;

        self.store_scraped(scraped).await
    }

    /// Merge-and-persist seam: also the entrypoint for callers that already
    /// hold an intermediate record (tests, backfills).
    pub async fn store_scraped(&self, mut scraped: ScrapedProduct) -> Result<ProductRecord> {
        scraped.url = canonical_url(&scraped.url, self.config.tracking.normalize_urls);

        let existing = self.repository.find_by_url(&scraped.url).await?;
        let merged = merge::merge(existing, scraped);
        let stored = self.repository.upsert_by_url(&merged).await?;

        info!(
            id = %stored.id,
            price = %stored.current_price,
            observations = stored.price_history.len(),
            "product saved"
        );
        Ok(stored)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<ProductRecord> {
        self.repository
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
    }

    pub async fn similar_products(&self, product_id: &str) -> Result<Vec<ProductRecord>> {
        // Resolve the id first so an unknown product surfaces as NotFound
        // instead of an empty list.
        self.get_product(product_id).await?;
        self.repository
            .find_similar(product_id, self.config.tracking.similar_limit)
            .await
    }

    /// Subscribe an email to price alerts for a product. The append is
    /// idempotent; the welcome notification is sent exactly once, on the
    /// first subscription.
    pub async fn subscribe(&self, product_id: &str, email: &str) -> Result<SubscribeOutcome> {
        if !is_valid_email(email) {
            return Err(AppError::InvalidEmail(email.to_string()));
        }

        let mut record = self.get_product(product_id).await?;
        if !record.add_subscriber(email) {
            info!(product_id, email, "subscriber already present");
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        let stored = self.repository.upsert_by_url(&record).await?;
        info!(product_id, email, "subscriber added");

        let content = render_welcome(&stored);
        match self.notifier.send(&content, &[email.to_string()]).await {
            Ok(_) => Ok(SubscribeOutcome::Subscribed),
            Err(e) => {
                warn!(product_id, email, error = %e, "welcome notification failed");
                Ok(SubscribeOutcome::SubscribedNotifyFailed(e.to_string()))
            }
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Records are keyed by exact URL unless normalization is enabled, in which
/// case fragments and trailing slashes are stripped. Query strings always
/// survive: retailers encode distinct variants in them.
pub fn canonical_url(url: &str, normalize: bool) -> String {
    if !normalize {
        return url.to_string();
    }
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    parsed.set_fragment(None);

    let mut result = parsed.to_string();
    while result.ends_with('/') && !result.ends_with("://") {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user name@example.com"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn test_canonical_url_off_by_default() {
        let url = "https://www.amazon.in/dp/B0TEST/?ref=x#reviews";
        assert_eq!(canonical_url(url, false), url);
    }

    #[test]
    fn test_canonical_url_strips_fragment_and_trailing_slash() {
        assert_eq!(
            canonical_url("https://www.amazon.in/dp/B0TEST/#reviews", true),
            "https://www.amazon.in/dp/B0TEST"
        );
        // Query strings are kept
        assert_eq!(
            canonical_url("https://www.amazon.in/dp/B0TEST?variant=blue", true),
            "https://www.amazon.in/dp/B0TEST?variant=blue"
        );
    }

    #[test]
    fn test_subscribe_outcome_messages_are_distinguishable() {
        let subscribed = SubscribeOutcome::Subscribed.message();
        let already = SubscribeOutcome::AlreadySubscribed.message();
        let failed = SubscribeOutcome::SubscribedNotifyFailed("smtp down".to_string()).message();

        assert_ne!(subscribed, already);
        assert_ne!(subscribed, failed);
        assert!(failed.contains("smtp down"));
    }
}

//! Source adapters, one per retailer.
//!
//! An adapter fetches a product page (through the egress rotator), runs the
//! field extractors over the retailer's ruleset and returns an intermediate
//! `ScrapedProduct`, or a typed failure. History is the merge engine's
//! responsibility, never the adapter's.

use async_trait::async_trait;
use rust_decimal::Decimal;
use scraper::Html;

use crate::extract;
use crate::models::ScrapedProduct;
use crate::rules::{ImageRule, Retailer};
use crate::utils::error::{AppError, Result};

pub mod amazon;
pub mod flipkart;
pub mod snapdeal;

pub use amazon::AmazonAdapter;
pub use flipkart::FlipkartAdapter;
pub use snapdeal::SnapdealAdapter;

// No retailer ruleset exposes these fields yet
const DEFAULT_CATEGORY: &str = "category";
const DEFAULT_REVIEWS_COUNT: u32 = 100;
const DEFAULT_STARS: f64 = 4.5;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn retailer(&self) -> Retailer;

    /// Fetch and extract one product page into an intermediate record.
    async fn scrape(&self, url: &str) -> Result<ScrapedProduct>;
}

/// Run every field extractor over a fetched document. The title is
/// mandatory: without one the page is treated as layout drift and no partial
/// record escapes.
pub fn build_record(
    html: &str,
    retailer: Retailer,
    url: &str,
    fallback_currency: &str,
) -> Result<ScrapedProduct> {
    let document = Html::parse_document(html);
    let rules = retailer.rules();

    let title = extract::first_text(&document, rules.title).unwrap_or_default();
    if title.is_empty() {
        return Err(AppError::ExtractionFailed {
            url: url.to_string(),
            message: format!("no product title in {} page", retailer.name()),
        });
    }

    let current_price = extract::extract_price(&document, rules.current_price);
    let original_price = extract::extract_price(&document, rules.original_price);
    let (current_price, original_price) = fallback_prices(current_price, original_price);

    let image = extract_image(&document, retailer);

    Ok(ScrapedProduct {
        url: url.to_string(),
        title,
        currency: extract::extract_currency(&document, rules.currency, fallback_currency),
        image,
        current_price,
        original_price,
        discount_rate: extract::extract_discount_rate(&document, rules.discount),
        description: extract::extract_description(&document, rules.description),
        category: DEFAULT_CATEGORY.to_string(),
        reviews_count: DEFAULT_REVIEWS_COUNT,
        stars: DEFAULT_STARS,
        is_out_of_stock: extract::is_out_of_stock(&document, &rules.out_of_stock),
    })
}

/// Shared fetch path for rendering-dependent retailers: rotate an egress
/// session, render the page behind the source's readiness selectors, then
/// extract from the DOM snapshot.
pub(crate) async fn scrape_rendered(
    renderer: &crate::scraper::PageRenderer,
    rotator: &crate::proxy::ProxyRotator,
    retailer: Retailer,
    url: &str,
    fallback_currency: &str,
) -> Result<ScrapedProduct> {
    let wait_for = retailer
        .rules()
        .wait_for
        .expect("rendered retailer must define wait selectors");

    let request = crate::scraper::RenderRequest {
        url: url.to_string(),
        wait_for: wait_for.to_string(),
        proxy: rotator.session(),
    };

    let html = renderer
        .render(request)
        .await
        .map_err(|e| AppError::FetchFailed {
            url: url.to_string(),
            message: format!("{e:#}"),
        })?;

    build_record(&html, retailer, url, fallback_currency)
}

/// Sources disagree on which of the two prices they expose; a missing one
/// falls back to the other, and both stay zero when neither parsed.
fn fallback_prices(current: Decimal, original: Decimal) -> (Decimal, Decimal) {
    let resolved_current = if current > Decimal::ZERO { current } else { original };
    let resolved_original = if original > Decimal::ZERO { original } else { current };
    (resolved_current, resolved_original)
}

fn extract_image(document: &Html, retailer: Retailer) -> String {
    let rules = retailer.rules();
    let Some(raw) = extract::first_attr(document, rules.image) else {
        return String::new();
    };
    match rules.image_rule {
        ImageRule::Attr => raw,
        // Attribute value is a JSON object keyed by image URL; a malformed
        // map degrades to no image rather than failing the scrape.
        ImageRule::JsonKeys => serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&raw)
            .ok()
            .and_then(|map| map.keys().next().cloned())
            .unwrap_or_default(),
    }
}

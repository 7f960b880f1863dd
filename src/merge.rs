//! Merge & history engine.
//!
//! A freshly scraped intermediate record is combined with the stored record
//! (when one exists): one `PricePoint` is appended per scrape cycle, scalar
//! fields are latest-wins, and the summary statistics are recomputed from the
//! full history every time rather than patched incrementally.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::models::{generate_id, PricePoint, ProductRecord, ScrapedProduct};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub lowest: Decimal,
    pub highest: Decimal,
    pub average: Decimal,
}

/// Derive lowest/highest/average from a full history. An empty history
/// (never produced by `merge`) reports all-zero stats.
pub fn summarize(history: &[PricePoint]) -> PriceStats {
    let Some(first) = history.first() else {
        return PriceStats {
            lowest: Decimal::ZERO,
            highest: Decimal::ZERO,
            average: Decimal::ZERO,
        };
    };

    let mut lowest = first.price;
    let mut highest = first.price;
    let mut sum = Decimal::ZERO;
    for point in history {
        lowest = lowest.min(point.price);
        highest = highest.max(point.price);
        sum += point.price;
    }

    PriceStats {
        lowest,
        highest,
        average: sum / Decimal::from(history.len() as u64),
    }
}

/// Combine a scrape result with the stored record for the same URL.
///
/// Without an existing record the history starts at the incoming current
/// price. With one, prior history entries are carried over untouched and
/// exactly one new entry is appended; id, subscribers and created_at
/// survive the merge.
pub fn merge(existing: Option<ProductRecord>, incoming: ScrapedProduct) -> ProductRecord {
    let now = Utc::now();
    let observed = PricePoint {
        price: incoming.current_price,
        observed_at: now,
    };

    let (id, mut price_history, subscribers, created_at) = match existing {
        Some(prev) => (prev.id, prev.price_history, prev.subscribers, prev.created_at),
        None => (generate_id(), Vec::new(), Vec::new(), now),
    };
    price_history.push(observed);

    let stats = summarize(&price_history);

    ProductRecord {
        id,
        url: incoming.url,
        title: incoming.title,
        currency: incoming.currency,
        image: incoming.image,
        current_price: incoming.current_price,
        original_price: incoming.original_price,
        price_history,
        lowest_price: stats.lowest,
        highest_price: stats.highest,
        average_price: stats.average,
        discount_rate: incoming.discount_rate,
        description: incoming.description,
        category: incoming.category,
        reviews_count: incoming.reviews_count,
        stars: incoming.stars,
        is_out_of_stock: incoming.is_out_of_stock,
        subscribers,
        created_at,
        updated_at: now,
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observed price, appended on every scrape cycle. History entries are
/// never rewritten; insertion order is chronological.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// Canonical, source-agnostic product record as persisted by the repository.
///
/// `lowest_price`, `highest_price` and `average_price` are derived from
/// `price_history` by the merge engine and are never set independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub currency: String,
    pub image: String,
    pub current_price: Decimal,
    pub original_price: Decimal,
    pub price_history: Vec<PricePoint>,
    pub lowest_price: Decimal,
    pub highest_price: Decimal,
    pub average_price: Decimal,
    pub discount_rate: u32,
    pub description: Vec<String>,
    pub category: String,
    pub reviews_count: u32,
    pub stars: f64,
    pub is_out_of_stock: bool,
    pub subscribers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    pub fn has_subscriber(&self, email: &str) -> bool {
        self.subscribers.iter().any(|s| s == email)
    }

    /// Append a subscriber, keeping the list duplicate-free. Returns false
    /// (and leaves the list untouched) when the email is already present.
    pub fn add_subscriber(&mut self, email: &str) -> bool {
        if self.has_subscriber(email) {
            return false;
        }
        self.subscribers.push(email.to_string());
        true
    }
}

/// Adapter output before the history merge. Carries no price history, no
/// subscribers and no id: those belong to the canonical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapedProduct {
    pub url: String,
    pub title: String,
    pub currency: String,
    pub image: String,
    pub current_price: Decimal,
    pub original_price: Decimal,
    pub discount_rate: u32,
    pub description: Vec<String>,
    pub category: String,
    pub reviews_count: u32,
    pub stars: f64,
    pub is_out_of_stock: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn sample_record() -> ProductRecord {
        let now = Utc::now();
        ProductRecord {
            id: crate::models::generate_id(),
            url: "https://www.amazon.in/dp/B0TEST".to_string(),
            title: "Test Product".to_string(),
            currency: "₹".to_string(),
            image: "https://images.example/x.jpg".to_string(),
            current_price: d("499"),
            original_price: d("999"),
            price_history: vec![PricePoint {
                price: d("499"),
                observed_at: now,
            }],
            lowest_price: d("499"),
            highest_price: d("499"),
            average_price: d("499"),
            discount_rate: 50,
            description: vec!["Line 1".to_string()],
            category: "category".to_string(),
            reviews_count: 100,
            stars: 4.5,
            is_out_of_stock: false,
            subscribers: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_subscriber_is_deduplicated() {
        let mut record = sample_record();

        assert!(record.add_subscriber("user@example.com"));
        assert!(!record.add_subscriber("user@example.com"));
        assert_eq!(record.subscribers.len(), 1);
        assert!(record.has_subscriber("user@example.com"));
    }

    #[test]
    fn test_subscriber_order_is_preserved() {
        let mut record = sample_record();
        record.add_subscriber("a@example.com");
        record.add_subscriber("b@example.com");
        record.add_subscriber("a@example.com");

        assert_eq!(record.subscribers, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_serialization_round_trip() {
        let record = sample_record();

        let serialized = serde_json::to_string(&record).unwrap();
        let deserialized: ProductRecord = serde_json::from_str(&serialized).unwrap();

        assert_eq!(record, deserialized);
    }
}

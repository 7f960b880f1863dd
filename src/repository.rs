//! Record persistence.
//!
//! The repository is a capability consumed by the service layer: records are
//! keyed by unique URL, addressed externally by their opaque id. The SQLite
//! implementation stores each record as a JSON document; the pool handle is
//! owned by the process entrypoint and passed in, never held as an ambient
//! global.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::models::ProductRecord;
use crate::utils::error::{AppError, Result};

#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_by_url(&self, url: &str) -> Result<Option<ProductRecord>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ProductRecord>>;
    /// Insert or replace the record stored under `record.url` and return the
    /// persisted state.
    async fn upsert_by_url(&self, record: &ProductRecord) -> Result<ProductRecord>;
    /// Most recently updated records excluding one id.
    async fn find_similar(&self, exclude_id: &str, limit: u32) -> Result<Vec<ProductRecord>>;
}

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the schema if missing. Called once at startup by the owner of
    /// the pool.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL UNIQUE,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn decode(payload: &str) -> Result<ProductRecord> {
        serde_json::from_str(payload)
            .map_err(|e| AppError::PersistenceFailed(format!("corrupt record payload: {e}")))
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn find_by_url(&self, url: &str) -> Result<Option<ProductRecord>> {
        let row = sqlx::query("SELECT record FROM products WHERE url = ?1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::decode(r.get::<String, _>(0).as_str()))
            .transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ProductRecord>> {
        let row = sqlx::query("SELECT record FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::decode(r.get::<String, _>(0).as_str()))
            .transpose()
    }

    async fn upsert_by_url(&self, record: &ProductRecord) -> Result<ProductRecord> {
        let payload = serde_json::to_string(record)
            .map_err(|e| AppError::PersistenceFailed(format!("record encode failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO products (id, url, record, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(url) DO UPDATE SET
                record = excluded.record,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.url)
        .bind(&payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(record.clone())
    }

    async fn find_similar(&self, exclude_id: &str, limit: u32) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            "SELECT record FROM products WHERE id != ?1 ORDER BY updated_at DESC LIMIT ?2",
        )
        .bind(exclude_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Self::decode(r.get::<String, _>(0).as_str()))
            .collect()
    }
}

/// Keyed vector store for tests and local development. Insertion order is
/// preserved, which makes `find_similar` deterministic.
#[derive(Default)]
pub struct MemoryRepository {
    records: Mutex<Vec<ProductRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_by_url(&self, url: &str) -> Result<Option<ProductRecord>> {
        Ok(self.records.lock().iter().find(|r| r.url == url).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ProductRecord>> {
        Ok(self.records.lock().iter().find(|r| r.id == id).cloned())
    }

    async fn upsert_by_url(&self, record: &ProductRecord) -> Result<ProductRecord> {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.url == record.url) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(record.clone())
    }

    async fn find_similar(&self, exclude_id: &str, limit: u32) -> Result<Vec<ProductRecord>> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.id != exclude_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::models::ScrapedProduct;
    use rust_decimal::Decimal;

    fn record(url: &str) -> ProductRecord {
        merge(
            None,
            ScrapedProduct {
                url: url.to_string(),
                title: "Widget".to_string(),
                currency: "₹".to_string(),
                image: String::new(),
                current_price: Decimal::from(100),
                original_price: Decimal::from(100),
                discount_rate: 0,
                description: vec!["Line".to_string()],
                category: "category".to_string(),
                reviews_count: 100,
                stars: 4.5,
                is_out_of_stock: false,
            },
        )
    }

    #[tokio::test]
    async fn test_memory_repository_upsert_and_find() {
        let repo = MemoryRepository::new();
        let rec = record("https://www.amazon.in/dp/A");

        repo.upsert_by_url(&rec).await.unwrap();
        assert_eq!(repo.len(), 1);

        let by_url = repo.find_by_url(&rec.url).await.unwrap().unwrap();
        assert_eq!(by_url.id, rec.id);

        let by_id = repo.find_by_id(&rec.id).await.unwrap().unwrap();
        assert_eq!(by_id.url, rec.url);

        assert!(repo.find_by_url("https://other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_repository_upsert_replaces_same_url() {
        let repo = MemoryRepository::new();
        let first = record("https://www.amazon.in/dp/A");
        repo.upsert_by_url(&first).await.unwrap();

        let updated = merge(
            Some(first.clone()),
            ScrapedProduct {
                url: first.url.clone(),
                title: "Widget v2".to_string(),
                currency: "₹".to_string(),
                image: String::new(),
                current_price: Decimal::from(90),
                original_price: Decimal::from(100),
                discount_rate: 10,
                description: vec!["Line".to_string()],
                category: "category".to_string(),
                reviews_count: 100,
                stars: 4.5,
                is_out_of_stock: false,
            },
        );
        repo.upsert_by_url(&updated).await.unwrap();

        assert_eq!(repo.len(), 1);
        let stored = repo.find_by_url(&first.url).await.unwrap().unwrap();
        assert_eq!(stored.title, "Widget v2");
        assert_eq!(stored.price_history.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_repository_find_similar_excludes_id() {
        let repo = MemoryRepository::new();
        let a = record("https://www.amazon.in/dp/A");
        let b = record("https://www.amazon.in/dp/B");
        let c = record("https://www.amazon.in/dp/C");
        for rec in [&a, &b, &c] {
            repo.upsert_by_url(rec).await.unwrap();
        }

        let similar = repo.find_similar(&a.id, 3).await.unwrap();
        assert_eq!(similar.len(), 2);
        assert!(similar.iter().all(|r| r.id != a.id));

        let limited = repo.find_similar(&a.id, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}

//! Round-robin egress rotation.
//!
//! The rotator hands out one endpoint per scrape attempt, advancing an atomic
//! cursor modulo the pool size. Fairness is best-effort under concurrency: a
//! race may hand the same endpoint to two concurrent callers, which is
//! acceptable.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::config::ProxyConfig;

/// Outbound identity for one top-level scrape attempt. The session id is
/// fresh per scrape, not per navigation retry.
#[derive(Debug, Clone)]
pub struct ProxySession {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub session_id: String,
}

impl ProxySession {
    pub fn server_url(&self) -> String {
        format!("http://{}", self.endpoint)
    }
}

pub struct ProxyRotator {
    endpoints: RwLock<Vec<String>>,
    cursor: AtomicUsize,
    username: String,
    password: String,
}

impl ProxyRotator {
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            endpoints: RwLock::new(config.endpoints.clone()),
            cursor: AtomicUsize::new(0),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Next endpoint in round-robin order, or `None` on an empty pool
    /// (callers then use direct egress).
    pub fn next(&self) -> Option<String> {
        let pool = self.endpoints.read();
        if pool.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % pool.len();
        Some(pool[index].clone())
    }

    /// Append an endpoint unless already present.
    pub fn add(&self, endpoint: &str) -> bool {
        let mut pool = self.endpoints.write();
        if pool.iter().any(|e| e == endpoint) {
            return false;
        }
        pool.push(endpoint.to_string());
        true
    }

    /// Remove the first matching endpoint. Relative order of the remaining
    /// entries is unchanged.
    pub fn remove(&self, endpoint: &str) -> bool {
        let mut pool = self.endpoints.write();
        match pool.iter().position(|e| e == endpoint) {
            Some(index) => {
                pool.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.read().is_empty()
    }

    /// Rotate an endpoint and pair it with session-scoped credentials.
    pub fn session(&self) -> Option<ProxySession> {
        let endpoint = self.next()?;
        let session_id = Uuid::new_v4().simple().to_string();
        Some(ProxySession {
            username: format!("{}-session-{}", self.username, &session_id[..8]),
            password: self.password.clone(),
            endpoint,
            session_id,
        })
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub scraper: ScraperConfig,
    pub proxy: ProxyConfig,
    pub smtp: SmtpConfig,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/pricewise.db?mode=rwc".to_string(),
            max_connections: 5,
            acquire_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub chrome_path: Option<String>,
    /// Per-attempt navigation timeout, seconds.
    pub navigation_timeout_secs: u64,
    /// Wait for the source's readiness selectors, seconds.
    pub selector_wait_secs: u64,
    /// Fixed wait after navigation for client-side content, seconds.
    pub settle_delay_secs: u64,
    /// Total navigation attempts before reporting a fetch failure.
    pub navigation_retries: u32,
    /// Fixed delay between attempts, milliseconds.
    pub retry_backoff_ms: u64,
    /// Currency symbol used when no candidate matches the allow-set.
    pub fallback_currency: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            chrome_path: None,
            navigation_timeout_secs: 60,
            selector_wait_secs: 30,
            settle_delay_secs: 8,
            navigation_retries: 3,
            retry_backoff_ms: 4000,
            fallback_currency: "₹".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub username: String,
    pub password: String,
    /// Ordered `host:port` pool. Empty means direct egress.
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub use_tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: "alerts@pricewise.local".to_string(),
            from_name: "Pricewise Team".to_string(),
            use_tls: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Strip fragments and trailing slashes before keying records by URL.
    /// Off by default: two URLs differing in query string stay distinct.
    pub normalize_urls: bool,
    pub similar_limit: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            normalize_urls: false,
            similar_limit: 3,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "PRICEWISE_"
            .add_source(Environment::with_prefix("PRICEWISE").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Chrome path may come from the conventional variable instead
        if config.scraper.chrome_path.is_none() {
            config.scraper.chrome_path = std::env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Message("Database URL must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "Database max_connections must be greater than 0".into(),
            ));
        }

        if self.scraper.navigation_retries == 0 {
            return Err(ConfigError::Message(
                "Scraper navigation_retries must be at least 1".into(),
            ));
        }

        if self.scraper.navigation_timeout_secs == 0 || self.scraper.selector_wait_secs == 0 {
            return Err(ConfigError::Message(
                "Scraper timeouts must be greater than 0".into(),
            ));
        }

        if self.scraper.fallback_currency.is_empty() {
            return Err(ConfigError::Message(
                "Scraper fallback_currency must not be empty".into(),
            ));
        }

        if self.smtp.port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if self.smtp.from_address.is_empty() {
            return Err(ConfigError::Message("SMTP from_address must not be empty".into()));
        }

        for endpoint in &self.proxy.endpoints {
            if !endpoint.contains(':') {
                return Err(ConfigError::Message(format!(
                    "Proxy endpoint '{endpoint}' must be host:port"
                )));
            }
        }

        if self.tracking.similar_limit == 0 {
            return Err(ConfigError::Message(
                "Tracking similar_limit must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        // Reference deployment values
        assert_eq!(config.scraper.navigation_timeout_secs, 60);
        assert_eq!(config.scraper.selector_wait_secs, 30);
        assert_eq!(config.scraper.settle_delay_secs, 8);
        assert_eq!(config.scraper.navigation_retries, 3);
        assert_eq!(config.scraper.retry_backoff_ms, 4000);
        assert_eq!(config.scraper.fallback_currency, "₹");
        assert!(!config.tracking.normalize_urls);
    }

    #[test]
    fn test_validation_rejects_zero_retries() {
        let mut config = AppConfig::default();
        config.scraper.navigation_retries = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("navigation_retries"));
    }

    #[test]
    fn test_validation_rejects_bad_proxy_endpoint() {
        let mut config = AppConfig::default();
        config.proxy.endpoints = vec!["10.0.0.1:8080".to_string(), "no-port".to_string()];

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no-port"));
    }

    #[test]
    fn test_validation_rejects_zero_smtp_port() {
        let mut config = AppConfig::default();
        config.smtp.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_fallback_currency() {
        let mut config = AppConfig::default();
        config.scraper.fallback_currency = String::new();

        assert!(config.validate().is_err());
    }
}

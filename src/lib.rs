pub mod adapters;
pub mod config;
pub mod extract;
pub mod merge;
pub mod models;
pub mod notify;
pub mod proxy;
pub mod repository;
pub mod rules;
pub mod scraper;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use models::{PricePoint, ProductRecord, ScrapedProduct};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;

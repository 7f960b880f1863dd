use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Extraction failed for {url}: {message}")]
    ExtractionFailed { url: String, message: String },

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

// All storage errors surface under the persistence bucket; the taxonomy
// stays closed over the operations callers can act on.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::PersistenceFailed(err.to_string())
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_display() {
        let err = AppError::FetchFailed {
            url: "https://www.amazon.in/dp/B0TEST".to_string(),
            message: "navigation failed after 3 attempts".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Fetch failed for https://www.amazon.in/dp/B0TEST: navigation failed after 3 attempts"
        );
    }

    #[test]
    fn test_extraction_failed_display() {
        let err = AppError::ExtractionFailed {
            url: "https://www.flipkart.com/x/p/y".to_string(),
            message: "no product title in page".to_string(),
        };
        assert!(err.to_string().starts_with("Extraction failed for"));
    }

    #[test]
    fn test_sqlx_error_maps_to_persistence() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::PersistenceFailed(_)));
    }
}

use thiserror::Error;

/// Application-wide error types for pastewatch.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or the provider answered with an unexpected status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The provider rejected a listing request with a rate limit.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A paste with this key has already been persisted.
    #[error("Paste {0} is already stored")]
    DuplicatePaste(String),

    /// Non-database storage backend failed (filesystem, invalid key).
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The health reporting endpoint could not be notified.
    #[error("Health check error: {0}")]
    HealthCheckError(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if the error came from the feed provider side (listing or fetch).
    pub fn is_feed_error(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::NetworkError(_)
                | AppError::SerializationError(_)
        )
    }
}

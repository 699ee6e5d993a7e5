use std::path::PathBuf;

use pastewatch_core::AppError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_FILE_STORE_DIR: &str = "./pastes";
const DEFAULT_MONGO_DATABASE: &str = "pastebin";
const DEFAULT_MONGO_COLLECTION: &str = "pastes";

/// Configuration for the database connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Read configuration from environment variables.
    ///
    /// - `DATABASE_URL` (required)
    /// - `DATABASE_MAX_CONNECTIONS` (optional, defaults to 5)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_values(
            std::env::var("DATABASE_URL").ok(),
            std::env::var("DATABASE_MAX_CONNECTIONS").ok(),
        )
    }

    fn from_values(url: Option<String>, max_connections: Option<String>) -> Result<Self, AppError> {
        let url = url.filter(|u| !u.is_empty()).ok_or_else(|| {
            AppError::ConfigError("DATABASE_URL not set. Required for the postgres store.".into())
        })?;

        let max_connections = match max_connections {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => {
                let parsed: u32 = raw.parse().map_err(|_| {
                    AppError::ConfigError(format!(
                        "Invalid DATABASE_MAX_CONNECTIONS '{raw}': must be a positive integer"
                    ))
                })?;
                if parsed == 0 {
                    return Err(AppError::ConfigError(
                        "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
                    ));
                }
                parsed
            }
        };

        Ok(Self {
            url,
            max_connections,
        })
    }
}

/// Connection settings for the MongoDB store.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl MongoConfig {
    /// Read configuration from environment variables.
    ///
    /// - `MONGO_URI` (required)
    /// - `MONGO_DATABASE` (optional, defaults to `pastebin`)
    /// - `MONGO_COLLECTION` (optional, defaults to `pastes`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_values(
            std::env::var("MONGO_URI").ok(),
            std::env::var("MONGO_DATABASE").ok(),
            std::env::var("MONGO_COLLECTION").ok(),
        )
    }

    fn from_values(
        uri: Option<String>,
        database: Option<String>,
        collection: Option<String>,
    ) -> Result<Self, AppError> {
        let uri = uri.filter(|u| !u.is_empty()).ok_or_else(|| {
            AppError::ConfigError("MONGO_URI not set. Required for the mongo store.".into())
        })?;
        let or_default = |value: Option<String>, default: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            uri,
            database: or_default(database, DEFAULT_MONGO_DATABASE),
            collection: or_default(collection, DEFAULT_MONGO_COLLECTION),
        })
    }
}

/// Configuration for the on-disk file store.
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    pub dir: PathBuf,
}

impl FileStoreConfig {
    /// Read `FILE_STORE_DIR`, defaulting to `./pastes`.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var("FILE_STORE_DIR").ok())
    }

    fn from_value(dir: Option<String>) -> Self {
        let dir = dir
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_STORE_DIR.to_string());
        Self { dir: dir.into() }
    }
}

use pastewatch_core::{AppError, DedupCache};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::postgres::PgPasteStore;

/// Central database facade. Owns the connection pool and vends stores.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Build a pool that opens connections on first use.
    ///
    /// Only the URL is validated here; [`PasteStore::initialize`] is where
    /// the first connection is made.
    ///
    /// [`PasteStore::initialize`]: pastewatch_core::PasteStore::initialize
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url)
            .map_err(|e| AppError::ConfigError(format!("Invalid DATABASE_URL: {e}")))?;

        Ok(Self { pool })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a [`PgPasteStore`] backed by this pool and the given cache.
    pub fn paste_store(&self, cache: DedupCache) -> PgPasteStore {
        PgPasteStore::with_cache(self.pool.clone(), cache)
    }
}
